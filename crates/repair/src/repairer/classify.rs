use std::fs;
use std::io;

use tagkeep_catalog::schema::modified_utc;
use tagkeep_catalog::{FileState, TrackedEntry};

use super::{EntryOutcome, Repairer};
use crate::candidates::CandidateIndex;
use crate::error::{CatalogResultExt, RepairError};
use crate::register::fingerprint_node;
use crate::report::RepairEvent;

impl Repairer<'_> {
    /// Compare one entry against a fresh `stat` and repair what drifted.
    pub(super) fn check_entry(
        &mut self,
        entry: &TrackedEntry,
        index: &CandidateIndex,
    ) -> Result<EntryOutcome, RepairError> {
        let path = entry.path();
        self.emit(RepairEvent::Checking {
            path: path.to_path_buf(),
        });

        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return self.resolve_missing(entry, index);
            }
            Err(err) if err.kind() == io::ErrorKind::PermissionDenied => {
                self.emit(RepairEvent::PermissionDenied {
                    path: path.to_path_buf(),
                });
                return Ok(EntryOutcome::SkippedPermission);
            }
            Err(err) => {
                self.emit(RepairEvent::StatFailed {
                    path: path.to_path_buf(),
                    message: err.to_string(),
                });
                return Ok(EntryOutcome::SkippedError);
            }
        };

        let is_dir = metadata.is_dir();
        if is_dir != entry.is_directory_record() {
            self.emit(RepairEvent::TypeChanged {
                path: path.to_path_buf(),
                now_directory: is_dir,
            });
            return Ok(EntryOutcome::TypeChanged);
        }

        let mod_time = modified_utc(&metadata).map_err(|source| RepairError::Stat {
            path: path.to_path_buf(),
            source,
        })?;
        let size = metadata.len();

        if entry.matches(mod_time, size) {
            self.emit(RepairEvent::Unchanged {
                path: path.to_path_buf(),
            });
            return Ok(EntryOutcome::Unchanged);
        }

        self.emit(RepairEvent::Updating {
            path: path.to_path_buf(),
        });
        let fingerprint = fingerprint_node(self.fingerprinter, path, is_dir)?;
        let state = FileState::new(fingerprint, mod_time, size);
        self.catalog.update_entry(entry.id, path, &state).at(path)?;
        self.emit(RepairEvent::Modified {
            path: path.to_path_buf(),
        });
        Ok(EntryOutcome::Modified)
    }
}
