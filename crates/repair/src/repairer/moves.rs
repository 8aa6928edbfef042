use std::fs;

use tagkeep_catalog::{FileState, TrackedEntry};

use super::{EntryOutcome, Repairer};
use crate::candidates::CandidateIndex;
use crate::error::{CatalogResultExt, RepairError};
use crate::report::RepairEvent;

impl Repairer<'_> {
    /// Look for a missing entry's content elsewhere beneath the roots.
    ///
    /// The first same-size candidate whose fingerprint matches wins.  With
    /// duplicate content that may be any of the copies; candidates are
    /// tried in index order so the choice is at least reproducible.
    pub(super) fn resolve_missing(
        &mut self,
        entry: &TrackedEntry,
        index: &CandidateIndex,
    ) -> Result<EntryOutcome, RepairError> {
        let path = entry.path();

        // Directories carry no fingerprint and are never matched.
        if entry.fingerprint.is_empty() {
            self.emit(RepairEvent::NoFingerprint {
                path: path.to_path_buf(),
            });
            self.emit(RepairEvent::Missing {
                path: path.to_path_buf(),
            });
            return Ok(EntryOutcome::Missing);
        }

        self.emit(RepairEvent::Searching {
            path: path.to_path_buf(),
        });

        for candidate in index.candidates(entry.size) {
            // A tracked file is somebody else's content, not our relocation.
            if self.catalog.entry_by_path(candidate).at(candidate)?.is_some() {
                continue;
            }

            let fingerprint = self
                .fingerprinter
                .fingerprint(candidate)
                .map_err(|source| RepairError::Fingerprint {
                    path: candidate.clone(),
                    source,
                })?;
            if fingerprint != entry.fingerprint {
                continue;
            }

            self.emit(RepairEvent::FingerprintMatch {
                path: path.to_path_buf(),
                candidate: candidate.clone(),
            });

            let state = fs::metadata(candidate)
                .and_then(|metadata| FileState::observed(entry.fingerprint.clone(), &metadata))
                .map_err(|source| RepairError::Stat {
                    path: candidate.clone(),
                    source,
                })?;
            self.catalog.update_entry(entry.id, candidate, &state).at(candidate)?;

            self.emit(RepairEvent::Moved {
                path: path.to_path_buf(),
                to: candidate.clone(),
            });
            return Ok(EntryOutcome::Moved);
        }

        self.emit(RepairEvent::Missing {
            path: path.to_path_buf(),
        });
        Ok(EntryOutcome::Missing)
    }
}
