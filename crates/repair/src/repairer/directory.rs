use std::fs;
use std::io;

use tagkeep_catalog::TrackedEntry;
use tracing::debug;

use super::Repairer;
use crate::error::{CatalogResultExt, RepairError};
use crate::register::register_observed;
use crate::report::RepairEvent;

impl Repairer<'_> {
    /// Make sure every immediate child of a tracked directory is tracked and
    /// carries an implicit tagging for each of the directory's explicit
    /// tags.
    ///
    /// One level only: a new subdirectory is registered and tagged, but its
    /// own children wait for a later run.
    pub(super) fn reconcile_directory(&mut self, dir: &TrackedEntry) -> Result<(), RepairError> {
        let dir_path = dir.path();
        let tags = self.catalog.tags_for_entry(dir.id, true).at(dir_path)?;
        let listing = match fs::read_dir(dir_path) {
            Ok(listing) => listing,
            Err(err) if err.kind() == io::ErrorKind::PermissionDenied => {
                self.emit(RepairEvent::PermissionDenied {
                    path: dir_path.to_path_buf(),
                });
                return Ok(());
            }
            Err(source) => {
                return Err(RepairError::ReadDir {
                    path: dir_path.to_path_buf(),
                    source,
                });
            }
        };

        let mut names = Vec::new();
        for item in listing {
            let item = item.map_err(|source| RepairError::ReadDir {
                path: dir_path.to_path_buf(),
                source,
            })?;
            names.push(item.file_name());
        }
        names.sort();
        debug!(path = %dir_path.display(), children = names.len(), tags = tags.len(), "reconciling directory");

        for name in names {
            let child_path = dir_path.join(&name);

            let child = match self.catalog.entry_by_path(&child_path).at(&child_path)? {
                Some(child) => child,
                None => {
                    let metadata = match fs::metadata(&child_path) {
                        Ok(metadata) => metadata,
                        Err(err) => {
                            // Vanished since listing, a dangling link, or unreadable.
                            self.emit(if err.kind() == io::ErrorKind::PermissionDenied {
                                RepairEvent::PermissionDenied { path: child_path }
                            } else {
                                RepairEvent::StatFailed {
                                    path: child_path,
                                    message: err.to_string(),
                                }
                            });
                            continue;
                        }
                    };
                    let child =
                        register_observed(self.catalog, self.fingerprinter, &child_path, &metadata)?;
                    self.summary.new_entries += 1;
                    self.emit(RepairEvent::New {
                        path: child_path.clone(),
                    });
                    child
                }
            };

            for tag in &tags {
                // An explicit tagging does not satisfy the implicit one.
                let has_implicit = self
                    .catalog
                    .find_tagging(child.id, tag.id)
                    .at(&child_path)?
                    .is_some_and(|association| association.implicit);
                if has_implicit {
                    continue;
                }

                self.catalog
                    .add_implicit_tagging(child.id, tag.id)
                    .at(&child_path)?;
                self.summary.implicit_taggings += 1;
                self.emit(RepairEvent::ImplicitTagging {
                    path: child_path.clone(),
                    tag: tag.name.clone(),
                });
            }
        }

        Ok(())
    }
}
