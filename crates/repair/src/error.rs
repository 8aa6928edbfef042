use std::io;
use std::path::{Path, PathBuf};

use tagkeep_catalog::CatalogError;
use thiserror::Error;

/// Failures that abort a repair run.  Ordinary drift (a file gone, a
/// permission denied) never surfaces here; it is reported as a warning
/// event instead.
#[derive(Debug, Error)]
pub enum RepairError {
    #[error("'{}': catalog failure: {source}", .path.display())]
    Catalog {
        path: PathBuf,
        #[source]
        source: CatalogError,
    },
    #[error("'{}': cannot compute fingerprint: {source}", .path.display())]
    Fingerprint {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("'{}': cannot build map of files by size: {source}", .path.display())]
    CandidateIndex {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("'{}': {source}", .path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("'{}': cannot list directory: {source}", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("'{}': cannot resolve absolute path: {source}", .path.display())]
    InvalidPath {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Attach the path being worked on to a catalog failure.
pub(crate) trait CatalogResultExt<T> {
    fn at(self, path: &Path) -> Result<T, RepairError>;
}

impl<T> CatalogResultExt<T> for Result<T, CatalogError> {
    fn at(self, path: &Path) -> Result<T, RepairError> {
        self.map_err(|source| RepairError::Catalog {
            path: path.to_path_buf(),
            source,
        })
    }
}
