//! Content fingerprints used to recognise a file after it has been moved.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use sha2::{Digest, Sha256};

/// Maps a path to a deterministic identity of its content.
pub trait Fingerprinter {
    /// Directories yield the empty fingerprint.  Unreadable files fail with
    /// the underlying I/O error.
    fn fingerprint(&self, path: &Path) -> io::Result<String>;
}

/// Lowercase hex SHA-256 of the file contents.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Fingerprinter;

impl Fingerprinter for Sha256Fingerprinter {
    fn fingerprint(&self, path: &Path) -> io::Result<String> {
        if fs::metadata(path)?.is_dir() {
            return Ok(String::new());
        }

        let mut file = File::open(path)?;
        let mut hasher = Sha256::new();
        io::copy(&mut file, &mut hasher)?;
        Ok(format!("{:x}", hasher.finalize()))
    }
}
