//! Size-keyed map of every regular file beneath the repair roots, used to
//! find where a missing file went.

use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::RepairError;
use crate::report::{RepairEvent, Reporter};

/// Ephemeral, built once per run and never persisted.  Candidates for a
/// size are kept in discovery order: roots in the order given, then a
/// depth-first walk with siblings sorted by file name.
#[derive(Debug, Default)]
pub struct CandidateIndex {
    by_size: BTreeMap<u64, Vec<PathBuf>>,
    seen: HashSet<PathBuf>,
}

impl CandidateIndex {
    /// Walk every root.  A root that cannot be read for lack of permission
    /// is reported and skipped; any other failure on a root aborts the
    /// build.  Unreadable nodes below a root are logged and skipped.
    pub fn build(roots: &[PathBuf], reporter: &mut dyn Reporter) -> Result<Self, RepairError> {
        reporter.report(RepairEvent::IndexBuilding);

        let mut index = Self::default();
        for root in roots {
            match index.add_root(root) {
                Ok(()) => {}
                Err(err) if err.io_error().map(io::Error::kind) == Some(io::ErrorKind::PermissionDenied) => {
                    reporter.report(RepairEvent::PermissionDenied { path: root.clone() });
                }
                Err(source) => {
                    return Err(RepairError::CandidateIndex {
                        path: root.clone(),
                        source,
                    });
                }
            }
        }

        debug!(sizes = index.by_size.len(), candidates = index.len(), "candidate map built");
        reporter.report(RepairEvent::IndexBuilt {
            candidates: index.len(),
        });
        Ok(index)
    }

    fn add_root(&mut self, root: &Path) -> Result<(), walkdir::Error> {
        for item in WalkDir::new(root).follow_links(true).sort_by_file_name() {
            let node = match item {
                Ok(node) => node,
                Err(err) if err.depth() == 0 => return Err(err),
                Err(err) => {
                    warn!(path = ?err.path(), %err, "skipping unreadable node while mapping files by size");
                    continue;
                }
            };
            if !node.file_type().is_file() {
                continue;
            }
            let size = match node.metadata() {
                Ok(metadata) => metadata.len(),
                Err(err) if node.depth() == 0 => return Err(err),
                Err(err) => {
                    warn!(path = %node.path().display(), %err, "skipping unreadable file while mapping files by size");
                    continue;
                }
            };
            self.insert(size, node.into_path());
        }
        Ok(())
    }

    /// Zero-byte files say nothing about identity and are left out.
    fn insert(&mut self, size: u64, path: PathBuf) {
        if size == 0 || !self.seen.insert(path.clone()) {
            return;
        }
        self.by_size.entry(size).or_default().push(path);
    }

    /// Paths of every file of exactly `size` bytes, in discovery order.
    pub fn candidates(&self, size: u64) -> &[PathBuf] {
        self.by_size.get(&size).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of candidate paths.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
