//! Fixtures shared by the unit tests.

use std::cell::Cell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tagkeep_catalog::{Catalog, CatalogStore, Fingerprinter, Sha256Fingerprinter, TrackedEntry};
use tempfile::TempDir;

use crate::error::RepairError;
use crate::register::{apply_tags, register_path};
use crate::report::RecordingReporter;
use crate::repairer::{RepairSummary, Repairer};

/// A scratch tree plus a catalog kept outside of it, so repairing the tree
/// never sees the catalog file.
pub(crate) struct Fixture {
    data: TempDir,
    _state: TempDir,
    pub catalog: Catalog,
}

impl Fixture {
    pub fn new() -> Self {
        let data = TempDir::new().unwrap();
        let state = TempDir::new().unwrap();
        let catalog = Catalog::open(state.path().join("catalog.redb")).unwrap();
        Self {
            data,
            _state: state,
            catalog,
        }
    }

    pub fn root(&self) -> PathBuf {
        self.data.path().to_path_buf()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.data.path().join(rel)
    }

    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    pub fn mkdir(&self, rel: &str) -> PathBuf {
        let path = self.path(rel);
        fs::create_dir_all(&path).unwrap();
        path
    }

    pub fn track(&mut self, rel: &str) -> TrackedEntry {
        let path = self.path(rel);
        register_path(&mut self.catalog, &Sha256Fingerprinter, &path).unwrap()
    }

    pub fn tag(&mut self, rel: &str, name: &str, value: Option<&str>) -> TrackedEntry {
        let path = self.path(rel);
        let tags = vec![(name.to_string(), value.map(str::to_string))];
        apply_tags(&mut self.catalog, &Sha256Fingerprinter, &path, &tags).unwrap()
    }

    pub fn entry(&self, path: &Path) -> Option<TrackedEntry> {
        self.catalog.entry_by_path(path).unwrap()
    }

    pub fn repair(
        &mut self,
        fingerprinter: &dyn Fingerprinter,
        roots: &[PathBuf],
    ) -> (Result<RepairSummary, RepairError>, RecordingReporter) {
        let mut reporter = RecordingReporter::default();
        let result = Repairer::new(&mut self.catalog, fingerprinter, &mut reporter).run(roots);
        (result, reporter)
    }
}

/// Push a file's modification time an hour into the past.
pub(crate) fn backdate(path: &Path) -> SystemTime {
    let time = SystemTime::now() - Duration::from_secs(3600);
    let file = fs::File::options().write(true).open(path).unwrap();
    file.set_modified(time).unwrap();
    time
}

/// SHA-256 fingerprints, counting how many were computed.
#[derive(Default)]
pub(crate) struct CountingFingerprinter {
    calls: Cell<usize>,
}

impl CountingFingerprinter {
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl Fingerprinter for CountingFingerprinter {
    fn fingerprint(&self, path: &Path) -> io::Result<String> {
        self.calls.set(self.calls.get() + 1);
        Sha256Fingerprinter.fingerprint(path)
    }
}

/// Fails for one path, SHA-256 for everything else.
pub(crate) struct FailingFingerprinter {
    pub fail_on: PathBuf,
}

impl Fingerprinter for FailingFingerprinter {
    fn fingerprint(&self, path: &Path) -> io::Result<String> {
        if path == self.fail_on {
            return Err(io::Error::other("read error"));
        }
        Sha256Fingerprinter.fingerprint(path)
    }
}

/// Strip every permission from `path`.  Returns false, with permissions
/// restored, when the lock has no effect (tests running as root).
#[cfg(unix)]
pub(crate) fn lock(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o000)).unwrap();
    if fs::read_dir(path).is_ok() {
        unlock(path);
        return false;
    }
    true
}

#[cfg(unix)]
pub(crate) fn unlock(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}
