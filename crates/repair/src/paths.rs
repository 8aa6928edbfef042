use std::io;
use std::path::{Component, Path, PathBuf};

/// Absolute form of `path`, with `.` and `..` resolved lexically.  Symlinks
/// are left alone: catalog paths name the link, not its target.
pub fn absolute_path(path: &Path) -> io::Result<PathBuf> {
    Ok(normalize_path(&std::path::absolute(path)?))
}

fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other),
        }
    }
    out
}
