//! Bringing untracked paths into the catalog.

use std::fs::{self, Metadata};
use std::path::Path;

use tagkeep_catalog::{CatalogStore, FileState, Fingerprinter, TrackedEntry};

use crate::error::{CatalogResultExt, RepairError};

/// Stat `path` (following symlinks), fingerprint it and track it.
pub fn register_path(
    catalog: &mut dyn CatalogStore,
    fingerprinter: &dyn Fingerprinter,
    path: &Path,
) -> Result<TrackedEntry, RepairError> {
    let metadata = fs::metadata(path).map_err(|source| RepairError::Stat {
        path: path.to_path_buf(),
        source,
    })?;
    register_observed(catalog, fingerprinter, path, &metadata)
}

pub(crate) fn register_observed(
    catalog: &mut dyn CatalogStore,
    fingerprinter: &dyn Fingerprinter,
    path: &Path,
    metadata: &Metadata,
) -> Result<TrackedEntry, RepairError> {
    let fingerprint = fingerprint_node(fingerprinter, path, metadata.is_dir())?;
    let state = FileState::observed(fingerprint, metadata).map_err(|source| RepairError::Stat {
        path: path.to_path_buf(),
        source,
    })?;
    catalog.add_entry(path, &state).at(path)
}

/// Directories are never fingerprinted.
pub(crate) fn fingerprint_node(
    fingerprinter: &dyn Fingerprinter,
    path: &Path,
    is_dir: bool,
) -> Result<String, RepairError> {
    if is_dir {
        return Ok(String::new());
    }
    fingerprinter
        .fingerprint(path)
        .map_err(|source| RepairError::Fingerprint {
            path: path.to_path_buf(),
            source,
        })
}

/// Track `path` if needed and apply explicit `(name, value)` tags to it,
/// creating tags on first use.  Returns the entry.
pub fn apply_tags(
    catalog: &mut dyn CatalogStore,
    fingerprinter: &dyn Fingerprinter,
    path: &Path,
    tags: &[(String, Option<String>)],
) -> Result<TrackedEntry, RepairError> {
    let entry = match catalog.entry_by_path(path).at(path)? {
        Some(entry) => entry,
        None => register_path(catalog, fingerprinter, path)?,
    };

    for (name, value) in tags {
        let tag = catalog.add_tag(name).at(path)?;
        catalog
            .add_explicit_tagging(entry.id, tag.id, value.as_deref())
            .at(path)?;
    }
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use tagkeep_catalog::Sha256Fingerprinter;

    use super::*;
    use crate::test_support::{CountingFingerprinter, Fixture};

    #[test]
    fn registers_file_with_fingerprint_and_size() {
        let mut fx = Fixture::new();
        let path = fx.write("data/a.txt", "0123456789");
        let entry = register_path(&mut fx.catalog, &Sha256Fingerprinter, &path).unwrap();
        assert_eq!(entry.path, path);
        assert_eq!(entry.size, 10);
        assert!(!entry.fingerprint.is_empty());
        assert_eq!(fx.catalog.entry_by_path(&path).unwrap().unwrap().id, entry.id);
    }

    #[test]
    fn directories_are_registered_without_fingerprinting() {
        let mut fx = Fixture::new();
        let dir = fx.mkdir("data/docs");
        let counting = CountingFingerprinter::default();
        let entry = register_path(&mut fx.catalog, &counting, &dir).unwrap();
        assert!(entry.is_directory_record());
        assert_eq!(counting.calls(), 0);
    }

    #[test]
    fn missing_path_cannot_be_registered() {
        let mut fx = Fixture::new();
        let path = fx.root().join("absent");
        let err = register_path(&mut fx.catalog, &Sha256Fingerprinter, &path).unwrap_err();
        assert!(matches!(err, RepairError::Stat { .. }));
    }

    #[test]
    fn apply_tags_reuses_tracked_entry() {
        let mut fx = Fixture::new();
        let path = fx.write("data/song.mp3", "la la la");
        let tags = vec![
            ("music".to_string(), None),
            ("year".to_string(), Some("2011".to_string())),
        ];
        let first = apply_tags(&mut fx.catalog, &Sha256Fingerprinter, &path, &tags).unwrap();
        let second = apply_tags(&mut fx.catalog, &Sha256Fingerprinter, &path, &tags[..1]).unwrap();
        assert_eq!(first.id, second.id);

        let names: Vec<String> = fx
            .catalog
            .tags_for_entry(first.id, true)
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["music", "year"]);
    }
}
