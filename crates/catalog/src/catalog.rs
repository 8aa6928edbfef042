//! Persistent catalog of tracked entries and their tag associations, backed
//! by [`redb`].
//!
//! # Tables
//!
//! | Name        | Key                              | Value                         |
//! |-------------|----------------------------------|-------------------------------|
//! | `entries`   | entry id (u64)                   | JSON [`TrackedEntry`]         |
//! | `paths`     | absolute path (raw OS bytes)     | entry id                      |
//! | `tags`      | tag id (u64)                     | tag name                      |
//! | `tag_names` | tag name (&str)                  | tag id                        |
//! | `taggings`  | (entry id, tag id, implicit 0/1) | JSON [`TagAssociation`]       |
//! | `meta`      | counter name (&str)              | next id to hand out           |
//!
//! A [`Catalog`] value is one session: the database file stays open until
//! it is dropped.  Each mutating call runs in its own write transaction.
use std::path::{Path, PathBuf};

use redb::{Database, ReadableTable, TableDefinition, WriteTransaction};
use tracing::debug;

use crate::encoding::{path_from_bytes, path_to_bytes};
use crate::error::CatalogError;
use crate::schema::{EntryId, FileState, Tag, TagAssociation, TagId, TrackedEntry};
use crate::store::CatalogStore;

// ── redb table definitions ────────────────────────────────────────────────────

const ENTRIES_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("entries");
const PATHS_TABLE: TableDefinition<&[u8], u64> = TableDefinition::new("paths");
const TAGS_TABLE: TableDefinition<u64, &str> = TableDefinition::new("tags");
const TAG_NAMES_TABLE: TableDefinition<&str, u64> = TableDefinition::new("tag_names");
const TAGGINGS_TABLE: TableDefinition<(u64, u64, u8), &[u8]> = TableDefinition::new("taggings");
const META_TABLE: TableDefinition<&str, u64> = TableDefinition::new("meta");

const NEXT_ENTRY_ID: &str = "next_entry_id";
const NEXT_TAG_ID: &str = "next_tag_id";

const EXPLICIT: u8 = 0;
const IMPLICIT: u8 = 1;

pub struct Catalog {
    db: Database,
    path: PathBuf,
}

impl Catalog {
    /// Open or create the catalog file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let db = Database::create(&path)?;

        // Ensure tables exist so read transactions never hit a missing table.
        {
            let tx = db.begin_write()?;
            tx.open_table(ENTRIES_TABLE)?;
            tx.open_table(PATHS_TABLE)?;
            tx.open_table(TAGS_TABLE)?;
            tx.open_table(TAG_NAMES_TABLE)?;
            tx.open_table(TAGGINGS_TABLE)?;
            tx.open_table(META_TABLE)?;
            tx.commit()?;
        }

        debug!(path = %path.display(), "catalog opened");
        Ok(Self { db, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_entries(&self, ids: &[u64]) -> Result<Vec<TrackedEntry>, CatalogError> {
        let tx = self.db.begin_read()?;
        let tbl = tx.open_table(ENTRIES_TABLE)?;
        let mut entries = Vec::with_capacity(ids.len());
        for id in ids {
            match tbl.get(*id)? {
                Some(raw) => entries.push(serde_json::from_slice(raw.value())?),
                None => return Err(CatalogError::UnknownEntry(EntryId(*id))),
            }
        }
        Ok(entries)
    }

    fn put_tagging(&mut self, association: &TagAssociation) -> Result<(), CatalogError> {
        let flag = if association.implicit { IMPLICIT } else { EXPLICIT };
        let bytes = serde_json::to_vec(association)?;

        let tx = self.db.begin_write()?;
        {
            let entries = tx.open_table(ENTRIES_TABLE)?;
            if entries.get(association.entry_id.0)?.is_none() {
                return Err(CatalogError::UnknownEntry(association.entry_id));
            }
            let tags = tx.open_table(TAGS_TABLE)?;
            if tags.get(association.tag_id.0)?.is_none() {
                return Err(CatalogError::UnknownTag(association.tag_id));
            }
            let mut taggings = tx.open_table(TAGGINGS_TABLE)?;
            taggings.insert(
                (association.entry_id.0, association.tag_id.0, flag),
                bytes.as_slice(),
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

fn path_key(path: &Path) -> Result<&[u8], CatalogError> {
    path_to_bytes(path)
}

/// Hand out the next value of a monotonically increasing counter.
fn next_id(tx: &WriteTransaction, counter: &str) -> Result<u64, CatalogError> {
    let mut meta = tx.open_table(META_TABLE)?;
    let id = meta.get(counter)?.map(|v| v.value()).unwrap_or(1);
    meta.insert(counter, id + 1)?;
    Ok(id)
}

impl CatalogStore for Catalog {
    fn entries_under(&self, dir: &Path) -> Result<Vec<TrackedEntry>, CatalogError> {
        let prefix = path_key(dir)?;
        let ids = {
            let tx = self.db.begin_read()?;
            let paths = tx.open_table(PATHS_TABLE)?;
            let mut ids = Vec::new();
            for item in paths.range(prefix..)? {
                let (key, id) = item?;
                let key = key.value();
                if !key.starts_with(prefix) {
                    break;
                }
                // `/data-old` shares the prefix of `/data` but is not beneath it.
                if path_from_bytes(key).is_some_and(|path| path.starts_with(dir)) {
                    ids.push(id.value());
                }
            }
            ids
        };
        self.load_entries(&ids)
    }

    fn all_entries(&self) -> Result<Vec<TrackedEntry>, CatalogError> {
        let ids = {
            let tx = self.db.begin_read()?;
            let paths = tx.open_table(PATHS_TABLE)?;
            let mut ids = Vec::new();
            for item in paths.iter()? {
                let (_, id) = item?;
                ids.push(id.value());
            }
            ids
        };
        self.load_entries(&ids)
    }

    fn entry_by_path(&self, path: &Path) -> Result<Option<TrackedEntry>, CatalogError> {
        let key = path_key(path)?;
        let tx = self.db.begin_read()?;
        let paths = tx.open_table(PATHS_TABLE)?;
        let Some(id) = paths.get(key)?.map(|v| v.value()) else {
            return Ok(None);
        };
        let entries = tx.open_table(ENTRIES_TABLE)?;
        match entries.get(id)? {
            Some(raw) => Ok(Some(serde_json::from_slice(raw.value())?)),
            None => Err(CatalogError::UnknownEntry(EntryId(id))),
        }
    }

    fn update_entry(&mut self, id: EntryId, path: &Path, state: &FileState) -> Result<(), CatalogError> {
        let new_key = path_key(path)?;

        let tx = self.db.begin_write()?;
        {
            let mut entries = tx.open_table(ENTRIES_TABLE)?;
            let current: TrackedEntry = match entries.get(id.0)? {
                Some(raw) => serde_json::from_slice(raw.value())?,
                None => return Err(CatalogError::UnknownEntry(id)),
            };

            if current.path != path {
                let mut paths = tx.open_table(PATHS_TABLE)?;
                if paths.get(new_key)?.is_some() {
                    return Err(CatalogError::DuplicatePath(path.to_path_buf()));
                }
                paths.remove(path_key(&current.path)?)?;
                paths.insert(new_key, id.0)?;
            }

            let updated = TrackedEntry::new(id, path, state.clone());
            let bytes = serde_json::to_vec(&updated)?;
            entries.insert(id.0, bytes.as_slice())?;
        }
        tx.commit()?;

        debug!(%id, path = %path.display(), size = state.size, "catalog entry updated");
        Ok(())
    }

    fn add_entry(&mut self, path: &Path, state: &FileState) -> Result<TrackedEntry, CatalogError> {
        let key = path_key(path)?;

        let tx = self.db.begin_write()?;
        let entry = {
            let mut paths = tx.open_table(PATHS_TABLE)?;
            if paths.get(key)?.is_some() {
                return Err(CatalogError::DuplicatePath(path.to_path_buf()));
            }
            let id = EntryId(next_id(&tx, NEXT_ENTRY_ID)?);
            let entry = TrackedEntry::new(id, path, state.clone());
            let bytes = serde_json::to_vec(&entry)?;

            let mut entries = tx.open_table(ENTRIES_TABLE)?;
            entries.insert(id.0, bytes.as_slice())?;
            paths.insert(key, id.0)?;
            entry
        };
        tx.commit()?;

        debug!(id = %entry.id, path = %path.display(), "catalog entry added");
        Ok(entry)
    }

    fn tags_for_entry(&self, id: EntryId, explicit_only: bool) -> Result<Vec<Tag>, CatalogError> {
        let tx = self.db.begin_read()?;
        let taggings = tx.open_table(TAGGINGS_TABLE)?;
        let mut tag_ids: Vec<u64> = Vec::new();
        for item in taggings.range((id.0, 0u64, EXPLICIT)..=(id.0, u64::MAX, IMPLICIT))? {
            let (key, _) = item?;
            let (_, tag_id, flag) = key.value();
            if explicit_only && flag == IMPLICIT {
                continue;
            }
            if tag_ids.last() != Some(&tag_id) {
                tag_ids.push(tag_id);
            }
        }

        let names = tx.open_table(TAGS_TABLE)?;
        let mut tags = Vec::with_capacity(tag_ids.len());
        for tag_id in tag_ids {
            let name = names
                .get(tag_id)?
                .map(|v| v.value().to_string())
                .ok_or(CatalogError::UnknownTag(TagId(tag_id)))?;
            tags.push(Tag {
                id: TagId(tag_id),
                name,
            });
        }
        Ok(tags)
    }

    fn taggings_for_entry(&self, id: EntryId) -> Result<Vec<TagAssociation>, CatalogError> {
        let tx = self.db.begin_read()?;
        let taggings = tx.open_table(TAGGINGS_TABLE)?;
        let mut associations = Vec::new();
        for item in taggings.range((id.0, 0u64, EXPLICIT)..=(id.0, u64::MAX, IMPLICIT))? {
            let (_, raw) = item?;
            associations.push(serde_json::from_slice(raw.value())?);
        }
        Ok(associations)
    }

    fn find_tagging(&self, entry: EntryId, tag: TagId) -> Result<Option<TagAssociation>, CatalogError> {
        let tx = self.db.begin_read()?;
        let taggings = tx.open_table(TAGGINGS_TABLE)?;
        for flag in [IMPLICIT, EXPLICIT] {
            if let Some(raw) = taggings.get((entry.0, tag.0, flag))? {
                return Ok(Some(serde_json::from_slice(raw.value())?));
            }
        }
        Ok(None)
    }

    fn add_implicit_tagging(&mut self, entry: EntryId, tag: TagId) -> Result<TagAssociation, CatalogError> {
        let association = TagAssociation {
            entry_id: entry,
            tag_id: tag,
            value: None,
            implicit: true,
        };
        self.put_tagging(&association)?;
        debug!(%entry, %tag, "implicit tagging added");
        Ok(association)
    }

    fn add_explicit_tagging(
        &mut self,
        entry: EntryId,
        tag: TagId,
        value: Option<&str>,
    ) -> Result<TagAssociation, CatalogError> {
        let association = TagAssociation {
            entry_id: entry,
            tag_id: tag,
            value: value.map(str::to_string),
            implicit: false,
        };
        self.put_tagging(&association)?;
        debug!(%entry, %tag, "explicit tagging added");
        Ok(association)
    }

    fn tag(&self, id: TagId) -> Result<Tag, CatalogError> {
        let tx = self.db.begin_read()?;
        let tags = tx.open_table(TAGS_TABLE)?;
        let name = tags
            .get(id.0)?
            .map(|v| v.value().to_string())
            .ok_or(CatalogError::UnknownTag(id))?;
        Ok(Tag { id, name })
    }

    fn tag_by_name(&self, name: &str) -> Result<Option<Tag>, CatalogError> {
        let tx = self.db.begin_read()?;
        let names = tx.open_table(TAG_NAMES_TABLE)?;
        Ok(names.get(name)?.map(|v| Tag {
            id: TagId(v.value()),
            name: name.to_string(),
        }))
    }

    fn add_tag(&mut self, name: &str) -> Result<Tag, CatalogError> {
        if let Some(existing) = self.tag_by_name(name)? {
            return Ok(existing);
        }

        let tx = self.db.begin_write()?;
        let id = {
            let id = next_id(&tx, NEXT_TAG_ID)?;
            let mut tags = tx.open_table(TAGS_TABLE)?;
            tags.insert(id, name)?;
            let mut names = tx.open_table(TAG_NAMES_TABLE)?;
            names.insert(name, id)?;
            TagId(id)
        };
        tx.commit()?;

        debug!(%id, name, "tag created");
        Ok(Tag {
            id,
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    use super::*;

    fn state(fingerprint: &str, size: u64) -> FileState {
        FileState::new(fingerprint, Utc.timestamp_opt(1_700_000_000, 0).unwrap(), size)
    }

    fn open(dir: &TempDir) -> Catalog {
        Catalog::open(dir.path().join("db/catalog.redb")).unwrap()
    }

    #[test]
    fn open_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let catalog = open(&dir);
        assert!(catalog.path().exists());
    }

    #[test]
    fn add_and_find_by_path() {
        let dir = TempDir::new().unwrap();
        let mut catalog = open(&dir);
        let added = catalog.add_entry(Path::new("/data/a.txt"), &state("f1", 10)).unwrap();

        let found = catalog.entry_by_path(Path::new("/data/a.txt")).unwrap().unwrap();
        assert_eq!(found, added);
        assert_eq!(found.fingerprint, "f1");
        assert!(catalog.entry_by_path(Path::new("/data/b.txt")).unwrap().is_none());
    }

    #[test]
    fn add_rejects_tracked_path() {
        let dir = TempDir::new().unwrap();
        let mut catalog = open(&dir);
        catalog.add_entry(Path::new("/data/a.txt"), &state("f1", 10)).unwrap();
        let err = catalog
            .add_entry(Path::new("/data/a.txt"), &state("f2", 3))
            .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicatePath(_)));
    }

    #[test]
    fn entries_under_includes_root_and_descendants_in_path_order() {
        let dir = TempDir::new().unwrap();
        let mut catalog = open(&dir);
        for path in ["/data/z.txt", "/data-old/x", "/data", "/data/sub/b", "/other", "/data/a.txt"] {
            catalog.add_entry(Path::new(path), &state("f", 1)).unwrap();
        }

        let paths: Vec<PathBuf> = catalog
            .entries_under(Path::new("/data"))
            .unwrap()
            .into_iter()
            .map(|e| e.path)
            .collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/data"),
                PathBuf::from("/data/a.txt"),
                PathBuf::from("/data/sub/b"),
                PathBuf::from("/data/z.txt"),
            ]
        );
        assert_eq!(catalog.all_entries().unwrap().len(), 6);
    }

    #[test]
    fn update_moves_path_index() {
        let dir = TempDir::new().unwrap();
        let mut catalog = open(&dir);
        let entry = catalog.add_entry(Path::new("/data/a.txt"), &state("f1", 10)).unwrap();

        catalog
            .update_entry(entry.id, Path::new("/data/moved/a.txt"), &state("f1", 10))
            .unwrap();

        assert!(catalog.entry_by_path(Path::new("/data/a.txt")).unwrap().is_none());
        let moved = catalog.entry_by_path(Path::new("/data/moved/a.txt")).unwrap().unwrap();
        assert_eq!(moved.id, entry.id);
    }

    #[test]
    fn update_onto_tracked_path_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut catalog = open(&dir);
        let a = catalog.add_entry(Path::new("/a"), &state("f1", 1)).unwrap();
        catalog.add_entry(Path::new("/b"), &state("f2", 1)).unwrap();
        let err = catalog.update_entry(a.id, Path::new("/b"), &state("f1", 1)).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicatePath(_)));
    }

    #[test]
    fn update_unknown_entry_fails() {
        let dir = TempDir::new().unwrap();
        let mut catalog = open(&dir);
        let err = catalog
            .update_entry(EntryId(42), Path::new("/x"), &state("f", 1))
            .unwrap_err();
        assert!(matches!(err, CatalogError::UnknownEntry(EntryId(42))));
    }

    #[test]
    fn explicit_and_implicit_taggings_coexist() {
        let dir = TempDir::new().unwrap();
        let mut catalog = open(&dir);
        let entry = catalog.add_entry(Path::new("/docs/a"), &state("f", 1)).unwrap();
        let project = catalog.add_tag("project").unwrap();
        let draft = catalog.add_tag("draft").unwrap();

        catalog.add_explicit_tagging(entry.id, project.id, Some("x")).unwrap();
        let explicit = catalog.find_tagging(entry.id, project.id).unwrap().unwrap();
        assert!(!explicit.implicit);
        assert_eq!(explicit.value.as_deref(), Some("x"));

        catalog.add_implicit_tagging(entry.id, project.id).unwrap();
        catalog.add_implicit_tagging(entry.id, draft.id).unwrap();
        let preferred = catalog.find_tagging(entry.id, project.id).unwrap().unwrap();
        assert!(preferred.implicit);

        let all: Vec<String> = catalog
            .tags_for_entry(entry.id, false)
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(all, vec!["project", "draft"]);

        let explicit_only = catalog.tags_for_entry(entry.id, true).unwrap();
        assert_eq!(explicit_only, vec![project]);
        assert_eq!(catalog.taggings_for_entry(entry.id).unwrap().len(), 3);
    }

    #[test]
    fn add_tag_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut catalog = open(&dir);
        let first = catalog.add_tag("music").unwrap();
        let second = catalog.add_tag("music").unwrap();
        assert_eq!(first, second);
        assert_eq!(catalog.tag(first.id).unwrap().name, "music");
        assert!(catalog.tag_by_name("video").unwrap().is_none());
    }

    #[test]
    fn tagging_unknown_entry_fails() {
        let dir = TempDir::new().unwrap();
        let mut catalog = open(&dir);
        let tag = catalog.add_tag("music").unwrap();
        let err = catalog.add_implicit_tagging(EntryId(9), tag.id).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownEntry(EntryId(9))));
    }

    #[test]
    fn catalog_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let mut catalog = open(&dir);
            let entry = catalog.add_entry(Path::new("/data/a.txt"), &state("f1", 10)).unwrap();
            let tag = catalog.add_tag("music").unwrap();
            catalog.add_explicit_tagging(entry.id, tag.id, None).unwrap();
        }
        let mut catalog = open(&dir);
        let entry = catalog.entry_by_path(Path::new("/data/a.txt")).unwrap().unwrap();
        assert_eq!(catalog.tags_for_entry(entry.id, true).unwrap().len(), 1);

        // Counters persist too: new ids never collide with old ones.
        let second = catalog.add_entry(Path::new("/data/b.txt"), &state("f2", 3)).unwrap();
        assert_ne!(second.id, entry.id);
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_paths_are_tracked() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = TempDir::new().unwrap();
        let mut catalog = open(&dir);
        let odd = PathBuf::from(OsStr::from_bytes(b"/data/caf\xe9.txt"));
        let added = catalog.add_entry(&odd, &state("f1", 10)).unwrap();
        catalog.add_entry(Path::new("/data/good.txt"), &state("f2", 3)).unwrap();

        assert_eq!(catalog.entry_by_path(&odd).unwrap(), Some(added.clone()));
        let under: Vec<PathBuf> = catalog
            .entries_under(Path::new("/data"))
            .unwrap()
            .into_iter()
            .map(|e| e.path)
            .collect();
        assert_eq!(under, vec![odd.clone(), PathBuf::from("/data/good.txt")]);

        catalog
            .update_entry(added.id, Path::new("/data/cafe.txt"), &state("f1", 10))
            .unwrap();
        assert!(catalog.entry_by_path(&odd).unwrap().is_none());
    }
}
