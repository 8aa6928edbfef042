use std::path::Path;

use crate::error::CatalogError;
use crate::schema::{EntryId, FileState, Tag, TagAssociation, TagId, TrackedEntry};

/// Operations the repair engine and the command surface need from a
/// catalog.  Every mutating call is durable once it returns `Ok`.
pub trait CatalogStore {
    /// The entry at `dir` itself (when tracked) followed by every entry
    /// strictly beneath it, in lexicographic path order.
    fn entries_under(&self, dir: &Path) -> Result<Vec<TrackedEntry>, CatalogError>;

    fn all_entries(&self) -> Result<Vec<TrackedEntry>, CatalogError>;

    fn entry_by_path(&self, path: &Path) -> Result<Option<TrackedEntry>, CatalogError>;

    /// Overwrite the stored path and observed state of an existing entry.
    fn update_entry(&mut self, id: EntryId, path: &Path, state: &FileState) -> Result<(), CatalogError>;

    /// Track a previously untracked path.
    fn add_entry(&mut self, path: &Path, state: &FileState) -> Result<TrackedEntry, CatalogError>;

    /// Tags associated with an entry, each listed once.  With
    /// `explicit_only` the implicit associations are ignored.
    fn tags_for_entry(&self, id: EntryId, explicit_only: bool) -> Result<Vec<Tag>, CatalogError>;

    /// Every association of an entry, explicit before implicit per tag.
    fn taggings_for_entry(&self, id: EntryId) -> Result<Vec<TagAssociation>, CatalogError>;

    /// The association between `entry` and `tag`.  When the pair is tagged
    /// both explicitly and implicitly the implicit association is returned.
    fn find_tagging(&self, entry: EntryId, tag: TagId) -> Result<Option<TagAssociation>, CatalogError>;

    fn add_implicit_tagging(&mut self, entry: EntryId, tag: TagId) -> Result<TagAssociation, CatalogError>;

    fn add_explicit_tagging(
        &mut self,
        entry: EntryId,
        tag: TagId,
        value: Option<&str>,
    ) -> Result<TagAssociation, CatalogError>;

    fn tag(&self, id: TagId) -> Result<Tag, CatalogError>;

    fn tag_by_name(&self, name: &str) -> Result<Option<Tag>, CatalogError>;

    fn add_tag(&mut self, name: &str) -> Result<Tag, CatalogError>;
}
