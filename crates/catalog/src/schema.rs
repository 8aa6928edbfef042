use std::fmt;
use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Opaque catalog identity of a tracked entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TagId(pub u64);

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The mutable part of a tracked entry: what was observed on disk the last
/// time the entry was added or repaired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileState {
    /// Content fingerprint.  Empty for directories, which are never
    /// fingerprinted.
    pub fingerprint: String,
    /// Modification time, second precision.
    pub mod_time: DateTime<Utc>,
    pub size: u64,
}

impl FileState {
    pub fn new(fingerprint: impl Into<String>, mod_time: DateTime<Utc>, size: u64) -> Self {
        Self {
            fingerprint: fingerprint.into(),
            mod_time: truncate_to_second(mod_time),
            size,
        }
    }

    /// Build a state from a `stat` result and a freshly computed fingerprint.
    pub fn observed(fingerprint: impl Into<String>, metadata: &Metadata) -> io::Result<Self> {
        Ok(Self::new(fingerprint, modified_utc(metadata)?, metadata.len()))
    }
}

/// A file or directory recorded in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedEntry {
    pub id: EntryId,
    #[serde(with = "crate::encoding::serde_path")]
    pub path: PathBuf,
    pub fingerprint: String,
    pub mod_time: DateTime<Utc>,
    pub size: u64,
}

impl TrackedEntry {
    pub fn new(id: EntryId, path: impl Into<PathBuf>, state: FileState) -> Self {
        Self {
            id,
            path: path.into(),
            fingerprint: state.fingerprint,
            mod_time: state.mod_time,
            size: state.size,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory records are the only ones stored without a fingerprint.
    pub fn is_directory_record(&self) -> bool {
        self.fingerprint.is_empty()
    }

    /// Whether a fresh `stat` still agrees with the stored metadata.  Only
    /// the modification second and the size take part.
    pub fn matches(&self, mod_time: DateTime<Utc>, size: u64) -> bool {
        self.mod_time.timestamp() == mod_time.timestamp() && self.size == size
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

/// One (entry, tag) association.  Implicit associations are inferred from
/// directory containment and never carry a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagAssociation {
    pub entry_id: EntryId,
    pub tag_id: TagId,
    #[serde(default)]
    pub value: Option<String>,
    pub implicit: bool,
}

/// Modification time of `metadata` in UTC, truncated to whole seconds.
pub fn modified_utc(metadata: &Metadata) -> io::Result<DateTime<Utc>> {
    let modified: DateTime<Utc> = metadata.modified()?.into();
    Ok(truncate_to_second(modified))
}

fn truncate_to_second(time: DateTime<Utc>) -> DateTime<Utc> {
    time.with_nanosecond(0).unwrap_or(time)
}
