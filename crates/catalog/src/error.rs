use std::path::PathBuf;

use thiserror::Error;

use crate::schema::{EntryId, TagId};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog storage error: {0}")]
    Storage(#[from] redb::Error),
    #[error("corrupt catalog record: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("catalog i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no catalog entry with id {0}")]
    UnknownEntry(EntryId),
    #[error("no tag with id {0}")]
    UnknownTag(TagId),
    #[error("'{}' is already tracked", .0.display())]
    DuplicatePath(PathBuf),
    #[error("'{}' is not valid UTF-8 and cannot be stored", .0.display())]
    NonUtf8Path(PathBuf),
}

/// redb splits its failures into one type per operation; all of them fold
/// into [`redb::Error`].
macro_rules! storage_error_from {
    ($($source:ty),* $(,)?) => {
        $(
            impl From<$source> for CatalogError {
                fn from(err: $source) -> Self {
                    Self::Storage(err.into())
                }
            }
        )*
    };
}

storage_error_from!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);
