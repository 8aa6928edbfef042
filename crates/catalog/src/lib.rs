pub mod catalog;
mod encoding;
pub mod error;
pub mod fingerprint;
pub mod schema;
pub mod store;

pub use catalog::Catalog;
pub use error::CatalogError;
pub use fingerprint::{Fingerprinter, Sha256Fingerprinter};
pub use schema::{EntryId, FileState, Tag, TagAssociation, TagId, TrackedEntry};
pub use store::CatalogStore;
