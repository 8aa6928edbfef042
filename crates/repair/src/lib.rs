//! Reconciles the catalog with the filesystem: picks up modified files,
//! follows moved files by content fingerprint and restores implicit
//! taggings beneath tagged directories.

pub mod candidates;
pub mod error;
pub mod paths;
pub mod register;
pub mod report;
pub mod repairer;

#[cfg(test)]
mod test_support;

pub use candidates::CandidateIndex;
pub use error::RepairError;
pub use register::{apply_tags, register_path};
pub use report::{RecordingReporter, RepairEvent, Reporter, Severity};
pub use repairer::{EntryOutcome, RepairSummary, Repairer};
