use std::fmt;
use std::path::PathBuf;

/// How a [`RepairEvent`] should be surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Progress detail, shown only when verbose output is requested.
    Verbose,
    /// A change applied to the catalog.
    Change,
    /// Drift that could not be repaired; goes to the diagnostic stream.
    Warning,
}

/// Everything a repair run has to say, one event per line of output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairEvent {
    IndexBuilding,
    IndexBuilt { candidates: usize },
    Checking { path: PathBuf },
    Unchanged { path: PathBuf },
    Updating { path: PathBuf },
    Modified { path: PathBuf },
    New { path: PathBuf },
    ImplicitTagging { path: PathBuf, tag: String },
    Searching { path: PathBuf },
    NoFingerprint { path: PathBuf },
    FingerprintMatch { path: PathBuf, candidate: PathBuf },
    Moved { path: PathBuf, to: PathBuf },
    Missing { path: PathBuf },
    PermissionDenied { path: PathBuf },
    StatFailed { path: PathBuf, message: String },
    TypeChanged { path: PathBuf, now_directory: bool },
    NoRoots,
}

impl RepairEvent {
    pub fn severity(&self) -> Severity {
        match self {
            Self::Modified { .. }
            | Self::New { .. }
            | Self::ImplicitTagging { .. }
            | Self::Moved { .. } => Severity::Change,
            Self::Missing { .. }
            | Self::PermissionDenied { .. }
            | Self::StatFailed { .. }
            | Self::TypeChanged { .. }
            | Self::NoRoots => Severity::Warning,
            Self::IndexBuilding
            | Self::IndexBuilt { .. }
            | Self::Checking { .. }
            | Self::Unchanged { .. }
            | Self::Updating { .. }
            | Self::Searching { .. }
            | Self::NoFingerprint { .. }
            | Self::FingerprintMatch { .. } => Severity::Verbose,
        }
    }
}

impl fmt::Display for RepairEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IndexBuilding => write!(f, "Building map of files by size."),
            Self::IndexBuilt { candidates } => {
                write!(f, "Finished building map of files by size ({candidates} candidates).")
            }
            Self::Checking { path } => write!(f, "'{}': checking.", path.display()),
            Self::Unchanged { path } => write!(f, "'{}': unchanged.", path.display()),
            Self::Updating { path } => write!(f, "'{}': updating entry in catalog.", path.display()),
            Self::Modified { path } => write!(f, "'{}': modified.", path.display()),
            Self::New { path } => write!(f, "'{}': new.", path.display()),
            Self::ImplicitTagging { path, tag } => write!(
                f,
                "'{}': creating missing implicit tagging '{tag}'.",
                path.display()
            ),
            Self::Searching { path } => {
                write!(f, "'{}': searching for new location.", path.display())
            }
            Self::NoFingerprint { path } => write!(
                f,
                "'{}': not searching for new location (no fingerprint).",
                path.display()
            ),
            Self::FingerprintMatch { path, candidate } => write!(
                f,
                "'{}': file with same fingerprint found at '{}'.",
                path.display(),
                candidate.display()
            ),
            Self::Moved { path, to } => {
                write!(f, "'{}': moved to '{}'.", path.display(), to.display())
            }
            Self::Missing { path } => write!(f, "'{}': missing.", path.display()),
            Self::PermissionDenied { path } => {
                write!(f, "'{}': permission denied.", path.display())
            }
            Self::StatFailed { path, message } => write!(f, "'{}': {message}", path.display()),
            Self::TypeChanged {
                path,
                now_directory: true,
            } => write!(f, "'{}': file replaced by a directory.", path.display()),
            Self::TypeChanged {
                path,
                now_directory: false,
            } => write!(f, "'{}': directory replaced by a file.", path.display()),
            Self::NoRoots => write!(
                f,
                "no paths given: nothing repaired (moved files can only be located beneath given paths)."
            ),
        }
    }
}

/// Receives events as a repair run produces them.
pub trait Reporter {
    fn report(&mut self, event: RepairEvent);
}

/// Keeps every event in order.  Handy for embedding the engine and for
/// asserting on output.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub events: Vec<RepairEvent>,
}

impl RecordingReporter {
    pub fn lines(&self, severity: Severity) -> Vec<String> {
        self.events
            .iter()
            .filter(|event| event.severity() == severity)
            .map(ToString::to_string)
            .collect()
    }
}

impl Reporter for RecordingReporter {
    fn report(&mut self, event: RepairEvent) {
        self.events.push(event);
    }
}
