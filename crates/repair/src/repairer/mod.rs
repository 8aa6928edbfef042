use std::collections::HashSet;
use std::path::PathBuf;

use tagkeep_catalog::{CatalogStore, EntryId, Fingerprinter, TrackedEntry};
use tracing::{debug, info};

use crate::candidates::CandidateIndex;
use crate::error::{CatalogResultExt, RepairError};
use crate::paths::absolute_path;
use crate::report::{RepairEvent, Reporter};

mod classify;
mod directory;
mod moves;

/// Where one tracked entry ended up after a run.  Every state is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    Unchanged,
    Modified,
    Moved,
    Missing,
    SkippedPermission,
    SkippedError,
    TypeChanged,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairSummary {
    pub checked: usize,
    pub unchanged: usize,
    pub modified: usize,
    pub moved: usize,
    pub missing: usize,
    /// Entries created for untracked children of tracked directories.
    pub new_entries: usize,
    pub implicit_taggings: usize,
    /// Entries skipped because they could not be examined.
    pub skipped: usize,
    pub type_changed: usize,
}

impl RepairSummary {
    /// Number of catalog writes the run performed.
    pub fn mutations(&self) -> usize {
        self.modified + self.moved + self.new_entries + self.implicit_taggings
    }

    fn record(&mut self, outcome: EntryOutcome) {
        self.checked += 1;
        match outcome {
            EntryOutcome::Unchanged => self.unchanged += 1,
            EntryOutcome::Modified => self.modified += 1,
            EntryOutcome::Moved => self.moved += 1,
            EntryOutcome::Missing => self.missing += 1,
            EntryOutcome::SkippedPermission | EntryOutcome::SkippedError => self.skipped += 1,
            EntryOutcome::TypeChanged => self.type_changed += 1,
        }
    }
}

/// Drives one repair run over a catalog session.  Single-threaded: every
/// entry is examined, repaired and committed before the next one.
pub struct Repairer<'a> {
    catalog: &'a mut dyn CatalogStore,
    fingerprinter: &'a dyn Fingerprinter,
    reporter: &'a mut dyn Reporter,
    summary: RepairSummary,
}

impl<'a> Repairer<'a> {
    pub fn new(
        catalog: &'a mut dyn CatalogStore,
        fingerprinter: &'a dyn Fingerprinter,
        reporter: &'a mut dyn Reporter,
    ) -> Self {
        Self {
            catalog,
            fingerprinter,
            reporter,
            summary: RepairSummary::default(),
        }
    }

    /// Repair the tracked entries rooted at each of `paths`.
    ///
    /// Every entry under every root is classified and, if missing, searched
    /// for before any directory is reconciled.
    ///
    /// Moved files are only found beneath the given paths, so with no paths
    /// there is nothing to do: a warning is reported and the catalog is left
    /// alone.  A fatal error stops the run immediately; repairs already
    /// committed stay committed.
    pub fn run(mut self, paths: &[PathBuf]) -> Result<RepairSummary, RepairError> {
        if paths.is_empty() {
            self.emit(RepairEvent::NoRoots);
            return Ok(self.summary);
        }

        let roots = paths
            .iter()
            .map(|path| {
                absolute_path(path).map_err(|source| RepairError::InvalidPath {
                    path: path.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let index = CandidateIndex::build(&roots, &mut *self.reporter)?;

        // Overlapping roots would otherwise revisit entries from a stale
        // snapshot.
        let mut visited: HashSet<EntryId> = HashSet::new();
        let mut directories: Vec<TrackedEntry> = Vec::new();
        for root in &roots {
            let entries = self.catalog.entries_under(root).at(root)?;
            info!(root = %root.display(), entries = entries.len(), "repairing entries under root");

            for entry in entries {
                if !visited.insert(entry.id) {
                    continue;
                }
                let outcome = self.check_entry(&entry, &index)?;
                debug!(path = %entry.path.display(), ?outcome, "entry checked");
                if entry.is_directory_record()
                    && matches!(outcome, EntryOutcome::Unchanged | EntryOutcome::Modified)
                {
                    directories.push(entry);
                }
                self.summary.record(outcome);
            }
        }

        // Children are registered only once every move has been resolved, so
        // a file moved into a tracked directory keeps its identity.
        for dir in &directories {
            self.reconcile_directory(dir)?;
        }

        info!(
            checked = self.summary.checked,
            mutations = self.summary.mutations(),
            missing = self.summary.missing,
            "repair finished"
        );
        Ok(self.summary)
    }

    fn emit(&mut self, event: RepairEvent) {
        self.reporter.report(event);
    }
}
