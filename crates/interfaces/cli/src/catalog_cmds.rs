use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use tagkeep_catalog::{Catalog, CatalogStore, Sha256Fingerprinter, TrackedEntry};
use tagkeep_repair::paths::absolute_path;
use tagkeep_repair::{RepairSummary, Repairer, Reporter, apply_tags};

pub(crate) fn run_repair(
    catalog: &mut Catalog,
    paths: &[PathBuf],
    reporter: &mut dyn Reporter,
) -> Result<RepairSummary> {
    let summary = Repairer::new(catalog, &Sha256Fingerprinter, reporter)
        .run(paths)
        .context("repair aborted")?;
    Ok(summary)
}

pub(crate) fn summary_lines(summary: &RepairSummary) -> Vec<String> {
    vec![
        "── repair summary ───────────────────────────────────".to_string(),
        format!("  checked           : {}", summary.checked),
        format!("  unchanged         : {}", summary.unchanged),
        format!("  modified          : {}", summary.modified),
        format!("  moved             : {}", summary.moved),
        format!("  missing           : {}", summary.missing),
        format!("  new               : {}", summary.new_entries),
        format!("  implicit taggings : {}", summary.implicit_taggings),
        format!("  skipped           : {}", summary.skipped),
        format!("  type changes      : {}", summary.type_changed),
    ]
}

/// Split `name=value`; a bare `name` has no value.
pub(crate) fn parse_tag(raw: &str) -> Result<(String, Option<String>)> {
    let (name, value) = match raw.split_once('=') {
        Some((name, value)) => (name, Some(value.to_string())),
        None => (raw, None),
    };
    if name.is_empty() {
        bail!("invalid tag '{raw}': tag name is empty");
    }
    Ok((name.to_string(), value))
}

pub(crate) fn run_tag(catalog: &mut Catalog, path: &Path, raw_tags: &[String]) -> Result<TrackedEntry> {
    let tags = raw_tags
        .iter()
        .map(|raw| parse_tag(raw))
        .collect::<Result<Vec<_>>>()?;
    let path = absolute_path(path).with_context(|| format!("invalid path {}", path.display()))?;
    let entry = apply_tags(catalog, &Sha256Fingerprinter, &path, &tags)
        .with_context(|| format!("failed to tag {}", path.display()))?;
    Ok(entry)
}

pub(crate) fn run_tags(catalog: &Catalog, path: &Path) -> Result<Vec<String>> {
    let path = absolute_path(path).with_context(|| format!("invalid path {}", path.display()))?;
    let Some(entry) = catalog.entry_by_path(&path)? else {
        bail!("'{}': not tracked", path.display());
    };

    let mut lines = Vec::new();
    for association in catalog.taggings_for_entry(entry.id)? {
        let tag = catalog.tag(association.tag_id)?;
        let mut line = match &association.value {
            Some(value) => format!("{}={value}", tag.name),
            None => tag.name,
        };
        if association.implicit {
            line.push_str(" (implicit)");
        }
        lines.push(line);
    }
    Ok(lines)
}

pub(crate) fn run_files(catalog: &Catalog) -> Result<Vec<String>> {
    let lines = catalog
        .all_entries()?
        .into_iter()
        .map(|entry| {
            let fingerprint = if entry.is_directory_record() {
                "-"
            } else {
                &entry.fingerprint[..entry.fingerprint.len().min(12)]
            };
            format!(
                "{:<12} {:>10}  {}",
                fingerprint,
                entry.size,
                entry.path.display()
            )
        })
        .collect();
    Ok(lines)
}
