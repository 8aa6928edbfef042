mod catalog_cmds;
mod console;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use tagkeep_catalog::Catalog;
use tagkeep_config::AppConfig;

use crate::console::ConsoleReporter;

#[derive(Debug, Parser)]
#[command(
    name = "tagkeep",
    version,
    about = "Tag files and directories, and keep the tags attached as the files change"
)]
struct Cli {
    /// Catalog database to use (overrides config and TAGKEEP_DB).
    #[arg(long, global = true, value_name = "PATH")]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Bring the catalog back in line with the filesystem beneath PATHs.
    Repair {
        /// Roots to repair; moved files are only found beneath these.
        #[arg(value_name = "PATH")]
        paths: Vec<PathBuf>,
        /// Also report entries that needed no repair.
        #[arg(short, long)]
        verbose: bool,
    },
    /// Apply tags to a file or directory, tracking it if needed.
    /// Example: tagkeep tag song.mp3 music year=2011
    Tag {
        path: PathBuf,
        #[arg(required = true, value_name = "TAG[=VALUE]")]
        tags: Vec<String>,
    },
    /// List the tags on a tracked file or directory.
    Tags { path: PathBuf },
    /// List every tracked file and directory.
    Files,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    let config = AppConfig::load()
        .with_context(|| format!("failed to load {}", AppConfig::config_path().display()))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.telemetry.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let database = cli.database.unwrap_or_else(|| config.database_path());
    let mut catalog = Catalog::open(&database)
        .with_context(|| format!("failed to open catalog {}", database.display()))?;
    debug!(database = %database.display(), command = ?cli.command, "catalog session started");

    match cli.command {
        Commands::Repair { paths, verbose } => {
            let verbose = verbose || config.repair.verbose;
            let mut reporter = ConsoleReporter::stdio(verbose);
            let summary = catalog_cmds::run_repair(&mut catalog, &paths, &mut reporter)?;
            if verbose {
                for line in catalog_cmds::summary_lines(&summary) {
                    println!("{line}");
                }
            }
        }
        Commands::Tag { path, tags } => {
            catalog_cmds::run_tag(&mut catalog, &path, &tags)?;
        }
        Commands::Tags { path } => {
            for line in catalog_cmds::run_tags(&catalog, &path)? {
                println!("{line}");
            }
        }
        Commands::Files => {
            for line in catalog_cmds::run_files(&catalog)? {
                println!("{line}");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use clap::error::ErrorKind;

    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn help_and_version_need_no_config() {
        let help = Cli::try_parse_from(["tagkeep", "--help"]).unwrap_err();
        assert_eq!(help.kind(), ErrorKind::DisplayHelp);
        let version = Cli::try_parse_from(["tagkeep", "--version"]).unwrap_err();
        assert_eq!(version.kind(), ErrorKind::DisplayVersion);
    }

    #[test]
    fn repair_accepts_paths_verbose_and_database() {
        let cli = Cli::try_parse_from(["tagkeep", "repair", "-v", "a", "b", "--database", "x.redb"]).unwrap();
        assert_eq!(cli.database, Some(PathBuf::from("x.redb")));
        match cli.command {
            Commands::Repair { paths, verbose } => {
                assert!(verbose);
                assert_eq!(paths, vec![PathBuf::from("a"), PathBuf::from("b")]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn tag_requires_at_least_one_tag() {
        assert!(Cli::try_parse_from(["tagkeep", "tag", "song.mp3"]).is_err());
    }
}
