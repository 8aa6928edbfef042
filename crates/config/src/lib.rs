use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Default location of the config file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = ".tagkeep/config.toml";

/// Env var that points at an alternative config file.
pub const CONFIG_PATH_ENV: &str = "TAGKEEP_CONFIG";

/// Env var that overrides `[catalog] path`.
pub const DATABASE_PATH_ENV: &str = "TAGKEEP_DB";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Path of the redb catalog file.  Relative paths resolve against the
    /// working directory.
    pub path: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: ".tagkeep/catalog.redb".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RepairConfig {
    /// Always print per-entry progress lines, as if `--verbose` were passed.
    pub verbose: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Fallback `tracing` filter used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub repair: RepairConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load the config from `path`, falling back to defaults when the file
    /// does not exist.  `TAGKEEP_DB` takes precedence over the file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::default();
        if let Ok(raw) = fs::read_to_string(path) {
            config = toml::from_str(&raw)?;
        }

        if let Ok(value) = env::var(DATABASE_PATH_ENV) {
            if !value.is_empty() {
                config.catalog.path = value;
            }
        }

        Ok(config)
    }

    /// Load from `TAGKEEP_CONFIG` when set, otherwise from
    /// [`DEFAULT_CONFIG_PATH`].
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path())
    }

    pub fn config_path() -> PathBuf {
        match env::var(CONFIG_PATH_ENV) {
            Ok(value) if !value.is_empty() => PathBuf::from(value),
            _ => PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        let rendered = toml::to_string_pretty(self)?;
        fs::write(path, rendered)?;
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.catalog.path)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
