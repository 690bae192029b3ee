//! Settings for the tracker.
//!
//! Values come from an optional TOML file (`bve.toml` by default) and are
//! overridden by `BVE__`-prefixed environment variables, e.g.
//! `BVE__STORAGE__DATABASE=/tmp/budget.db`.
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::LedgerResult;

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// SQLite file holding the persisted slot.
    #[serde(default = "default_database")]
    pub database: PathBuf,
    /// Key of the slot inside the store.
    #[serde(default = "default_slot_key")]
    pub slot_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_export_directory")]
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UsersConfig {
    /// Password given to the user created alongside a new team.
    #[serde(default = "default_team_password")]
    pub default_password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub users: UsersConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Settings {
    pub fn load(file: Option<&Path>) -> LedgerResult<Self> {
        let file_source = match file {
            Some(path) => ::config::File::from(path.to_path_buf()).required(true),
            None => ::config::File::with_name("bve").required(false),
        };

        let settings = ::config::Config::builder()
            .add_source(file_source)
            .add_source(
                ::config::Environment::with_prefix("BVE")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            slot_key: default_slot_key(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            directory: default_export_directory(),
        }
    }
}

impl Default for UsersConfig {
    fn default() -> Self {
        Self {
            default_password: default_team_password(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_database() -> PathBuf {
    PathBuf::from("budget_ledger.db")
}

fn default_slot_key() -> String {
    "nloc_bve_data".to_string()
}

fn default_export_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_team_password() -> String {
    "team123".to_string()
}

fn default_level() -> String {
    "info".to_string()
}
