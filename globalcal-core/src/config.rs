//! Global globalcal configuration.

use std::path::{Path, PathBuf};

use config::{Config, File};
use serde::{Deserialize, Serialize};

use crate::error::{GlobalCalError, GlobalCalResult};
use crate::source::DEFAULT_BATCH_SIZE;

static DEFAULT_DATA_DIR: &str = "~/.globalcal";
static DEFAULT_OWNER_MODEL: &str = "res.users";

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

fn default_owner_model() -> String {
    DEFAULT_OWNER_MODEL.to_string()
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

/// Global configuration at ~/.config/globalcal/config.toml
///
/// Sources themselves live in `<data_dir>/sources.toml`, records and
/// projected events in `<data_dir>/store.json`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GlobalConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Model every owner field must point to
    #[serde(default = "default_owner_model")]
    pub owner_model: String,

    /// Batch size given to sources created by bootstrap
    #[serde(default = "default_batch_size")]
    pub default_batch_size: usize,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        GlobalConfig {
            data_dir: default_data_dir(),
            owner_model: default_owner_model(),
            default_batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl GlobalConfig {
    pub fn config_path() -> GlobalCalResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| {
                GlobalCalError::Configuration("Could not determine config directory".into())
            })?
            .join("globalcal");

        Ok(config_dir.join("config.toml"))
    }

    /// Load ~/.config/globalcal/config.toml, creating a commented-out one
    /// on first run.
    pub fn load() -> GlobalCalResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    /// Load from an explicit path. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> GlobalCalResult<Self> {
        let config: GlobalConfig = Config::builder()
            .add_source(File::from(path).required(false))
            .build()
            .map_err(|e| GlobalCalError::Configuration(e.to_string()))?
            .try_deserialize()
            .map_err(|e| GlobalCalError::Configuration(e.to_string()))?;

        if config.owner_model.trim().is_empty() {
            return Err(GlobalCalError::Configuration(
                "owner_model must not be empty".into(),
            ));
        }

        Ok(config)
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> GlobalCalResult<()> {
        let contents = format!(
            "\
# globalcal configuration

# Where sources and the record store live:
# data_dir = \"{}\"

# Model that owner fields must point to:
# owner_model = \"{}\"

# Page size of sources created by `globalcal bootstrap`:
# default_batch_size = {}
",
            DEFAULT_DATA_DIR, DEFAULT_OWNER_MODEL, DEFAULT_BATCH_SIZE
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                GlobalCalError::Configuration(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents).map_err(|e| {
            GlobalCalError::Configuration(format!("Could not write config file: {e}"))
        })?;

        Ok(())
    }

    /// `data_dir` with `~` expanded.
    pub fn data_path(&self) -> PathBuf {
        let full_path_str = shellexpand::tilde(&self.data_dir.to_string_lossy()).into_owned();

        PathBuf::from(full_path_str)
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_path().join("store.json")
    }

    pub fn sources_path(&self) -> PathBuf {
        self.data_path().join("sources.toml")
    }
}
