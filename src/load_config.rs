//! `load_config`: reads the optional `.blogsync.yaml` file.
//!
//! Every key is optional; a missing file means all defaults. The API key is
//! never read from this file, it comes from `--apikey` or `DEVTO_APIKEY`.
//!
//! ```yaml
//! api_base_url: https://dev.to
//! per_page: 1000
//! rate_limit_backoff_ms: 1000
//! fields:
//!   id: devtoId
//!   published: devtoPublished
//!   skip: devtoSkip
//!   url: devtoUrl
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use blogsync_core::reconcile::FieldNames;
use serde::Deserialize;
use tracing::{debug, error, info};

pub const DEFAULT_CONFIG_FILE: &str = ".blogsync.yaml";

#[derive(Debug, Clone, Deserialize)]
pub struct CliConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    #[serde(default = "default_backoff_ms")]
    pub rate_limit_backoff_ms: u64,
    #[serde(default)]
    pub fields: FieldNames,
}

fn default_api_base_url() -> String {
    "https://dev.to".to_string()
}

fn default_per_page() -> u32 {
    1000
}

fn default_backoff_ms() -> u64 {
    1000
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            per_page: default_per_page(),
            rate_limit_backoff_ms: default_backoff_ms(),
            fields: FieldNames::default(),
        }
    }
}

impl CliConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.rate_limit_backoff_ms)
    }
}

/// Loads a YAML config file. Keys left out take their default.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    // An empty file is a valid, all-defaults config.
    if config_content.trim().is_empty() {
        return Ok(CliConfig::default());
    }

    match serde_yaml::from_str::<CliConfig>(&config_content) {
        Ok(config) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            Ok(config)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML {:?}: {e}", path_ref))
        }
    }
}

/// The config given with `--config`, else `<root>/.blogsync.yaml` when it
/// exists, else the defaults.
pub fn resolve_config(explicit: Option<&Path>, root: &Path) -> Result<CliConfig> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    let implicit: PathBuf = root.join(DEFAULT_CONFIG_FILE);
    if implicit.is_file() {
        return load_config(implicit);
    }
    debug!(root = %root.display(), "No config file, using defaults");
    Ok(CliConfig::default())
}
