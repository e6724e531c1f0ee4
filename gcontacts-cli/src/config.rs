//! CLI configuration handling.

use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use gcontacts_core::ClientConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings read from `config.toml`. Command-line flags and environment
/// variables take precedence over everything here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// OAuth client ID.
    pub client_id: Option<String>,

    /// OAuth client secret.
    pub client_secret: Option<String>,

    /// Path to the JSON credential file.
    pub auth_file: Option<PathBuf>,

    /// Token endpoint override.
    pub token_url: Option<String>,

    /// Directory client settings.
    #[serde(default)]
    pub client: ClientConfig,

    /// Logging level.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Path to the configuration file that was loaded.
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            auth_file: None,
            token_url: None,
            client: ClientConfig::default(),
            log_level: default_log_level(),
            config_path: None,
        }
    }
}

/// Load configuration from `explicit` or the default location.
///
/// A missing file at the default location yields defaults; a missing file
/// that was asked for by name is an error.
pub fn load_config(explicit: Option<&Path>) -> Result<CliConfig> {
    let (path, required) = match explicit {
        Some(path) => (Some(path.to_path_buf()), true),
        None => (default_config_path(), false),
    };

    let Some(path) = path else {
        return Ok(CliConfig::default());
    };

    if !path.exists() {
        if required {
            bail!("Config file {:?} does not exist", path);
        }
        return Ok(CliConfig::default());
    }

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config from {:?}", path))?;
    let mut config = parse_config(&contents)
        .with_context(|| format!("Failed to parse config from {:?}", path))?;
    config.config_path = Some(path);

    Ok(config)
}

fn parse_config(contents: &str) -> Result<CliConfig> {
    Ok(toml::from_str(contents)?)
}

pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|d| d.config_dir().join("config.toml"))
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "gcontacts", "gcontacts")
}
