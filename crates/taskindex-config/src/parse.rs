//! Configuration file parsing.
//!
//! Parses individual `.taskindex.toml` files into intermediate `RawConfig`
//! structures that keep every field optional until merging.

use std::{fs, path::Path};

use serde::Deserialize;

use crate::ConfigError;

/// Raw configuration as parsed directly from a TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// When true, stop discovery here - ignore parent and global configs.
    pub root: Option<bool>,
    /// `[index]` section.
    pub index: Option<RawIndexSettings>,
    /// `[maintenance]` section.
    pub maintenance: Option<RawMaintenanceSettings>,
}

/// Raw `[index]` settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawIndexSettings {
    /// Index directory, relative paths resolve against the config file.
    pub location: Option<String>,
    /// Field searched by unqualified pattern terms.
    pub default_field: Option<String>,
    /// Cap on hits gathered by a single match computation.
    pub max_match_hits: Option<usize>,
}

/// Raw `[maintenance]` settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawMaintenanceSettings {
    /// Delay before the first maintenance run.
    pub startup_delay_ms: Option<u64>,
    /// Delay applied when a change or explicit reindex schedules a run.
    pub reindex_delay_ms: Option<u64>,
    /// Upper bound on how long close waits for an active run.
    pub close_timeout_ms: Option<u64>,
}

/// Parses a configuration file from disk.
pub fn parse_config_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    parse_config_str(&contents, path)
}

/// Parses configuration from a TOML string.
///
/// The `path` parameter is used for error reporting.
pub fn parse_config_str(contents: &str, path: &Path) -> Result<RawConfig, ConfigError> {
    toml::from_str(contents).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })
}

/// Checks if a config file has `root = true` set.
///
/// Returns false if the file cannot be read or parsed.
pub fn is_root_config(path: &Path) -> bool {
    let Ok(contents) = fs::read_to_string(path) else {
        return false;
    };
    toml::from_str::<RawConfig>(&contents).is_ok_and(|config| config.root == Some(true))
}
