//! Configuration system for the task list index.
//!
//! Settings live in TOML files named `.taskindex.toml`. Configuration is resolved
//! by walking up the directory tree from the current working directory, collecting
//! any `.taskindex.toml` files found, then loading `~/.taskindex.toml` as the
//! global config with lowest precedence.
//!
//! ```toml
//! [index]
//! location = ".taskindex"
//! default_field = "summary"
//! max_match_hits = 1500
//!
//! [maintenance]
//! startup_delay_ms = 6000
//! reindex_delay_ms = 3000
//! ```

#![warn(missing_docs)]

mod discovery;
mod error;
mod merge;
mod parse;
#[cfg(test)]
mod test_support;
mod validate;

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

pub use discovery::{
    CONFIG_FILENAME, default_index_location, discover_config_files, global_config_path,
    is_global_config,
};
pub use error::ConfigError;
pub use merge::{ParsedConfig, merge_configs};
pub use parse::{
    RawConfig, RawIndexSettings, RawMaintenanceSettings, parse_config_file, parse_config_str,
};
use serde::{Deserialize, Serialize};
pub use validate::{ConfigWarning, MAX_STARTUP_DELAY_MS};
use validate::validate_config;

/// Top-level merged configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Index storage and matching settings.
    pub index: IndexSettings,
    /// Background maintenance timing.
    pub maintenance: MaintenanceSettings,
    /// Directory containing the most specific config file.
    pub config_root: Option<PathBuf>,
}

impl Config {
    /// Loads configuration by discovering and merging all relevant config files.
    ///
    /// Returns `Ok(Config::default())` if no configuration files are found.
    pub fn load(cwd: &Path) -> Result<Self, ConfigError> {
        Self::load_from_files(&discover_config_files(cwd))
    }

    /// Loads configuration from a specific list of config file paths.
    ///
    /// Files should be provided in precedence order: highest precedence first.
    pub fn load_from_files(files: &[PathBuf]) -> Result<Self, ConfigError> {
        let parsed = files
            .iter()
            .map(|path| {
                Ok(ParsedConfig {
                    path: path.clone(),
                    config: parse_config_file(path)?,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(merge_configs(&parsed))
    }

    /// Validates the configuration and returns any warnings.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        validate_config(self)
    }

    /// Returns the configured index directory, or the platform default.
    pub fn index_location(&self) -> Option<PathBuf> {
        self.index.location.clone().or_else(default_index_location)
    }

    /// Serializes the effective settings to TOML format.
    pub fn settings_to_toml(&self) -> Result<String, ConfigError> {
        let serializable = SerializableSettings {
            index: &self.index,
            maintenance: &self.maintenance,
        };
        Ok(toml::to_string_pretty(&serializable)?)
    }
}

/// Index storage and matching settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct IndexSettings {
    /// Index directory. `None` selects the platform default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<PathBuf>,
    /// Field searched by unqualified pattern terms.
    pub default_field: String,
    /// Cap on hits gathered by a single match computation.
    pub max_match_hits: usize,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            location: None,
            default_field: String::from("summary"),
            max_match_hits: 1500,
        }
    }
}

/// Background maintenance timing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MaintenanceSettings {
    /// Delay before the first maintenance run.
    pub startup_delay_ms: u64,
    /// Delay applied when a change or explicit reindex schedules a run.
    pub reindex_delay_ms: u64,
    /// Upper bound on how long close waits for an active run.
    pub close_timeout_ms: u64,
}

impl MaintenanceSettings {
    /// Startup delay as a `Duration`.
    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }

    /// Reindex delay as a `Duration`.
    pub fn reindex_delay(&self) -> Duration {
        Duration::from_millis(self.reindex_delay_ms)
    }

    /// Close timeout as a `Duration`.
    pub fn close_timeout(&self) -> Duration {
        Duration::from_millis(self.close_timeout_ms)
    }
}

impl Default for MaintenanceSettings {
    fn default() -> Self {
        Self {
            startup_delay_ms: 6000,
            reindex_delay_ms: 3000,
            close_timeout_ms: 30_000,
        }
    }
}

/// Borrowed view of the settings sections for TOML output.
#[derive(Serialize)]
struct SerializableSettings<'a> {
    /// `[index]` section.
    index: &'a IndexSettings,
    /// `[maintenance]` section.
    maintenance: &'a MaintenanceSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = Config::default();
        assert_eq!(config.index.default_field, "summary");
        assert_eq!(config.index.max_match_hits, 1500);
        assert_eq!(config.maintenance.startup_delay(), Duration::from_secs(6));
        assert_eq!(config.maintenance.reindex_delay(), Duration::from_secs(3));
    }

    #[test]
    fn settings_render_as_toml() {
        let rendered = Config::default().settings_to_toml().unwrap();
        assert!(rendered.contains("[index]"));
        assert!(rendered.contains("default_field = \"summary\""));
        assert!(rendered.contains("[maintenance]"));
        assert!(rendered.contains("startup_delay_ms = 6000"));
        assert!(!rendered.contains("location"));
    }

    #[test]
    fn explicit_location_wins_over_default() {
        let mut config = Config::default();
        config.index.location = Some(PathBuf::from("/tmp/idx"));
        assert_eq!(config.index_location(), Some(PathBuf::from("/tmp/idx")));
    }
}
