//! Configuration merging.
//!
//! Merges multiple `RawConfig` files into a single resolved `Config`.

use std::path::{Path, PathBuf};

use crate::{
    Config, IndexSettings, MaintenanceSettings,
    parse::{RawConfig, RawIndexSettings, RawMaintenanceSettings},
};

/// A parsed config file with its source path.
pub struct ParsedConfig {
    /// Path to the config file.
    pub path: PathBuf,
    /// Parsed raw configuration.
    pub config: RawConfig,
}

/// Merges multiple configuration files into a single resolved `Config`.
///
/// Configs are given highest precedence first. Each scalar takes the value from
/// the highest-precedence file that defines it.
pub fn merge_configs(configs: &[ParsedConfig]) -> Config {
    let mut config = Config {
        config_root: configs
            .first()
            .and_then(|c| c.path.parent())
            .map(Path::to_path_buf),
        ..Config::default()
    };

    // Lowest precedence first so later files overwrite.
    for parsed in configs.iter().rev() {
        let base = parsed.path.parent().unwrap_or_else(|| Path::new("."));
        if let Some(ref index) = parsed.config.index {
            apply_index(&mut config.index, index, base);
        }
        if let Some(ref maintenance) = parsed.config.maintenance {
            apply_maintenance(&mut config.maintenance, maintenance);
        }
    }

    config
}

/// Applies raw `[index]` settings, resolving a relative location against `base`.
fn apply_index(result: &mut IndexSettings, raw: &RawIndexSettings, base: &Path) {
    if let Some(ref location) = raw.location {
        result.location = Some(base.join(location));
    }
    if let Some(ref field) = raw.default_field {
        result.default_field = field.clone();
    }
    if let Some(v) = raw.max_match_hits {
        result.max_match_hits = v;
    }
}

/// Applies raw `[maintenance]` settings.
fn apply_maintenance(result: &mut MaintenanceSettings, raw: &RawMaintenanceSettings) {
    if let Some(v) = raw.startup_delay_ms {
        result.startup_delay_ms = v;
    }
    if let Some(v) = raw.reindex_delay_ms {
        result.reindex_delay_ms = v;
    }
    if let Some(v) = raw.close_timeout_ms {
        result.close_timeout_ms = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_config_str;

    fn parsed(path: &str, toml: &str) -> ParsedConfig {
        ParsedConfig {
            path: PathBuf::from(path),
            config: parse_config_str(toml, Path::new(path)).unwrap(),
        }
    }

    #[test]
    fn closest_file_wins_per_key() {
        let configs = [
            parsed("/work/project/.taskindex.toml", "[index]\ndefault_field = \"content\"\n"),
            parsed(
                "/home/user/.taskindex.toml",
                "[index]\ndefault_field = \"summary\"\nmax_match_hits = 10\n",
            ),
        ];
        let config = merge_configs(&configs);
        assert_eq!(config.index.default_field, "content");
        assert_eq!(config.index.max_match_hits, 10);
        assert_eq!(config.config_root, Some(PathBuf::from("/work/project")));
    }

    #[test]
    fn relative_location_resolves_against_its_file() {
        let configs = [parsed("/work/.taskindex.toml", "[index]\nlocation = \"idx\"\n")];
        let config = merge_configs(&configs);
        assert_eq!(config.index.location, Some(PathBuf::from("/work/idx")));
    }

    #[test]
    fn untouched_settings_keep_defaults() {
        let config = merge_configs(&[parsed("/a/.taskindex.toml", "")]);
        assert_eq!(config.maintenance, MaintenanceSettings::default());
    }
}
