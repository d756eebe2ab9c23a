//! Configuration validation.
//!
//! Reports non-fatal issues with a loaded configuration.

use std::fmt;

use crate::Config;

/// Largest startup delay accepted, in milliseconds.
pub const MAX_STARTUP_DELAY_MS: u64 = 60_000;

/// A non-fatal warning about the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// The startup delay is outside `0..=MAX_STARTUP_DELAY_MS`.
    StartupDelayOutOfRange {
        /// Configured delay.
        delay_ms: u64,
    },
    /// A hit cap of zero means no pattern ever matches.
    ZeroMatchHits,
    /// The default field is blank.
    EmptyDefaultField,
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartupDelayOutOfRange { delay_ms } => write!(
                f,
                "startup_delay_ms = {delay_ms} exceeds the maximum of {MAX_STARTUP_DELAY_MS}"
            ),
            Self::ZeroMatchHits => write!(f, "max_match_hits = 0 disables matching entirely"),
            Self::EmptyDefaultField => write!(f, "default_field is empty"),
        }
    }
}

/// Validates the configuration and returns any warnings.
pub fn validate_config(config: &Config) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();

    if config.maintenance.startup_delay_ms > MAX_STARTUP_DELAY_MS {
        warnings.push(ConfigWarning::StartupDelayOutOfRange {
            delay_ms: config.maintenance.startup_delay_ms,
        });
    }
    if config.index.max_match_hits == 0 {
        warnings.push(ConfigWarning::ZeroMatchHits);
    }
    if config.index.default_field.trim().is_empty() {
        warnings.push(ConfigWarning::EmptyDefaultField);
    }

    warnings
}
