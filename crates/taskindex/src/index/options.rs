//! Settings for opening a task list index.

use std::time::Duration;

use taskindex_config::{Config, MAX_STARTUP_DELAY_MS};

use crate::{error::IndexError, field::TaskField};

/// Default cap on hits gathered for one `matches` pattern.
pub const DEFAULT_MAX_MATCH_HITS: usize = 1500;

/// Default delay before the first maintenance run.
pub const DEFAULT_STARTUP_DELAY: Duration = Duration::from_millis(6000);

/// Default delay between a change and the run that indexes it.
pub const DEFAULT_REINDEX_DELAY: Duration = Duration::from_millis(3000);

/// Default bound on how long closing waits for an active run.
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest accepted startup delay.
pub const MAX_STARTUP_DELAY: Duration = Duration::from_millis(MAX_STARTUP_DELAY_MS);

/// Options for [`TaskListIndex::open`](crate::TaskListIndex::open).
///
/// A zero startup or reindex delay makes the corresponding run happen on the
/// calling thread before the call returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexOptions {
    /// Field searched by unqualified pattern words.
    pub default_field: TaskField,
    /// Cap on hits gathered for one `matches` pattern.
    pub max_match_hits: usize,
    /// Delay before the first maintenance run.
    pub startup_delay: Duration,
    /// Delay between a change or reindex request and the run that handles it.
    pub reindex_delay: Duration,
    /// Bound on how long closing waits for an active run.
    pub close_timeout: Duration,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            default_field: TaskField::Summary,
            max_match_hits: DEFAULT_MAX_MATCH_HITS,
            startup_delay: DEFAULT_STARTUP_DELAY,
            reindex_delay: DEFAULT_REINDEX_DELAY,
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
        }
    }
}

impl IndexOptions {
    /// Options with both delays zero, so every run completes before the
    /// triggering call returns.
    pub fn synchronous() -> Self {
        Self::default()
            .with_startup_delay(Duration::ZERO)
            .with_reindex_delay(Duration::ZERO)
    }

    /// Builds options from loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, IndexError> {
        let name = &config.index.default_field;
        let default_field =
            TaskField::from_name(name).ok_or_else(|| IndexError::UnknownField(name.clone()))?;
        let options = Self {
            default_field,
            max_match_hits: config.index.max_match_hits,
            startup_delay: config.maintenance.startup_delay(),
            reindex_delay: config.maintenance.reindex_delay(),
            close_timeout: config.maintenance.close_timeout(),
        };
        options.validate()?;
        Ok(options)
    }

    /// Sets the default field.
    pub fn with_default_field(mut self, field: TaskField) -> Self {
        self.default_field = field;
        self
    }

    /// Sets the hit cap for `matches`.
    pub fn with_max_match_hits(mut self, hits: usize) -> Self {
        self.max_match_hits = hits;
        self
    }

    /// Sets the startup delay.
    pub fn with_startup_delay(mut self, delay: Duration) -> Self {
        self.startup_delay = delay;
        self
    }

    /// Sets the reindex delay.
    pub fn with_reindex_delay(mut self, delay: Duration) -> Self {
        self.reindex_delay = delay;
        self
    }

    /// Sets the close timeout.
    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    /// Checks that every setting is within range.
    pub fn validate(&self) -> Result<(), IndexError> {
        if self.startup_delay > MAX_STARTUP_DELAY {
            return Err(IndexError::InvalidSetting {
                name: "startup_delay",
                message: format!(
                    "{} ms exceeds the maximum of {MAX_STARTUP_DELAY_MS} ms",
                    self.startup_delay.as_millis()
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let options = IndexOptions::default();
        assert_eq!(options.default_field, TaskField::Summary);
        assert_eq!(options.max_match_hits, 1500);
        assert_eq!(options.startup_delay, Duration::from_secs(6));
        assert_eq!(options.reindex_delay, Duration::from_secs(3));
        assert!(options.validate().is_ok());
    }

    #[test]
    fn startup_delay_is_bounded() {
        let at_limit = IndexOptions::default().with_startup_delay(MAX_STARTUP_DELAY);
        assert!(at_limit.validate().is_ok());

        let over = IndexOptions::default().with_startup_delay(Duration::from_millis(60_001));
        assert!(matches!(
            over.validate(),
            Err(IndexError::InvalidSetting {
                name: "startup_delay",
                ..
            })
        ));
    }

    #[test]
    fn from_config_resolves_field_names() {
        let mut config = Config::default();
        config.index.default_field = "Content".into();
        config.index.max_match_hits = 10;
        config.maintenance.reindex_delay_ms = 0;
        let options = IndexOptions::from_config(&config).unwrap();
        assert_eq!(options.default_field, TaskField::Content);
        assert_eq!(options.max_match_hits, 10);
        assert_eq!(options.reindex_delay, Duration::ZERO);

        config.index.default_field = "colour".into();
        assert!(matches!(
            IndexOptions::from_config(&config),
            Err(IndexError::UnknownField(name)) if name == "colour"
        ));
    }

    #[test]
    fn from_config_rejects_long_startup_delay() {
        let mut config = Config::default();
        config.maintenance.startup_delay_ms = 120_000;
        assert!(IndexOptions::from_config(&config).is_err());
    }
}
