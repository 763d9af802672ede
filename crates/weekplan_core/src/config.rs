//! Engine configuration.
//!
//! # Responsibility
//! - Hold the tunables of the placement resolver and logging bootstrap.
//! - Provide defaults that need no external file.
//!
//! # Invariants
//! - `relocation_hours` is a non-empty range within one day.

use crate::logging::default_log_level;
use crate::model::interval::{Minute, TimeInterval, Weekday, MINUTES_PER_DAY, MINUTES_PER_HOUR};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

const DEFAULT_DAY_START: Minute = 7 * MINUTES_PER_HOUR;
const DEFAULT_DAY_END: Minute = 22 * MINUTES_PER_HOUR;

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidDayHours { start: Minute, end: Minute },
    EmptyLogLevel,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDayHours { start, end } => write!(
                f,
                "relocation hours must satisfy 0 <= start < end <= {MINUTES_PER_DAY}, got {start}..{end}"
            ),
            Self::EmptyLogLevel => write!(f, "log level must not be empty"),
        }
    }
}

impl Error for ConfigError {}

/// Daily range, in minutes after midnight, used when relocating tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayHours {
    pub start: Minute,
    pub end: Minute,
}

impl Default for DayHours {
    fn default() -> Self {
        Self {
            start: DEFAULT_DAY_START,
            end: DEFAULT_DAY_END,
        }
    }
}

impl DayHours {
    /// These hours on `day`, or `None` when the range is empty.
    pub fn on(&self, day: Weekday) -> Option<TimeInterval> {
        let base = day.index() * MINUTES_PER_DAY;
        TimeInterval::new(base + self.start, base + self.end).ok()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start < 0 || self.end > MINUTES_PER_DAY || self.start >= self.end {
            return Err(ConfigError::InvalidDayHours {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }
}

/// Logging bootstrap settings; `log_dir = None` leaves logging off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub log_dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

/// Top-level engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Allow moving lower-priority flexible neighbours (one level deep).
    pub displacement_enabled: bool,
    /// Daily hours displaced tasks may be moved into outside their window.
    pub relocation_hours: DayHours,
    pub logging: LoggingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            displacement_enabled: true,
            relocation_hours: DayHours::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.relocation_hours.validate()?;
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::EmptyLogLevel);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, DayHours, EngineConfig};
    use crate::model::interval::{TimeInterval, Weekday};

    #[test]
    fn default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.displacement_enabled);
    }

    #[test]
    fn day_hours_project_onto_weekday() {
        let hours = DayHours::default();
        assert_eq!(
            hours.on(Weekday::Wed),
            Some(TimeInterval::on(Weekday::Wed, (7, 0), (22, 0)).unwrap())
        );
    }

    #[test]
    fn inverted_day_hours_are_rejected() {
        let hours = DayHours {
            start: 600,
            end: 300,
        };
        assert_eq!(
            hours.validate().unwrap_err(),
            ConfigError::InvalidDayHours {
                start: 600,
                end: 300
            }
        );
    }
}
