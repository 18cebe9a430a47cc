//! Calendar settings, loadable from TOML.

use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;

use crate::consts::{ANCHOR_DAY, ANCHOR_MONTH, EPOCH_OFFSET};

/// A year without February 29, used to check the anchor date exists every year.
const COMMON_YEAR: i32 = 2023;

/// What to do when a date lies more than 364 days after the anchor.
///
/// This happens on the last civil day of a custom year that contains a
/// February 29.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Overflow {
    /// Stay on the last day of the last month.
    #[default]
    Clamp,
    /// Continue counting from the first day of the first month.
    Wrap,
}

/// Settings for a [`Converter`](crate::Converter).
///
/// ```toml
/// anchor_month = 9
/// anchor_day = 21
/// epoch_offset = 5508
/// overflow = "clamp"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CalendarConfig {
    #[serde(default = "default_anchor_month")]
    pub anchor_month: u8,
    #[serde(default = "default_anchor_day")]
    pub anchor_day: u8,
    #[serde(default = "default_epoch_offset")]
    pub epoch_offset: i32,
    #[serde(default)]
    pub overflow: Overflow,
}

fn default_anchor_month() -> u8 {
    ANCHOR_MONTH
}
fn default_anchor_day() -> u8 {
    ANCHOR_DAY
}
fn default_epoch_offset() -> i32 {
    EPOCH_OFFSET
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            anchor_month: default_anchor_month(),
            anchor_day: default_anchor_day(),
            epoch_offset: default_epoch_offset(),
            overflow: Overflow::default(),
        }
    }
}

/// Error type for loading and validating a [`CalendarConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML")]
    Toml(#[from] toml::de::Error),

    #[error("invalid anchor month: {0} (must be 1..=12)")]
    InvalidAnchorMonth(u8),

    /// February 29 is rejected since it does not occur every year.
    #[error("invalid anchor day: {day} for month {month}")]
    InvalidAnchorDay { month: u8, day: u8 },
}

impl CalendarConfig {
    /// Parses a config from a TOML string and validates it.
    ///
    /// # Errors
    /// Returns `ConfigError::Toml` for malformed input or unknown keys, and a
    /// validation error for an impossible anchor date.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML config file.
    ///
    /// # Errors
    /// Returns `ConfigError::Io` if the file cannot be read, otherwise as
    /// [`CalendarConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading calendar config");
        let toml_str = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&toml_str)
    }

    /// Checks that the anchor date exists in every civil year.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidAnchorMonth` or `ConfigError::InvalidAnchorDay`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let month = self.anchor_month;
        if NaiveDate::from_ymd_opt(COMMON_YEAR, u32::from(month), 1).is_none() {
            return Err(ConfigError::InvalidAnchorMonth(month));
        }
        let day = self.anchor_day;
        if NaiveDate::from_ymd_opt(COMMON_YEAR, u32::from(month), u32::from(day)).is_none() {
            return Err(ConfigError::InvalidAnchorDay { month, day });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let config = CalendarConfig::default();
        assert_eq!(config.anchor_month, 9);
        assert_eq!(config.anchor_day, 21);
        assert_eq!(config.epoch_offset, 5508);
        assert_eq!(config.overflow, Overflow::Clamp);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = CalendarConfig::from_toml_str("").unwrap();
        assert_eq!(config, CalendarConfig::default());
    }

    #[test]
    fn test_full_toml() {
        let config = CalendarConfig::from_toml_str(
            r#"
            anchor_month = 3
            anchor_day = 1
            epoch_offset = 0
            overflow = "wrap"
            "#,
        )
        .unwrap();
        assert_eq!(config.anchor_month, 3);
        assert_eq!(config.anchor_day, 1);
        assert_eq!(config.epoch_offset, 0);
        assert_eq!(config.overflow, Overflow::Wrap);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = CalendarConfig::from_toml_str("leap_days = true").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_unknown_overflow_rejected() {
        let err = CalendarConfig::from_toml_str(r#"overflow = "extend""#).unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_invalid_anchor_month() {
        let err = CalendarConfig::from_toml_str("anchor_month = 13").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAnchorMonth(13)));
        assert_eq!(err.to_string(), "invalid anchor month: 13 (must be 1..=12)");
        let err = CalendarConfig::from_toml_str("anchor_month = 0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAnchorMonth(0)));
    }

    #[test]
    fn test_february_29_anchor_rejected() {
        let config = CalendarConfig {
            anchor_month: 2,
            anchor_day: 29,
            ..CalendarConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAnchorDay { month: 2, day: 29 }));
        assert_eq!(err.to_string(), "invalid anchor day: 29 for month 2");
    }

    #[test]
    fn test_month_lengths_checked_per_month() {
        let april_31 = CalendarConfig::from_toml_str("anchor_month = 4\nanchor_day = 31");
        assert!(matches!(
            april_31,
            Err(ConfigError::InvalidAnchorDay { month: 4, day: 31 })
        ));
        assert!(CalendarConfig::from_toml_str("anchor_month = 12\nanchor_day = 31").is_ok());
        assert!(CalendarConfig::from_toml_str("anchor_month = 2\nanchor_day = 28").is_ok());
    }

    #[test]
    fn test_zero_anchor_day_rejected() {
        let err = CalendarConfig::from_toml_str("anchor_day = 0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAnchorDay { day: 0, .. }));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = CalendarConfig::load("/nonexistent/slavic_calendar.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
