//! Application settings loaded from `drivetrack.toml`.
//!
//! Every field has a default, so a missing file section (or a missing file, via
//! [`AppConfig::default`]) still yields a usable configuration.

use crate::core::attendance::DuplicateCheckIn;
use crate::core::balance::DiscountRule;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Default file name looked up by [`load_default_config`].
pub const DEFAULT_CONFIG_FILE: &str = "drivetrack.toml";

/// Configuration structure representing the entire drivetrack.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// School identity used on receipts
    pub school: SchoolConfig,
    /// Balance and dashboard rules
    pub billing: BillingConfig,
    /// Check-in rules
    pub attendance: AttendanceConfig,
}

/// `[school]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchoolConfig {
    /// Name printed at the top of receipts
    pub name: String,
    /// Currency label prefixed to amounts
    pub currency: String,
}

impl Default for SchoolConfig {
    fn default() -> Self {
        Self {
            name: "DriveTrack Driving School".to_string(),
            currency: "NPR".to_string(),
        }
    }
}

/// `[billing]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    /// Which ledger rows count as discounts
    pub discount_rule: DiscountRule,
    /// Enrollments ending within this many days are listed as due soon
    pub due_soon_window_days: u32,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            discount_rule: DiscountRule::Tagged,
            due_soon_window_days: 2,
        }
    }
}

/// `[attendance]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AttendanceConfig {
    /// Whether a second same-day check-in is rejected
    pub duplicate_check_in: DuplicateCheckIn,
    /// Lesson length recorded by a quick check-in
    pub default_lesson_hours: f64,
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        Self {
            duplicate_check_in: DuplicateCheckIn::Reject,
            default_lesson_hours: 1.0,
        }
    }
}

/// Loads settings from a TOML file.
///
/// # Errors
/// Returns [`Error::Config`] if the file cannot be read or the TOML is invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    parse_config(&contents)
}

/// Parses settings from TOML text.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse drivetrack.toml: {e}"),
    })
}

/// Loads settings from `./drivetrack.toml`, falling back to defaults when the file is absent.
pub fn load_default_config() -> Result<AppConfig> {
    if Path::new(DEFAULT_CONFIG_FILE).exists() {
        load_config(DEFAULT_CONFIG_FILE)
    } else {
        tracing::info!("No {DEFAULT_CONFIG_FILE} found, using default settings");
        Ok(AppConfig::default())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            [school]
            name = "Hilltop Driving"
            currency = "INR"

            [billing]
            discount_rule = "tagged_or_legacy_prefix"
            due_soon_window_days = 3

            [attendance]
            duplicate_check_in = "allow"
            default_lesson_hours = 0.5
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.school.name, "Hilltop Driving");
        assert_eq!(config.school.currency, "INR");
        assert_eq!(config.billing.discount_rule, DiscountRule::TaggedOrLegacyPrefix);
        assert_eq!(config.billing.due_soon_window_days, 3);
        assert_eq!(config.attendance.duplicate_check_in, DuplicateCheckIn::Allow);
        assert_eq!(config.attendance.default_lesson_hours, 0.5);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = parse_config("[school]\nname = \"Only Name\"\n").unwrap();
        assert_eq!(config.school.name, "Only Name");
        assert_eq!(config.school.currency, "NPR");
        assert_eq!(config.billing.discount_rule, DiscountRule::Tagged);
        assert_eq!(config.billing.due_soon_window_days, 2);
        assert_eq!(config.attendance.duplicate_check_in, DuplicateCheckIn::Reject);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = parse_config("[billing]\ndue_soon_window_days = \"soon\"");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
