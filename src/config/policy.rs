//! Return policy configuration loading from config.toml
//!
//! This module loads the product-policy knobs that vary between deployments:
//! whether a return deadline may already be in the past at creation, whether
//! a returned date is required up front, and the per-user record ceiling.
//! Missing file or missing fields fall back to the defaults.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Default per-user record ceiling. A product rule, not a performance limit.
pub const DEFAULT_MAX_RECORDS: u64 = 25;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Return policy knobs
    #[serde(default)]
    pub policy: ReturnPolicy,
}

/// Product-policy knobs applied by the validation engine and record store
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ReturnPolicy {
    /// When true, `return_by_date` must be today or later at creation time
    pub return_by_must_be_future: bool,
    /// When true, a draft without a `returned_date` is rejected
    pub require_returned_date: bool,
    /// Maximum records a single user may own at once
    pub max_records: u64,
}

impl Default for ReturnPolicy {
    fn default() -> Self {
        Self {
            return_by_must_be_future: false,
            require_returned_date: false,
            max_records: DEFAULT_MAX_RECORDS,
        }
    }
}

/// Loads policy configuration from a TOML file
///
/// # Arguments
/// * `path` - Path to the config.toml file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads policy configuration from the default location (./config.toml),
/// falling back to defaults when the file does not exist.
pub fn load_default_config() -> Result<Config> {
    if Path::new("config.toml").exists() {
        load_config("config.toml")
    } else {
        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_policy_config() {
        let toml_str = r#"
            [policy]
            return_by_must_be_future = true
            require_returned_date = false
            max_records = 10
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(config.policy.return_by_must_be_future);
        assert!(!config.policy.require_returned_date);
        assert_eq!(config.policy.max_records, 10);
    }

    #[test]
    fn test_defaults_when_section_missing() {
        let config: Config = toml::from_str("").unwrap();
        assert!(!config.policy.return_by_must_be_future);
        assert!(!config.policy.require_returned_date);
        assert_eq!(config.policy.max_records, DEFAULT_MAX_RECORDS);
    }
}
