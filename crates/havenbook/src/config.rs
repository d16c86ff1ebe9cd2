//! Configuration management for havenbook.
//!
//! Configuration is loaded from a TOML file with environment variable
//! overrides (prefixed with `HAVENBOOK_`), falling back to sensible
//! defaults for anything unset.

use std::path::PathBuf;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::share::Permission;

/// Main configuration structure for havenbook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Storage settings.
    pub storage: StorageConfig,
    /// Share-link settings.
    pub sharing: SharingConfig,
    /// Import settings.
    pub import: ImportConfig,
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the `SQLite` database file.
    pub database_path: PathBuf,
}

/// Share-link configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharingConfig {
    /// Length of generated share tokens, in alphanumeric characters.
    pub token_length: usize,
    /// Access level stamped on newly issued links.
    pub default_permission: Permission,
    /// Default expiry applied when issuing a link with no explicit
    /// expiry, in days. `None` issues links that never expire.
    pub default_expiry_days: Option<i64>,
}

/// Import configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Maximum number of contacts accepted in one import batch.
    pub max_batch: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                database_path: default_database_path(),
            },
            sharing: SharingConfig {
                token_length: 12,
                default_permission: Permission::View,
                default_expiry_days: None,
            },
            import: ImportConfig { max_batch: 1000 },
        }
    }
}

impl Config {
    /// Load configuration from the default path with environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or is invalid.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load configuration from a specific TOML file.
    ///
    /// Values are resolved in order: defaults, then the TOML file, then
    /// `HAVENBOOK_`-prefixed environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or is invalid.
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self> {
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.into()))
            .merge(Env::prefixed("HAVENBOOK_").split("__"))
            .extract()?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error if any value is out of range.
    pub fn validate(&self) -> Result<()> {
        if self.sharing.token_length < 8 {
            return Err(Error::ConfigValidation {
                message: format!(
                    "sharing.token_length must be at least 8, got {}",
                    self.sharing.token_length
                ),
            });
        }

        if self.import.max_batch == 0 {
            return Err(Error::ConfigValidation {
                message: "import.max_batch must be greater than zero".to_string(),
            });
        }

        if let Some(days) = self.sharing.default_expiry_days {
            if days <= 0 {
                return Err(Error::ConfigValidation {
                    message: format!(
                        "sharing.default_expiry_days must be positive, got {days}"
                    ),
                });
            }
        }

        Ok(())
    }
}

/// Get the default database path.
///
/// Uses the platform data directory, falling back to the current
/// directory if unavailable.
#[must_use]
pub fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("havenbook")
        .join("contacts.db")
}

/// Get the default configuration file path.
#[must_use]
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("havenbook")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sharing.token_length, 12);
        assert_eq!(config.import.max_batch, 1000);
        assert!(config.sharing.default_expiry_days.is_none());
    }

    #[test]
    fn test_token_length_minimum() {
        let mut config = Config::default();
        config.sharing.token_length = 7;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("token_length"));

        config.sharing.token_length = 8;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_max_batch_must_be_positive() {
        let mut config = Config::default();
        config.import.max_batch = 0;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_batch"));
    }

    #[test]
    fn test_default_expiry_days_must_be_positive() {
        let mut config = Config::default();
        config.sharing.default_expiry_days = Some(0);
        assert!(config.validate().is_err());

        config.sharing.default_expiry_days = Some(-3);
        assert!(config.validate().is_err());

        config.sharing.default_expiry_days = Some(7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let config = Config::load_from("/nonexistent/config.toml").unwrap();
        assert_eq!(config.sharing.token_length, 12);
    }

    #[test]
    fn test_load_from_toml_file() {
        let temp_dir = std::env::temp_dir();
        let config_path = temp_dir.join(format!("havenbook_cfg_{}.toml", std::process::id()));

        std::fs::write(
            &config_path,
            r#"
[storage]
database_path = "/tmp/custom.db"

[sharing]
token_length = 16
default_permission = "edit"
default_expiry_days = 30

[import]
max_batch = 50
"#,
        )
        .unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.storage.database_path, PathBuf::from("/tmp/custom.db"));
        assert_eq!(config.sharing.token_length, 16);
        assert_eq!(config.sharing.default_permission, Permission::Edit);
        assert_eq!(config.sharing.default_expiry_days, Some(30));
        assert_eq!(config.import.max_batch, 50);

        let _ = std::fs::remove_file(&config_path);
    }

    #[test]
    fn test_load_from_invalid_values_rejected() {
        let temp_dir = std::env::temp_dir();
        let config_path = temp_dir.join(format!("havenbook_bad_{}.toml", std::process::id()));

        std::fs::write(&config_path, "[sharing]\ntoken_length = 4\n").unwrap();

        assert!(Config::load_from(&config_path).is_err());
        let _ = std::fs::remove_file(&config_path);
    }

    #[test]
    fn test_default_paths_end_with_expected_names() {
        assert!(default_database_path().ends_with("havenbook/contacts.db"));
        assert!(default_config_path().ends_with("havenbook/config.toml"));
    }
}
