//! Runtime configuration
//!
//! Every field is optional in the JSON file. `Config::from_env` reads the
//! file named by `SAVKIT_CONFIG` when set, then applies `SAVKIT_LOG_LEVEL`.

use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{SavError, SavResult};
use crate::observability::{Logger, Severity};

/// Environment variable naming a JSON config file
pub const CONFIG_ENV: &str = "SAVKIT_CONFIG";

/// Environment variable overriding `log_level`
pub const LOG_LEVEL_ENV: &str = "SAVKIT_LOG_LEVEL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Compression for newly created documents (default: true)
    #[serde(default = "default_compression")]
    pub compression: bool,

    /// Minimum log severity: trace, info, warn, error or fatal (default: "warn")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Fsync after every committed case instead of only on close (default: false)
    #[serde(default)]
    pub sync_each_case: bool,
}

fn default_compression() -> bool {
    true
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            compression: default_compression(),
            log_level: default_log_level(),
            sync_each_case: false,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_json_file(path: &Path) -> SavResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| SavError::io(format!("Failed to read config {}", path.display()), e))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| SavError::invalid_argument(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Configuration from the environment, falling back to defaults.
    ///
    /// An unreadable config file is logged and ignored.
    pub fn from_env() -> Self {
        let mut config = match env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_json_file(Path::new(&path)).unwrap_or_else(|err| {
                let reason = err.to_string();
                Logger::warn("CONFIG_IGNORED", &[("reason", &reason)]);
                Self::default()
            }),
            None => Self::default(),
        };

        if let Ok(level) = env::var(LOG_LEVEL_ENV) {
            if Severity::parse(&level).is_some() {
                config.log_level = level;
            }
        }

        config.apply_log_level();
        config
    }

    fn validate(&self) -> SavResult<()> {
        if Severity::parse(&self.log_level).is_none() {
            return Err(SavError::invalid_argument(format!(
                "Invalid log_level: '{}'. Expected trace, info, warn, error or fatal.",
                self.log_level
            )));
        }
        Ok(())
    }

    /// The configured minimum log severity
    pub fn min_severity(&self) -> Severity {
        Severity::parse(&self.log_level).unwrap_or(Severity::Warn)
    }

    /// Installs `log_level` as the process-wide logging threshold
    pub fn apply_log_level(&self) {
        Logger::set_min_severity(self.min_severity());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("savkit.json");
        fs::write(&path, "{}").unwrap();

        let config = Config::from_json_file(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(config.compression);
        assert_eq!(config.min_severity(), Severity::Warn);
        assert!(!config.sync_each_case);
    }

    #[test]
    fn test_config_overrides() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("savkit.json");
        fs::write(
            &path,
            r#"{"compression": false, "log_level": "info", "sync_each_case": true}"#,
        )
        .unwrap();

        let config = Config::from_json_file(&path).unwrap();
        assert!(!config.compression);
        assert_eq!(config.min_severity(), Severity::Info);
        assert!(config.sync_each_case);
    }

    #[test]
    fn test_config_rejects_unknown_level() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("savkit.json");
        fs::write(&path, r#"{"log_level": "loud"}"#).unwrap();

        let err = Config::from_json_file(&path).unwrap_err();
        assert_eq!(err.code(), crate::errors::SavErrorCode::InvalidArgument);
    }

    #[test]
    fn test_config_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = Config::from_json_file(&dir.path().join("absent.json")).unwrap_err();
        assert_eq!(err.code(), crate::errors::SavErrorCode::Io);
    }
}
