//! Configuration management for guestwatch.
//!
//! Loaded with figment from defaults, a TOML file and `GUESTWATCH_`
//! environment variables.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::session::{default_accounts, Account};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "guestwatch";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "registry.db";

/// Default local state file name.
const SESSION_FILE_NAME: &str = "session.json";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `GUESTWATCH_`, sections split on `__`)
/// 2. TOML config file at `~/.config/guestwatch/config.toml`
/// 3. Default values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Local session configuration.
    pub session: SessionConfig,
    /// Wanted-hit alert wording.
    pub alerts: AlertConfig,
    /// Credential table.
    pub accounts: Vec<Account>,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/guestwatch/registry.db`
    pub database_path: Option<PathBuf>,
    /// How often `watch` checks the database for writes by other processes.
    pub poll_interval_ms: u64,
}

/// Local session configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Path to the persisted session and profile.
    /// Defaults to `~/.local/share/guestwatch/session.json`
    pub state_path: Option<PathBuf>,
}

/// Wording of the alert raised on a wanted hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Alert title.
    pub title: String,
    /// Alert body; `{guest}` and `{hotel}` are substituted.
    pub message_template: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            session: SessionConfig::default(),
            alerts: AlertConfig::default(),
            accounts: default_accounts(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            poll_interval_ms: 1_000,
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            title: "Wanted person checked in".to_string(),
            message_template: "{guest} has checked in at {hotel}.".to_string(),
        }
    }
}

impl AlertConfig {
    /// Fill the message template for one guest.
    ///
    /// `{guest}` and `{hotel}` are substituted in one pass, so placeholder
    /// text inside the values is left alone.
    #[must_use]
    pub fn render_message(&self, guest: &str, hotel: &str) -> String {
        let mut out = String::with_capacity(self.message_template.len() + guest.len());
        let mut rest = self.message_template.as_str();
        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let tail = &rest[start..];
            if let Some(after) = tail.strip_prefix("{guest}") {
                out.push_str(guest);
                rest = after;
            } else if let Some(after) = tail.strip_prefix("{hotel}") {
                out.push_str(hotel);
                rest = after;
            } else {
                out.push('{');
                rest = &tail[1..];
            }
        }
        out.push_str(rest);
        out
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("GUESTWATCH_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.storage.poll_interval_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "poll_interval_ms must be greater than 0".to_string(),
            });
        }

        if self.alerts.title.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "alert title must not be empty".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for account in &self.accounts {
            if account.username.is_empty() {
                return Err(Error::ConfigValidation {
                    message: "account username must not be empty".to_string(),
                });
            }
            if !seen.insert(account.username.as_str()) {
                return Err(Error::ConfigValidation {
                    message: format!("duplicate account: {}", account.username),
                });
            }
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the local state path, resolving defaults if not set.
    #[must_use]
    pub fn state_path(&self) -> PathBuf {
        self.session
            .state_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(SESSION_FILE_NAME))
    }

    /// Get the poll interval as a Duration.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.storage.poll_interval_ms)
    }
}
