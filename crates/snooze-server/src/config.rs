//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use snooze_core::{AlarmTime, DEFAULT_ALARM_TIME};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,
    /// Address the HTTP server binds to.
    pub host: String,
    /// Port the HTTP server listens on.
    pub port: u16,
    /// Alarm time used whenever no rule applies.
    pub default_alarm_time: AlarmTime,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("default_alarm_time", &self.default_alarm_time.to_string())
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("snooze.db"),
            host: "127.0.0.1".to_string(),
            port: 8000,
            default_alarm_time: DEFAULT_ALARM_TIME,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // SNOOZE_DATABASE_PATH, SNOOZE_PORT, ...
        figment = figment.merge(Env::prefixed("SNOOZE_"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for snooze.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("snooze"))
}

/// Returns the platform-specific data directory for snooze.
///
/// On Linux: `~/.local/share/snooze`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("snooze"))
}
