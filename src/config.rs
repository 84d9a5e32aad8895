//! Client configuration.
//!
//! Loaded from `config/config.toml` (optional) layered under environment
//! variables with the `ARMADA` prefix, e.g.
//! `ARMADA__CLIENT__REMOTE_URL=https://…`. Every field has a default so a
//! bare environment still produces a usable configuration.

use chrono::Weekday;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::schedule::RotationOptions;

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_remote_url")]
    pub remote_url: String,
    /// Trailing window of sales fetched at bootstrap, in days.
    #[serde(default = "default_sales_window_days")]
    pub sales_window_days: u32,
    /// Default rotation interval for schedule generation.
    #[serde(default = "default_rotation_interval")]
    pub rotation_interval: u32,
    /// Default excluded weekdays, numbered 0 = Sunday … 6 = Saturday.
    #[serde(default)]
    pub excluded_days: Vec<u8>,
}

fn default_remote_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_sales_window_days() -> u32 {
    365
}

fn default_rotation_interval() -> u32 {
    3
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            remote_url: default_remote_url(),
            sales_window_days: default_sales_window_days(),
            rotation_interval: default_rotation_interval(),
            excluded_days: Vec::new(),
        }
    }
}

impl ClientConfig {
    /// Load the client configuration from `config/config.toml`, falling back to env vars.
    pub fn load() -> Result<Self, ConfigError> {
        // Build configuration by reading the TOML file (optional) and environment variables
        let builder = Config::builder()
            .add_source(File::with_name("config/config.toml").required(false))
            .add_source(Environment::with_prefix("ARMADA").separator("__"));

        let settings = match builder.build() {
            Ok(cfg) => cfg,
            Err(err) => {
                // If the file existed but was unreadable, log a warning and retry with env only
                if std::path::Path::new("config/config.toml").exists() {
                    log::warn!(
                        "failed to load config file, falling back to env. Error: {}",
                        err
                    );
                }
                Config::builder()
                    .add_source(Environment::with_prefix("ARMADA").separator("__"))
                    .build()
                    .map_err(|env_err| {
                        ConfigError::Message(format!(
                            "Failed to load configuration from file and env: {}, then env-only error: {}",
                            err, env_err
                        ))
                    })?
            }
        };

        let client_config: ClientConfig = settings.get::<ClientConfig>("client").map_err(|e| {
            ConfigError::Message(format!(
                "Client configuration could not be loaded from file or environment: {}",
                e
            ))
        })?;

        Ok(client_config)
    }

    /// Default rotation options derived from this configuration.
    ///
    /// Excluded-day numbers outside 0–6 are skipped with a warning.
    pub fn rotation_options(&self) -> RotationOptions {
        let excluded_days = self
            .excluded_days
            .iter()
            .filter_map(|&index| match weekday_from_sunday_index(index) {
                Some(day) => Some(day),
                None => {
                    log::warn!("ignoring invalid excluded weekday index {}", index);
                    None
                }
            })
            .collect();
        RotationOptions {
            rotation_interval: self.rotation_interval,
            excluded_days,
        }
    }
}

/// Map a Sunday-based weekday number (0 = Sunday … 6 = Saturday) to a
/// [`Weekday`].
pub fn weekday_from_sunday_index(index: u8) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}
