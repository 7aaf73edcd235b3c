//! Runtime configuration read from the environment once at startup.

use chrono::NaiveDate;
use std::env;
use std::path::PathBuf;

use crate::calendar::parse_date;
use crate::storage::resolve_data_path;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// JSON file backing the record store.
    pub data_path: PathBuf,
    /// Pins "today" when set; otherwise the local date is used.
    pub fixed_today: Option<NaiveDate>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(8080);

        let fixed_today = match env::var("APP_TODAY") {
            Ok(raw) if !raw.trim().is_empty() => Some(parse_date(&raw).map_err(|err| {
                ConfigError::Invalid {
                    name: "APP_TODAY",
                    reason: err.to_string(),
                }
            })?),
            _ => None,
        };

        Ok(Self {
            port,
            data_path: resolve_data_path(),
            fixed_today,
        })
    }
}
