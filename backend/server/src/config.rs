use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_PORT: u16 = 1111;
pub const DEFAULT_DATABASE_PATH: &str = "kos.db";
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 50;
pub const DEFAULT_MAX_STAY_DAYS: u32 = 366;
pub const DEFAULT_CORS_MAX_AGE_SECS: u64 = 60 * 60;

#[derive(Error, Debug)]
#[error("Invalid {key} value '{value}': {reason}")]
pub struct ConfigError {
    key: &'static str,
    value: String,
    reason: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: PathBuf,
    pub max_page_size: u32,
    pub max_stay_days: u32,
    pub cors_max_age: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            max_stay_days: DEFAULT_MAX_STAY_DAYS,
            cors_max_age: Duration::from_secs(DEFAULT_CORS_MAX_AGE_SECS),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            port: try_load("RUST_PORT", DEFAULT_PORT)?,
            database_path: try_load("KOS_DATABASE_PATH", DEFAULT_DATABASE_PATH.to_string())?
                .into(),
            max_page_size: positive("KOS_MAX_PAGE_SIZE", DEFAULT_MAX_PAGE_SIZE)?,
            max_stay_days: positive("KOS_MAX_STAY_DAYS", DEFAULT_MAX_STAY_DAYS)?,
            cors_max_age: Duration::from_secs(try_load(
                "KOS_CORS_MAX_AGE_SECS",
                DEFAULT_CORS_MAX_AGE_SECS,
            )?),
        })
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        info!("{key} not set, using default");
    })
}

fn try_load<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    let Ok(value) = var(key) else {
        return Ok(default);
    };

    let parsed = value.trim().parse::<T>();
    parsed.map_err(|e| {
        warn!("Invalid {key} value: {e}");

        ConfigError {
            key,
            value,
            reason: e.to_string(),
        }
    })
}

fn positive(key: &'static str, default: u32) -> Result<u32, ConfigError> {
    match try_load(key, default)? {
        0 => Err(ConfigError {
            key,
            value: "0".to_string(),
            reason: "must be positive".to_string(),
        }),
        value => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();

        assert_eq!(config.port, 1111);
        assert_eq!(config.database_path, PathBuf::from("kos.db"));
        assert_eq!(config.max_stay_days, 366);
    }

    #[test]
    fn unset_keys_fall_back() {
        let port: u16 = try_load("KOS_TEST_SURELY_UNSET_PORT", 8080).unwrap();
        assert_eq!(port, 8080);
    }

    #[test]
    fn config_error_message() {
        let err = ConfigError {
            key: "RUST_PORT",
            value: "abc".to_string(),
            reason: "invalid digit found in string".to_string(),
        };

        assert_eq!(
            err.to_string(),
            "Invalid RUST_PORT value 'abc': invalid digit found in string"
        );
    }
}
