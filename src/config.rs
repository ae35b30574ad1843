use std::str::FromStr;
use std::time::Duration;
use std::{env, fmt::Display};

use thiserror::Error;
use tracing::info;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_STORE_TIMEOUT_MS: u64 = 5_000;

/// Runtime configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Connection string for the ledger database.
    pub database_url: String,
    /// Upper bound on any single store operation.
    pub store_timeout: Duration,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {key}: {value}")]
    InvalidVar { key: &'static str, value: String },
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// A missing `DATABASE_URL` is a startup failure: the process must not
    /// serve traffic it cannot back with the store.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            port: parse_or("PORT", DEFAULT_PORT)?,
            database_url: require("DATABASE_URL")?,
            store_timeout: Duration::from_millis(parse_or(
                "STORE_TIMEOUT_MS",
                DEFAULT_STORE_TIMEOUT_MS,
            )?),
        })
    }
}

fn require(key: &'static str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVar(key))
}

fn parse_or<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Display,
{
    match env::var(key) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidVar { key, value }),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}
