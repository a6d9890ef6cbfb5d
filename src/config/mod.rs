use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::confirmation::DEFAULT_CODE_LENGTH;

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub reservation: ReservationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
    pub seed_demo_data: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
    pub acquire_timeout_secs: u64,
}

// Redis is optional: without REDIS_URL the read views go straight to the database.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReservationConfig {
    pub timeout_ms: u64,
    pub confirmation_code_length: usize,
}

impl ReservationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ReservationConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            confirmation_code_length: DEFAULT_CODE_LENGTH,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let reservation_defaults = ReservationConfig::default();

        Ok(Config {
            app: AppConfig {
                host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(&lookup, "PORT", 8000)?,
                environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
                rust_log: lookup("RUST_LOG")
                    .unwrap_or_else(|| "movie_booking=debug,tower_http=debug".to_string()),
                seed_demo_data: parse_or(&lookup, "SEED_DEMO_DATA", false)?,
            },
            database: DatabaseConfig {
                url: lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
                pool_size: parse_or(&lookup, "DB_POOL_SIZE", 20)?,
                acquire_timeout_secs: parse_or(&lookup, "DB_ACQUIRE_TIMEOUT_SECS", 5)?,
            },
            redis: RedisConfig {
                url: lookup("REDIS_URL").filter(|u| !u.trim().is_empty()),
            },
            reservation: ReservationConfig {
                timeout_ms: parse_or(
                    &lookup,
                    "RESERVATION_TIMEOUT_MS",
                    reservation_defaults.timeout_ms,
                )?,
                confirmation_code_length: parse_or(
                    &lookup,
                    "CONFIRMATION_CODE_LENGTH",
                    reservation_defaults.confirmation_code_length,
                )?,
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}
