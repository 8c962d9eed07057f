use anyhow::Context;
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::fmt;
use std::str::FromStr;

use crate::utils::sanitize::mask_url_password;

pub const DEFAULT_APP_NAME: &str = "uPay API";
pub const DEFAULT_SERVER_PORT: u16 = 8000;
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:8000";
pub const DEFAULT_DB_POOL_SIZE: u32 = 5;
pub const DEFAULT_DB_ACQUIRE_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Test,
    Prod,
}

impl Environment {
    pub fn is_debug(&self) -> bool {
        matches!(self, Environment::Dev | Environment::Test)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Test => "test",
            Environment::Prod => "prod",
        }
    }
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dev" => Ok(Environment::Dev),
            "test" => Ok(Environment::Test),
            "prod" => Ok(Environment::Prod),
            other => anyhow::bail!("APP_ENV must be one of: dev, test, prod (got {:?})", other),
        }
    }
}

#[derive(Clone, Deserialize)]
pub struct Config {
    pub app_name: String,
    pub environment: Environment,
    pub server_port: u16,
    pub database_url: String,
    pub posting_key: String,
    pub allowed_origins: Vec<String>,
    pub db_pool_size: u32,
    pub db_acquire_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok(); // Load .env file if present

        Self::from_vars(|key| env::var(key).ok())
    }

    /// Builds the configuration from a variable lookup.
    pub fn from_vars<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match var("APP_ENV") {
            Some(value) => value.parse()?,
            None => Environment::Dev,
        };

        Ok(Config {
            app_name: var("APP_NAME").unwrap_or_else(|| DEFAULT_APP_NAME.to_string()),
            environment,
            server_port: parse_or(&var, "SERVER_PORT", DEFAULT_SERVER_PORT)?,
            database_url: var("DATABASE_URL").context("DATABASE_URL must be set")?,
            posting_key: var("POSTING_KEY").unwrap_or_default(),
            allowed_origins: parse_origins(
                &var("ALLOWED_ORIGINS").unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string()),
            ),
            db_pool_size: parse_or(&var, "DB_POOL_SIZE", DEFAULT_DB_POOL_SIZE)?,
            db_acquire_timeout_secs: parse_or(
                &var,
                "DB_ACQUIRE_TIMEOUT_SECS",
                DEFAULT_DB_ACQUIRE_TIMEOUT_SECS,
            )?,
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("app_name", &self.app_name)
            .field("environment", &self.environment)
            .field("server_port", &self.server_port)
            .field("database_url", &mask_url_password(&self.database_url))
            .field("posting_key", &if self.posting_key.is_empty() { "<unset>" } else { "****" })
            .field("allowed_origins", &self.allowed_origins)
            .field("db_pool_size", &self.db_pool_size)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}

fn parse_or<F, T>(var: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {:?}", key, raw)),
        None => Ok(default),
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
