//! Service configuration from the environment.

use crate::nhl::client::{ClientConfig, DEFAULT_STATS_BASE, DEFAULT_WEB_BASE};
use crate::season::Season;
use anyhow::{anyhow, Context, Result};
use std::env;
use std::time::Duration;

const DB_PASSWORD_SECRET: &str = "/run/secrets/db_password";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub nhl_api_base_url: String,
    pub nhl_stats_base_url: String,
    pub api_port: u16,
    pub sync_interval_seconds: u64,
    pub requests_per_minute: u32,
    /// If true, sync once and exit (no periodic loop)
    pub run_once: bool,
    /// Season to sync; the current one when unset
    pub sync_season: Option<Season>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| -> Result<Option<String>> {
            match lookup(key) {
                Some(v) if !v.trim().is_empty() => Ok(Some(v.trim().to_string())),
                Some(_) => Err(anyhow!("{} is set but empty", key)),
                None => Ok(None),
            }
        };

        // Database: DATABASE_URL wins, otherwise assemble from parts.
        let database_url = match optional("DATABASE_URL")? {
            Some(url) => url,
            None => {
                let db_user = optional("DB_USER")?.unwrap_or_else(|| "nhl".to_string());
                let db_name = optional("DB_NAME")?.unwrap_or_else(|| "nhl".to_string());
                let db_host = optional("DB_HOST")?.unwrap_or_else(|| "postgres".to_string());
                let db_port = optional("DB_PORT")?.unwrap_or_else(|| "5432".to_string());
                let db_password = match optional("DB_PASSWORD")? {
                    Some(p) => p,
                    None => read_secret_file(DB_PASSWORD_SECRET, "db_password")?,
                };
                format!("postgresql://{}:{}@{}:{}/{}", db_user, db_password, db_host, db_port, db_name)
            }
        };

        let sync_season = optional("SYNC_SEASON")?
            .map(|s| s.parse::<Season>())
            .transpose()
            .context("SYNC_SEASON must look like 20242025")?;

        let requests_per_minute = parse_or("REQUESTS_PER_MINUTE", optional("REQUESTS_PER_MINUTE")?, 120u32)?;
        if requests_per_minute == 0 {
            return Err(anyhow!("REQUESTS_PER_MINUTE must be greater than zero"));
        }

        Ok(Self {
            database_url,
            nhl_api_base_url: optional("NHL_API_BASE_URL")?.unwrap_or_else(|| DEFAULT_WEB_BASE.to_string()),
            nhl_stats_base_url: optional("NHL_STATS_BASE_URL")?.unwrap_or_else(|| DEFAULT_STATS_BASE.to_string()),
            api_port: parse_or("API_PORT", optional("API_PORT")?, 8000u16)?,
            sync_interval_seconds: parse_or("SYNC_INTERVAL_SECONDS", optional("SYNC_INTERVAL_SECONDS")?, 21600u64)?,
            requests_per_minute,
            run_once: optional("RUN_ONCE")?
                .map(|v| v.to_lowercase() == "true")
                .unwrap_or(false),
            sync_season,
        })
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            web_base_url: self.nhl_api_base_url.clone(),
            stats_base_url: self.nhl_stats_base_url.clone(),
            requests_per_minute: self.requests_per_minute,
            ..ClientConfig::default()
        }
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_seconds)
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(v) => v.parse().with_context(|| format!("{} has an invalid value '{}'", key, v)),
        None => Ok(default),
    }
}

/// Read a secret from a Docker secret file
fn read_secret_file(file_path: &str, secret_name: &str) -> Result<String> {
    std::fs::read_to_string(file_path)
        .map(|s| s.trim().to_string())
        .context(format!(
            "Secret {} not found at {} and no environment override was set",
            secret_name, file_path
        ))
}
