//! Process configuration, read from the environment after `.env` is loaded.

use anyhow::{Context, Result};
use std::str::FromStr;

fn default_port() -> u16 {
    8080
}
fn default_max_connections() -> u32 {
    10
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Postgres connection string. Unset runs the in-memory store.
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub port: u16,
    pub nats_url: Option<String>,
    /// Allowed CORS origins. Empty means permissive.
    pub cors_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: default_max_connections(),
            port: default_port(),
            nats_url: None,
            cors_origins: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| trimmed(lookup(key));
        let max_connections = parse("DATABASE_MAX_CONNECTIONS", &get)?;
        let port = parse("PORT", &get)?;
        let cors_origins = get("CORS_ALLOWED_ORIGINS")
            .map(|v| split_list(&v))
            .unwrap_or_default();
        Ok(Self {
            database_url: get("DATABASE_URL"),
            max_connections: max_connections.unwrap_or_else(default_max_connections),
            port: port.unwrap_or_else(default_port),
            nats_url: get("NATS_URL"),
            cors_origins,
        })
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(String::from)
        .collect()
}

fn parse<T>(key: &str, get: impl Fn(&str) -> Option<String>) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let Some(value) = get(key) else {
        return Ok(None);
    };
    let parsed = value
        .parse::<T>()
        .with_context(|| format!("{key} has invalid value {value:?}"))?;
    Ok(Some(parsed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const DATABASE_URL: &str = "postgres://localhost/flexfume";

    fn config(pairs: &[(&str, &str)]) -> Result<Config> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn test_defaults() {
        assert_eq!(config(&[]).unwrap(), Config::default());
    }

    #[test]
    fn test_reads_values() {
        let c = config(&[
            ("DATABASE_URL", DATABASE_URL),
            ("DATABASE_MAX_CONNECTIONS", "25"),
            ("PORT", "9000"),
            ("CORS_ALLOWED_ORIGINS", "https://shop.example, ,https://admin.example"),
        ])
        .unwrap();
        assert_eq!(c.database_url.as_deref(), Some(DATABASE_URL));
        assert_eq!(c.max_connections, 25);
        assert_eq!(c.port, 9000);
        let origins = ["https://shop.example", "https://admin.example"];
        assert_eq!(c.cors_origins, origins);
        assert_eq!(c.nats_url, None);
    }

    #[test]
    fn test_invalid_number_is_an_error() {
        let err = config(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
        let blank = config(&[("DATABASE_URL", "  ")]).unwrap();
        assert_eq!(blank.database_url, None);
    }
}
