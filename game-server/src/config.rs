use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
    #[error("{0} is required unless AUTH_DEV_MODE=true")]
    Missing(&'static str),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// A word list file, or a directory of `.txt` word lists.
    pub words_path: String,
    /// Optional JSON letter distribution; the English set is used otherwise.
    pub letters_file: Option<String>,
    pub store_timeout: Duration,
    pub auth_dev_mode: bool,
    pub auth_secret: Option<String>,
    pub rate_limit_burst: u32,
    pub rate_limit_per_second: u32,
    pub lock_sweep_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let auth_dev_mode = parse_or(&lookup, "AUTH_DEV_MODE", false)?;
        let auth_secret = lookup("AUTH_SECRET").filter(|secret| !secret.is_empty());
        if !auth_dev_mode && auth_secret.is_none() {
            return Err(ConfigError::Missing("AUTH_SECRET"));
        }

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&lookup, "PORT", 8080)?,
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://word_rooms.db?mode=rwc".to_string()),
            words_path: lookup("WORDS_PATH").unwrap_or_else(|| "./shared/words".to_string()),
            letters_file: lookup("LETTERS_FILE"),
            store_timeout: Duration::from_millis(parse_or(&lookup, "STORE_TIMEOUT_MS", 3000)?),
            auth_dev_mode,
            auth_secret,
            rate_limit_burst: parse_or(&lookup, "RATE_LIMIT_BURST", 30)?,
            rate_limit_per_second: parse_or(&lookup, "RATE_LIMIT_PER_SECOND", 5)?,
            lock_sweep_interval: Duration::from_secs(parse_or(
                &lookup,
                "LOCK_SWEEP_SECONDS",
                60,
            )?),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_in_dev_mode() {
        let config = config_from(&[("AUTH_DEV_MODE", "true")]).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.store_timeout, Duration::from_millis(3000));
        assert_eq!(config.rate_limit_burst, 30);
        assert!(config.letters_file.is_none());
        assert!(config.auth_dev_mode);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("AUTH_SECRET", "s3cret"),
            ("PORT", "9000"),
            ("STORE_TIMEOUT_MS", "250"),
            ("LETTERS_FILE", "letters.json"),
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.store_timeout, Duration::from_millis(250));
        assert_eq!(config.letters_file.as_deref(), Some("letters.json"));
        assert_eq!(config.auth_secret.as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_invalid_number_is_reported() {
        let err = config_from(&[("AUTH_DEV_MODE", "true"), ("PORT", "eighty")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "PORT",
                value: "eighty".to_string()
            }
        );
    }

    #[test]
    fn test_secret_required_outside_dev_mode() {
        assert_eq!(
            config_from(&[]).unwrap_err(),
            ConfigError::Missing("AUTH_SECRET")
        );
    }
}
