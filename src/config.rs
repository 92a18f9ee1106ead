use std::{fmt::Display, str::FromStr};

use thiserror::Error;

pub const DEFAULT_ACCESS_TOKEN: &str = "DEMO2024";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} should be set")]
    Missing(&'static str),

    #[error("invalid {key} value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub port: u16,
    pub access_token: String,
    pub admin_token: Option<String>,
    pub access_cookie_days: i64,
    pub db_pool_size: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let access_token = lookup("WEDDING_ACCESS_TOKEN").unwrap_or_else(|| DEFAULT_ACCESS_TOKEN.to_string());
        if access_token.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "WEDDING_ACCESS_TOKEN",
                value: access_token,
                reason: "must not be blank".to_string(),
            });
        }
        if access_token == DEFAULT_ACCESS_TOKEN {
            log::warn!("WEDDING_ACCESS_TOKEN not set, guests are using the demo token");
        }

        let admin_token = lookup("WEDDING_ADMIN_TOKEN").filter(|t| !t.trim().is_empty());
        if admin_token.is_none() {
            log::warn!("WEDDING_ADMIN_TOKEN not set, admin endpoints are disabled");
        }

        Ok(Config {
            database_url,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: try_load(&lookup, "PORT", 8080)?,
            access_token,
            admin_token,
            access_cookie_days: try_load(&lookup, "ACCESS_COOKIE_DAYS", 7)?,
            db_pool_size: try_load(&lookup, "DB_POOL_SIZE", 10)?,
        })
    }
}

fn try_load<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        None => {
            log::info!("{key} not set, using default: {default}");
            Ok(default)
        }
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/wedding")]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.bind_addr, "127.0.0.1");
        assert_eq!(config.access_token, DEFAULT_ACCESS_TOKEN);
        assert_eq!(config.admin_token, None);
        assert_eq!(config.access_cookie_days, 7);
        assert_eq!(config.db_pool_size, 10);
    }

    #[test]
    fn test_database_url_is_required() {
        assert!(matches!(load(&[]), Err(ConfigError::Missing("DATABASE_URL"))));
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        let err = load(&[("DATABASE_URL", "postgres://x"), ("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));
    }

    #[test]
    fn test_blank_tokens() {
        let err = load(&[("DATABASE_URL", "postgres://x"), ("WEDDING_ACCESS_TOKEN", "  ")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "WEDDING_ACCESS_TOKEN", .. }));

        let config = load(&[("DATABASE_URL", "postgres://x"), ("WEDDING_ADMIN_TOKEN", "")]).unwrap();
        assert_eq!(config.admin_token, None);
    }
}
