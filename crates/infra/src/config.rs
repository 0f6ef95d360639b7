//! Storage configuration.
//!
//! Read once at startup from the environment:
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `DATABASE_URL` | Postgres connection string; unset selects the in-memory store | unset |
//! | `ORDERDESK_DB_MAX_CONNECTIONS` | pool size | `5` |

use thiserror::Error;

pub const DATABASE_URL: &str = "DATABASE_URL";
pub const DB_MAX_CONNECTIONS: &str = "ORDERDESK_DB_MAX_CONNECTIONS";

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    pub fn invalid(key: &'static str, value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            value: value.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
}

// The URL may carry a password.
impl core::fmt::Debug for PostgresConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PostgresConfig")
            .field("url", &"<redacted>")
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

/// Which orders store backs the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    InMemory,
    Postgres(PostgresConfig),
}

impl StoreConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source (tests pass a closure over a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(url) = lookup(DATABASE_URL).filter(|u| !u.trim().is_empty()) else {
            return Ok(StoreConfig::InMemory);
        };

        let max_connections = match lookup(DB_MAX_CONNECTIONS) {
            None => DEFAULT_MAX_CONNECTIONS,
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                Ok(_) => return Err(ConfigError::invalid(DB_MAX_CONNECTIONS, raw, "must be positive")),
                Err(e) => return Err(ConfigError::invalid(DB_MAX_CONNECTIONS, raw, e.to_string())),
            },
        };

        Ok(StoreConfig::Postgres(PostgresConfig {
            url,
            max_connections,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn no_database_url_means_in_memory() {
        assert_eq!(StoreConfig::from_lookup(lookup(&[])), Ok(StoreConfig::InMemory));
        assert_eq!(
            StoreConfig::from_lookup(lookup(&[(DATABASE_URL, "  ")])),
            Ok(StoreConfig::InMemory)
        );
    }

    #[test]
    fn database_url_selects_postgres_with_default_pool() {
        let cfg = StoreConfig::from_lookup(lookup(&[(DATABASE_URL, "postgres://localhost/orders")]))
            .unwrap();
        assert_eq!(
            cfg,
            StoreConfig::Postgres(PostgresConfig {
                url: "postgres://localhost/orders".into(),
                max_connections: DEFAULT_MAX_CONNECTIONS,
            })
        );
    }

    #[test]
    fn bad_pool_size_is_an_error() {
        for raw in ["zero", "0", "-3"] {
            let err = StoreConfig::from_lookup(lookup(&[
                (DATABASE_URL, "postgres://localhost/orders"),
                (DB_MAX_CONNECTIONS, raw),
            ]))
            .unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { key: DB_MAX_CONNECTIONS, .. }));
        }
    }

    #[test]
    fn debug_output_hides_the_url() {
        let cfg = PostgresConfig {
            url: "postgres://user:secret@db/orders".into(),
            max_connections: 1,
        };
        assert!(!format!("{cfg:?}").contains("secret"));
    }
}
