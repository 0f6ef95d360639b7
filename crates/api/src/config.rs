//! Process configuration for the API binary.
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `ORDERDESK_BIND_ADDR` | listen address | `0.0.0.0:8000` |
//!
//! Storage variables are documented on [`orderdesk_infra::StoreConfig`].

use std::net::SocketAddr;

use orderdesk_infra::{ConfigError, StoreConfig};

pub const BIND_ADDR: &str = "ORDERDESK_BIND_ADDR";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub store: StoreConfig,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw = lookup(BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw
            .trim()
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid(BIND_ADDR, raw.clone(), e.to_string()))?;

        Ok(Self {
            bind_addr,
            store: StoreConfig::from_lookup(&lookup)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_port_8000_and_memory_store() {
        let cfg = ApiConfig::from_lookup(|_| None).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:8000".parse().unwrap());
        assert_eq!(cfg.store, StoreConfig::InMemory);
    }

    #[test]
    fn bind_addr_is_read_from_env() {
        let cfg = ApiConfig::from_lookup(|key| {
            (key == BIND_ADDR).then(|| "127.0.0.1:9090".to_string())
        })
        .unwrap();
        assert_eq!(cfg.bind_addr.port(), 9090);
    }

    #[test]
    fn malformed_bind_addr_is_rejected() {
        let err = ApiConfig::from_lookup(|key| (key == BIND_ADDR).then(|| "localhost".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: BIND_ADDR, .. }));
    }
}
