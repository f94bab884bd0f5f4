//! Service configuration read from the environment.
//!
//! | Variable               | Default   |
//! |------------------------|-----------|
//! | `SERVICE_PORT`         | `12345`   |
//! | `ADMIN_PORT`           | `9090` (`0` disables the admin listener) |
//! | `MAX_CONNECTIONS`      | `100`     |
//! | `MAX_FRAME_BYTES`      | `8388608` |
//! | `ADMISSION_POLICY`     | `greedy`  |
//! | `ADMISSION_TIMEOUT_MS` | unset (wait forever) |
//! | `CELL_SIZE`            | `250`     |
//! | `MATCH_RADIUS`         | `500`     |

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use walkgraph_lib::{
    AdmissionPolicy, NetworkConfig, ResolverConfig, DEFAULT_CELL_SIZE, DEFAULT_MATCH_RADIUS,
};

use crate::codec::DEFAULT_MAX_FRAME_BYTES;

pub const DEFAULT_SERVICE_PORT: u16 = 12345;
pub const DEFAULT_ADMIN_PORT: u16 = 9090;
pub const DEFAULT_MAX_CONNECTIONS: usize = 100;

/// A variable was set to something unusable.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name}={value:?} is not a valid value: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Everything the service needs to start.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub service_port: u16,
    /// `None` disables the admin HTTP listener.
    pub admin_port: Option<u16>,
    pub max_connections: usize,
    pub max_frame_bytes: usize,
    pub network: NetworkConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            service_port: DEFAULT_SERVICE_PORT,
            admin_port: Some(DEFAULT_ADMIN_PORT),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            network: NetworkConfig::default(),
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable source. Unset
    /// variables take their defaults; set but malformed ones are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let service_port = parse_or(&lookup, "SERVICE_PORT", DEFAULT_SERVICE_PORT)?;
        let admin_port = match parse_or(&lookup, "ADMIN_PORT", DEFAULT_ADMIN_PORT)? {
            0 => None,
            port => Some(port),
        };

        let max_connections = parse_or(&lookup, "MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        if max_connections == 0 {
            return Err(invalid("MAX_CONNECTIONS", "0", "must be at least 1"));
        }
        let max_frame_bytes = parse_or(&lookup, "MAX_FRAME_BYTES", DEFAULT_MAX_FRAME_BYTES)?;
        if max_frame_bytes == 0 {
            return Err(invalid("MAX_FRAME_BYTES", "0", "must be at least 1"));
        }

        let policy = match lookup("ADMISSION_POLICY") {
            Some(value) => AdmissionPolicy::from_str(&value)
                .map_err(|e| invalid("ADMISSION_POLICY", &value, e))?,
            None => AdmissionPolicy::default(),
        };
        let admission_timeout = match lookup("ADMISSION_TIMEOUT_MS") {
            Some(value) => Some(Duration::from_millis(parse_value(
                "ADMISSION_TIMEOUT_MS",
                &value,
            )?)),
            None => None,
        };

        let cell_size = parse_or(&lookup, "CELL_SIZE", DEFAULT_CELL_SIZE)?;
        let match_radius = parse_or(&lookup, "MATCH_RADIUS", DEFAULT_MATCH_RADIUS)?;
        let resolver = ResolverConfig::new(cell_size, match_radius).map_err(|e| {
            invalid(
                "CELL_SIZE/MATCH_RADIUS",
                &format!("{cell_size}/{match_radius}"),
                e,
            )
        })?;

        Ok(Self {
            service_port,
            admin_port,
            max_connections,
            max_frame_bytes,
            network: NetworkConfig {
                resolver,
                policy,
                admission_timeout,
            },
        })
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(value) => parse_value(name, &value),
        None => Ok(default),
    }
}

fn parse_value<T>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| invalid(name, value, e))
}

fn invalid(name: &'static str, value: &str, reason: impl std::fmt::Display) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<ServiceConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.service_port, 12345);
        assert_eq!(config.admin_port, Some(9090));
        assert_eq!(config.max_connections, 100);
        assert_eq!(config.max_frame_bytes, 8 * 1024 * 1024);
        assert_eq!(config.network.policy, AdmissionPolicy::Greedy);
        assert!(config.network.admission_timeout.is_none());
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = from_pairs(&[
            ("SERVICE_PORT", "4000"),
            ("ADMIN_PORT", "0"),
            ("MAX_CONNECTIONS", "8"),
            ("ADMISSION_POLICY", "alternating"),
            ("ADMISSION_TIMEOUT_MS", "250"),
            ("CELL_SIZE", "10"),
            ("MATCH_RADIUS", "25.5"),
        ])
        .unwrap();

        assert_eq!(config.service_port, 4000);
        assert_eq!(config.admin_port, None);
        assert_eq!(config.max_connections, 8);
        assert_eq!(config.network.policy, AdmissionPolicy::Alternating);
        assert_eq!(
            config.network.admission_timeout,
            Some(Duration::from_millis(250))
        );
        assert_eq!(config.network.resolver.cell_size, 10.0);
        assert_eq!(config.network.resolver.match_radius, 25.5);
    }

    #[test]
    fn test_malformed_values_name_the_variable() {
        let error = from_pairs(&[("SERVICE_PORT", "http")]).unwrap_err();
        assert!(error.to_string().starts_with("SERVICE_PORT=\"http\""));

        assert!(from_pairs(&[("MAX_CONNECTIONS", "0")]).is_err());
        assert!(from_pairs(&[("ADMISSION_POLICY", "lifo")]).is_err());
        assert!(from_pairs(&[("MATCH_RADIUS", "-3")]).is_err());
    }

    #[test]
    fn test_resolver_scan_block_is_bounded() {
        let error = from_pairs(&[("CELL_SIZE", "0.5"), ("MATCH_RADIUS", "500")]).unwrap_err();
        assert!(error.to_string().starts_with("CELL_SIZE/MATCH_RADIUS"));

        assert!(from_pairs(&[("CELL_SIZE", "10"), ("MATCH_RADIUS", "640")]).is_ok());
    }
}
