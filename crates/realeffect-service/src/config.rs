//! Service configuration.
//!
//! Values are resolved from defaults, then environment variables, then
//! command-line flags ([`ConfigOverrides`]). A flag wins over its variable
//! without the variable being parsed.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `REALEFFECTD_ADDR` | `0.0.0.0:8081` |
//! | `REALEFFECTD_REQUEST_TIMEOUT` | `30s` |
//! | `REALEFFECTD_MAX_BODY` | `1048576` |
//! | `REALEFFECTD_RULES` | unset (built-in rule set) |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use realeffect_core::{MissionError, RuleSet};
use thiserror::Error;

pub const ENV_ADDR: &str = "REALEFFECTD_ADDR";
pub const ENV_REQUEST_TIMEOUT: &str = "REALEFFECTD_REQUEST_TIMEOUT";
pub const ENV_MAX_BODY: &str = "REALEFFECTD_MAX_BODY";
pub const ENV_RULES: &str = "REALEFFECTD_RULES";

/// Errors from reading configuration values.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{key}: invalid listen address {value:?}: {reason}")]
    InvalidAddr {
        key: String,
        value: String,
        reason: String,
    },

    #[error("{key}: invalid duration {value:?}: {reason}")]
    InvalidDuration {
        key: String,
        value: String,
        reason: String,
    },

    #[error("{key}: invalid size {value:?}: {reason}")]
    InvalidSize {
        key: String,
        value: String,
        reason: String,
    },

    #[error("failed to load rule set: {0}")]
    Rules(#[from] MissionError),
}

/// Configuration for the evaluation daemon.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// Address the HTTP server binds to
    pub listen_addr: SocketAddr,

    /// Upper bound on handling a single request
    pub request_timeout: Duration,

    /// Largest accepted request body
    pub max_body_bytes: usize,

    /// Rule set file; `None` uses the built-in thresholds
    pub rules_path: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8081)),
            request_timeout: Duration::from_secs(30),
            max_body_bytes: 1024 * 1024,
            rules_path: None,
        }
    }
}

/// Raw values given on the command line.
///
/// A set field replaces its environment variable entirely: the variable is
/// not read, so a malformed value there cannot block startup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub addr: Option<String>,
    pub request_timeout: Option<String>,
    pub max_body_bytes: Option<String>,
    pub rules: Option<PathBuf>,
}

impl ServiceConfig {
    /// Build a config from the process environment and command-line flags.
    pub fn from_env_with(overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        Self::resolve(|key| std::env::var(key).ok(), overrides)
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::resolve(lookup, &ConfigOverrides::default())
    }

    /// Resolve defaults, then `lookup`, then `overrides`.
    pub fn resolve<F>(lookup: F, overrides: &ConfigOverrides) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        match &overrides.addr {
            Some(value) => config.listen_addr = parse_addr("--addr", value)?,
            None => {
                if let Some(value) = lookup(ENV_ADDR) {
                    config.listen_addr = parse_addr(ENV_ADDR, &value)?;
                }
            }
        }

        match &overrides.request_timeout {
            Some(value) => config.request_timeout = parse_duration("--request-timeout", value)?,
            None => {
                if let Some(value) = lookup(ENV_REQUEST_TIMEOUT) {
                    config.request_timeout = parse_duration(ENV_REQUEST_TIMEOUT, &value)?;
                }
            }
        }

        match &overrides.max_body_bytes {
            Some(value) => config.max_body_bytes = parse_size("--max-body-bytes", value)?,
            None => {
                if let Some(value) = lookup(ENV_MAX_BODY) {
                    config.max_body_bytes = parse_size(ENV_MAX_BODY, &value)?;
                }
            }
        }

        config.rules_path = match &overrides.rules {
            Some(path) => Some(path.clone()),
            None => lookup(ENV_RULES)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
        };

        Ok(config)
    }

    /// Load the configured rule set, or the built-in one.
    pub fn load_rules(&self) -> Result<RuleSet, ConfigError> {
        match &self.rules_path {
            Some(path) => Ok(RuleSet::from_file(path)?),
            None => Ok(RuleSet::default()),
        }
    }
}

fn parse_addr(key: &str, value: &str) -> Result<SocketAddr, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|e: std::net::AddrParseError| ConfigError::InvalidAddr {
            key: key.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}

/// Parse a human-readable duration such as `30s` or `1m 30s`.
fn parse_duration(key: &str, value: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(value.trim()).map_err(|e| ConfigError::InvalidDuration {
        key: key.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_size(key: &str, value: &str) -> Result<usize, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| ConfigError::InvalidSize {
            key: key.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.listen_addr.port(), 8081);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.load_rules().unwrap(), RuleSet::default());
    }

    #[test]
    fn test_env_overrides() {
        let config = ServiceConfig::from_lookup(lookup(&[
            (ENV_ADDR, "127.0.0.1:9000"),
            (ENV_REQUEST_TIMEOUT, "1m 30s"),
            (ENV_MAX_BODY, "4096"),
            (ENV_RULES, "rules.yaml"),
        ]))
        .unwrap();

        assert_eq!(config.listen_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.request_timeout, Duration::from_secs(90));
        assert_eq!(config.max_body_bytes, 4096);
        assert_eq!(config.rules_path, Some(PathBuf::from("rules.yaml")));
    }

    #[test]
    fn test_invalid_values() {
        let result = ServiceConfig::from_lookup(lookup(&[(ENV_ADDR, "not-an-addr")]));
        assert!(matches!(result, Err(ConfigError::InvalidAddr { .. })));

        let result = ServiceConfig::from_lookup(lookup(&[(ENV_REQUEST_TIMEOUT, "soon")]));
        assert!(matches!(result, Err(ConfigError::InvalidDuration { .. })));

        let result = ServiceConfig::from_lookup(lookup(&[(ENV_MAX_BODY, "-1")]));
        assert!(matches!(result, Err(ConfigError::InvalidSize { .. })));
    }

    #[test]
    fn test_flags_override_env() {
        let overrides = ConfigOverrides {
            addr: Some("127.0.0.1:9000".to_string()),
            rules: Some(PathBuf::from("flag_rules.yaml")),
            ..Default::default()
        };
        let config = ServiceConfig::resolve(
            lookup(&[
                (ENV_ADDR, "127.0.0.1:7000"),
                (ENV_MAX_BODY, "2048"),
                (ENV_RULES, "env_rules.yaml"),
            ]),
            &overrides,
        )
        .unwrap();

        assert_eq!(config.listen_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.max_body_bytes, 2048);
        assert_eq!(config.rules_path, Some(PathBuf::from("flag_rules.yaml")));
    }

    #[test]
    fn test_flag_shadows_malformed_env() {
        let overrides = ConfigOverrides {
            addr: Some("127.0.0.1:9000".to_string()),
            request_timeout: Some("5s".to_string()),
            ..Default::default()
        };
        let config = ServiceConfig::resolve(
            lookup(&[(ENV_ADDR, "bad"), (ENV_REQUEST_TIMEOUT, "soon")]),
            &overrides,
        )
        .unwrap();

        assert_eq!(config.listen_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_malformed_flag_names_the_flag() {
        let overrides = ConfigOverrides {
            max_body_bytes: Some("lots".to_string()),
            ..Default::default()
        };
        let err = ServiceConfig::resolve(lookup(&[]), &overrides).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSize { ref key, .. } if key == "--max-body-bytes"));
    }

    #[test]
    fn test_missing_rules_file() {
        let config = ServiceConfig {
            rules_path: Some(PathBuf::from("no/such/rules.yaml")),
            ..Default::default()
        };
        assert!(matches!(config.load_rules(), Err(ConfigError::Rules(_))));
    }
}
