//! Process configuration, read from `WAREFLOW_*` environment variables.

use std::net::SocketAddr;
use std::str::FromStr;

use thiserror::Error;

use wareflow_catalog::DEFAULT_MAX_BUNDLE_DEPTH;
pub use wareflow_observability::LogFormat;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_ALERT_WINDOW_DAYS: u32 = 30;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: cannot parse {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub max_connections: u32,
    pub max_bundle_depth: usize,
    pub alert_window_days: u32,
    pub log_format: LogFormat,
    pub seed_demo: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Unset keys take defaults;
    /// set but malformed keys are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = parse_or(&lookup, "WAREFLOW_BIND_ADDR", || {
            SocketAddr::from(([0, 0, 0, 0], 8080))
        })?;
        let database_url = lookup("WAREFLOW_DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let max_connections: u32 = parse_or(&lookup, "WAREFLOW_MAX_CONNECTIONS", || DEFAULT_MAX_CONNECTIONS)?;
        if max_connections == 0 {
            return Err(invalid("WAREFLOW_MAX_CONNECTIONS", "0", "must be at least 1"));
        }
        let max_bundle_depth: usize =
            parse_or(&lookup, "WAREFLOW_MAX_BUNDLE_DEPTH", || DEFAULT_MAX_BUNDLE_DEPTH)?;
        if max_bundle_depth == 0 {
            return Err(invalid("WAREFLOW_MAX_BUNDLE_DEPTH", "0", "must be at least 1"));
        }
        let alert_window_days: u32 =
            parse_or(&lookup, "WAREFLOW_ALERT_WINDOW_DAYS", || DEFAULT_ALERT_WINDOW_DAYS)?;
        if alert_window_days == 0 {
            return Err(invalid("WAREFLOW_ALERT_WINDOW_DAYS", "0", "must be at least 1"));
        }
        let log_format = parse_or(&lookup, "WAREFLOW_LOG_FORMAT", LogFormat::default)?;
        let seed_demo = match lookup("WAREFLOW_SEED_DEMO") {
            None => false,
            Some(v) => parse_flag(&v).ok_or_else(|| invalid("WAREFLOW_SEED_DEMO", &v, "expected a boolean"))?,
        };

        Ok(Self {
            bind_addr,
            database_url,
            max_connections,
            max_bundle_depth,
            alert_window_days,
            log_format,
            seed_demo,
        })
    }
}

fn invalid(var: &'static str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: impl FnOnce() -> T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(default()),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| invalid(var, &raw, e.to_string())),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
