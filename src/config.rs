//! Startup configuration, read once from `ROOMBOOK_*` environment variables.

use std::str::FromStr;

use crate::engine::DurationPolicy;
use crate::model::MINUTE_MS;

pub const DEFAULT_PORT: u16 = 3001;
/// 12 hours.
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 12 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind: String,
    pub port: u16,
    pub secret: String,
    pub token_ttl_secs: u64,
    pub metrics_port: Option<u16>,
    /// Mount the `/api/testing` reset routes.
    pub testing: bool,
    pub policy: DurationPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{key} environment variable is required"),
            ConfigError::Invalid { key, value } => write!(f, "invalid value for {key}: {value:?}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key → value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let secret = lookup("ROOMBOOK_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("ROOMBOOK_SECRET"))?;

        let min_minutes: Option<i64> = parsed(&lookup, "ROOMBOOK_MIN_DURATION_MINUTES")?;
        let max_minutes: Option<i64> = parsed(&lookup, "ROOMBOOK_MAX_DURATION_MINUTES")?;
        let policy = DurationPolicy::new(
            minutes(min_minutes, "ROOMBOOK_MIN_DURATION_MINUTES")?,
            minutes(max_minutes, "ROOMBOOK_MAX_DURATION_MINUTES")?,
        );
        if let (Some(min), Some(max)) = (policy.min, policy.max)
            && min > max
        {
            return Err(ConfigError::Invalid {
                key: "ROOMBOOK_MAX_DURATION_MINUTES",
                value: format!("{} (below minimum {})", max / MINUTE_MS, min / MINUTE_MS),
            });
        }

        Ok(Self {
            bind: lookup("ROOMBOOK_BIND").unwrap_or_else(|| "0.0.0.0".into()),
            port: parsed(&lookup, "ROOMBOOK_PORT")?.unwrap_or(DEFAULT_PORT),
            secret,
            token_ttl_secs: parsed(&lookup, "ROOMBOOK_TOKEN_TTL_SECS")?
                .unwrap_or(DEFAULT_TOKEN_TTL_SECS),
            metrics_port: parsed(&lookup, "ROOMBOOK_METRICS_PORT")?,
            testing: flag(&lookup, "ROOMBOOK_TESTING")?,
            policy,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

fn flag(lookup: &impl Fn(&str) -> Option<String>, key: &'static str) -> Result<bool, ConfigError> {
    match lookup(key).as_deref().map(str::trim) {
        None | Some("") | Some("0") | Some("false") | Some("no") => Ok(false),
        Some("1") | Some("true") | Some("yes") => Ok(true),
        Some(other) => Err(ConfigError::Invalid {
            key,
            value: other.to_string(),
        }),
    }
}

fn minutes(value: Option<i64>, key: &'static str) -> Result<Option<i64>, ConfigError> {
    match value {
        Some(m) => m
            .checked_mul(MINUTE_MS)
            .filter(|_| m > 0)
            .map(Some)
            .ok_or_else(|| ConfigError::Invalid {
                key,
                value: m.to_string(),
            }),
        None => Ok(None),
    }
}
