//! Process configuration, read once at startup.

use std::net::SocketAddr;

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// HS256 key for session tokens.
    pub session_secret: String,
    /// Bearer secret of the cron endpoints.
    pub cron_secret: String,
    /// `None` selects the in-memory stores.
    pub database_url: Option<String>,
    pub seed_on_start: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let session_secret = get("SESSION_SECRET").ok_or(ConfigError::Missing("SESSION_SECRET"))?;
        let cron_secret = get("CRON_SECRET").ok_or(ConfigError::Missing("CRON_SECRET"))?;

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                key: "BIND_ADDR",
                message: e.to_string(),
            })?;

        let seed_on_start = match get("SEED_ON_START").as_deref() {
            None => true,
            Some(v) => parse_bool(v).ok_or_else(|| ConfigError::Invalid {
                key: "SEED_ON_START",
                message: format!("expected true/false, got '{v}'"),
            })?,
        };

        Ok(Self {
            bind_addr,
            session_secret,
            cron_secret,
            database_url: get("DATABASE_URL"),
            seed_on_start,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl core::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("database", &self.database_url.as_ref().map(|_| "<set>"))
            .field("seed_on_start", &self.seed_on_start)
            .finish_non_exhaustive()
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
    fn defaults_apply() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("SESSION_SECRET", "s"),
            ("CRON_SECRET", "c"),
        ]))
        .unwrap();
        assert_eq!(cfg.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(cfg.database_url, None);
        assert!(cfg.seed_on_start);
    }

    #[test]
    fn missing_or_blank_secret_fails_fast() {
        let err = AppConfig::from_lookup(lookup(&[("CRON_SECRET", "c")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("SESSION_SECRET"));

        let err = AppConfig::from_lookup(lookup(&[
            ("SESSION_SECRET", "s"),
            ("CRON_SECRET", "   "),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing("CRON_SECRET"));
    }

    #[test]
    fn bad_values_are_rejected() {
        let err = AppConfig::from_lookup(lookup(&[
            ("SESSION_SECRET", "s"),
            ("CRON_SECRET", "c"),
            ("SEED_ON_START", "maybe"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "SEED_ON_START", .. }));

        let err = AppConfig::from_lookup(lookup(&[
            ("SESSION_SECRET", "s"),
            ("CRON_SECRET", "c"),
            ("BIND_ADDR", "nowhere"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "BIND_ADDR", .. }));
    }

    #[test]
    fn debug_hides_secrets() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("SESSION_SECRET", "hunter2"),
            ("CRON_SECRET", "cron-secret"),
            ("DATABASE_URL", "postgres://u:pw@db/app"),
        ]))
        .unwrap();
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("cron-secret"));
        assert!(!rendered.contains("pw@db"));
    }
}
