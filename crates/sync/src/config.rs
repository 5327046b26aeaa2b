//! Sync pipeline configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CAFE24_BASE_URL` - Base URL of the Cafe24 admin API
//! - `TOKEN_REFRESH_URL` - Token-refresh endpoint for connected shops
//!
//! ## Optional
//! - `APP_ENV` - `development`, `staging`, or `production` (default: development)
//! - `SYNC_MAX_ATTEMPTS` - Fetch attempt budget (default: 10)
//! - `SYNC_BASE_DELAY_MS` - First backoff delay in ms (default: 100)
//! - `SYNC_MAX_DELAY_MS` - Backoff ceiling in ms (default: 30000)
//! - `SYNC_FIXTURE_CATALOG` - `true` to bypass the network and return a
//!   fixed catalog; refused when `APP_ENV=production`

use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::adapters::{Cafe24Config, RetryPolicy};

const DEFAULT_MAX_ATTEMPTS: u32 = 10;
const DEFAULT_BASE_DELAY_MS: u64 = 100;
const DEFAULT_MAX_DELAY_MS: u64 = 30_000;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("SYNC_FIXTURE_CATALOG must not be enabled in production")]
    FixtureInProduction,
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Whether this is the production environment.
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Sync pipeline configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Deployment environment.
    pub environment: Environment,
    /// Base URL of the Cafe24 admin API.
    pub cafe24_base_url: String,
    /// Token-refresh endpoint.
    pub token_refresh_url: String,
    /// Fetch attempt budget.
    pub max_attempts: u32,
    /// First backoff delay.
    pub base_delay: Duration,
    /// Backoff ceiling.
    pub max_delay: Duration,
    /// Development shortcut: return a fixed catalog without touching the
    /// network. Never allowed in production.
    pub fixture_catalog: bool,
}

impl SyncConfig {
    /// Load configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for missing/malformed variables and for a
    /// fixture-catalog flag in a production environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an injectable variable lookup (tests pass
    /// a map instead of mutating the process environment).
    ///
    /// # Errors
    ///
    /// See [`Self::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let environment = match lookup("APP_ENV").as_deref() {
            None | Some("development") => Environment::Development,
            Some("staging") => Environment::Staging,
            Some("production") => Environment::Production,
            Some(other) => {
                return Err(ConfigError::InvalidEnvVar(
                    "APP_ENV".to_string(),
                    format!("unknown environment: {other}"),
                ));
            }
        };

        let cafe24_base_url = lookup("CAFE24_BASE_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("CAFE24_BASE_URL".to_string()))?;
        let token_refresh_url = lookup("TOKEN_REFRESH_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("TOKEN_REFRESH_URL".to_string()))?;

        let max_attempts = parse_or("SYNC_MAX_ATTEMPTS", &lookup, DEFAULT_MAX_ATTEMPTS)?;
        if max_attempts == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "SYNC_MAX_ATTEMPTS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let base_delay_ms = parse_or("SYNC_BASE_DELAY_MS", &lookup, DEFAULT_BASE_DELAY_MS)?;
        let max_delay_ms = parse_or("SYNC_MAX_DELAY_MS", &lookup, DEFAULT_MAX_DELAY_MS)?;

        let fixture_catalog = match lookup("SYNC_FIXTURE_CATALOG").as_deref() {
            None | Some("false") | Some("0") | Some("") => false,
            Some("true") | Some("1") => true,
            Some(other) => {
                return Err(ConfigError::InvalidEnvVar(
                    "SYNC_FIXTURE_CATALOG".to_string(),
                    format!("expected true/false, got: {other}"),
                ));
            }
        };
        if fixture_catalog && environment.is_production() {
            return Err(ConfigError::FixtureInProduction);
        }

        Ok(Self {
            environment,
            cafe24_base_url,
            token_refresh_url,
            max_attempts,
            base_delay: Duration::from_millis(base_delay_ms),
            max_delay: Duration::from_millis(max_delay_ms),
            fixture_catalog,
        })
    }

    /// Retry policy derived from the configured bounds.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: self.base_delay,
            max_delay: self.max_delay,
        }
    }

    /// Endpoint configuration for the Cafe24 adapter.
    #[must_use]
    pub fn cafe24(&self) -> Cafe24Config {
        Cafe24Config {
            base_url: self.cafe24_base_url.clone(),
            token_refresh_url: self.token_refresh_url.clone(),
            fixture_catalog: self.fixture_catalog,
        }
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &str,
    lookup: impl Fn(&str) -> Option<String>,
    default: T,
) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn load(pairs: &[(&str, &str)]) -> Result<SyncConfig, ConfigError> {
        let map = vars(pairs);
        SyncConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[
            ("CAFE24_BASE_URL", "https://acme.cafe24api.com"),
            ("TOKEN_REFRESH_URL", "https://auth.example.com/refresh"),
        ])
        .unwrap();

        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.max_attempts, 10);
        assert_eq!(config.base_delay, Duration::from_millis(100));
        assert_eq!(config.max_delay, Duration::from_secs(30));
        assert!(!config.fixture_catalog);
    }

    #[test]
    fn test_missing_base_url() {
        let err = load(&[("TOKEN_REFRESH_URL", "https://auth.example.com/refresh")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref key) if key == "CAFE24_BASE_URL"));
    }

    #[test]
    fn test_fixture_refused_in_production() {
        let err = load(&[
            ("APP_ENV", "production"),
            ("CAFE24_BASE_URL", "https://acme.cafe24api.com"),
            ("TOKEN_REFRESH_URL", "https://auth.example.com/refresh"),
            ("SYNC_FIXTURE_CATALOG", "true"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::FixtureInProduction));
    }

    #[test]
    fn test_fixture_allowed_in_development() {
        let config = load(&[
            ("CAFE24_BASE_URL", "https://acme.cafe24api.com"),
            ("TOKEN_REFRESH_URL", "https://auth.example.com/refresh"),
            ("SYNC_FIXTURE_CATALOG", "true"),
        ])
        .unwrap();
        assert!(config.fixture_catalog);
    }

    #[test]
    fn test_invalid_attempts() {
        let err = load(&[
            ("CAFE24_BASE_URL", "https://acme.cafe24api.com"),
            ("TOKEN_REFRESH_URL", "https://auth.example.com/refresh"),
            ("SYNC_MAX_ATTEMPTS", "0"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "SYNC_MAX_ATTEMPTS"));
    }

    #[test]
    fn test_retry_policy_reflects_overrides() {
        let config = load(&[
            ("CAFE24_BASE_URL", "https://acme.cafe24api.com"),
            ("TOKEN_REFRESH_URL", "https://auth.example.com/refresh"),
            ("SYNC_MAX_ATTEMPTS", "3"),
            ("SYNC_BASE_DELAY_MS", "10"),
            ("SYNC_MAX_DELAY_MS", "50"),
        ])
        .unwrap();
        let policy = config.retry_policy();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay, Duration::from_millis(10));
        assert_eq!(policy.max_delay, Duration::from_millis(50));
    }
}
