//! Platform adapters and the adapter registry.
//!
//! Each external commerce platform gets one adapter that encapsulates the
//! resilient fetch protocol against that platform's API and normalizes its
//! responses into the platform-neutral [`ExternalProduct`] shape. Callers
//! that do not care which platform they are talking to resolve adapters
//! through the [`AdapterRegistry`].
//!
//! The registry is an explicit object constructed once at startup and passed
//! by reference; adapters are registered statically (no dynamic loading), so
//! an unknown platform resolves to `None` rather than a best-effort load.

pub mod cafe24;
pub mod protocol;
pub mod types;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use stocklink_core::ShopId;

use crate::store::StoreError;

pub use cafe24::{Cafe24Adapter, Cafe24Config};
pub use protocol::{AttemptOutcome, NoopSleeper, RetryPolicy, Sleeper, TokioSleeper, Transition};
pub use types::ExternalProduct;

/// Errors surfaced by platform adapters.
///
/// Transport and auth failures are retried inside the fetch protocol and
/// never surface individually; only the terminal states below reach callers.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// HTTP transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The platform answered with an unexpected status.
    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
        /// Response body text.
        body: String,
    },

    /// The attempt budget was spent without a successful fetch.
    #[error("catalog fetch exhausted after {attempts} attempts: {last_error}")]
    Exhausted {
        /// Number of attempts performed.
        attempts: u32,
        /// Description of the final failure.
        last_error: String,
    },

    /// No adapter is registered for the shop's platform.
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// The shop exists but lacks a credential the adapter needs.
    #[error("missing credential: {0}")]
    MissingCredential(String),

    /// The shop is unknown to the credential store.
    #[error("shop not found: {0}")]
    ShopNotFound(ShopId),

    /// Platform payload could not be parsed.
    #[error("payload parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The caller cancelled the fetch.
    #[error("fetch cancelled")]
    Cancelled,

    /// Credential store failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// A platform adapter's fetch entry point.
#[async_trait]
pub trait ProductFetcher: Send + Sync {
    /// Platform name this adapter serves (registry key).
    fn platform(&self) -> &str;

    /// Retrieve the full normalized product catalog for one shop, riding out
    /// transient network and auth failures.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::Exhausted` when the attempt budget is spent,
    /// `AdapterError::ShopNotFound`/`MissingCredential` for unusable shops,
    /// and `AdapterError::Cancelled` when the caller gave up.
    async fn fetch(&self, shop_id: ShopId) -> Result<Vec<ExternalProduct>, AdapterError>;
}

/// Maps platform names to adapters.
///
/// Registration is last-wins and deterministic; replacing an existing
/// adapter is logged at debug level. Lookups for an unregistered platform
/// return `None`, never panic.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: HashMap<String, Arc<dyn ProductFetcher>>,
}

impl AdapterRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under a platform name. A later registration for
    /// the same name deterministically replaces the earlier one.
    pub fn register(&mut self, platform: impl Into<String>, fetcher: Arc<dyn ProductFetcher>) {
        let platform = platform.into();
        if self.adapters.insert(platform.clone(), fetcher).is_some() {
            tracing::debug!(platform, "adapter registration replaced");
        }
    }

    /// Resolve the adapter for a platform, if one is registered.
    #[must_use]
    pub fn resolve(&self, platform: &str) -> Option<Arc<dyn ProductFetcher>> {
        self.adapters.get(platform).cloned()
    }

    /// Registered platform names, sorted.
    #[must_use]
    pub fn platforms(&self) -> Vec<String> {
        let mut names: Vec<String> = self.adapters.keys().cloned().collect();
        names.sort();
        names
    }

    /// Build a registry holding the statically known adapter set. New
    /// platforms are added here, at compile time; there is no dynamic
    /// adapter loading.
    #[must_use]
    pub fn with_builtin_adapters(
        config: &crate::config::SyncConfig,
        shops: Arc<dyn crate::store::ShopStore>,
        logger: crate::logging::SyncLogger,
    ) -> Self {
        let mut registry = Self::new();
        registry.register(
            cafe24::PLATFORM,
            Arc::new(
                Cafe24Adapter::new(config.cafe24(), shops, logger)
                    .with_policy(config.retry_policy()),
            ),
        );
        registry
    }
}
