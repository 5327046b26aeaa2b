//! One-call shop synchronization.
//!
//! Ties the shop store, the adapter registry, and the reconciliation engine
//! together: resolve the shop's platform, run the resilient fetch, feed the
//! normalized catalog to the engine, and return a combined report. Each
//! invocation is an independent logical flow; multiple shops may be synced
//! concurrently.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use stocklink_core::{LogLevel, ShopId};

use crate::adapters::{AdapterError, AdapterRegistry};
use crate::logging::SyncLogger;
use crate::reconcile::{ImportReport, ReconcileEngine, UpsertOptions};
use crate::store::{ShopStore, StoreError};

/// Errors surfaced by a sync invocation.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The shop is unknown to the credential store.
    #[error("shop not found: {0}")]
    ShopNotFound(ShopId),

    /// The fetch protocol failed terminally.
    #[error("adapter error: {0}")]
    Adapter(#[from] AdapterError),

    /// A store operation outside the reconciliation batch failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Options for one sync invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Preview the import without mutating the product store.
    pub dry_run: bool,
}

/// Combined result of a sync invocation.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    /// Shop that was synced.
    pub shop_id: ShopId,
    /// Platform the catalog came from.
    pub platform: String,
    /// Normalized products returned by the adapter.
    pub fetched: usize,
    /// Whether the reconciliation ran in dry-run mode.
    pub dry_run: bool,
    /// Per-item reconciliation outcome.
    pub import: ImportReport,
}

/// The top-level sync entry point.
#[derive(Clone)]
pub struct SyncService {
    shops: Arc<dyn ShopStore>,
    registry: Arc<AdapterRegistry>,
    engine: ReconcileEngine,
    logger: SyncLogger,
}

impl SyncService {
    /// Assemble a service from its collaborators.
    #[must_use]
    pub fn new(
        shops: Arc<dyn ShopStore>,
        registry: Arc<AdapterRegistry>,
        engine: ReconcileEngine,
        logger: SyncLogger,
    ) -> Self {
        Self {
            shops,
            registry,
            engine,
            logger,
        }
    }

    /// Sync one shop's catalog into the internal store.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::ShopNotFound` for unknown shops,
    /// `SyncError::Adapter` when the platform is unsupported or the fetch
    /// protocol exhausts its attempts. Per-item reconciliation failures are
    /// collected into the report, not raised.
    #[instrument(skip(self), fields(shop_id = %shop_id, dry_run = options.dry_run))]
    pub async fn sync_shop(
        &self,
        shop_id: ShopId,
        options: SyncOptions,
    ) -> Result<SyncReport, SyncError> {
        let shop = self
            .shops
            .get_shop(shop_id)
            .await?
            .ok_or(SyncError::ShopNotFound(shop_id))?;

        let Some(adapter) = self.registry.resolve(&shop.platform) else {
            self.logger
                .log(
                    shop_id,
                    &shop.platform,
                    LogLevel::Error,
                    "no adapter registered for platform",
                    serde_json::Value::Null,
                )
                .await;
            return Err(SyncError::Adapter(AdapterError::UnsupportedPlatform(
                shop.platform,
            )));
        };

        let catalog = adapter.fetch(shop_id).await?;
        let fetched = catalog.len();

        let import = self
            .engine
            .import_batch(
                &catalog,
                UpsertOptions {
                    dry_run: options.dry_run,
                },
            )
            .await;

        self.logger
            .log(
                shop_id,
                adapter.platform(),
                LogLevel::Info,
                "sync completed",
                serde_json::json!({
                    "fetched": fetched,
                    "valid": import.valid,
                    "invalid": import.invalid,
                    "errors": import.errors.len(),
                    "dry_run": options.dry_run,
                }),
            )
            .await;

        Ok(SyncReport {
            shop_id,
            platform: adapter.platform().to_string(),
            fetched,
            dry_run: options.dry_run,
            import,
        })
    }
}
