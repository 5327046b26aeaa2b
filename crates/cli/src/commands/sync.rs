//! `stocklink sync` - run one shop sync end to end.

use std::sync::Arc;

use thiserror::Error;

use stocklink_core::{CredentialMap, Shop, ShopId};
use stocklink_sync::store::{MemoryProductStore, MemoryShopStore, MemorySyncLogStore};
use stocklink_sync::{
    AdapterRegistry, ConfigError, ReconcileEngine, SyncConfig, SyncError, SyncLogger,
    SyncOptions, SyncService,
};

/// Errors raised by the sync subcommand.
#[derive(Debug, Error)]
pub enum SyncCommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
}

/// Run a sync for one shop seeded from the process environment.
///
/// # Errors
///
/// Returns `SyncCommandError` when configuration is incomplete or the sync
/// itself fails terminally.
pub async fn run(
    shop: i32,
    dry_run: bool,
    show_log: bool,
    log_limit: usize,
) -> Result<(), SyncCommandError> {
    let config = SyncConfig::from_env()?;

    let shop_id = ShopId::new(shop);
    let shops = Arc::new(MemoryShopStore::new());
    shops.put_shop(shop_from_env(shop_id, &config)?).await;

    let products = Arc::new(MemoryProductStore::new());
    let sink = Arc::new(MemorySyncLogStore::new());
    let logger = SyncLogger::new(sink.clone());

    let registry = Arc::new(AdapterRegistry::with_builtin_adapters(
        &config,
        shops.clone(),
        logger.clone(),
    ));
    let service = SyncService::new(
        shops,
        registry,
        ReconcileEngine::new(products),
        logger.clone(),
    );

    let report = service.sync_shop(shop_id, SyncOptions { dry_run }).await?;

    tracing::info!(
        shop = %report.shop_id,
        platform = %report.platform,
        fetched = report.fetched,
        valid = report.import.valid,
        invalid = report.import.invalid,
        errors = report.import.errors.len(),
        dry_run = report.dry_run,
        "sync finished"
    );
    for error in &report.import.errors {
        tracing::warn!(external_id = %error.external_id, reason = %error.reason, "item failed");
    }

    if show_log {
        super::logs::print_page(logger.sink().as_ref(), log_limit, 0)
            .await
            .map_err(SyncError::from)?;
    }

    Ok(())
}

/// Build the connected shop from `SHOP_*` environment variables.
fn shop_from_env(shop_id: ShopId, config: &SyncConfig) -> Result<Shop, SyncCommandError> {
    let platform =
        std::env::var("SHOP_PLATFORM").unwrap_or_else(|_| "cafe24".to_string());

    let mut credentials = CredentialMap::new();
    match std::env::var("SHOP_ACCESS_TOKEN") {
        Ok(token) => credentials.set("access_token", token),
        // The fixture shortcut never touches the network, so a token is
        // only required for real fetches.
        Err(_) if config.fixture_catalog => {}
        Err(_) => {
            return Err(SyncCommandError::MissingEnvVar(
                "SHOP_ACCESS_TOKEN".to_string(),
            ));
        }
    }
    if let Ok(refresh) = std::env::var("SHOP_REFRESH_TOKEN") {
        credentials.set("refresh_token", refresh);
    }

    Ok(Shop::new(shop_id, platform, credentials))
}
