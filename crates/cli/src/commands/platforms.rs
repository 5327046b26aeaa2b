//! `stocklink platforms` - list the statically registered adapter set.

use std::sync::Arc;

use stocklink_sync::store::{MemoryShopStore, MemorySyncLogStore};
use stocklink_sync::{AdapterRegistry, ConfigError, SyncConfig, SyncLogger};

/// Print the registered platform names.
///
/// # Errors
///
/// Returns `ConfigError` when the environment is not configured.
pub fn run() -> Result<(), ConfigError> {
    let config = SyncConfig::from_env()?;
    let registry = AdapterRegistry::with_builtin_adapters(
        &config,
        Arc::new(MemoryShopStore::new()),
        SyncLogger::new(Arc::new(MemorySyncLogStore::new())),
    );

    for platform in registry.platforms() {
        tracing::info!(%platform, "registered adapter");
    }
    Ok(())
}
