//! Shared harness for Stocklink integration tests.
//!
//! Builds a complete in-memory pipeline (shop store, product store, log
//! sink) around a Cafe24 adapter pointed at a wiremock server, with backoff
//! sleeping disabled so retry tests run instantly.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use stocklink_core::{CredentialMap, Shop, ShopId};
use stocklink_sync::adapters::{Cafe24Adapter, Cafe24Config, NoopSleeper, RetryPolicy};
use stocklink_sync::store::{MemoryProductStore, MemoryShopStore, MemorySyncLogStore};
use stocklink_sync::SyncLogger;

/// The shop id used throughout the integration tests.
pub const TEST_SHOP: ShopId = ShopId::new(1);

/// In-memory collaborators shared by a test pipeline.
pub struct TestWorld {
    pub shops: Arc<MemoryShopStore>,
    pub products: Arc<MemoryProductStore>,
    pub sink: Arc<MemorySyncLogStore>,
    pub logger: SyncLogger,
}

impl TestWorld {
    /// Build the collaborators and seed one shop with an access token.
    pub async fn with_shop(platform: &str, access_token: &str) -> Self {
        let shops = Arc::new(MemoryShopStore::new());
        shops
            .put_shop(Shop::new(
                TEST_SHOP,
                platform,
                CredentialMap::with_access_token(access_token),
            ))
            .await;

        let sink = Arc::new(MemorySyncLogStore::new());
        Self {
            shops,
            products: Arc::new(MemoryProductStore::new()),
            logger: SyncLogger::new(sink.clone()),
            sink,
        }
    }

    /// A Cafe24 adapter pointed at a mock server, with instant backoff.
    pub fn cafe24_adapter(&self, base_url: &str, max_attempts: u32) -> Cafe24Adapter {
        Cafe24Adapter::new(
            Cafe24Config {
                base_url: base_url.to_string(),
                token_refresh_url: format!("{base_url}/auth/refresh"),
                fixture_catalog: false,
            },
            self.shops.clone(),
            self.logger.clone(),
        )
        .with_policy(RetryPolicy {
            max_attempts,
            ..RetryPolicy::default()
        })
        .with_sleeper(Arc::new(NoopSleeper))
    }
}

/// A minimal Cafe24 products payload with the given product names.
#[must_use]
pub fn products_payload(names: &[&str]) -> serde_json::Value {
    let products: Vec<serde_json::Value> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            serde_json::json!({
                "product_no": i + 1,
                "product_name": name,
                "price": "10000.00",
                "quantity": 5,
                "selling": "T",
            })
        })
        .collect();
    serde_json::json!({ "products": products })
}
