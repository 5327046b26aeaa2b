//! In-memory reference implementations of the store contracts.
//!
//! Used by unit/integration tests and by the CLI's preview mode. All
//! implementations are `Clone` and share state through `Arc`, so concurrent
//! sync invocations observe each other's writes (a token refreshed by one
//! invocation is visible to the next attempt of another).

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use stocklink_core::{
    CredentialPatch, InventoryMovement, Product, ProductId, Shop, ShopId, SyncLogEntry, Variant,
    VariantId,
};

use super::{ProductStore, ShopStore, StoreError, SyncLogStore};

// =============================================================================
// Shop store
// =============================================================================

/// In-memory shop/credential store.
#[derive(Clone, Default)]
pub struct MemoryShopStore {
    shops: Arc<RwLock<HashMap<ShopId, Shop>>>,
}

impl MemoryShopStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a shop record.
    pub async fn put_shop(&self, shop: Shop) {
        self.shops.write().await.insert(shop.id, shop);
    }
}

#[async_trait]
impl ShopStore for MemoryShopStore {
    async fn get_shop(&self, shop_id: ShopId) -> Result<Option<Shop>, StoreError> {
        Ok(self.shops.read().await.get(&shop_id).cloned())
    }

    async fn merge_credentials(
        &self,
        shop_id: ShopId,
        patch: CredentialPatch,
    ) -> Result<Shop, StoreError> {
        let mut shops = self.shops.write().await;
        let shop = shops.get_mut(&shop_id).ok_or(StoreError::NotFound)?;
        shop.credentials.merge(patch);
        Ok(shop.clone())
    }
}

// =============================================================================
// Product store
// =============================================================================

/// In-memory product/variant/ledger store.
#[derive(Clone, Default)]
pub struct MemoryProductStore {
    inner: Arc<MemoryProductStoreInner>,
}

#[derive(Default)]
struct MemoryProductStoreInner {
    products: RwLock<Vec<Product>>,
    variants: RwLock<Vec<Variant>>,
    movements: RwLock<Vec<InventoryMovement>>,
    next_product_id: AtomicI32,
    next_variant_id: AtomicI32,
}

impl MemoryProductStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn next_product_id(&self) -> ProductId {
        ProductId::new(self.inner.next_product_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    fn next_variant_id(&self) -> VariantId {
        VariantId::new(self.inner.next_variant_id.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<Product>, StoreError> {
        Ok(self
            .inner
            .products
            .read()
            .await
            .iter()
            .find(|p| p.external_product_id.as_deref() == Some(external_id))
            .cloned())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Product>, StoreError> {
        Ok(self
            .inner
            .products
            .read()
            .await
            .iter()
            .find(|p| p.code == code)
            .cloned())
    }

    async fn insert_product(&self, mut product: Product) -> Result<Product, StoreError> {
        let mut products = self.inner.products.write().await;
        if let Some(external_id) = product.external_product_id.as_deref()
            && products
                .iter()
                .any(|p| p.external_product_id.as_deref() == Some(external_id))
        {
            return Err(StoreError::Conflict(format!(
                "external product id already linked: {external_id}"
            )));
        }
        product.id = self.next_product_id();
        products.push(product.clone());
        Ok(product)
    }

    async fn update_product(&self, product: Product) -> Result<Product, StoreError> {
        let mut products = self.inner.products.write().await;
        let slot = products
            .iter_mut()
            .find(|p| p.id == product.id)
            .ok_or(StoreError::NotFound)?;
        *slot = product.clone();
        Ok(product)
    }

    async fn find_variant_by_sku(&self, sku: &str) -> Result<Option<Variant>, StoreError> {
        Ok(self
            .inner
            .variants
            .read()
            .await
            .iter()
            .find(|v| v.sku == sku)
            .cloned())
    }

    async fn insert_variant(&self, mut variant: Variant) -> Result<Variant, StoreError> {
        let mut variants = self.inner.variants.write().await;
        if variants.iter().any(|v| v.sku == variant.sku) {
            return Err(StoreError::Conflict(format!(
                "sku already exists: {}",
                variant.sku
            )));
        }
        variant.id = self.next_variant_id();
        variants.push(variant.clone());
        Ok(variant)
    }

    async fn update_variant(&self, variant: Variant) -> Result<Variant, StoreError> {
        let mut variants = self.inner.variants.write().await;
        let slot = variants
            .iter_mut()
            .find(|v| v.id == variant.id)
            .ok_or(StoreError::NotFound)?;
        *slot = variant.clone();
        Ok(variant)
    }

    async fn record_movement(&self, movement: InventoryMovement) -> Result<(), StoreError> {
        self.inner.movements.write().await.push(movement);
        Ok(())
    }

    async fn products(&self) -> Result<Vec<Product>, StoreError> {
        Ok(self.inner.products.read().await.clone())
    }

    async fn variants_of(&self, product_id: ProductId) -> Result<Vec<Variant>, StoreError> {
        Ok(self
            .inner
            .variants
            .read()
            .await
            .iter()
            .filter(|v| v.product_id == product_id)
            .cloned()
            .collect())
    }

    async fn movements(&self) -> Result<Vec<InventoryMovement>, StoreError> {
        Ok(self.inner.movements.read().await.clone())
    }
}

// =============================================================================
// Sync log store
// =============================================================================

/// In-memory append-only log sink, listed newest-first.
#[derive(Clone, Default)]
pub struct MemorySyncLogStore {
    entries: Arc<RwLock<Vec<SyncLogEntry>>>,
}

impl MemorySyncLogStore {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SyncLogStore for MemorySyncLogStore {
    async fn append(&self, entry: SyncLogEntry) -> Result<(), StoreError> {
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<SyncLogEntry>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .rev()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }
}
