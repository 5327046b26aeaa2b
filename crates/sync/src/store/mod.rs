//! Store contracts for the sync pipeline's external collaborators.
//!
//! The pipeline consumes the rest of the system through three narrow
//! interfaces: a credential/shop lookup service, a persistent
//! product/variant/inventory store, and an append-only structured log sink.
//! Production deployments back these with a database; the in-memory
//! implementations in [`memory`] serve tests and the CLI preview mode.

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use stocklink_core::{
    CredentialPatch, InventoryMovement, Product, ProductId, Shop, ShopId, SyncLogEntry, Variant,
};

pub use memory::{MemoryProductStore, MemoryShopStore, MemorySyncLogStore};

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g. duplicate sku or external product id).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Underlying storage failed.
    #[error("storage error: {0}")]
    Io(String),
}

/// Credential/shop lookup service.
///
/// Shops are mutated only by token-refresh operations and explicit
/// credential updates; the sync pipeline never deletes them.
#[async_trait]
pub trait ShopStore: Send + Sync {
    /// Look up one shop by id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the underlying storage fails.
    async fn get_shop(&self, shop_id: ShopId) -> Result<Option<Shop>, StoreError>;

    /// Merge a credential patch into a shop's credential map. Keys absent
    /// from the patch are left untouched.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the shop does not exist.
    async fn merge_credentials(
        &self,
        shop_id: ShopId,
        patch: CredentialPatch,
    ) -> Result<Shop, StoreError>;
}

/// Persistent product/variant/inventory store.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Find a product by its external platform id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the underlying storage fails.
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<Product>, StoreError>;

    /// Find a product by its platform-native code.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the underlying storage fails.
    async fn find_by_code(&self, code: &str) -> Result<Option<Product>, StoreError>;

    /// Insert a new product, assigning its id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the external product id is already
    /// linked to another product.
    async fn insert_product(&self, product: Product) -> Result<Product, StoreError>;

    /// Update an existing product in place.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the product does not exist.
    async fn update_product(&self, product: Product) -> Result<Product, StoreError>;

    /// Find a variant by its sku.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the underlying storage fails.
    async fn find_variant_by_sku(&self, sku: &str) -> Result<Option<Variant>, StoreError>;

    /// Insert a new variant, assigning its id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the sku already exists.
    async fn insert_variant(&self, variant: Variant) -> Result<Variant, StoreError>;

    /// Update an existing variant in place.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the variant does not exist.
    async fn update_variant(&self, variant: Variant) -> Result<Variant, StoreError>;

    /// Append one inventory ledger entry. Ledger entries are never mutated
    /// or deleted.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the underlying storage fails.
    async fn record_movement(&self, movement: InventoryMovement) -> Result<(), StoreError>;

    /// All products, for reporting and tests.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the underlying storage fails.
    async fn products(&self) -> Result<Vec<Product>, StoreError>;

    /// All variants belonging to one product.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the underlying storage fails.
    async fn variants_of(&self, product_id: ProductId) -> Result<Vec<Variant>, StoreError>;

    /// All ledger entries, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the underlying storage fails.
    async fn movements(&self) -> Result<Vec<InventoryMovement>, StoreError>;
}

/// Append-only structured log sink.
///
/// Callers should go through [`crate::logging::SyncLogger`], which guards
/// against sink failures; a failed log write must never abort a sync.
#[async_trait]
pub trait SyncLogStore: Send + Sync {
    /// Append one entry.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the underlying storage fails.
    async fn append(&self, entry: SyncLogEntry) -> Result<(), StoreError>;

    /// List entries ordered newest-first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the underlying storage fails.
    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<SyncLogEntry>, StoreError>;
}
