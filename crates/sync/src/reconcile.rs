//! Idempotent reconciliation of external products into the internal store.
//!
//! Per external product: match an internal product by external id (falling
//! back to the platform code), create or update it in place, resolve the
//! variant by a deterministic sku, and append one inventory ledger entry per
//! variant touched. Dry-run mode runs the same matching and derivation but
//! mutates nothing.
//!
//! A failure on one product never aborts the rest of a batch; the batch form
//! returns a per-item report instead of throwing.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::instrument;

use stocklink_core::{
    InventoryMovement, PLACEHOLDER_ID, Product, ProductId, Variant, VariantId,
};

use crate::adapters::ExternalProduct;
use crate::store::{ProductStore, StoreError};

/// Separator between `key=value` pairs in the sku hash input.
const OPTION_SEPARATOR: &str = "/";

/// Length of the hex hash suffix appended to option-variant skus.
const SKU_HASH_LEN: usize = 8;

/// Errors surfaced per reconciled item.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The external record is missing required fields.
    #[error("invalid record: {reason}")]
    Invalid {
        /// Why the record was rejected.
        reason: String,
    },

    /// A store write failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Options for a reconciliation pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpsertOptions {
    /// Compute everything but write nothing; returned records use
    /// placeholder ids where a persisted id would otherwise be required.
    pub dry_run: bool,
}

/// Result of reconciling one external product.
#[derive(Debug, Clone)]
pub struct UpsertOutcome {
    /// The product as written (or as it would be written under dry-run).
    pub product: Product,
    /// The variant as written (or simulated).
    pub variant: Variant,
    /// The ledger entry recorded (or simulated).
    pub movement: InventoryMovement,
    /// Whether the product was newly created rather than updated.
    pub product_created: bool,
    /// Whether the variant was newly created rather than updated.
    pub variant_created: bool,
}

/// One rejected or failed item in a batch report.
#[derive(Debug, Clone, Serialize)]
pub struct ImportItemError {
    /// External id of the offending record (empty when the id itself was
    /// missing).
    pub external_id: String,
    /// Why the item failed.
    pub reason: String,
}

/// Records written by a batch pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WrittenRecords {
    /// Products created or updated.
    pub products: Vec<Product>,
    /// Variants created or updated.
    pub variants: Vec<Variant>,
}

/// Per-item outcome summary of a batch reconciliation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    /// Items presented to the engine.
    pub total: usize,
    /// Items reconciled successfully.
    pub valid: usize,
    /// Items rejected by validation.
    pub invalid: usize,
    /// Itemized failures (validation and persistence alike).
    pub errors: Vec<ImportItemError>,
    /// Records written (or simulated under dry-run).
    pub written: WrittenRecords,
}

/// Derive the deterministic sku for an option combination.
///
/// Without options the sku is the base itself (the product code, or the
/// internal id when no code exists). With options, the sorted `key=value`
/// pairs are joined and a short stable hash of the joined string is appended
/// to the base, so the same combination always reduces to the same sku
/// regardless of map iteration order.
#[must_use]
pub fn derive_sku(base: &str, option_map: Option<&BTreeMap<String, String>>) -> String {
    match option_map {
        None => base.to_string(),
        Some(options) if options.is_empty() => base.to_string(),
        Some(options) => {
            let joined = options
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect::<Vec<_>>()
                .join(OPTION_SEPARATOR);
            let digest = Sha256::digest(joined.as_bytes());
            let mut hash = hex::encode(digest);
            hash.truncate(SKU_HASH_LEN);
            format!("{base}-{hash}")
        }
    }
}

/// The reconciliation engine.
#[derive(Clone)]
pub struct ReconcileEngine {
    store: Arc<dyn ProductStore>,
}

impl ReconcileEngine {
    /// Wrap a product store.
    #[must_use]
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        Self { store }
    }

    /// Reconcile one external product into the store.
    ///
    /// # Errors
    ///
    /// Returns `ReconcileError::Invalid` for records missing required fields
    /// and `ReconcileError::Store` when a write fails.
    #[instrument(skip(self, external), fields(external_id = %external.external_id))]
    pub async fn upsert(
        &self,
        external: &ExternalProduct,
        options: UpsertOptions,
    ) -> Result<UpsertOutcome, ReconcileError> {
        validate(external)?;

        let (product, product_created) = self.resolve_product(external, options).await?;
        let (variant, variant_created) = self.resolve_variant(external, &product, options).await?;

        // The ledger records sync events, not deltas: one entry per variant
        // touched, even when the quantity is unchanged.
        let movement = InventoryMovement::import(
            product.id,
            variant.id,
            variant.stock,
            format!("import from external product {}", external.external_id),
        );
        if !options.dry_run {
            self.store.record_movement(movement.clone()).await?;
        }

        Ok(UpsertOutcome {
            product,
            variant,
            movement,
            product_created,
            variant_created,
        })
    }

    /// Reconcile a batch. Items are processed independently; one failure
    /// never aborts the rest.
    #[instrument(skip(self, externals), fields(total = externals.len(), dry_run = options.dry_run))]
    pub async fn import_batch(
        &self,
        externals: &[ExternalProduct],
        options: UpsertOptions,
    ) -> ImportReport {
        let mut report = ImportReport {
            total: externals.len(),
            ..ImportReport::default()
        };

        for external in externals {
            match self.upsert(external, options).await {
                Ok(outcome) => {
                    report.valid += 1;
                    report.written.products.push(outcome.product);
                    report.written.variants.push(outcome.variant);
                }
                Err(error) => {
                    if matches!(error, ReconcileError::Invalid { .. }) {
                        report.invalid += 1;
                    }
                    report.errors.push(ImportItemError {
                        external_id: external.external_id.clone(),
                        reason: error.to_string(),
                    });
                }
            }
        }

        report
    }

    /// Match or create the internal product for an external record.
    async fn resolve_product(
        &self,
        external: &ExternalProduct,
        options: UpsertOptions,
    ) -> Result<(Product, bool), ReconcileError> {
        let existing = match self
            .store
            .find_by_external_id(&external.external_id)
            .await?
        {
            Some(product) => Some(product),
            None => match external.code.as_deref() {
                Some(code) if !code.is_empty() => self.store.find_by_code(code).await?,
                _ => None,
            },
        };

        if let Some(mut product) = existing {
            // Internal identity and creation metadata survive every sync.
            apply_external_fields(&mut product, external);
            let product = if options.dry_run {
                product
            } else {
                self.store.update_product(product).await?
            };
            return Ok((product, false));
        }

        let now = Utc::now();
        let mut product = Product {
            id: ProductId::new(PLACEHOLDER_ID),
            name: external.name.clone(),
            code: external
                .code
                .clone()
                .unwrap_or_else(|| external.external_id.clone()),
            external_product_id: Some(external.external_id.clone()),
            price: external.price,
            stock: clamp_quantity(external.inventory_quantity),
            is_selling: external.is_selling,
            description: external.description.clone().unwrap_or_default(),
            image_url: external.image_url.clone(),
            origin: external.origin.clone(),
            brand: external.brand.clone(),
            created_at: now,
            updated_at: now,
        };
        if !options.dry_run {
            product = self.store.insert_product(product).await?;
        }
        Ok((product, true))
    }

    /// Match or create the variant for an external record.
    async fn resolve_variant(
        &self,
        external: &ExternalProduct,
        product: &Product,
        options: UpsertOptions,
    ) -> Result<(Variant, bool), ReconcileError> {
        let sku_base = if product.code.is_empty() {
            product.id.to_string()
        } else {
            product.code.clone()
        };
        let sku = derive_sku(&sku_base, external.option_map.as_ref());

        let stock = clamp_quantity(external.inventory_quantity);
        let option_values = external.option_map.clone().unwrap_or_default();
        let barcode = external.barcodes.first().cloned();

        if let Some(mut variant) = self.store.find_variant_by_sku(&sku).await? {
            variant.price = external.price;
            variant.stock = stock;
            variant.option_values = option_values;
            variant.barcode = barcode;
            let variant = if options.dry_run {
                variant
            } else {
                self.store.update_variant(variant).await?
            };
            return Ok((variant, false));
        }

        let mut variant = Variant {
            id: VariantId::new(PLACEHOLDER_ID),
            product_id: product.id,
            sku,
            price: external.price,
            stock,
            option_values,
            barcode,
        };
        if !options.dry_run {
            variant = self.store.insert_variant(variant).await?;
        }
        Ok((variant, true))
    }
}

fn validate(external: &ExternalProduct) -> Result<(), ReconcileError> {
    if external.external_id.trim().is_empty() {
        return Err(ReconcileError::Invalid {
            reason: "missing external id".to_string(),
        });
    }
    if external.name.trim().is_empty() {
        return Err(ReconcileError::Invalid {
            reason: "missing name".to_string(),
        });
    }
    Ok(())
}

fn apply_external_fields(product: &mut Product, external: &ExternalProduct) {
    product.name = external.name.clone();
    product.external_product_id = Some(external.external_id.clone());
    product.price = external.price;
    product.stock = clamp_quantity(external.inventory_quantity);
    product.is_selling = external.is_selling;
    if let Some(description) = &external.description {
        product.description = description.clone();
    }
    if external.image_url.is_some() {
        product.image_url = external.image_url.clone();
    }
    if external.origin.is_some() {
        product.origin = external.origin.clone();
    }
    if external.brand.is_some() {
        product.brand = external.brand.clone();
    }
    product.updated_at = Utc::now();
}

const fn clamp_quantity(quantity: i64) -> i64 {
    if quantity < 0 { 0 } else { quantity }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::store::MemoryProductStore;

    use super::*;

    fn engine() -> (ReconcileEngine, Arc<MemoryProductStore>) {
        let store = Arc::new(MemoryProductStore::new());
        (ReconcileEngine::new(store.clone()), store)
    }

    fn shirt() -> ExternalProduct {
        ExternalProduct::new("E1", "Shirt", Decimal::new(10_000, 0))
            .with_quantity(5)
            .with_options([("color", "red"), ("size", "M")])
    }

    #[test]
    fn test_sku_deterministic_across_insertion_order() {
        let forward: BTreeMap<String, String> = [("color", "red"), ("size", "M")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let reversed: BTreeMap<String, String> = [("size", "M"), ("color", "red")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        assert_eq!(
            derive_sku("P1", Some(&forward)),
            derive_sku("P1", Some(&reversed))
        );
    }

    #[test]
    fn test_sku_distinct_combinations_do_not_collide() {
        let red: BTreeMap<String, String> =
            [("color".to_string(), "red".to_string())].into_iter().collect();
        let blue: BTreeMap<String, String> =
            [("color".to_string(), "blue".to_string())].into_iter().collect();

        assert_ne!(derive_sku("P1", Some(&red)), derive_sku("P1", Some(&blue)));
    }

    #[test]
    fn test_sku_without_options_is_the_base() {
        assert_eq!(derive_sku("P1", None), "P1");
        let empty = BTreeMap::new();
        assert_eq!(derive_sku("P1", Some(&empty)), "P1");
    }

    #[tokio::test]
    async fn test_upsert_twice_is_idempotent() {
        let (engine, store) = engine();
        let external = shirt();

        let first = engine
            .upsert(&external, UpsertOptions::default())
            .await
            .unwrap();
        assert!(first.product_created);
        assert!(first.variant_created);

        let second = engine
            .upsert(&external, UpsertOptions::default())
            .await
            .unwrap();
        assert!(!second.product_created);
        assert!(!second.variant_created);
        assert_eq!(first.product.id, second.product.id);
        assert_eq!(first.variant.sku, second.variant.sku);

        assert_eq!(store.products().await.unwrap().len(), 1);
        assert_eq!(store.variants_of(first.product.id).await.unwrap().len(), 1);

        // Two syncs, two ledger entries, each recording quantity 5.
        let movements = store.movements().await.unwrap();
        assert_eq!(movements.len(), 2);
        assert!(movements.iter().all(|m| m.quantity == 5));
    }

    #[tokio::test]
    async fn test_match_falls_back_to_code() {
        let (engine, store) = engine();

        let mut by_code = shirt();
        by_code.code = Some("P0000X".to_string());
        engine
            .upsert(&by_code, UpsertOptions::default())
            .await
            .unwrap();

        // Same code, different external id: must update, not duplicate.
        let mut renumbered = by_code.clone();
        renumbered.external_id = "E2".to_string();
        let outcome = engine
            .upsert(&renumbered, UpsertOptions::default())
            .await
            .unwrap();
        assert!(!outcome.product_created);
        assert_eq!(store.products().await.unwrap().len(), 1);
        assert_eq!(
            store
                .products()
                .await
                .unwrap()
                .first()
                .unwrap()
                .external_product_id
                .as_deref(),
            Some("E2")
        );
    }

    #[tokio::test]
    async fn test_dry_run_mutates_nothing() {
        let (engine, store) = engine();
        let outcome = engine
            .upsert(&shirt(), UpsertOptions { dry_run: true })
            .await
            .unwrap();

        assert_eq!(outcome.product.id.as_i32(), PLACEHOLDER_ID);
        assert_eq!(outcome.product.name, "Shirt");
        assert!(outcome.variant.sku.starts_with("E1-"));
        assert_eq!(outcome.movement.quantity, 5);

        assert!(store.products().await.unwrap().is_empty());
        assert!(store.movements().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_batch_isolates_invalid_items() {
        let (engine, store) = engine();
        let mut nameless = ExternalProduct::new("E9", "", Decimal::ZERO);
        nameless.inventory_quantity = 1;
        let batch = vec![shirt(), nameless, ExternalProduct::new("E3", "Mug", Decimal::ONE)];

        let report = engine.import_batch(&batch, UpsertOptions::default()).await;
        assert_eq!(report.total, 3);
        assert_eq!(report.valid, 2);
        assert_eq!(report.invalid, 1);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors.first().unwrap().external_id, "E9");
        assert_eq!(store.products().await.unwrap().len(), 2);
    }

    /// Store wrapper whose ledger rejects entries for one external product,
    /// standing in for a mid-batch persistence failure.
    struct LedgerFailingStore {
        inner: MemoryProductStore,
        poison_note: &'static str,
    }

    #[async_trait::async_trait]
    impl ProductStore for LedgerFailingStore {
        async fn find_by_external_id(
            &self,
            external_id: &str,
        ) -> Result<Option<Product>, StoreError> {
            self.inner.find_by_external_id(external_id).await
        }

        async fn find_by_code(&self, code: &str) -> Result<Option<Product>, StoreError> {
            self.inner.find_by_code(code).await
        }

        async fn insert_product(&self, product: Product) -> Result<Product, StoreError> {
            self.inner.insert_product(product).await
        }

        async fn update_product(&self, product: Product) -> Result<Product, StoreError> {
            self.inner.update_product(product).await
        }

        async fn find_variant_by_sku(&self, sku: &str) -> Result<Option<Variant>, StoreError> {
            self.inner.find_variant_by_sku(sku).await
        }

        async fn insert_variant(&self, variant: Variant) -> Result<Variant, StoreError> {
            self.inner.insert_variant(variant).await
        }

        async fn update_variant(&self, variant: Variant) -> Result<Variant, StoreError> {
            self.inner.update_variant(variant).await
        }

        async fn record_movement(&self, movement: InventoryMovement) -> Result<(), StoreError> {
            if movement.note.contains(self.poison_note) {
                return Err(StoreError::Io("ledger unavailable".to_string()));
            }
            self.inner.record_movement(movement).await
        }

        async fn products(&self) -> Result<Vec<Product>, StoreError> {
            self.inner.products().await
        }

        async fn variants_of(&self, product_id: ProductId) -> Result<Vec<Variant>, StoreError> {
            self.inner.variants_of(product_id).await
        }

        async fn movements(&self) -> Result<Vec<InventoryMovement>, StoreError> {
            self.inner.movements().await
        }
    }

    #[tokio::test]
    async fn test_persistence_failure_does_not_abort_batch() {
        let engine = ReconcileEngine::new(Arc::new(LedgerFailingStore {
            inner: MemoryProductStore::new(),
            poison_note: "E2",
        }));

        let batch = vec![
            ExternalProduct::new("E1", "Shirt", Decimal::ONE).with_quantity(1),
            ExternalProduct::new("E2", "Cursed", Decimal::ONE).with_quantity(1),
            ExternalProduct::new("E3", "Mug", Decimal::ONE).with_quantity(1),
        ];
        let report = engine.import_batch(&batch, UpsertOptions::default()).await;

        assert_eq!(report.valid, 2);
        // Persistence failures are itemized but are not validation rejects.
        assert_eq!(report.invalid, 0);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors.first().unwrap().external_id, "E2");
    }

    #[tokio::test]
    async fn test_negative_quantity_clamped() {
        let (engine, _store) = engine();
        let mut external = ExternalProduct::new("E5", "Ghost", Decimal::ONE);
        external.inventory_quantity = -4;
        let outcome = engine
            .upsert(&external, UpsertOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome.variant.stock, 0);
        assert_eq!(outcome.movement.quantity, 0);
    }

    #[tokio::test]
    async fn test_update_preserves_creation_metadata() {
        let (engine, store) = engine();
        let first = engine
            .upsert(&shirt(), UpsertOptions::default())
            .await
            .unwrap();

        let mut updated = shirt();
        updated.name = "Shirt v2".to_string();
        updated.inventory_quantity = 9;
        let second = engine
            .upsert(&updated, UpsertOptions::default())
            .await
            .unwrap();

        assert_eq!(second.product.created_at, first.product.created_at);
        assert_eq!(second.product.name, "Shirt v2");
        let stored = store.products().await.unwrap();
        assert_eq!(stored.first().unwrap().stock, 9);
    }
}
