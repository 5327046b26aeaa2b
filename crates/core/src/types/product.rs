//! Durable product and variant records.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::id::{ProductId, VariantId};

/// The system's durable product record.
///
/// Created on first sync of a given external product and updated in place on
/// every subsequent sync; the internal identity and `created_at` are
/// preserved across syncs. Never deleted by the sync pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Internal product identifier.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// The platform's native product code; reconciliation fallback key.
    pub code: String,
    /// Reconciliation key back to the external platform, unique when present.
    pub external_product_id: Option<String>,
    /// Current list price.
    pub price: Decimal,
    /// Aggregate stock as last reported by the external source.
    pub stock: i64,
    /// Whether the product is currently offered for sale.
    pub is_selling: bool,
    /// Free-form description carried over from the platform.
    pub description: String,
    /// Primary image URL, if the platform provided one.
    pub image_url: Option<String>,
    /// Country/region of origin, if reported.
    pub origin: Option<String>,
    /// Brand name, if reported.
    pub brand: Option<String>,
    /// When the internal record was first created.
    pub created_at: DateTime<Utc>,
    /// When the internal record was last touched by a sync.
    pub updated_at: DateTime<Utc>,
}

/// A sellable variant of a [`Product`].
///
/// `sku` is the reconciliation key: a deterministic function of the product
/// code and the variant's option combination, so re-running a sync on
/// unchanged input updates rather than duplicates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    /// Internal variant identifier.
    pub id: VariantId,
    /// Owning product.
    pub product_id: ProductId,
    /// Deterministic stock-keeping unit key, unique within the store.
    pub sku: String,
    /// Variant price.
    pub price: Decimal,
    /// Variant stock as last reported.
    pub stock: i64,
    /// Distinguishing attributes (e.g. color, size). Sorted by key.
    pub option_values: BTreeMap<String, String>,
    /// Barcode, if the platform reported one.
    pub barcode: Option<String>,
}
