//! Platform-neutral product records.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A product as reported by an external platform, normalized into a
/// platform-neutral shape.
///
/// Produced per fetch invocation and handed to the reconciliation engine;
/// never persisted as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalProduct {
    /// The platform's identifier for the product; reconciliation key.
    pub external_id: String,
    /// The platform's native product code, when it has one distinct from the
    /// identifier.
    pub code: Option<String>,
    /// Display name.
    pub name: String,
    /// List price.
    pub price: Decimal,
    /// Stock quantity reported by the platform.
    pub inventory_quantity: i64,
    /// Whether the platform currently offers the product for sale.
    pub is_selling: bool,
    /// Unordered key-value attributes distinguishing a variant (color, size,
    /// ...). Absent means the product has a single implicit variant.
    pub option_map: Option<BTreeMap<String, String>>,
    /// Barcodes reported by the platform, if any.
    pub barcodes: Vec<String>,
    /// Primary image URL.
    pub image_url: Option<String>,
    /// Platform category label.
    pub category: Option<String>,
    /// Brand name.
    pub brand: Option<String>,
    /// Country/region of origin.
    pub origin: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
    /// When the platform last updated the product.
    pub last_updated: Option<DateTime<Utc>>,
}

impl ExternalProduct {
    /// Build a minimal record; remaining fields start empty.
    #[must_use]
    pub fn new(external_id: impl Into<String>, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            external_id: external_id.into(),
            code: None,
            name: name.into(),
            price,
            inventory_quantity: 0,
            is_selling: true,
            option_map: None,
            barcodes: Vec::new(),
            image_url: None,
            category: None,
            brand: None,
            origin: None,
            description: None,
            last_updated: None,
        }
    }

    /// Attach an option map (builder style, used heavily in tests).
    #[must_use]
    pub fn with_options<K: Into<String>, V: Into<String>>(
        mut self,
        options: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        self.option_map = Some(
            options
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Set the reported stock quantity (builder style).
    #[must_use]
    pub const fn with_quantity(mut self, quantity: i64) -> Self {
        self.inventory_quantity = quantity;
        self
    }
}
