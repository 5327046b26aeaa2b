//! Append-only inventory ledger entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::id::{ProductId, VariantId};

/// Why an inventory ledger entry was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Quantity reported by an external marketplace sync.
    Import,
}

impl MovementKind {
    /// Stable string form used in log metadata.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Import => "import",
        }
    }
}

/// One append-only inventory ledger entry.
///
/// The ledger records sync events, not deltas: every variant touched by a
/// successful reconciliation gets exactly one entry, even when the reported
/// quantity is unchanged. Entries are never mutated or deleted; they are the
/// sole source of truth for "why did stock change."
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryMovement {
    /// Ledger entry identity.
    pub id: Uuid,
    /// Product the movement belongs to.
    pub product_id: ProductId,
    /// Variant the movement belongs to.
    pub variant_id: VariantId,
    /// Quantity reported by the external source at sync time.
    pub quantity: i64,
    /// Why the entry exists.
    pub kind: MovementKind,
    /// Human-readable note identifying the external source.
    pub note: String,
    /// When the entry was appended.
    pub created_at: DateTime<Utc>,
}

impl InventoryMovement {
    /// Build a new import ledger entry stamped with the current time.
    #[must_use]
    pub fn import(
        product_id: ProductId,
        variant_id: VariantId,
        quantity: i64,
        note: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id,
            variant_id,
            quantity,
            kind: MovementKind::Import,
            note: note.into(),
            created_at: Utc::now(),
        }
    }
}
