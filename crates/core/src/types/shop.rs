//! A connected external marketplace shop.

use crate::types::credential::CredentialMap;
use crate::types::id::ShopId;

/// One connected shop on an external commerce platform.
///
/// Owned by the shop store. The sync pipeline never deletes shops; only
/// token-refresh operations and explicit credential updates mutate the
/// credential map.
#[derive(Debug, Clone)]
pub struct Shop {
    /// Internal shop identifier.
    pub id: ShopId,
    /// Platform name used to resolve an adapter (e.g. `"cafe24"`).
    pub platform: String,
    /// Opaque credential map (access token, refresh token, ...).
    pub credentials: CredentialMap,
}

impl Shop {
    /// Create a shop record.
    #[must_use]
    pub fn new(id: ShopId, platform: impl Into<String>, credentials: CredentialMap) -> Self {
        Self {
            id,
            platform: platform.into(),
            credentials,
        }
    }
}
