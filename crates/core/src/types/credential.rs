//! Opaque credential storage for external platform shops.
//!
//! Credentials are a string-keyed map of secret values. The sync pipeline
//! only ever reads two well-known keys (`access_token`, `refresh_token`);
//! platform adapters may stash whatever else they need alongside them.
//!
//! Updates go through [`CredentialMap::merge`], which merges a patch into the
//! existing map rather than replacing it, so a token refresh never wipes out
//! unrelated keys.

use std::collections::BTreeMap;

use secrecy::{ExposeSecret, SecretString};

/// Well-known credential key for the platform access token.
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Well-known credential key for the platform refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// An opaque map of named secrets belonging to one shop.
///
/// Implements `Debug` manually so secret values are never logged.
#[derive(Clone, Default)]
pub struct CredentialMap {
    entries: BTreeMap<String, SecretString>,
}

/// A partial credential update. Keys present in the patch overwrite the
/// matching keys in the target map; absent keys are left untouched.
pub type CredentialPatch = BTreeMap<String, String>;

impl CredentialMap {
    /// Create an empty credential map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Build a map holding a single access token.
    #[must_use]
    pub fn with_access_token(token: impl Into<String>) -> Self {
        let mut map = Self::new();
        map.set(ACCESS_TOKEN_KEY, token.into());
        map
    }

    /// Set one credential value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries
            .insert(key.into(), SecretString::from(value.into()));
    }

    /// Look up a credential value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&SecretString> {
        self.entries.get(key)
    }

    /// The stored access token, if any.
    #[must_use]
    pub fn access_token(&self) -> Option<&SecretString> {
        self.get(ACCESS_TOKEN_KEY)
    }

    /// The stored refresh token, if any.
    #[must_use]
    pub fn refresh_token(&self) -> Option<&SecretString> {
        self.get(REFRESH_TOKEN_KEY)
    }

    /// Merge a patch into this map. Existing keys not named by the patch
    /// survive unchanged.
    pub fn merge(&mut self, patch: CredentialPatch) {
        for (key, value) in patch {
            self.entries.insert(key, SecretString::from(value));
        }
    }

    /// Number of stored credential entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map holds no credentials at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over credential keys (values stay secret).
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for CredentialMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for key in self.entries.keys() {
            map.entry(key, &"[REDACTED]");
        }
        map.finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CredentialMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.set(key, value);
        }
        map
    }
}

/// Compare a stored secret against an expected plain value. Test helper used
/// by store implementations; not part of the sync pipeline's hot path.
#[must_use]
pub fn secret_eq(secret: &SecretString, expected: &str) -> bool {
    secret.expose_secret() == expected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_preserves_unrelated_keys() {
        let mut map = CredentialMap::from_iter([
            (ACCESS_TOKEN_KEY, "old-access"),
            (REFRESH_TOKEN_KEY, "refresh-1"),
            ("mall_id", "acme"),
        ]);

        let patch = CredentialPatch::from([(ACCESS_TOKEN_KEY.to_string(), "new-access".to_string())]);
        map.merge(patch);

        assert!(secret_eq(map.access_token().unwrap(), "new-access"));
        assert!(secret_eq(map.refresh_token().unwrap(), "refresh-1"));
        assert!(secret_eq(map.get("mall_id").unwrap(), "acme"));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_debug_redacts_values() {
        let map = CredentialMap::with_access_token("super-secret");
        let rendered = format!("{map:?}");
        assert!(rendered.contains("access_token"));
        assert!(rendered.contains("REDACTED"));
        assert!(!rendered.contains("super-secret"));
    }
}
