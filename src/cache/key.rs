//! Tenant-scoped cache key construction.
//!
//! Keys have the shape `<tenant>:<namespace>:<part>[:<part>...]`. The same
//! inputs always produce the same key, so lookups never depend on anything
//! but the caller's arguments.

use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::cache::CacheError;

/// Separator between key segments.
pub const KEY_SEPARATOR: char = ':';

/// Suffix appended to a key to form its lock key.
const LOCK_SUFFIX: &str = "lock";

/// Number of hex characters of the SHA-256 digest kept in secure keys.
const DIGEST_HEX_LEN: usize = 16;

/// A fully built, validated cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Build a key from a tenant, a namespace and one or more parts.
    ///
    /// Tenant and namespace must be non-empty and free of whitespace and of
    /// the separator. Parts must be non-empty and free of the separator.
    pub fn new<S: AsRef<str>>(tenant: &str, namespace: &str, parts: &[S]) -> Result<Self, CacheError> {
        validate_segment("tenant", tenant)?;
        validate_segment("namespace", namespace)?;
        if parts.is_empty() {
            return Err(CacheError::InvalidKey(
                "at least one key part is required".to_string(),
            ));
        }

        let mut key = String::with_capacity(tenant.len() + namespace.len() + 16);
        key.push_str(tenant);
        key.push(KEY_SEPARATOR);
        key.push_str(namespace);
        for part in parts {
            let part = part.as_ref();
            validate_part(part)?;
            key.push(KEY_SEPARATOR);
            key.push_str(part);
        }

        Ok(Self(key))
    }

    /// Build a key whose last part is a short digest of `payload`.
    ///
    /// The payload is serialized to JSON and hashed with SHA-256; only the
    /// first 64 bits of the digest are kept. The plaintext driving the key
    /// never appears in the store, at the price of a small collision risk.
    pub fn secure<T: Serialize + ?Sized>(
        tenant: &str,
        namespace: &str,
        payload: &T,
    ) -> Result<Self, CacheError> {
        Self::new(tenant, namespace, &[payload_digest(payload)?])
    }

    /// Build a key from plain parts followed by a digest of `payload`.
    pub fn with_digest<S: AsRef<str>, T: Serialize + ?Sized>(
        tenant: &str,
        namespace: &str,
        parts: &[S],
        payload: &T,
    ) -> Result<Self, CacheError> {
        let mut all: Vec<String> = parts.iter().map(|p| p.as_ref().to_string()).collect();
        all.push(payload_digest(payload)?);
        Self::new(tenant, namespace, &all)
    }

    /// Key of the lock guarding this entry.
    pub fn lock_key(&self) -> String {
        format!("{}{}{}", self.0, KEY_SEPARATOR, LOCK_SUFFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Validate a tenant identifier or namespace.
pub fn validate_segment(what: &str, value: &str) -> Result<(), CacheError> {
    if value.is_empty() {
        return Err(CacheError::InvalidKey(format!("{} must not be empty", what)));
    }
    if value.contains(KEY_SEPARATOR) || value.chars().any(char::is_whitespace) {
        return Err(CacheError::InvalidKey(format!(
            "{} '{}' must not contain '{}' or whitespace",
            what, value, KEY_SEPARATOR
        )));
    }
    Ok(())
}

fn validate_part(part: &str) -> Result<(), CacheError> {
    if part.is_empty() {
        return Err(CacheError::InvalidKey("key parts must not be empty".to_string()));
    }
    if part.contains(KEY_SEPARATOR) {
        return Err(CacheError::InvalidKey(format!(
            "key part '{}' must not contain '{}'",
            part, KEY_SEPARATOR
        )));
    }
    Ok(())
}

fn payload_digest<T: Serialize + ?Sized>(payload: &T) -> Result<String, CacheError> {
    let canonical = serde_json::to_vec(payload)?;
    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    let digest = hex::encode(hasher.finalize());
    Ok(digest[..DIGEST_HEX_LEN].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_key_joins_segments() {
        let key = CacheKey::new("acme", "forecast", &["sku-1", "12"]).unwrap();
        assert_eq!(key.as_str(), "acme:forecast:sku-1:12");
        assert_eq!(key.lock_key(), "acme:forecast:sku-1:12:lock");
    }

    #[test]
    fn test_key_rejects_invalid_segments() {
        assert!(CacheKey::new("", "ns", &["a"]).is_err());
        assert!(CacheKey::new("ac:me", "ns", &["a"]).is_err());
        assert!(CacheKey::new("acme", "n s", &["a"]).is_err());
        assert!(CacheKey::new("acme", "ns", &["a:b"]).is_err());
        assert!(CacheKey::new("acme", "ns", &[""]).is_err());
        assert!(CacheKey::new::<&str>("acme", "ns", &[]).is_err());
    }

    #[test]
    fn test_secure_key_hides_payload() {
        let payload = json!({"email": "buyer@example.com", "region": "emea"});
        let key = CacheKey::secure("acme", "report", &payload).unwrap();
        assert!(!key.as_str().contains("buyer"));
        let digest = key.as_str().rsplit(':').next().unwrap();
        assert_eq!(digest.len(), DIGEST_HEX_LEN);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_secure_key_differs_by_payload() {
        let a = CacheKey::secure("acme", "report", &json!({"q": 1})).unwrap();
        let b = CacheKey::secure("acme", "report", &json!({"q": 2})).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_with_digest_keeps_plain_parts() {
        let key = CacheKey::with_digest("acme", "forecast", &["sku-9"], &json!([1, 2, 3])).unwrap();
        assert!(key.as_str().starts_with("acme:forecast:sku-9:"));
        assert_eq!(key.as_str().split(':').count(), 4);
    }

    proptest! {
        #[test]
        fn prop_key_is_deterministic(
            tenant in "[a-z0-9_-]{1,16}",
            namespace in "[a-z0-9_-]{1,16}",
            parts in proptest::collection::vec("[A-Za-z0-9_. -]{1,12}", 1..4),
        ) {
            let first = CacheKey::new(&tenant, &namespace, &parts).unwrap();
            let second = CacheKey::new(&tenant, &namespace, &parts).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_secure_key_is_deterministic(
            tenant in "[a-z0-9_-]{1,16}",
            values in proptest::collection::vec(any::<i64>(), 0..8),
        ) {
            let first = CacheKey::secure(&tenant, "digest", &values).unwrap();
            let second = CacheKey::secure(&tenant, "digest", &values).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
