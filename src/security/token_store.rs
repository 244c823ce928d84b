//! Server-side token records: revocation and client binding.
//!
//! Verifying the signature of a bearer token is not enough — a token must
//! also still be *known*: present in this store, not revoked, not expired,
//! and presented from the client fingerprint it was issued under.

use dashmap::DashMap;
use sha2::{Digest, Sha256};

/// Persisted record of an issued token, keyed by `jti`.
#[derive(Debug, Clone)]
pub struct TokenRecord {
    pub jti: String,
    pub subject: String,
    /// SHA-256 over client IP + user agent, hex encoded.
    pub fingerprint: String,
    pub issued_at: u64,
    pub expires_at: u64,
    pub revoked: bool,
}

impl TokenRecord {
    #[must_use]
    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.expires_at
    }
}

/// Storage for issued-token records.
///
/// Production hosts back this with their database; the in-memory
/// implementation serves tests and single-process deployments.
pub trait TokenStore: Send + Sync {
    fn insert(&self, record: TokenRecord);
    fn get(&self, jti: &str) -> Option<TokenRecord>;
    /// Mark a token revoked. Returns false when the jti is unknown.
    fn revoke(&self, jti: &str) -> bool;
}

/// Lock-free concurrent in-memory token store.
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    records: DashMap<String, TokenRecord>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl TokenStore for InMemoryTokenStore {
    fn insert(&self, record: TokenRecord) {
        self.records.insert(record.jti.clone(), record);
    }

    fn get(&self, jti: &str) -> Option<TokenRecord> {
        self.records.get(jti).map(|r| r.clone())
    }

    fn revoke(&self, jti: &str) -> bool {
        match self.records.get_mut(jti) {
            Some(mut record) => {
                record.revoked = true;
                true
            }
            None => false,
        }
    }
}

/// Hash the originating client's IP and user agent into the fingerprint a
/// token is bound to.
#[must_use]
pub fn client_fingerprint(ip: &str, user_agent: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(ip.as_bytes());
    hasher.update(b"\x1f");
    hasher.update(user_agent.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(jti: &str) -> TokenRecord {
        TokenRecord {
            jti: jti.to_string(),
            subject: "u1".to_string(),
            fingerprint: client_fingerprint("10.0.0.1", "test-agent"),
            issued_at: 1_000,
            expires_at: 2_000,
            revoked: false,
        }
    }

    #[test]
    fn revoke_marks_record() {
        let store = InMemoryTokenStore::new();
        store.insert(record("t1"));
        assert!(store.revoke("t1"));
        assert!(store.get("t1").unwrap().revoked);
        assert!(!store.revoke("missing"));
    }

    #[test]
    fn expiry_is_inclusive_of_deadline() {
        let r = record("t1");
        assert!(!r.is_expired(1_999));
        assert!(r.is_expired(2_000));
    }

    #[test]
    fn fingerprint_differs_by_ip_and_agent() {
        let base = client_fingerprint("10.0.0.1", "agent");
        assert_eq!(base, client_fingerprint("10.0.0.1", "agent"));
        assert_ne!(base, client_fingerprint("10.0.0.2", "agent"));
        assert_ne!(base, client_fingerprint("10.0.0.1", "other"));
    }
}
