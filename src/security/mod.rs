//! # Security Module
//!
//! Authentication guards and the principal model consumed by the
//! authorization middleware.
//!
//! A [`Guard`] resolves the authenticated principal for a request — or
//! nothing, in which case the middleware fails closed with a 401. The
//! built-in [`JwtGuard`] verifies bearer tokens (signature + expiry), checks
//! the token id against a revocation store, and additionally binds tokens to
//! the client fingerprint they were issued under: a valid token presented
//! from a different IP/user-agent resolves to no principal.
//!
//! Permissions are never carried inside the token. A [`PermissionStore`]
//! flattens the subject's assignments at lookup time, so revoking a
//! permission takes effect on the next request rather than at token expiry.
//!
//! ```rust
//! use portico::security::{GuardRegistry, InMemoryTokenStore, JwtGuard, StaticPermissionStore};
//! use std::sync::Arc;
//!
//! let store = Arc::new(InMemoryTokenStore::new());
//! let permissions = Arc::new(StaticPermissionStore::new());
//! let guard = JwtGuard::new("signing-key", store, permissions);
//!
//! let mut guards = GuardRegistry::new();
//! guards.register("jwt", Arc::new(guard));
//! ```

use crate::server::request::Request;
use std::collections::HashMap;
use std::sync::Arc;

mod jwt_guard;
mod token_store;

pub use jwt_guard::{AuthError, JwtGuard, TokenClaims};
pub use token_store::{client_fingerprint, InMemoryTokenStore, TokenRecord, TokenStore};

/// Name of the guard used when an authorization rule does not specify one.
pub const DEFAULT_GUARD: &str = "jwt";

/// The authenticated caller for the duration of one request.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: String,
    /// Flattened permission list, assembled by the guard at lookup time.
    pub permissions: Vec<String>,
}

impl Principal {
    /// OR semantics: true when at least one required permission is held.
    /// An empty requirement set is satisfied by any principal.
    #[must_use]
    pub fn has_any_permission(&self, required: &[String]) -> bool {
        required.is_empty() || required.iter().any(|r| self.permissions.contains(r))
    }
}

/// Authentication capability consumed by the authorization middleware.
pub trait Guard: Send + Sync {
    /// Resolve the principal presenting this request, or `None` when the
    /// request carries no acceptable credentials.
    fn user(&self, request: &Request) -> Option<Principal>;
}

/// Supplies the flattened permission list for a subject.
pub trait PermissionStore: Send + Sync {
    fn permissions_for(&self, subject: &str) -> Vec<String>;
}

/// In-memory permission assignments, for tests and simple hosts.
#[derive(Debug, Default)]
pub struct StaticPermissionStore {
    assignments: std::sync::RwLock<HashMap<String, Vec<String>>>,
}

impl StaticPermissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign<I, S>(&self, subject: &str, permissions: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Ok(mut map) = self.assignments.write() {
            map.insert(
                subject.to_string(),
                permissions.into_iter().map(Into::into).collect(),
            );
        }
    }
}

impl PermissionStore for StaticPermissionStore {
    fn permissions_for(&self, subject: &str) -> Vec<String> {
        self.assignments
            .read()
            .ok()
            .and_then(|map| map.get(subject).cloned())
            .unwrap_or_default()
    }
}

/// Named guards available to authorization rules.
#[derive(Default)]
pub struct GuardRegistry {
    guards: HashMap<String, Arc<dyn Guard>>,
}

impl GuardRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, guard: Arc<dyn Guard>) {
        self.guards.insert(name.into(), guard);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Guard>> {
        self.guards.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_check_is_or_semantics() {
        let principal = Principal {
            id: "u1".to_string(),
            permissions: vec!["manager".to_string()],
        };
        let required = vec!["admin".to_string(), "manager".to_string()];
        assert!(principal.has_any_permission(&required));
        assert!(principal.has_any_permission(&[]));

        let viewer = Principal {
            id: "u2".to_string(),
            permissions: vec!["viewer".to_string()],
        };
        assert!(!viewer.has_any_permission(&required));
    }
}
