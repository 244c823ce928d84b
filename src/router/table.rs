//! Route table: per-HTTP-method, insertion-ordered pattern → options map.
//!
//! Matching iterates entries in registration order and the first structural
//! match wins, so "more specific before more general" is a property of
//! registration order. Literal routes must be registered before typed
//! patterns that would also match them (`users/me` before `users/(id:int)`).

use crate::validation::RuleSet;
use http::Method;
use std::collections::HashMap;
use tracing::debug;

/// Classification of what a route's action produces, declared at
/// registration. Only `View` GET routes participate in language expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    /// Renders a page view.
    View,
    /// Returns an API envelope.
    Api,
    /// Returns a plain string body.
    Text,
    /// Nothing declared; treated as API-like and never language-expanded.
    Unknown,
}

/// Authorization requirement declared on an action.
///
/// `permissions` uses OR semantics: the principal needs at least one of the
/// listed permissions. An empty list means "authenticated is enough".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizeRule {
    pub guard: String,
    pub permissions: Vec<String>,
}

impl Default for AuthorizeRule {
    /// Authentication through the default guard, no permission requirement.
    fn default() -> Self {
        Self::guard(crate::security::DEFAULT_GUARD)
    }
}

impl AuthorizeRule {
    /// Require authentication through the named guard.
    pub fn guard(name: impl Into<String>) -> Self {
        Self {
            guard: name.into(),
            permissions: Vec::new(),
        }
    }

    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self
    }
}

/// Explicit parameter binding source for an action.
///
/// One variant per supported source; there is no runtime-type-driven
/// fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingKind {
    /// The ambient request object.
    Request,
    /// The request body run through the route's validation rule set.
    Validated,
    /// A single named path parameter.
    Param(String),
    /// Nothing bound.
    None,
}

/// Language annotation attached to rewritten route entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageMeta {
    pub iso: String,
    pub prefix: String,
    pub original_uri: String,
    pub default: bool,
    /// All language isos configured for the owning module.
    pub languages: Vec<String>,
}

/// One registered route: the raw pattern plus everything dispatch needs.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub method: Method,
    pub pattern: String,
    pub module: String,
    pub controller: String,
    pub action: String,
    pub kind: RouteKind,
    pub authorize: Vec<AuthorizeRule>,
    pub validate: Option<RuleSet>,
    pub bindings: Vec<BindingKind>,
    pub language: Option<LanguageMeta>,
}

/// Per-method, insertion-ordered route storage.
///
/// Written only during the load/rewrite phase; read-only during matching.
/// Long-lived deployments swap whole tables atomically instead of mutating
/// a live one (see `server::service::SharedRouter`).
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: HashMap<Method, Vec<RouteEntry>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route. A same-(method, pattern) entry is replaced in place,
    /// keeping its position in registration order.
    pub fn store(&mut self, entry: RouteEntry) {
        let routes = self.entries.entry(entry.method.clone()).or_default();
        if let Some(existing) = routes.iter_mut().find(|e| e.pattern == entry.pattern) {
            debug!(
                method = %entry.method,
                pattern = %entry.pattern,
                "Route entry replaced in place"
            );
            *existing = entry;
        } else {
            routes.push(entry);
        }
    }

    /// Exact-pattern lookup.
    pub fn retrieve(&self, method: &Method, pattern: &str) -> Option<&RouteEntry> {
        self.entries
            .get(method)?
            .iter()
            .find(|e| e.pattern == pattern)
    }

    /// Unregister a route, returning the removed entry.
    pub fn remove(&mut self, method: &Method, pattern: &str) -> Option<RouteEntry> {
        let routes = self.entries.get_mut(method)?;
        let idx = routes.iter().position(|e| e.pattern == pattern)?;
        Some(routes.remove(idx))
    }

    /// All entries for a method, in registration order.
    pub fn entries(&self, method: &Method) -> &[RouteEntry] {
        self.entries.get(method).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.entries.keys()
    }

    pub fn iter_all(&self) -> impl Iterator<Item = &RouteEntry> {
        self.entries.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(method: Method, pattern: &str) -> RouteEntry {
        RouteEntry {
            method,
            pattern: pattern.to_string(),
            module: "Orders".to_string(),
            controller: "OrderController".to_string(),
            action: "index".to_string(),
            kind: RouteKind::Api,
            authorize: Vec::new(),
            validate: None,
            bindings: Vec::new(),
            language: None,
        }
    }

    #[test]
    fn store_preserves_registration_order() {
        let mut table = RouteTable::new();
        table.store(entry(Method::GET, "users/me"));
        table.store(entry(Method::GET, "users/(id:int)"));
        let patterns: Vec<_> = table
            .entries(&Method::GET)
            .iter()
            .map(|e| e.pattern.as_str())
            .collect();
        assert_eq!(patterns, vec!["users/me", "users/(id:int)"]);
    }

    #[test]
    fn replace_keeps_position() {
        let mut table = RouteTable::new();
        table.store(entry(Method::GET, "a"));
        table.store(entry(Method::GET, "b"));
        let mut replacement = entry(Method::GET, "a");
        replacement.action = "replaced".to_string();
        table.store(replacement);
        let entries = table.entries(&Method::GET);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].pattern, "a");
        assert_eq!(entries[0].action, "replaced");
    }

    #[test]
    fn retrieve_and_remove_are_exact_keyed() {
        let mut table = RouteTable::new();
        table.store(entry(Method::GET, "users/(id:int)"));
        assert!(table.retrieve(&Method::GET, "users/(id:int)").is_some());
        assert!(table.retrieve(&Method::GET, "users/42").is_none());
        assert!(table.remove(&Method::GET, "users/(id:int)").is_some());
        assert!(table.is_empty());
    }

    #[test]
    fn methods_are_isolated() {
        let mut table = RouteTable::new();
        table.store(entry(Method::GET, "orders"));
        table.store(entry(Method::POST, "orders"));
        assert_eq!(table.entries(&Method::GET).len(), 1);
        assert_eq!(table.entries(&Method::POST).len(), 1);
        assert!(table.entries(&Method::DELETE).is_empty());
    }
}
