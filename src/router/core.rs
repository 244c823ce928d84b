//! Router core: path normalization and route resolution.

use super::pattern::{PatternCache, PatternError};
use super::rules::RuleRegistry;
use super::table::{AuthorizeRule, BindingKind, LanguageMeta, RouteKind, RouteTable};
use http::Method;
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Maximum number of path parameters before heap allocation. Route templates
/// rarely carry more than a handful of placeholders.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the match path.
///
/// Names come from the static route table, so they are shared as `Arc<str>`;
/// values are per-request captures.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Descriptor of a successfully resolved route.
///
/// Created once resolution succeeds; lives for the duration of one request.
#[derive(Debug, Clone)]
pub struct ResolvedModule {
    pub module: String,
    pub controller: String,
    pub action: String,
    /// Captured path parameters. Keys are unique by construction: duplicate
    /// placeholder names are rejected at pattern compile time.
    pub parameters: ParamVec,
    pub pattern: String,
    pub kind: RouteKind,
    pub authorize: Vec<AuthorizeRule>,
    pub validate: Option<crate::validation::RuleSet>,
    pub bindings: Vec<BindingKind>,
    pub language: Option<LanguageMeta>,
    /// Theme declared by the owning module's manifest, filled in by the
    /// service after resolution.
    pub theme: Option<String>,
}

impl ResolvedModule {
    /// Get a captured path parameter by name.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Normalize a request path for matching: strip the query string, collapse
/// duplicate slashes, trim leading and trailing slashes.
pub fn normalize_path(path: &str) -> String {
    let path = path.split('?').next().unwrap_or("");
    let mut normalized = String::with_capacity(path.len());
    let mut last_was_slash = true; // swallows leading slashes
    for c in path.chars() {
        if c == '/' {
            if !last_was_slash {
                normalized.push('/');
            }
            last_was_slash = true;
        } else {
            normalized.push(c);
            last_was_slash = false;
        }
    }
    if normalized.ends_with('/') {
        normalized.pop();
    }
    normalized
}

/// Matches normalized request paths against the route table.
///
/// Resolution iterates the method's entries in registration order, compiling
/// each pattern through the memoizing cache, and the first full match wins.
pub struct Router {
    table: RouteTable,
    rules: RuleRegistry,
    cache: PatternCache,
}

impl Router {
    pub fn new(table: RouteTable, rules: RuleRegistry) -> Self {
        info!(routes_count = table.len(), "Routing table loaded");
        Self {
            table,
            rules,
            cache: PatternCache::new(),
        }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn rules(&self) -> &RuleRegistry {
        &self.rules
    }

    /// Compile every registered pattern eagerly.
    ///
    /// Pattern defects (unknown rule type, duplicate parameter name) are
    /// deployment errors and must abort boot rather than surface on the
    /// first matching request.
    pub fn verify(&self) -> Result<(), PatternError> {
        for entry in self.table.iter_all() {
            self.cache.get_or_compile(&entry.pattern, &self.rules)?;
        }
        Ok(())
    }

    /// Resolve a request against the table. `path` may be raw; it is
    /// normalized here.
    #[must_use]
    pub fn resolve(&self, method: &Method, path: &str) -> Option<ResolvedModule> {
        let normalized = normalize_path(path);
        debug!(method = %method, path = %normalized, "Route match attempt");

        for entry in self.table.entries(method) {
            let compiled = match self.cache.get_or_compile(&entry.pattern, &self.rules) {
                Ok(c) => c,
                Err(e) => {
                    // verify() catches these at boot; a failure here means the
                    // table was built without it.
                    error!(pattern = %entry.pattern, error = %e, "Skipping uncompilable route");
                    continue;
                }
            };

            if let Some(caps) = compiled.regex.captures(&normalized) {
                let mut parameters = ParamVec::new();
                for name in &compiled.params {
                    if let Some(m) = caps.name(name) {
                        parameters.push((Arc::from(name.as_str()), m.as_str().to_string()));
                    }
                }

                info!(
                    method = %method,
                    path = %normalized,
                    pattern = %entry.pattern,
                    module = %entry.module,
                    controller = %entry.controller,
                    action = %entry.action,
                    "Route matched"
                );

                return Some(ResolvedModule {
                    module: entry.module.clone(),
                    controller: entry.controller.clone(),
                    action: entry.action.clone(),
                    parameters,
                    pattern: entry.pattern.clone(),
                    kind: entry.kind,
                    authorize: entry.authorize.clone(),
                    validate: entry.validate.clone(),
                    bindings: entry.bindings.clone(),
                    language: entry.language.clone(),
                    theme: None,
                });
            }
        }

        warn!(method = %method, path = %normalized, "No route matched");
        None
    }
}
