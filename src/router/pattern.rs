//! Route pattern compilation.
//!
//! Turns a route template with typed placeholders (`report/(id:uuid)/page/(n:int)`)
//! into an anchored regex with one named capture group per placeholder, plus
//! the ordered list of parameter names.
//!
//! Compilation is a pure function of the pattern string and the rule
//! registry, so results are memoized in an LRU cache keyed by pattern.

use super::rules::RuleRegistry;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::debug;

/// Placeholder shape inside a route template: `(name:type)`.
static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(([A-Za-z_][A-Za-z0-9_]*):([A-Za-z_][A-Za-z0-9_]*)\)")
        .unwrap_or_else(|e| unreachable!("placeholder regex is static: {e}"))
});

/// Errors raised while compiling a route pattern.
///
/// All of these are startup-fatal: they surface when routes are loaded, never
/// per-request.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("unknown rule type `{rule}` in pattern `{pattern}`")]
    UnknownRuleType { pattern: String, rule: String },
    #[error("duplicate parameter name `{name}` in pattern `{pattern}`")]
    DuplicateParamName { pattern: String, name: String },
    #[error("failed to compile pattern `{pattern}`: {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// A compiled route pattern.
///
/// Invariant: `params` lists placeholder names in left-to-right order of
/// appearance and matches the named capture groups of `regex` exactly.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    /// Anchored regex (`^...$`) over the normalized request path.
    pub regex: Regex,
    /// Placeholder names in order of first appearance.
    pub params: Vec<String>,
}

/// Compile a route template into an anchored regex and its parameter list.
///
/// Each `(name:type)` placeholder is replaced with `(?P<name>fragment)` where
/// the fragment comes from the rule registry; everything else is escaped as a
/// literal. Duplicate placeholder names are rejected rather than silently
/// letting the last capture win.
pub fn compile(pattern: &str, rules: &RuleRegistry) -> Result<CompiledPattern, PatternError> {
    let mut regex_src = String::with_capacity(pattern.len() + 8);
    regex_src.push('^');

    let mut params = Vec::new();
    let mut seen = HashSet::new();
    let mut last_end = 0;

    for caps in PLACEHOLDER.captures_iter(pattern) {
        let whole = caps.get(0).unwrap_or_else(|| unreachable!("group 0 always set"));
        let name = &caps[1];
        let rule = &caps[2];

        let fragment =
            rules
                .fragment(rule)
                .ok_or_else(|| PatternError::UnknownRuleType {
                    pattern: pattern.to_string(),
                    rule: rule.to_string(),
                })?;
        if !seen.insert(name.to_string()) {
            return Err(PatternError::DuplicateParamName {
                pattern: pattern.to_string(),
                name: name.to_string(),
            });
        }

        regex_src.push_str(&regex::escape(&pattern[last_end..whole.start()]));
        regex_src.push_str("(?P<");
        regex_src.push_str(name);
        regex_src.push('>');
        regex_src.push_str(fragment);
        regex_src.push(')');

        params.push(name.to_string());
        last_end = whole.end();
    }

    regex_src.push_str(&regex::escape(&pattern[last_end..]));
    regex_src.push('$');

    let regex = Regex::new(&regex_src).map_err(|source| PatternError::Regex {
        pattern: pattern.to_string(),
        source,
    })?;

    debug!(pattern = %pattern, regex = %regex_src, params = ?params, "Pattern compiled");

    Ok(CompiledPattern { regex, params })
}

/// LRU memoization of compiled patterns.
///
/// Compilation is deterministic per (pattern, registry) pair, so the cache is
/// keyed by pattern string alone; callers that swap rule registries at
/// runtime must use a fresh cache.
pub struct PatternCache {
    cache: Mutex<lru::LruCache<String, Arc<CompiledPattern>>>,
}

impl PatternCache {
    /// Default capacity, comfortably above the route count of a large app
    /// after language expansion.
    const DEFAULT_CAPACITY: usize = 4096;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1))
            .unwrap_or_else(|| unreachable!("capacity clamped to >= 1"));
        Self {
            cache: Mutex::new(lru::LruCache::new(capacity)),
        }
    }

    /// Fetch the compiled form of `pattern`, compiling on first use.
    pub fn get_or_compile(
        &self,
        pattern: &str,
        rules: &RuleRegistry,
    ) -> Result<Arc<CompiledPattern>, PatternError> {
        if let Ok(mut cache) = self.cache.lock() {
            if let Some(hit) = cache.get(pattern) {
                return Ok(Arc::clone(hit));
            }
        }
        let compiled = Arc::new(compile(pattern, rules)?);
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(pattern.to_string(), Arc::clone(&compiled));
        }
        Ok(compiled)
    }
}

impl Default for PatternCache {
    fn default() -> Self {
        Self::new()
    }
}
