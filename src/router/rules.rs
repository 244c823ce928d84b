//! Named parameter type rules.
//!
//! Each rule maps a placeholder type (the `type` in `(name:type)`) to a regex
//! fragment. The built-in set covers the common path parameter shapes; hosts
//! can register additional rules before routes are loaded.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// The canonical 8-4-4-4-12 UUID shape, case-insensitive.
const UUID_FRAGMENT: &str =
    "[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}";

/// Registry of named parameter type rules.
///
/// A rule is just a regex fragment; the pattern compiler wraps it into a
/// named capture group. Fragments must not contain capture groups of their
/// own (use `(?:...)` for alternation).
#[derive(Debug, Clone)]
pub struct RuleRegistry {
    rules: HashMap<String, String>,
}

impl RuleRegistry {
    /// An empty registry with no rules at all.
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// Registry pre-populated with the built-in rules:
    /// `int`, `uuid`, `slug`, `date`, `bool`, `alpha`, `alphanum`, `any`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register("int", r"\d+");
        registry.register("uuid", UUID_FRAGMENT);
        registry.register("slug", "[a-z0-9-]+");
        registry.register("date", r"\d{4}-\d{2}-\d{2}");
        registry.register("bool", "(?:true|false|0|1)");
        registry.register("alpha", "[A-Za-z]+");
        registry.register("alphanum", "[A-Za-z0-9]+");
        registry.register("any", "[^/]+");
        registry
    }

    /// Register (or replace) a rule. Call before routes are loaded; rules are
    /// consulted at pattern compile time only.
    pub fn register(&mut self, name: impl Into<String>, fragment: impl Into<String>) {
        self.rules.insert(name.into(), fragment.into());
    }

    /// Look up the regex fragment for a rule name.
    pub fn fragment(&self, name: &str) -> Option<&str> {
        self.rules.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

static DEFAULT_RULES: Lazy<RuleRegistry> = Lazy::new(RuleRegistry::with_defaults);

/// Shared default registry for callers that never customize rules.
pub fn default_rules() -> &'static RuleRegistry {
    &DEFAULT_RULES
}
