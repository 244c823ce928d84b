//! # Router Module
//!
//! Path matching and route resolution.
//!
//! Route templates are plain path strings with typed placeholders of the
//! form `(name:type)`; the type names a rule in the [`rules::RuleRegistry`]
//! that supplies a regex fragment. At load time every template is compiled
//! into an anchored regex with named capture groups ([`pattern`]); at
//! request time the [`Router`] walks the method's entries in registration
//! order and the first full match wins.
//!
//! ```rust
//! use portico::router::{compile, default_rules};
//!
//! let compiled = compile("report/(id:uuid)", default_rules()).unwrap();
//! assert_eq!(compiled.params, vec!["id"]);
//! assert!(compiled.regex.is_match("report/3fa85f64-5717-4562-b3fc-2c963f66afa6"));
//! ```

mod core;
pub mod pattern;
pub mod rules;
pub mod table;

pub use core::{normalize_path, ParamVec, ResolvedModule, Router, MAX_INLINE_PARAMS};
pub use pattern::{compile, CompiledPattern, PatternCache, PatternError};
pub use rules::{default_rules, RuleRegistry};
pub use table::{AuthorizeRule, BindingKind, LanguageMeta, RouteEntry, RouteKind, RouteTable};
