//! # Portico
//!
//! **Portico** is a front-controller micro-framework core: declarative HTTP
//! routing with typed path placeholders, multi-language route rewriting,
//! guard-based authorization, and a uniform API response envelope.
//!
//! ## Architecture
//!
//! The library is organized into focused modules:
//!
//! - **[`router`]** — typed pattern rules, pattern-to-regex compilation,
//!   the insertion-ordered route table, and first-match-wins resolution
//! - **[`registry`]** — the [`Controller`](registry::Controller) trait and
//!   declarative route loading (the Rust replacement for attribute
//!   reflection)
//! - **[`language`]** — per-module manifests, language files, and the
//!   rewriter that expands localizable routes into per-language variants
//! - **[`dispatcher`]** — controller lookup, parameter binding, action
//!   invocation, and panic-to-500 conversion
//! - **[`middleware`]** — the hook trait plus the authorization gate
//! - **[`security`]** — guards, principals, the JWT guard and its
//!   fingerprint-bound revocation store
//! - **[`validation`]** — dot-path field rule sets producing non-throwing
//!   validated request wrappers
//! - **[`server`]** — request/response types, the envelope, and the
//!   [`AppService`](server::AppService) front controller
//! - **[`cli`]** — CLI pseudo-method dispatch sharing the route table
//!
//! ## Request flow
//!
//! At boot, controllers declare their routes; the loader populates the
//! route table, the language rewriter expands view routes, and every
//! pattern is compiled and verified. Per request:
//!
//! ```text
//! resolve (first match wins, registration order)
//!   → localize (redirect on language/session mismatch)
//!   → authorize (guard chain, 401/403 short-circuit)
//!   → bind (declared binding kinds only)
//!   → invoke (panics become 500 envelopes)
//!   → respond (one terminal response per request)
//! ```
//!
//! ## Quick start
//!
//! ```rust
//! use portico::language::LanguageConfig;
//! use portico::registry::{Controller, RouteDef};
//! use portico::dispatcher::{ActionContext, ActionError, ActionOutcome};
//! use portico::router::RuleRegistry;
//! use portico::runtime_config::RuntimeConfig;
//! use portico::security::GuardRegistry;
//! use portico::server::{AppService, Request};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! struct ReportController;
//!
//! impl Controller for ReportController {
//!     fn name(&self) -> &str {
//!         "ReportController"
//!     }
//!
//!     fn module_path(&self) -> &str {
//!         "App.Modules.Reports.Controller.ReportController"
//!     }
//!
//!     fn routes(&self) -> Vec<RouteDef> {
//!         vec![RouteDef::get("report/(id:uuid)", "show").api()]
//!     }
//!
//!     fn invoke(&self, action: &str, ctx: &mut ActionContext) -> Result<ActionOutcome, ActionError> {
//!         match action {
//!             "show" => Ok(ActionOutcome::success(json!({ "id": ctx.param("id") }))),
//!             other => Err(ActionError::unknown_action(self.name(), other)),
//!         }
//!     }
//! }
//!
//! let service = AppService::initialize(
//!     vec![Arc::new(ReportController)],
//!     RuleRegistry::with_defaults(),
//!     LanguageConfig::new(),
//!     Arc::new(GuardRegistry::new()),
//!     RuntimeConfig::default(),
//! )
//! .unwrap();
//!
//! let response = service.handle(Request::get(
//!     "/report/3fa85f64-5717-4562-b3fc-2c963f66afa6",
//! ));
//! assert_eq!(response.status(), 200);
//! ```

pub mod cli;
pub mod dispatcher;
pub mod ids;
pub mod language;
pub mod middleware;
pub mod registry;
pub mod router;
pub mod runtime_config;
pub mod security;
pub mod server;
pub mod validation;

pub use registry::{Controller, ControllerRegistry, RouteDef, RouteLoadError};
pub use router::{
    AuthorizeRule, BindingKind, RouteEntry, RouteKind, RouteTable, Router, RuleRegistry,
};
pub use runtime_config::RuntimeConfig;
pub use server::{AppService, Request, Response};
