//! Controller registry and declarative route loading.
//!
//! Registration is declarative: each controller *lists* its routes as
//! [`RouteDef`] values — one entry per (verb, uri) pair, carrying the
//! action's authorization and validation metadata — and dispatches
//! invocations by action name. The whole surface is checked at startup;
//! nothing is discovered at request time.
//!
//! ```rust
//! use portico::dispatcher::{ActionContext, ActionError, ActionOutcome};
//! use portico::registry::{Controller, RouteDef};
//! use http::Method;
//! use serde_json::json;
//!
//! struct HealthController;
//!
//! impl Controller for HealthController {
//!     fn name(&self) -> &str {
//!         "HealthController"
//!     }
//!
//!     fn module_path(&self) -> &str {
//!         "App.Modules.System.Controller.HealthController"
//!     }
//!
//!     fn routes(&self) -> Vec<RouteDef> {
//!         vec![RouteDef::get("health", "status").api()]
//!     }
//!
//!     fn invoke(&self, action: &str, _ctx: &mut ActionContext) -> Result<ActionOutcome, ActionError> {
//!         match action {
//!             "status" => Ok(ActionOutcome::success(json!({ "status": "ok" }))),
//!             other => Err(ActionError::unknown_action(self.name(), other)),
//!         }
//!     }
//! }
//! ```

use crate::dispatcher::{ActionContext, ActionError, ActionOutcome};
use crate::router::{
    AuthorizeRule, BindingKind, PatternError, RouteEntry, RouteKind, RouteTable, RuleRegistry,
};
use crate::validation::RuleSet;
use http::Method;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// One declared route: verb + uri template + target action, plus the
/// metadata the dispatcher needs.
#[derive(Debug, Clone)]
pub struct RouteDef {
    pub method: Method,
    pub pattern: String,
    pub action: String,
    pub kind: RouteKind,
    pub authorize: Vec<AuthorizeRule>,
    pub validate: Option<RuleSet>,
    pub bindings: Vec<BindingKind>,
}

impl RouteDef {
    pub fn new(method: Method, pattern: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            method,
            pattern: pattern.into(),
            action: action.into(),
            kind: RouteKind::Unknown,
            authorize: Vec::new(),
            validate: None,
            bindings: Vec::new(),
        }
    }

    pub fn get(pattern: impl Into<String>, action: impl Into<String>) -> Self {
        Self::new(Method::GET, pattern, action)
    }

    pub fn post(pattern: impl Into<String>, action: impl Into<String>) -> Self {
        Self::new(Method::POST, pattern, action)
    }

    pub fn put(pattern: impl Into<String>, action: impl Into<String>) -> Self {
        Self::new(Method::PUT, pattern, action)
    }

    pub fn patch(pattern: impl Into<String>, action: impl Into<String>) -> Self {
        Self::new(Method::PATCH, pattern, action)
    }

    pub fn delete(pattern: impl Into<String>, action: impl Into<String>) -> Self {
        Self::new(Method::DELETE, pattern, action)
    }

    /// A command-line route sharing the table with HTTP routes.
    pub fn cli(pattern: impl Into<String>, action: impl Into<String>) -> Self {
        Self::new(crate::server::request::cli_method(), pattern, action)
    }

    /// Mark the action as rendering a page view (participates in language
    /// expansion when the owning module is localized).
    pub fn view(mut self) -> Self {
        self.kind = RouteKind::View;
        self
    }

    /// Mark the action as returning an API envelope.
    pub fn api(mut self) -> Self {
        self.kind = RouteKind::Api;
        self
    }

    /// Mark the action as returning a plain string body.
    pub fn text(mut self) -> Self {
        self.kind = RouteKind::Text;
        self
    }

    pub fn authorize(mut self, rule: AuthorizeRule) -> Self {
        self.authorize.push(rule);
        self
    }

    pub fn validate(mut self, rules: RuleSet) -> Self {
        self.validate = Some(rules);
        self
    }

    pub fn bind(mut self, binding: BindingKind) -> Self {
        self.bindings.push(binding);
        self
    }
}

/// A registered controller: declares its routes and dispatches invocations
/// by action name.
pub trait Controller: Send + Sync {
    /// Controller name used in route entries, e.g. `OrderController`.
    fn name(&self) -> &str;

    /// Dotted logical path of the controller. Must contain a
    /// `Modules.<Name>.Controller` sequence; `<Name>` becomes the owning
    /// module, e.g. `App.Modules.Orders.Controller.OrderController`.
    fn module_path(&self) -> &str;

    /// Declared routes. A controller returning none is not routable and is
    /// skipped silently.
    fn routes(&self) -> Vec<RouteDef>;

    /// Optional lifecycle hook called after instantiation, before the
    /// middleware chain runs.
    fn init(&self) {}

    /// Invoke the named action.
    fn invoke(&self, action: &str, ctx: &mut ActionContext) -> Result<ActionOutcome, ActionError>;
}

/// Errors raised while loading routes from controllers. All startup-fatal.
#[derive(Debug, Error)]
pub enum RouteLoadError {
    #[error("cannot derive module name from controller path `{path}`")]
    ModuleNameUnresolvable { path: String },
    #[error(transparent)]
    Pattern(#[from] PatternError),
}

/// Derive the owning module name from a controller's dotted path.
///
/// The path must contain `Modules` followed by the module name, with a
/// `Controller` segment somewhere after it. Routing cannot proceed without a
/// module owner, so failure here aborts boot.
pub fn derive_module_name(module_path: &str) -> Result<String, RouteLoadError> {
    let segments: Vec<&str> = module_path.split('.').collect();
    let modules_idx = segments.iter().position(|s| *s == "Modules");
    if let Some(idx) = modules_idx {
        if let Some(name) = segments.get(idx + 1) {
            let has_controller = segments[idx + 2..].iter().any(|s| *s == "Controller");
            if has_controller && !name.is_empty() {
                return Ok((*name).to_string());
            }
        }
    }
    Err(RouteLoadError::ModuleNameUnresolvable {
        path: module_path.to_string(),
    })
}

/// Lookup table from `(module, controller)` to the registered controller
/// instance — the replacement for resolving classes by string name at
/// request time.
#[derive(Default)]
pub struct ControllerRegistry {
    controllers: HashMap<(String, String), Arc<dyn Controller>>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a controller under its derived module name.
    pub fn register(&mut self, controller: Arc<dyn Controller>) -> Result<(), RouteLoadError> {
        let module = derive_module_name(controller.module_path())?;
        debug!(
            module = %module,
            controller = %controller.name(),
            "Controller registered"
        );
        self.controllers
            .insert((module, controller.name().to_string()), controller);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, module: &str, controller: &str) -> Option<Arc<dyn Controller>> {
        self.controllers
            .get(&(module.to_string(), controller.to_string()))
            .map(Arc::clone)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}

/// Populate the route table from the controllers' declared routes.
///
/// Every pattern is compiled once here so rule defects (unknown type,
/// duplicate parameter name) surface at startup, not per-request.
pub fn load_routes(
    controllers: &[Arc<dyn Controller>],
    table: &mut RouteTable,
    rules: &RuleRegistry,
) -> Result<(), RouteLoadError> {
    for controller in controllers {
        let module = derive_module_name(controller.module_path())?;
        let routes = controller.routes();
        if routes.is_empty() {
            debug!(controller = %controller.name(), "Controller declares no routes, skipped");
            continue;
        }
        for def in routes {
            crate::router::compile(&def.pattern, rules)?;
            table.store(RouteEntry {
                method: def.method,
                pattern: def.pattern,
                module: module.clone(),
                controller: controller.name().to_string(),
                action: def.action,
                kind: def.kind,
                authorize: def.authorize,
                validate: def.validate,
                bindings: def.bindings,
                language: None,
            });
        }
    }
    info!(
        controllers = controllers.len(),
        routes = table.len(),
        "Routes loaded from controllers"
    );
    Ok(())
}
