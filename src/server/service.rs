//! Front controller: request lifecycle orchestration.
//!
//! A request moves through a fixed state machine:
//!
//! ```text
//! Uninitialized → RoutesLoaded → Localized          (boot, once)
//! Resolved → Executing → Responded                  (per request)
//! ```
//!
//! `Responded` is terminal — exactly one response per request. Resolution
//! misses and authorization failures jump straight to `Responded` with an
//! error payload; there is no out-of-band termination anywhere in the
//! pipeline.
//!
//! The router state (route table + language config) is built during boot and
//! read-only afterwards. [`SharedRouter`] wraps it in an `ArcSwap`, so a
//! long-lived process can rebuild the table and swap it atomically while
//! in-flight requests keep reading the old one.

use crate::dispatcher::ModuleRunner;
use crate::language::{self, LanguageConfig};
use crate::middleware::{AuthMiddleware, Middleware};
use crate::registry::{load_routes, Controller, ControllerRegistry};
use crate::router::{normalize_path, ResolvedModule, RouteKind, RouteTable, Router, RuleRegistry};
use crate::runtime_config::RuntimeConfig;
use crate::security::GuardRegistry;
use crate::server::request::Request;
use crate::server::response::{DebugBlock, RenderedResponse, Response, ResponseFormat};
use arc_swap::ArcSwap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Request lifecycle states, in order. Terminal on `Responded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    RoutesLoaded,
    Localized,
    Resolved,
    Executing,
    Responded,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Lifecycle::Uninitialized => "Uninitialized",
            Lifecycle::RoutesLoaded => "RoutesLoaded",
            Lifecycle::Localized => "Localized",
            Lifecycle::Resolved => "Resolved",
            Lifecycle::Executing => "Executing",
            Lifecycle::Responded => "Responded",
        };
        f.write_str(name)
    }
}

/// Immutable routing state: built once, swapped whole.
pub struct RouterState {
    pub router: Router,
    pub languages: LanguageConfig,
}

/// Atomically swappable handle to the routing state.
///
/// Readers load a consistent snapshot; a rebuild never mutates a table that
/// matchers are iterating.
pub struct SharedRouter {
    state: ArcSwap<RouterState>,
}

impl SharedRouter {
    pub fn new(state: RouterState) -> Self {
        Self {
            state: ArcSwap::from_pointee(state),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> Arc<RouterState> {
        self.state.load_full()
    }

    pub fn swap(&self, state: RouterState) {
        self.state.store(Arc::new(state));
        info!("Router state swapped");
    }
}

/// The assembled application service.
///
/// Owns the routing state, the controller registry, and the module runner;
/// `handle` takes a parsed request all the way to a terminal response.
pub struct AppService {
    shared: SharedRouter,
    runner: ModuleRunner,
    registry: Arc<ControllerRegistry>,
    controllers: Vec<Arc<dyn Controller>>,
    rules: RuleRegistry,
    config: RuntimeConfig,
}

impl AppService {
    /// Boot the service: load routes from the controllers, rewrite them for
    /// the configured languages, verify every pattern, and install the
    /// authorization middleware.
    ///
    /// Errors here are deployment defects and must abort boot.
    pub fn initialize(
        controllers: Vec<Arc<dyn Controller>>,
        rules: RuleRegistry,
        languages: LanguageConfig,
        guards: Arc<GuardRegistry>,
        config: RuntimeConfig,
    ) -> anyhow::Result<Self> {
        debug!(state = %Lifecycle::Uninitialized, "Service boot");
        let state = build_state(&controllers, &rules, languages)?;

        let mut registry = ControllerRegistry::new();
        for controller in &controllers {
            registry.register(Arc::clone(controller))?;
        }
        let registry = Arc::new(registry);

        let mut runner =
            ModuleRunner::new(Arc::clone(&registry)).developer(config.developer);
        runner.add_middleware(Arc::new(AuthMiddleware::new(guards)));

        Ok(Self {
            shared: SharedRouter::new(state),
            runner,
            registry,
            controllers,
            rules,
            config,
        })
    }

    /// Append middleware after the authorization gate.
    pub fn add_middleware(&mut self, middleware: Arc<dyn Middleware>) {
        self.runner.add_middleware(middleware);
    }

    /// Rebuild the routing state (e.g. after a language config change) and
    /// swap it atomically.
    pub fn rebuild(&self, languages: LanguageConfig) -> anyhow::Result<()> {
        let state = build_state(&self.controllers, &self.rules, languages)?;
        self.shared.swap(state);
        Ok(())
    }

    #[must_use]
    pub fn router_state(&self) -> Arc<RouterState> {
        self.shared.snapshot()
    }

    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Handle a request to a terminal [`Response`].
    #[must_use]
    pub fn handle(&self, request: Request) -> Response {
        self.handle_at(request, Instant::now())
    }

    /// Handle a request and render it for emission, negotiating the output
    /// format from the `Accept` header.
    #[must_use]
    pub fn respond(&self, request: Request) -> RenderedResponse {
        let started = Instant::now();
        let format = ResponseFormat::negotiate(request.header("accept"));
        let response = self.handle_at(request, started).with_format(format);
        response.render(started)
    }

    fn handle_at(&self, request: Request, started: Instant) -> Response {
        let state = self.shared.snapshot();
        let normalized = normalize_path(&request.path);

        let resolved = match state.router.resolve(&request.method, &request.path) {
            Some(resolved) => resolved,
            None => return self.handle_miss(&state, request, &normalized, started),
        };
        debug!(state = %Lifecycle::Resolved, module = %resolved.module, "Request resolved");

        let mut resolved = resolved;
        resolved.theme = state.languages.theme(&resolved.module).map(str::to_string);

        if let Some(redirect) = self.localization_redirect(&state, &resolved, &request, &normalized)
        {
            debug!(state = %Lifecycle::Responded, "Localization redirect");
            return redirect;
        }

        debug!(state = %Lifecycle::Executing, module = %resolved.module, action = %resolved.action, "Dispatch");
        let response = self.runner.run(&resolved, request, started);
        debug!(state = %Lifecycle::Responded, status = response.status(), "Request responded");
        response
    }

    /// For page-view routes, keep the URL's language segment in line with
    /// the session-pinned language. Skipped entirely when the session is on
    /// the module's default language (or pins nothing).
    fn localization_redirect(
        &self,
        state: &RouterState,
        resolved: &ResolvedModule,
        request: &Request,
        normalized: &str,
    ) -> Option<Response> {
        if resolved.kind != RouteKind::View {
            return None;
        }
        let meta = resolved.language.as_ref()?;
        let pinned = request.session_language.as_deref()?;
        if state.languages.default_language(&resolved.module) == Some(pinned) {
            return None;
        }
        if meta.iso == pinned {
            return None;
        }
        let pinned_prefix = state.languages.prefix_for(&resolved.module, pinned)?;

        // Swap the matched prefix for the pinned one on the concrete path,
        // so captured parameters survive the redirect.
        let rest = if meta.prefix.is_empty() {
            normalized
        } else {
            normalized
                .strip_prefix(&format!("{}/", meta.prefix))
                .unwrap_or(normalized)
        };
        let target = format!("/{}", normalize_path(&format!("{pinned_prefix}/{rest}")));
        debug!(from = %normalized, to = %target, "Language mismatch, redirecting");
        Some(Response::redirect(target))
    }

    /// Resolution miss: API-looking requests get an envelope 404; browser
    /// requests fall back to the configured error module; and if even that
    /// is misconfigured, a raw diagnostic 404. This branch never fails.
    fn handle_miss(
        &self,
        state: &Arc<RouterState>,
        request: Request,
        normalized: &str,
        started: Instant,
    ) -> Response {
        if request.looks_like_api_call(normalized) {
            let mut response = Response::envelope_error(404, "not found");
            if self.config.developer {
                response.attach_debug(DebugBlock::capture(None, &request, None));
            }
            debug!(state = %Lifecycle::Responded, "API 404");
            return response;
        }

        if let Some(error_module) = &self.config.error_module {
            let module_dir = self.config.modules_root.join(error_module);
            if module_dir.is_dir()
                && self.registry.get(error_module, "ErrorController").is_some()
            {
                let resolved = ResolvedModule {
                    module: error_module.clone(),
                    controller: "ErrorController".to_string(),
                    action: "not_found".to_string(),
                    parameters: Default::default(),
                    pattern: normalized.to_string(),
                    kind: RouteKind::View,
                    authorize: Vec::new(),
                    validate: None,
                    bindings: Vec::new(),
                    language: None,
                    theme: state.languages.theme(error_module).map(str::to_string),
                };
                debug!(module = %error_module, "Delegating miss to error module");
                return self.runner.run(&resolved, request, started);
            }
            warn!(
                error_module = %error_module,
                "Error module unusable, emitting raw 404"
            );
        }

        Response::html(404, raw_not_found(&request, normalized, &self.config))
    }
}

fn build_state(
    controllers: &[Arc<dyn Controller>],
    rules: &RuleRegistry,
    languages: LanguageConfig,
) -> anyhow::Result<RouterState> {
    let mut table = RouteTable::new();
    load_routes(controllers, &mut table, rules)?;
    debug!(state = %Lifecycle::RoutesLoaded, routes = table.len(), "Routes loaded");

    language::rewrite(&mut table, &languages)?;
    debug!(state = %Lifecycle::Localized, routes = table.len(), "Routes localized");

    let router = Router::new(table, rules.clone());
    router.verify()?;
    Ok(RouterState { router, languages })
}

/// Last-resort 404 page with a short diagnostic list. Raw HTML, not an
/// envelope, and deliberately free of anything that could fail.
fn raw_not_found(request: &Request, normalized: &str, config: &RuntimeConfig) -> String {
    let error_module_note = match &config.error_module {
        Some(name) => format!("error module `{name}` is not usable"),
        None => "no error module configured".to_string(),
    };
    format!(
        "<!doctype html><html><body><h1>404 Not Found</h1><ul>\
         <li>method: {}</li>\
         <li>path: /{}</li>\
         <li>{}</li>\
         <li>modules root: {}</li>\
         </ul></body></html>",
        request.method,
        normalized,
        error_module_note,
        config.modules_root.display()
    )
}
