//! Dispatch boundary: controller resolution, parameter binding, action
//! invocation, and the single place where uncaught action failures become
//! structured 500 envelopes.

use crate::ids::RequestId;
use crate::middleware::Middleware;
use crate::registry::ControllerRegistry;
use crate::router::{BindingKind, ParamVec, ResolvedModule};
use crate::security::Principal;
use crate::server::request::Request;
use crate::server::response::{Caller, DebugBlock, ErrorDetail, Response};
use crate::validation::{RuleSet, ValidatedRequest};
use serde_json::Value;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info};

/// Request-scoped context handed to the target action.
///
/// Created once dispatch starts and destroyed at request end; nothing in it
/// is persisted.
pub struct ActionContext {
    pub request_id: RequestId,
    pub request: Request,
    /// Path parameters captured during resolution.
    pub params: ParamVec,
    /// Present only when the route declares a `Validated` binding.
    pub validated: Option<ValidatedRequest>,
    /// Bound by the authorization middleware on success.
    pub principal: Option<Principal>,
    pub started: Instant,
    pub developer: bool,
}

impl ActionContext {
    pub fn new(request: Request, module: &ResolvedModule, started: Instant, developer: bool) -> Self {
        Self {
            request_id: RequestId::new(),
            request,
            params: module.parameters.clone(),
            validated: None,
            principal: None,
            started,
            developer,
        }
    }

    /// Get a captured path parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// What an action handed back to the dispatcher.
///
/// The router performs the corresponding output action exactly once: views
/// render, responses emit as-is, strings become plain text bodies, and
/// `Empty` emits an empty 200.
pub enum ActionOutcome {
    View(ViewPayload),
    Respond(Response),
    Text(String),
    Empty,
}

impl ActionOutcome {
    /// Shorthand for a 200 success envelope.
    pub fn success(result: Value) -> Self {
        ActionOutcome::Respond(Response::envelope_success(result))
    }

    /// Shorthand for an error envelope.
    pub fn error(code: u16, result: impl Into<Value>) -> Self {
        ActionOutcome::Respond(Response::envelope_error(code, result))
    }
}

/// A renderable page view; the actual template engine is a host concern.
pub struct ViewPayload {
    pub template: String,
    pub data: Value,
}

/// Failure returned by a controller invocation. Converted to a 500 envelope
/// at the dispatch boundary, never re-thrown.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("unknown action `{action}` on controller `{controller}`")]
    UnknownAction { controller: String, action: String },
    #[error("{0}")]
    Failed(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ActionError {
    pub fn unknown_action(controller: &str, action: &str) -> Self {
        Self::UnknownAction {
            controller: controller.to_string(),
            action: action.to_string(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Turns a [`ViewPayload`] into an HTML body. The framework ships a shell
/// renderer; real template engines plug in here.
pub trait ViewRenderer: Send + Sync {
    fn render(&self, view: &ViewPayload, module: &ResolvedModule) -> String;
}

/// Fallback renderer: an HTML shell that names the template and embeds the
/// view data for client-side hydration.
pub struct ShellViewRenderer;

impl ViewRenderer for ShellViewRenderer {
    fn render(&self, view: &ViewPayload, module: &ResolvedModule) -> String {
        let theme = module.theme.as_deref().unwrap_or("default");
        format!(
            "<!doctype html><html data-theme=\"{theme}\"><body data-template=\"{}\">\
             <script type=\"application/json\" id=\"view-data\">{}</script>\
             </body></html>",
            view.template, view.data
        )
    }
}

const GENERIC_ERROR: &str = "internal server error";

/// Runs resolved modules: controller lookup, lifecycle, middleware chain,
/// parameter binding, invocation, and error conversion.
pub struct ModuleRunner {
    controllers: Arc<ControllerRegistry>,
    middlewares: Vec<Arc<dyn Middleware>>,
    renderer: Arc<dyn ViewRenderer>,
    developer: bool,
}

impl ModuleRunner {
    pub fn new(controllers: Arc<ControllerRegistry>) -> Self {
        Self {
            controllers,
            middlewares: Vec::new(),
            renderer: Arc::new(ShellViewRenderer),
            developer: false,
        }
    }

    /// Middleware runs in the order it is added.
    pub fn add_middleware(&mut self, middleware: Arc<dyn Middleware>) {
        self.middlewares.push(middleware);
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn ViewRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn developer(mut self, developer: bool) -> Self {
        self.developer = developer;
        self
    }

    /// Run the matched module against the request. Always returns a terminal
    /// response; nothing escapes this boundary.
    pub fn run(&self, module: &ResolvedModule, request: Request, started: Instant) -> Response {
        let controller = match self.controllers.get(&module.module, &module.controller) {
            Some(c) => c,
            None => {
                error!(
                    module = %module.module,
                    controller = %module.controller,
                    "Controller not found"
                );
                let message = if self.developer {
                    format!(
                        "controller `{}` not found in module `{}`",
                        module.controller, module.module
                    )
                } else {
                    GENERIC_ERROR.to_string()
                };
                let detail = ErrorDetail {
                    kind: "ControllerNotFound".to_string(),
                    message: message.clone(),
                };
                let response = Response::envelope_error(500, message);
                return self.finish(module, &request, response, started, Some(detail));
            }
        };

        controller.init();

        let mut ctx = ActionContext::new(request, module, started, self.developer);

        for middleware in &self.middlewares {
            if let Some(response) = middleware.before(module, &mut ctx) {
                debug!(
                    module = %module.module,
                    action = %module.action,
                    status = response.status(),
                    "Middleware short-circuit"
                );
                return self.finish(module, &ctx.request, response, started, None);
            }
        }

        self.bind_parameters(module, &mut ctx);

        info!(
            request_id = %ctx.request_id,
            module = %module.module,
            controller = %module.controller,
            action = %module.action,
            "Action invocation start"
        );

        let invoked = catch_unwind(AssertUnwindSafe(|| {
            controller.invoke(&module.action, &mut ctx)
        }));

        let (response, detail) = match invoked {
            Ok(Ok(outcome)) => (self.outcome_to_response(outcome, module), None),
            Ok(Err(err)) => {
                error!(
                    request_id = %ctx.request_id,
                    module = %module.module,
                    action = %module.action,
                    error = %err,
                    "Action failed"
                );
                let message = if self.developer {
                    err.to_string()
                } else {
                    GENERIC_ERROR.to_string()
                };
                let detail = ErrorDetail {
                    kind: error_kind(&err),
                    message: err.to_string(),
                };
                (Response::envelope_error(500, message), Some(detail))
            }
            Err(panic) => {
                let panic_message = panic_text(&panic);
                error!(
                    request_id = %ctx.request_id,
                    module = %module.module,
                    action = %module.action,
                    panic_message = %panic_message,
                    "Action panicked"
                );
                let message = if self.developer {
                    format!("action panicked: {panic_message}")
                } else {
                    GENERIC_ERROR.to_string()
                };
                let detail = ErrorDetail {
                    kind: "Panic".to_string(),
                    message: panic_message,
                };
                (Response::envelope_error(500, message), Some(detail))
            }
        };

        self.finish(module, &ctx.request, response, started, detail)
    }

    /// Materialize declared binding sources. Only `Validated` requires work
    /// up front; the request itself and path parameters already live in the
    /// context, and `None` binds nothing by definition.
    fn bind_parameters(&self, module: &ResolvedModule, ctx: &mut ActionContext) {
        for binding in &module.bindings {
            if *binding == BindingKind::Validated && ctx.validated.is_none() {
                let empty = RuleSet::new();
                let rules = module.validate.as_ref().unwrap_or(&empty);
                ctx.validated = Some(ValidatedRequest::validate(rules, ctx.request.body.as_ref()));
            }
        }
    }

    fn outcome_to_response(&self, outcome: ActionOutcome, module: &ResolvedModule) -> Response {
        match outcome {
            ActionOutcome::Respond(response) => response,
            ActionOutcome::Text(body) => Response::text(200, body),
            ActionOutcome::View(view) => Response::html(200, self.renderer.render(&view, module)),
            ActionOutcome::Empty => Response::text(200, String::new()),
        }
    }

    /// Common tail: `after` middleware, then the developer debug block.
    fn finish(
        &self,
        module: &ResolvedModule,
        request: &Request,
        mut response: Response,
        started: Instant,
        detail: Option<ErrorDetail>,
    ) -> Response {
        let latency = started.elapsed();
        for middleware in &self.middlewares {
            middleware.after(module, &mut response, latency);
        }
        if self.developer {
            let caller = Caller {
                module: module.module.clone(),
                controller: module.controller.clone(),
                action: module.action.clone(),
            };
            response.attach_debug(DebugBlock::capture(Some(caller), request, detail));
        }
        response
    }
}

fn error_kind(err: &ActionError) -> String {
    match err {
        ActionError::UnknownAction { .. } => "UnknownAction".to_string(),
        ActionError::Failed(_) => "ActionFailed".to_string(),
        ActionError::Other(_) => "Error".to_string(),
    }
}

fn panic_text(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
