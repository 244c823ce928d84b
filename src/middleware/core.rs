use crate::dispatcher::ActionContext;
use crate::router::ResolvedModule;
use crate::server::response::Response;
use std::time::Duration;

/// Request/response processing hook around action invocation.
///
/// `before` may short-circuit by returning a terminal response, in which
/// case the target action never runs. `after` sees every outgoing response,
/// including short-circuits.
pub trait Middleware: Send + Sync {
    fn before(&self, _module: &ResolvedModule, _ctx: &mut ActionContext) -> Option<Response> {
        None
    }

    fn after(&self, _module: &ResolvedModule, _res: &mut Response, _latency: Duration) {}
}
