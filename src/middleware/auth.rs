use super::Middleware;
use crate::dispatcher::ActionContext;
use crate::router::ResolvedModule;
use crate::security::GuardRegistry;
use crate::server::response::Response;
use std::sync::Arc;
use tracing::{debug, warn};

/// Authorization gate evaluated before the target action.
///
/// Each [`AuthorizeRule`](crate::router::AuthorizeRule) declared on the
/// resolved route is checked in declaration order and the first failure
/// wins:
///
/// * no principal from the named guard → 401 `"unauthorized"`
/// * principal lacks every required permission → 403 `"no access"`
///
/// Permission checks use OR semantics — holding any one of the required
/// permissions is enough. On success the principal is bound into the
/// request-scoped context for the action to use.
pub struct AuthMiddleware {
    guards: Arc<GuardRegistry>,
}

impl AuthMiddleware {
    pub fn new(guards: Arc<GuardRegistry>) -> Self {
        Self { guards }
    }
}

impl Middleware for AuthMiddleware {
    fn before(&self, module: &ResolvedModule, ctx: &mut ActionContext) -> Option<Response> {
        for rule in &module.authorize {
            let guard = match self.guards.get(&rule.guard) {
                Some(g) => g,
                None => {
                    // An unregistered guard can never produce a principal;
                    // fail closed rather than open.
                    warn!(guard = %rule.guard, "Authorization rule names an unregistered guard");
                    return Some(Response::envelope_error(401, "unauthorized"));
                }
            };

            let principal = match guard.user(&ctx.request) {
                Some(p) => p,
                None => {
                    debug!(
                        guard = %rule.guard,
                        module = %module.module,
                        action = %module.action,
                        "Authorization failed: no principal"
                    );
                    return Some(Response::envelope_error(401, "unauthorized"));
                }
            };

            if !principal.has_any_permission(&rule.permissions) {
                warn!(
                    principal = %principal.id,
                    required = ?rule.permissions,
                    module = %module.module,
                    action = %module.action,
                    "Authorization failed: no matching permission"
                );
                return Some(Response::envelope_error(403, "no access"));
            }

            debug!(principal = %principal.id, guard = %rule.guard, "Principal authorized");
            ctx.principal = Some(principal);
        }
        None
    }
}
