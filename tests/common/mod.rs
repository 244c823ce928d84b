//! Shared fixtures for integration tests: a small set of controllers
//! covering API, view, validated, protected and failing actions, plus
//! helpers for assembling a service and the JWT stack.
#![allow(dead_code)]

use portico::dispatcher::{ActionContext, ActionError, ActionOutcome};
use portico::language::{LanguageConfig, LanguageSpec, ModuleManifest};
use portico::registry::{Controller, RouteDef};
use portico::router::{AuthorizeRule, BindingKind, RuleRegistry};
use portico::runtime_config::RuntimeConfig;
use portico::security::{
    GuardRegistry, InMemoryTokenStore, JwtGuard, StaticPermissionStore,
};
use portico::server::{AppService, Response};
use portico::validation::{FieldRules, FieldType, RuleSet};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const SIGNING_KEY: &str = "integration-test-signing-key";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// GET report/(id:uuid) — the end-to-end scenario route.
pub struct ReportController;

impl Controller for ReportController {
    fn name(&self) -> &str {
        "ReportController"
    }

    fn module_path(&self) -> &str {
        "App.Modules.Reports.Controller.ReportController"
    }

    fn routes(&self) -> Vec<RouteDef> {
        vec![RouteDef::get("report/(id:uuid)", "show").api()]
    }

    fn invoke(&self, action: &str, ctx: &mut ActionContext) -> Result<ActionOutcome, ActionError> {
        match action {
            "show" => Ok(ActionOutcome::success(json!({ "id": ctx.param("id") }))),
            other => Err(ActionError::unknown_action(self.name(), other)),
        }
    }
}

/// Literal route registered before the typed pattern that would also match.
pub struct UserController;

impl Controller for UserController {
    fn name(&self) -> &str {
        "UserController"
    }

    fn module_path(&self) -> &str {
        "App.Modules.Users.Controller.UserController"
    }

    fn routes(&self) -> Vec<RouteDef> {
        vec![
            RouteDef::get("users/me", "me").api(),
            RouteDef::get("users/(id:int)", "show").api(),
        ]
    }

    fn invoke(&self, action: &str, ctx: &mut ActionContext) -> Result<ActionOutcome, ActionError> {
        match action {
            "me" => Ok(ActionOutcome::success(json!({ "user": "me" }))),
            "show" => Ok(ActionOutcome::success(json!({ "user": ctx.param("id") }))),
            other => Err(ActionError::unknown_action(self.name(), other)),
        }
    }
}

/// Protected actions with a side-effect counter: the counter must stay at
/// zero whenever authorization short-circuits.
pub struct VaultController {
    pub hits: Arc<AtomicUsize>,
}

impl VaultController {
    pub fn new() -> (Arc<Self>, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        (
            Arc::new(Self {
                hits: Arc::clone(&hits),
            }),
            hits,
        )
    }
}

impl Controller for VaultController {
    fn name(&self) -> &str {
        "VaultController"
    }

    fn module_path(&self) -> &str {
        "App.Modules.Vault.Controller.VaultController"
    }

    fn routes(&self) -> Vec<RouteDef> {
        vec![
            RouteDef::get("vault/secret", "secret")
                .api()
                .authorize(AuthorizeRule::guard("jwt")),
            RouteDef::get("vault/admin", "admin")
                .api()
                .authorize(AuthorizeRule::guard("jwt").with_permissions(["admin", "manager"])),
        ]
    }

    fn invoke(&self, action: &str, ctx: &mut ActionContext) -> Result<ActionOutcome, ActionError> {
        self.hits.fetch_add(1, Ordering::SeqCst);
        let principal = ctx.principal.as_ref().map(|p| p.id.clone());
        match action {
            "secret" => Ok(ActionOutcome::success(json!({ "principal": principal }))),
            "admin" => Ok(ActionOutcome::success(json!({ "admin": principal }))),
            other => Err(ActionError::unknown_action(self.name(), other)),
        }
    }
}

/// Localized view module (Catalog: en default, ka).
pub struct ProductController;

impl Controller for ProductController {
    fn name(&self) -> &str {
        "ProductController"
    }

    fn module_path(&self) -> &str {
        "App.Modules.Catalog.Controller.ProductController"
    }

    fn routes(&self) -> Vec<RouteDef> {
        vec![RouteDef::get("products", "list").view()]
    }

    fn invoke(&self, action: &str, _ctx: &mut ActionContext) -> Result<ActionOutcome, ActionError> {
        match action {
            "list" => Ok(ActionOutcome::View(portico::dispatcher::ViewPayload {
                template: "catalog/list".to_string(),
                data: json!({ "products": [] }),
            })),
            other => Err(ActionError::unknown_action(self.name(), other)),
        }
    }
}

/// Validated POST body; `create` short-circuits through `check()`,
/// `create_lenient` inspects the wrapper and keeps going.
pub struct OrderController;

pub fn order_rules() -> RuleSet {
    RuleSet::new()
        .field(
            "customer.name",
            FieldRules::new().required().of_type(FieldType::String).min(2.0),
        )
        .field("qty", FieldRules::new().required().of_type(FieldType::Int).min(1.0))
}

impl Controller for OrderController {
    fn name(&self) -> &str {
        "OrderController"
    }

    fn module_path(&self) -> &str {
        "App.Modules.Orders.Controller.OrderController"
    }

    fn routes(&self) -> Vec<RouteDef> {
        vec![
            RouteDef::post("orders", "create")
                .api()
                .validate(order_rules())
                .bind(BindingKind::Validated),
            RouteDef::post("orders/lenient", "create_lenient")
                .api()
                .validate(order_rules())
                .bind(BindingKind::Validated),
        ]
    }

    fn invoke(&self, action: &str, ctx: &mut ActionContext) -> Result<ActionOutcome, ActionError> {
        let validated = ctx
            .validated
            .as_ref()
            .ok_or_else(|| ActionError::failed("validated binding missing"))?;
        match action {
            "create" => {
                if let Some(response) = validated.check() {
                    return Ok(ActionOutcome::Respond(response));
                }
                Ok(ActionOutcome::success(json!({ "qty": validated.get("qty") })))
            }
            "create_lenient" => Ok(ActionOutcome::success(
                json!({ "error_count": validated.errors().len() }),
            )),
            other => Err(ActionError::unknown_action(self.name(), other)),
        }
    }
}

/// Failing actions for the dispatch-boundary error tests.
pub struct BoomController;

impl Controller for BoomController {
    fn name(&self) -> &str {
        "BoomController"
    }

    fn module_path(&self) -> &str {
        "App.Modules.Ops.Controller.BoomController"
    }

    fn routes(&self) -> Vec<RouteDef> {
        vec![
            RouteDef::get("ops/boom", "boom").api(),
            RouteDef::get("ops/fail", "fail").api(),
            RouteDef::cli("ops/rebuild", "rebuild").api(),
        ]
    }

    fn invoke(&self, action: &str, _ctx: &mut ActionContext) -> Result<ActionOutcome, ActionError> {
        match action {
            "boom" => panic!("kaboom"),
            "fail" => Err(ActionError::failed("upstream unavailable")),
            "rebuild" => Ok(ActionOutcome::success(json!({ "rebuilt": true }))),
            other => Err(ActionError::unknown_action(self.name(), other)),
        }
    }
}

/// Browser-facing fallback module. Declares no routes on purpose: it is
/// reached only through the resolution-miss branch.
pub struct ErrorController;

impl Controller for ErrorController {
    fn name(&self) -> &str {
        "ErrorController"
    }

    fn module_path(&self) -> &str {
        "App.Modules.Errors.Controller.ErrorController"
    }

    fn routes(&self) -> Vec<RouteDef> {
        Vec::new()
    }

    fn invoke(&self, action: &str, _ctx: &mut ActionContext) -> Result<ActionOutcome, ActionError> {
        match action {
            "not_found" => Ok(ActionOutcome::Respond(Response::html(
                404,
                "<h1>Page not found</h1>",
            ))),
            other => Err(ActionError::unknown_action(self.name(), other)),
        }
    }
}

/// In-memory language config for the Catalog module: en (default) and ka.
pub fn catalog_languages() -> LanguageConfig {
    let mut config = LanguageConfig::new();
    config.insert(
        "Catalog",
        ModuleManifest {
            module_type: "view".to_string(),
            languages: true,
            default_language: Some("en".to_string()),
            theme: Some("midnight".to_string()),
        },
        vec![
            LanguageSpec {
                prefix: "en".to_string(),
                iso: "en".to_string(),
                name: "English".to_string(),
                header: Some("en-US".to_string()),
            },
            LanguageSpec {
                prefix: "ka".to_string(),
                iso: "ka".to_string(),
                name: "ქართული".to_string(),
                header: Some("ka-GE".to_string()),
            },
        ],
    );
    config
}

/// The JWT stack wired together: token store, permission store, guard, and
/// a registry exposing the guard under the default `jwt` name.
pub struct JwtStack {
    pub store: Arc<InMemoryTokenStore>,
    pub permissions: Arc<StaticPermissionStore>,
    pub guard: Arc<JwtGuard>,
    pub guards: Arc<GuardRegistry>,
}

pub fn jwt_stack() -> JwtStack {
    let store = Arc::new(InMemoryTokenStore::new());
    let permissions = Arc::new(StaticPermissionStore::new());
    let guard = Arc::new(JwtGuard::new(
        SIGNING_KEY,
        Arc::clone(&store) as Arc<dyn portico::security::TokenStore>,
        Arc::clone(&permissions) as Arc<dyn portico::security::PermissionStore>,
    ));
    let mut guards = GuardRegistry::new();
    guards.register("jwt", Arc::clone(&guard) as Arc<dyn portico::security::Guard>);
    JwtStack {
        store,
        permissions,
        guard,
        guards: Arc::new(guards),
    }
}

/// Assemble a service with defaults: built-in rules and an empty language
/// config unless provided.
pub fn build_service(
    controllers: Vec<Arc<dyn Controller>>,
    languages: LanguageConfig,
    guards: Arc<GuardRegistry>,
    config: RuntimeConfig,
) -> AppService {
    init_tracing();
    AppService::initialize(
        controllers,
        RuleRegistry::with_defaults(),
        languages,
        guards,
        config,
    )
    .expect("service must boot")
}
