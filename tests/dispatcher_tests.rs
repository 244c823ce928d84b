//! Dispatch boundary tests: controller lookup failures, panic recovery,
//! the developer/production message policy, and view rendering.

mod common;

use common::{build_service, BoomController, ProductController};
use portico::dispatcher::ModuleRunner;
use portico::language::LanguageConfig;
use portico::registry::ControllerRegistry;
use portico::router::{ResolvedModule, RouteKind};
use portico::runtime_config::RuntimeConfig;
use portico::security::GuardRegistry;
use portico::server::Request;
use std::sync::Arc;
use std::time::Instant;

fn resolved(module: &str, controller: &str, action: &str) -> ResolvedModule {
    ResolvedModule {
        module: module.to_string(),
        controller: controller.to_string(),
        action: action.to_string(),
        parameters: Default::default(),
        pattern: String::new(),
        kind: RouteKind::Api,
        authorize: Vec::new(),
        validate: None,
        bindings: Vec::new(),
        language: None,
        theme: None,
    }
}

#[test]
fn missing_controller_is_a_500_envelope() {
    common::init_tracing();
    let runner = ModuleRunner::new(Arc::new(ControllerRegistry::new()));
    let response = runner.run(
        &resolved("Ghost", "GhostController", "index"),
        Request::get("/ghost"),
        Instant::now(),
    );
    assert_eq!(response.status(), 500);
    assert_eq!(response.envelope_status(), Some("error"));
}

#[test]
fn missing_controller_message_depends_on_mode() {
    common::init_tracing();
    let registry = Arc::new(ControllerRegistry::new());

    let dev = ModuleRunner::new(Arc::clone(&registry)).developer(true);
    let response = dev.run(
        &resolved("Ghost", "GhostController", "index"),
        Request::get("/ghost"),
        Instant::now(),
    );
    let message = response.envelope_result().and_then(|v| v.as_str()).unwrap();
    assert!(message.contains("GhostController"));

    let prod = ModuleRunner::new(registry);
    let response = prod.run(
        &resolved("Ghost", "GhostController", "index"),
        Request::get("/ghost"),
        Instant::now(),
    );
    assert_eq!(
        response.envelope_result().and_then(|v| v.as_str()),
        Some("internal server error")
    );
}

#[test]
fn action_panic_becomes_500_without_tearing_down() {
    let service = build_service(
        vec![Arc::new(BoomController)],
        LanguageConfig::new(),
        Arc::new(GuardRegistry::new()),
        RuntimeConfig::default(),
    );

    let response = service.handle(Request::get("/ops/boom"));
    assert_eq!(response.status(), 500);
    assert_eq!(
        response.envelope_result().and_then(|v| v.as_str()),
        Some("internal server error"),
        "production mode must not leak the panic message"
    );

    // The service keeps serving after a panic.
    let response = service.handle(Request::get("/ops/fail"));
    assert_eq!(response.status(), 500);
}

#[test]
fn developer_mode_exposes_failure_and_debug_block() {
    let service = build_service(
        vec![Arc::new(BoomController)],
        LanguageConfig::new(),
        Arc::new(GuardRegistry::new()),
        RuntimeConfig::default().with_developer(true),
    );

    let response = service.handle(Request::get("/ops/boom"));
    assert_eq!(response.status(), 500);
    let message = response.envelope_result().and_then(|v| v.as_str()).unwrap();
    assert!(message.contains("kaboom"));
    assert!(response.has_debug());

    let envelope = response.envelope_value(Instant::now()).unwrap();
    assert_eq!(envelope["debug"]["caller"]["module"], "Ops");
    assert_eq!(envelope["debug"]["error"]["kind"], "Panic");
    let trace = envelope["debug"]["trace"].as_array().unwrap();
    assert!(trace.len() <= 15);
}

#[test]
fn production_mode_omits_debug_block() {
    let service = build_service(
        vec![Arc::new(BoomController)],
        LanguageConfig::new(),
        Arc::new(GuardRegistry::new()),
        RuntimeConfig::default(),
    );
    let response = service.handle(Request::get("/ops/fail"));
    assert!(!response.has_debug());
}

#[test]
fn action_error_maps_to_500_with_mode_policy() {
    let dev = build_service(
        vec![Arc::new(BoomController)],
        LanguageConfig::new(),
        Arc::new(GuardRegistry::new()),
        RuntimeConfig::default().with_developer(true),
    );
    let response = dev.handle(Request::get("/ops/fail"));
    assert_eq!(response.status(), 500);
    assert_eq!(
        response.envelope_result().and_then(|v| v.as_str()),
        Some("upstream unavailable")
    );
}

#[test]
fn view_outcome_renders_with_module_theme() {
    let service = build_service(
        vec![Arc::new(ProductController)],
        common::catalog_languages(),
        Arc::new(GuardRegistry::new()),
        RuntimeConfig::default(),
    );

    let rendered = service.respond(Request::get("/products"));
    assert_eq!(rendered.status, 200);
    assert!(rendered.body.contains("data-template=\"catalog/list\""));
    assert!(rendered.body.contains("data-theme=\"midnight\""));
    assert!(rendered
        .headers
        .iter()
        .any(|(k, v)| k == "content-type" && v == "text/html"));
}
