//! Authorization gate tests: fail-closed short-circuits, OR-semantics
//! permission checks, and principal binding.

mod common;

use common::{build_service, jwt_stack, VaultController};
use portico::language::LanguageConfig;
use portico::runtime_config::RuntimeConfig;
use portico::server::Request;
use std::sync::atomic::Ordering;
use std::sync::Arc;

const CLIENT_IP: &str = "203.0.113.7";
const USER_AGENT: &str = "integration-tests/1.0";

fn login_request() -> Request {
    Request::get("/vault/secret")
        .with_client_ip(CLIENT_IP)
        .with_header("user-agent", USER_AGENT)
}

#[test]
fn missing_bearer_token_yields_401_and_action_never_runs() {
    let stack = jwt_stack();
    let (vault, hits) = VaultController::new();
    let service = build_service(
        vec![vault],
        LanguageConfig::new(),
        Arc::clone(&stack.guards),
        RuntimeConfig::default(),
    );

    let response = service.handle(Request::get("/vault/secret"));

    assert_eq!(response.status(), 401);
    assert_eq!(response.envelope_status(), Some("error"));
    assert_eq!(
        response.envelope_result().and_then(|v| v.as_str()),
        Some("unauthorized")
    );
    assert_eq!(hits.load(Ordering::SeqCst), 0, "action body must not execute");
}

#[test]
fn valid_token_reaches_action_with_principal_bound() {
    let stack = jwt_stack();
    let (vault, hits) = VaultController::new();
    let service = build_service(
        vec![vault],
        LanguageConfig::new(),
        Arc::clone(&stack.guards),
        RuntimeConfig::default(),
    );

    let token = stack.guard.authorize("user-7", &login_request()).unwrap();
    let response = service.handle(
        login_request().with_header("authorization", format!("Bearer {token}")),
    );

    assert_eq!(response.status(), 200);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(
        response.envelope_result().and_then(|v| v["principal"].as_str()),
        Some("user-7")
    );
}

#[test]
fn permission_or_semantics_allows_any_match() {
    let stack = jwt_stack();
    stack.permissions.assign("manager-1", ["manager"]);
    let (vault, _hits) = VaultController::new();
    let service = build_service(
        vec![vault],
        LanguageConfig::new(),
        Arc::clone(&stack.guards),
        RuntimeConfig::default(),
    );

    let login = Request::get("/vault/admin")
        .with_client_ip(CLIENT_IP)
        .with_header("user-agent", USER_AGENT);
    let token = stack.guard.authorize("manager-1", &login).unwrap();
    // Required set is {admin, manager}; holding only `manager` is enough.
    let response = service.handle(
        login.clone().with_header("authorization", format!("Bearer {token}")),
    );
    assert_eq!(response.status(), 200);
}

#[test]
fn insufficient_permissions_yield_403() {
    let stack = jwt_stack();
    stack.permissions.assign("viewer-1", ["viewer"]);
    let (vault, hits) = VaultController::new();
    let service = build_service(
        vec![vault],
        LanguageConfig::new(),
        Arc::clone(&stack.guards),
        RuntimeConfig::default(),
    );

    let login = Request::get("/vault/admin")
        .with_client_ip(CLIENT_IP)
        .with_header("user-agent", USER_AGENT);
    let token = stack.guard.authorize("viewer-1", &login).unwrap();
    let response = service.handle(
        login.clone().with_header("authorization", format!("Bearer {token}")),
    );

    assert_eq!(response.status(), 403);
    assert_eq!(
        response.envelope_result().and_then(|v| v.as_str()),
        Some("no access")
    );
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[test]
fn unregistered_guard_fails_closed() {
    let (vault, hits) = VaultController::new();
    // Empty guard registry: the route's `jwt` guard cannot resolve anyone.
    let service = build_service(
        vec![vault],
        LanguageConfig::new(),
        Arc::new(portico::security::GuardRegistry::new()),
        RuntimeConfig::default(),
    );

    let response = service.handle(login_request());
    assert_eq!(response.status(), 401);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[test]
fn error_envelope_shares_success_shape() {
    let stack = jwt_stack();
    let (vault, _hits) = VaultController::new();
    let service = build_service(
        vec![vault],
        LanguageConfig::new(),
        Arc::clone(&stack.guards),
        RuntimeConfig::default(),
    );

    let response = service.handle(Request::get("/vault/secret"));
    let envelope = response.envelope_value(std::time::Instant::now()).unwrap();
    assert!(envelope.get("result").is_some());
    assert_eq!(envelope["code"], 401);
    assert_eq!(envelope["status"], "error");
    assert!(envelope["core"]["generation"].as_str().unwrap().ends_with("sec."));
    assert!(envelope["core"].get("memory").is_some());
}
