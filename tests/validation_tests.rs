//! Validated-request binding through the full pipeline: failures produce a
//! 422 only when the action asks for it, and never throw into the
//! dispatcher.

mod common;

use common::{build_service, OrderController};
use portico::language::LanguageConfig;
use portico::runtime_config::RuntimeConfig;
use portico::security::GuardRegistry;
use portico::server::Request;
use serde_json::json;
use std::sync::Arc;

fn order_service() -> portico::server::AppService {
    build_service(
        vec![Arc::new(OrderController)],
        LanguageConfig::new(),
        Arc::new(GuardRegistry::new()),
        RuntimeConfig::default(),
    )
}

#[test]
fn valid_body_passes_through_check() {
    let service = order_service();
    let response = service.handle(
        Request::post("/orders").with_body(json!({
            "customer": { "name": "Acme" },
            "qty": 3
        })),
    );
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.envelope_result().and_then(|v| v["qty"].as_i64()),
        Some(3)
    );
}

#[test]
fn invalid_body_becomes_422_via_check() {
    let service = order_service();
    let response = service.handle(
        Request::post("/orders").with_body(json!({
            "customer": { "name": "A" },
            "qty": 0
        })),
    );
    assert_eq!(response.status(), 422);
    assert_eq!(response.envelope_status(), Some("error"));
    let errors = response.envelope_result().unwrap().as_array().unwrap();
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().any(|e| e["field"] == "customer.name" && e["rule"] == "min"));
    assert!(errors.iter().any(|e| e["field"] == "qty" && e["rule"] == "min"));
}

#[test]
fn missing_body_reports_required_fields() {
    let service = order_service();
    let response = service.handle(Request::post("/orders"));
    assert_eq!(response.status(), 422);
    let errors = response.envelope_result().unwrap().as_array().unwrap();
    assert!(errors.iter().all(|e| e["rule"] == "required"));
}

#[test]
fn action_may_inspect_wrapper_instead_of_failing() {
    let service = order_service();
    // Same rule set, but the lenient action turns the failures into data.
    let response = service.handle(Request::post("/orders/lenient").with_body(json!({})));
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.envelope_result().and_then(|v| v["error_count"].as_i64()),
        Some(2)
    );
}
