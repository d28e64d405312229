//! REST Endpoint Tests
//!
//! Drives the full router with in-memory tables:
//! - Status mapping (200/201/204/400/404/500)
//! - Error body shape `{ "error": ... }`
//! - Query strings reaching the accessor

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use orthoplus_rest::http_server::{HttpServer, ServerConfig};
use orthoplus_rest::rest_api::{
    AccessError, AccessResult, MemoryTable, ParseMode, QuerySpec, RecordId, TableAccessor,
    TableRegistry,
};

// =============================================================================
// Helper Functions
// =============================================================================

/// Accessor that fails every call
struct OfflineTable;

impl TableAccessor for OfflineTable {
    fn find_many(&self, _: &QuerySpec) -> AccessResult<Vec<Value>> {
        Err(AccessError::Backend("database offline".to_string()))
    }
    fn find_unique(&self, _: &RecordId) -> AccessResult<Option<Value>> {
        Err(AccessError::Backend("database offline".to_string()))
    }
    fn create(&self, _: Value) -> AccessResult<Value> {
        Err(AccessError::Backend("database offline".to_string()))
    }
    fn update(&self, _: &RecordId, _: Value) -> AccessResult<Value> {
        Err(AccessError::Backend("database offline".to_string()))
    }
    fn delete(&self, _: &RecordId) -> AccessResult<()> {
        Err(AccessError::Backend("database offline".to_string()))
    }
}

fn registry() -> TableRegistry {
    let patients = MemoryTable::with_rows(vec![
        json!({"id": 42, "name": "Mariana", "city": "SP", "status": "ACTIVE", "age": 34}),
        json!({"id": 43, "name": "Bruno", "city": "RJ", "status": "ACTIVE", "age": 17}),
        json!({"id": 44, "name": "Ana", "city": "BH", "status": "ACTIVE", "age": 52}),
        json!({"id": 45, "name": "Carla", "city": "SP", "status": "INACTIVE", "age": 29}),
        json!({"id": 46, "name": "Diego", "city": "RJ", "status": "ACTIVE", "age": 41}),
    ])
    .unwrap();

    TableRegistry::new()
        .with_table("patients", Arc::new(patients))
        .with_table("appointments", Arc::new(MemoryTable::new()))
        .with_table("ledger", Arc::new(OfflineTable))
}

fn app_with(mode: ParseMode) -> Router {
    let config = ServerConfig {
        filter_mode: mode,
        ..Default::default()
    };
    HttpServer::new(config, registry()).router()
}

fn app() -> Router {
    app_with(ParseMode::Permissive)
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, body).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

/// Send a raw body, with an optional content-type, and decode the JSON reply
async fn send_raw(app: Router, method: Method, uri: &str, content_type: Option<&str>, body: &str) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(content_type) = content_type {
        builder = builder.header("content-type", content_type);
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn names(rows: &Value) -> Vec<&str> {
    rows.as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect()
}

// =============================================================================
// List
// =============================================================================

#[tokio::test]
async fn test_list_filter_order_limit() {
    let (status, body) = send_json(
        app(),
        Method::GET,
        "/rest/v1/patients?status=eq.ACTIVE&order=name.asc&limit=3",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["Ana", "Bruno", "Diego"]);
}

#[tokio::test]
async fn test_list_unknown_table() {
    let (status, body) = send_json(app(), Method::GET, "/rest/v1/unknown_table", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Table unknown_table not found"}));
}

#[tokio::test]
async fn test_list_no_match_is_empty_array() {
    let (status, body) = send_json(app(), Method::GET, "/rest/v1/patients?city=eq.POA", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_list_or_group() {
    let (status, body) = send_json(
        app(),
        Method::GET,
        "/rest/v1/patients?or=(city.eq.SP,city.eq.RJ)&order=id.asc",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["Mariana", "Bruno", "Carla", "Diego"]);
}

#[tokio::test]
async fn test_list_or_group_is_extra_conjunct() {
    let (_, body) = send_json(
        app(),
        Method::GET,
        "/rest/v1/patients?status=eq.ACTIVE&or=(age.gt.40,name.ilike.*ari*)&order=id.asc",
        None,
    )
    .await;

    assert_eq!(names(&body), vec!["Mariana", "Ana", "Diego"]);
}

#[tokio::test]
async fn test_list_select_offset_in() {
    let (_, body) = send_json(
        app(),
        Method::GET,
        "/rest/v1/patients?select=id,name&id=in.(42,43,44)&order=id.desc&offset=1",
        None,
    )
    .await;

    assert_eq!(body, json!([{"id": 43, "name": "Bruno"}, {"id": 42, "name": "Mariana"}]));
}

#[tokio::test]
async fn test_list_permissive_ignores_malformed() {
    let (status, body) = send_json(app(), Method::GET, "/rest/v1/patients?name=ilike.Ana", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_list_strict_rejects_malformed() {
    let (status, body) = send_json(
        app_with(ParseMode::Strict),
        Method::GET,
        "/rest/v1/patients?name=ilike.Ana",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid filter"));
}

#[tokio::test]
async fn test_list_strict_unknown_table_is_404() {
    let (status, body) = send_json(
        app_with(ParseMode::Strict),
        Method::GET,
        "/rest/v1/unknown_table?name=ilike.Ana",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Table unknown_table not found"}));
}

#[tokio::test]
async fn test_list_accessor_failure_is_500() {
    let (status, body) = send_json(app(), Method::GET, "/rest/v1/ledger", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "database offline"}));
}

// =============================================================================
// Single-record verbs
// =============================================================================

#[tokio::test]
async fn test_get_by_numeric_id() {
    let (status, body) = send_json(app(), Method::GET, "/rest/v1/patients/42", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Mariana");
}

#[tokio::test]
async fn test_get_missing() {
    let (status, body) = send_json(app(), Method::GET, "/rest/v1/patients/999", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Not found"}));
}

#[tokio::test]
async fn test_create_returns_201() {
    let (status, body) = send_json(
        app(),
        Method::POST,
        "/rest/v1/appointments",
        Some(json!({"patient_id": 42, "starts_at": "2026-10-20T09:00:00Z"})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["patient_id"], 42);
    assert!(body["id"].is_string());
}

#[tokio::test]
async fn test_create_non_object_is_400() {
    let (status, body) = send_json(app(), Method::POST, "/rest/v1/appointments", Some(json!([1, 2]))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_update_partial() {
    let (status, body) = send_json(
        app(),
        Method::PATCH,
        "/rest/v1/patients/43",
        Some(json!({"city": "SP"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["city"], "SP");
    assert_eq!(body["name"], "Bruno");
}

#[tokio::test]
async fn test_delete_existing_and_missing() {
    let app = app();

    let (status, bytes) = send(app.clone(), Method::DELETE, "/rest/v1/patients/42", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(bytes.is_empty());

    let (status, body) = send_json(app.clone(), Method::DELETE, "/rest/v1/patients/42", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Not found"}));

    let (status, _) = send(app, Method::GET, "/rest/v1/patients/42", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_missing_is_404() {
    let (status, body) = send_json(
        app(),
        Method::PATCH,
        "/rest/v1/patients/999",
        Some(json!({"city": "SP"})),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Not found"}));
}

#[tokio::test]
async fn test_malformed_json_body_is_400() {
    for method in [Method::POST, Method::PATCH] {
        let uri = if method == Method::POST {
            "/rest/v1/patients"
        } else {
            "/rest/v1/patients/42"
        };
        let (status, body) = send_raw(app(), method, uri, Some("application/json"), "{not json").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));
    }
}

#[tokio::test]
async fn test_body_without_content_type_is_400() {
    let (status, body) = send_raw(app(), Method::POST, "/rest/v1/patients", None, r#"{"name": "Ana"}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_single_record_verbs_on_unknown_table() {
    let expected = json!({"error": "Table unknown_table not found"});

    let (status, body) = send_json(app(), Method::GET, "/rest/v1/unknown_table/1", None).await;
    assert_eq!((status, &body), (StatusCode::NOT_FOUND, &expected));

    let (status, body) = send_json(app(), Method::POST, "/rest/v1/unknown_table", Some(json!({"a": 1}))).await;
    assert_eq!((status, &body), (StatusCode::NOT_FOUND, &expected));

    let (status, body) = send_json(app(), Method::PATCH, "/rest/v1/unknown_table/1", Some(json!({"a": 1}))).await;
    assert_eq!((status, &body), (StatusCode::NOT_FOUND, &expected));

    let (status, body) = send_json(app(), Method::DELETE, "/rest/v1/unknown_table/1", None).await;
    assert_eq!((status, &body), (StatusCode::NOT_FOUND, &expected));
}

#[tokio::test]
async fn test_unknown_table_wins_over_bad_body() {
    let (status, body) = send_raw(app(), Method::POST, "/rest/v1/unknown_table", Some("application/json"), "{not json").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Table unknown_table not found"}));
}

#[tokio::test]
async fn test_single_record_accessor_failures_are_500() {
    let expected = json!({"error": "database offline"});

    let (status, body) = send_json(app(), Method::POST, "/rest/v1/ledger", Some(json!({"amount": 10}))).await;
    assert_eq!((status, &body), (StatusCode::INTERNAL_SERVER_ERROR, &expected));

    let (status, body) = send_json(app(), Method::PATCH, "/rest/v1/ledger/1", Some(json!({"amount": 20}))).await;
    assert_eq!((status, &body), (StatusCode::INTERNAL_SERVER_ERROR, &expected));

    let (status, body) = send_json(app(), Method::DELETE, "/rest/v1/ledger/1", None).await;
    assert_eq!((status, &body), (StatusCode::INTERNAL_SERVER_ERROR, &expected));

    let (status, body) = send_json(app(), Method::GET, "/rest/v1/ledger/1", None).await;
    assert_eq!((status, &body), (StatusCode::INTERNAL_SERVER_ERROR, &expected));
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send_json(app(), Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["tables"], 3);
}
