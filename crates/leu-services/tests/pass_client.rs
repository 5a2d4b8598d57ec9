//! HttpPassClient against a stub pass service.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use leu_core::Customer;
use leu_services::{HttpPassClient, LoyaltyError, PassService};

const PASS_TYPE: &str = leu_core::DEFAULT_PASS_TYPE_IDENTIFIER;

async fn spawn(router: Router) -> HttpPassClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    HttpPassClient::with_base_url(&format!("http://{addr}/"), PASS_TYPE, Duration::from_secs(5))
        .unwrap()
}

fn customer_json() -> Value {
    json!({
        "id": "c-1",
        "nombre": "Ana",
        "email": "ana@mail.com",
        "visitas": 3,
        "ultimaVisita": "2026-03-01T10:00:00Z",
        "fechaRegistro": "2026-01-15T09:30:00Z",
        "proximaRecompensa": "Free Dessert",
    })
}

fn customer() -> Customer {
    serde_json::from_value(customer_json()).unwrap()
}

#[tokio::test]
async fn test_issue_pass_sends_customer_and_reads_bare_url() {
    let seen = Arc::new(Mutex::new(Vec::<Value>::new()));
    let sink = seen.clone();

    let client = spawn(Router::new().route(
        "/api/passes/generate",
        post(move |Json(body): Json<Value>| {
            let sink = sink.clone();
            async move {
                sink.lock().unwrap().push(body);
                Json(json!({ "passUrl": "/passes/c-1.pkpass" }))
            }
        }),
    ))
    .await;

    let url = client.issue_pass(&customer()).await.unwrap();
    assert_eq!(url, "/passes/c-1.pkpass");

    let requests = seen.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["id"], "c-1");
    assert_eq!(requests[0]["nombre"], "Ana");
    assert_eq!(requests[0]["passTypeIdentifier"], PASS_TYPE);
    assert!(requests[0]["lastPassUpdate"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn test_issue_pass_envelope_shapes() {
    let client = spawn(Router::new().route(
        "/api/passes/generate",
        post(|| async { Json(json!({ "success": true, "passUrl": "/p/ok.pkpass" })) }),
    ))
    .await;
    assert_eq!(client.issue_pass(&customer()).await.unwrap(), "/p/ok.pkpass");

    let client = spawn(Router::new().route(
        "/api/passes/generate",
        post(|| async { Json(json!({ "success": false, "error": "certificate expired" })) }),
    ))
    .await;
    match client.issue_pass(&customer()).await.unwrap_err() {
        LoyaltyError::PassGeneration(reason) => assert_eq!(reason, "certificate expired"),
        other => panic!("unexpected error: {other:?}"),
    }

    let client = spawn(Router::new().route(
        "/api/passes/generate",
        post(|| async { Json(json!({ "success": true })) }),
    ))
    .await;
    assert!(matches!(
        client.issue_pass(&customer()).await.unwrap_err(),
        LoyaltyError::PassGeneration(_)
    ));
}

#[tokio::test]
async fn test_issue_pass_server_error_uses_body_reason() {
    let client = spawn(Router::new().route(
        "/api/passes/generate",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "signing failed" })),
            )
        }),
    ))
    .await;

    match client.issue_pass(&customer()).await.unwrap_err() {
        LoyaltyError::PassGeneration(reason) => assert_eq!(reason, "signing failed"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_notify_pass_update() {
    let seen = Arc::new(Mutex::new(Vec::<Value>::new()));
    let sink = seen.clone();

    let client = spawn(Router::new().route(
        "/api/push/update-pass",
        post(move |Json(body): Json<Value>| {
            let sink = sink.clone();
            async move {
                sink.lock().unwrap().push(body);
                StatusCode::OK
            }
        }),
    ))
    .await;

    client.notify_pass_update("c-1").await.unwrap();

    let requests = seen.lock().unwrap();
    assert_eq!(requests[0]["clienteId"], "c-1");
    assert!(requests[0]["timestamp"].is_string());
}

#[tokio::test]
async fn test_notify_failure_is_soft() {
    let client = spawn(Router::new().route(
        "/api/push/update-pass",
        post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    ))
    .await;

    let err = client.notify_pass_update("c-1").await.unwrap_err();
    assert!(matches!(err, LoyaltyError::Notification { ref customer_id, .. } if customer_id == "c-1"));
    assert!(err.is_soft());
}

#[tokio::test]
async fn test_fetch_customer() {
    let client = spawn(Router::new().route(
        "/api/passes/{id}",
        get(|Path(id): Path<String>| async move {
            if id == "c-1" {
                Ok(Json(customer_json()))
            } else {
                Err(StatusCode::NOT_FOUND)
            }
        }),
    ))
    .await;

    let found = client.fetch_customer("c-1").await.unwrap().unwrap();
    assert_eq!(found, customer());

    assert!(client.fetch_customer("ghost").await.unwrap().is_none());
}

#[tokio::test]
async fn test_fetch_customer_reads_legacy_record() {
    let client = spawn(Router::new().route(
        "/api/passes/{id}",
        get(|| async {
            Json(json!({
                "id": "c-7",
                "nombre": "Bea",
                "email": "bea@mail.com",
                "visitas": 12,
                "ultimaVisita": { "_seconds": 1_700_000_000, "_nanoseconds": 0 },
                "proximaRecompensa": "Postre Gratis (faltan 5 visitas)",
            }))
        }),
    ))
    .await;

    let before = chrono::Utc::now();
    let found = client.fetch_customer("c-7").await.unwrap().unwrap();

    assert_eq!(found.id, "c-7");
    assert_eq!(found.visits, 12);
    assert_eq!(found.last_visit.timestamp(), 1_700_000_000);
    assert!(found.registered_at >= before);
    assert_eq!(found.next_reward, "Hand Gel Treatment");
    assert!(found.is_tier_consistent());
}

#[tokio::test]
async fn test_fetch_customer_rejects_non_object_body() {
    let client = spawn(Router::new().route(
        "/api/passes/{id}",
        get(|| async { Json(json!(["not", "a", "customer"])) }),
    ))
    .await;

    assert!(matches!(
        client.fetch_customer("c-1").await.unwrap_err(),
        LoyaltyError::Storage(_)
    ));
}

#[tokio::test]
async fn test_unreachable_service() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client =
        HttpPassClient::with_base_url(&format!("http://{addr}"), PASS_TYPE, Duration::from_secs(2))
            .unwrap();

    assert!(matches!(
        client.issue_pass(&customer()).await.unwrap_err(),
        LoyaltyError::PassGeneration(_)
    ));
    assert!(matches!(
        client.fetch_customer("c-1").await.unwrap_err(),
        LoyaltyError::Storage(_)
    ));
}
