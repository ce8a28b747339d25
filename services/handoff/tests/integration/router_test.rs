use std::time::Duration;

use axum::http::StatusCode;
use axum_test::{TestRequest, TestServer};
use chrono::Utc;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
use serde_json::json;
use uuid::Uuid;

use souq_domain::id::OrderId;
use souq_domain::order::OrderStatus;
use souq_handoff::domain::policy::HandoffPolicy;
use souq_handoff_schema::orders;
use souq_handoff::infra::notifier::OrderChangeHub;
use souq_handoff::router::build_router;
use souq_handoff::state::AppState;
use souq_testing::auth::MockAuth;

/// Router over a disconnected database: every request that reaches persistence fails,
/// so these tests only cover what is decided before it.
fn server() -> TestServer {
    let state = AppState {
        db: DatabaseConnection::Disconnected,
        hub: OrderChangeHub::new(16),
        policy: HandoffPolicy::default(),
    };
    TestServer::new(build_router(state)).unwrap()
}

/// Router over a live transport, backed by `db`, sharing `hub` with the caller.
fn ws_server(db: DatabaseConnection, hub: &OrderChangeHub) -> TestServer {
    let state = AppState {
        db,
        hub: hub.clone(),
        policy: HandoffPolicy::default(),
    };
    TestServer::builder()
        .http_transport()
        .build(build_router(state))
        .unwrap()
}

fn order_row(order_id: OrderId, status: OrderStatus) -> orders::Model {
    let now = Utc::now();
    orders::Model {
        id: order_id.0,
        status: status.as_str().to_owned(),
        picked_up_at: None,
        delivered_at: None,
        created_at: now,
        updated_at: now,
    }
}

async fn wait_until_unwatched(hub: &OrderChangeHub) {
    for _ in 0..100 {
        if hub.watched_orders().await == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("order channel still open after the watcher left");
}

fn as_user(mut request: TestRequest, auth: &MockAuth) -> TestRequest {
    for (name, value) in auth.headers().iter() {
        request = request.add_header(name.clone(), value.clone());
    }
    request
}

fn order_path(suffix: &str) -> String {
    format!("/orders/{}{suffix}", Uuid::now_v7())
}

#[tokio::test]
async fn should_answer_liveness_without_dependencies() {
    let response = server().get("/healthz").await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn should_report_not_ready_without_database() {
    let response = server().get("/readyz").await;
    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn should_echo_request_id() {
    let response = server()
        .get("/healthz")
        .add_header("x-request-id", "req-42")
        .await;
    assert_eq!(response.header("x-request-id"), "req-42");
}

#[tokio::test]
async fn should_reject_missing_identity() {
    let server = server();
    for path in [
        order_path(""),
        order_path("/handoffs"),
        order_path("/handoffs/pickup/code"),
    ] {
        let response = server.get(&path).await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED, "{path}");
    }
}

#[tokio::test]
async fn should_only_let_handing_party_see_code() {
    let server = server();
    let cases = [
        ("pickup", MockAuth::customer()),
        ("pickup", MockAuth::driver()),
        ("delivery", MockAuth::customer()),
        ("delivery", MockAuth::vendor()),
    ];
    for (kind, auth) in cases {
        let path = order_path(&format!("/handoffs/{kind}/code"));
        let response = as_user(server.get(&path), &auth).await;
        assert_eq!(response.status_code(), StatusCode::FORBIDDEN, "{kind}");
        let body: serde_json::Value = response.json();
        assert_eq!(body["kind"], "FORBIDDEN");

        let response = as_user(server.post(&path), &auth).await;
        assert_eq!(response.status_code(), StatusCode::FORBIDDEN, "{kind}");
    }
}

#[tokio::test]
async fn should_only_let_receiving_party_verify() {
    let server = server();
    let cases = [
        ("pickup", MockAuth::vendor()),
        ("pickup", MockAuth::customer()),
        ("delivery", MockAuth::driver()),
        ("delivery", MockAuth::vendor()),
    ];
    for (kind, auth) in cases {
        let path = order_path(&format!("/handoffs/{kind}/verify"));
        let response = as_user(server.post(&path), &auth)
            .json(&json!({ "method": "otp", "code": "482193" }))
            .await;
        assert_eq!(response.status_code(), StatusCode::FORBIDDEN, "{kind}");
    }
}

#[tokio::test]
async fn should_only_let_vendor_or_admin_sync_status() {
    let server = server();
    for auth in [MockAuth::customer(), MockAuth::driver()] {
        let response = as_user(server.put(&order_path("/status")), &auth)
            .json(&json!({ "status": "awaiting_pickup" }))
            .await;
        assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    }
}

#[tokio::test]
async fn should_reject_unknown_handoff_type() {
    let response = as_user(
        server().get(&order_path("/handoffs/dropoff/code")),
        &MockAuth::admin(),
    )
    .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn should_reject_unknown_verification_method() {
    let response = as_user(
        server().post(&order_path("/handoffs/pickup/verify")),
        &MockAuth::driver(),
    )
    .json(&json!({ "method": "sms", "code": "482193" }))
    .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn should_surface_database_failure_as_internal() {
    let response = as_user(
        server().post(&order_path("/handoffs/pickup/verify")),
        &MockAuth::driver(),
    )
    .json(&json!({ "method": "otp", "code": "482193" }))
    .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json();
    assert_eq!(body["kind"], "INTERNAL");
    assert_eq!(body["message"], "internal error");
}

#[tokio::test]
async fn should_stream_snapshot_then_changes_and_release_on_close() {
    let order_id = OrderId(Uuid::now_v7());
    // One row for the watcher's snapshot, one for the sync's read; then the status write.
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([
            vec![order_row(order_id, OrderStatus::Preparing)],
            vec![order_row(order_id, OrderStatus::Preparing)],
        ])
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .into_connection();
    let hub = OrderChangeHub::new(16);
    let server = ws_server(db, &hub);
    let vendor = MockAuth::vendor();

    let mut ws = as_user(server.get_websocket(&format!("/orders/{order_id}/events")), &vendor)
        .await
        .into_websocket()
        .await;

    let snapshot: serde_json::Value = ws.receive_json().await;
    assert_eq!(snapshot["change"], "snapshot");
    assert_eq!(snapshot["order_id"], order_id.to_string());
    assert_eq!(snapshot["status"], "preparing");
    assert_eq!(hub.watcher_count(order_id).await, 1);

    let response = as_user(server.put(&format!("/orders/{order_id}/status")), &vendor)
        .json(&json!({ "status": "awaiting_pickup" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let change: serde_json::Value = ws.receive_json().await;
    assert_eq!(change["change"], "status_synced");
    assert_eq!(change["status"], "awaiting_pickup");
    assert_eq!(change["from"], "preparing");
    assert!(change.get("otp").is_none());

    ws.close().await;
    wait_until_unwatched(&hub).await;
}

#[tokio::test]
async fn should_refuse_stream_for_unknown_order_without_leaking_channel() {
    let order_id = OrderId(Uuid::now_v7());
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<orders::Model>::new()])
        .into_connection();
    let hub = OrderChangeHub::new(16);
    let server = ws_server(db, &hub);

    let response = as_user(
        server.get_websocket(&format!("/orders/{order_id}/events")),
        &MockAuth::customer(),
    )
    .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(hub.watched_orders().await, 0);
}
