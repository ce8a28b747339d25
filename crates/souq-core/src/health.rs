use axum::http::StatusCode;

/// Handler for `GET /healthz`: liveness only, never touches dependencies.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}
