use axum::{
    Router,
    routing::{get, post, put},
};
use tower::ServiceBuilder;

use souq_core::health::healthz;
use souq_core::middleware::{propagate_request_id_layer, request_id_layer, trace_layer};

use crate::handlers::{
    code::{get_code, regenerate_code},
    events::order_events,
    health::readyz,
    history::list_handoffs,
    order::{get_order, sync_status},
    verify::verify_handoff,
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Order status
        .route("/orders/{order_id}", get(get_order))
        .route("/orders/{order_id}/status", put(sync_status))
        // Handoff codes
        .route("/orders/{order_id}/handoffs", get(list_handoffs))
        .route(
            "/orders/{order_id}/handoffs/{kind}/code",
            get(get_code).post(regenerate_code),
        )
        .route(
            "/orders/{order_id}/handoffs/{kind}/verify",
            post(verify_handoff),
        )
        // Live changes
        .route("/orders/{order_id}/events", get(order_events))
        .layer(
            ServiceBuilder::new()
                .layer(request_id_layer())
                .layer(trace_layer())
                .layer(propagate_request_id_layer()),
        )
        .with_state(state)
}
