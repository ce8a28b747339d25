use sea_orm::Database;
use tracing::info;

use souq_core::tracing::init_tracing;
use souq_handoff::config::HandoffConfig;
use souq_handoff::domain::policy::HandoffPolicy;
use souq_handoff::infra::notifier::OrderChangeHub;
use souq_handoff::router::build_router;
use souq_handoff::state::AppState;

#[tokio::main]
async fn main() {
    init_tracing("souq_handoff=info,tower_http=info");

    let config = HandoffConfig::from_env();

    let policy = HandoffPolicy::from_secs(config.pickup_code_ttl_secs, config.delivery_code_ttl_secs)
        .expect("invalid PICKUP_CODE_TTL_SECS / DELIVERY_CODE_TTL_SECS");

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let state = AppState {
        db,
        hub: OrderChangeHub::new(config.event_buffer),
        policy,
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.handoff_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!(
        pickup_window_secs = config.pickup_code_ttl_secs,
        delivery_window_secs = config.delivery_code_ttl_secs,
        "handoff service listening on {addr}"
    );
    axum::serve(listener, router).await.expect("server error");
}
