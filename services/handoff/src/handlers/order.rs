use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use souq_core::serde::{to_rfc3339_ms, to_rfc3339_ms_opt};
use souq_domain::id::OrderId;
use souq_domain::order::OrderStatus;
use souq_domain::user::UserRole;
use souq_identity::identity::IdentityHeaders;

use crate::domain::types::OrderHandoffState;
use crate::error::HandoffServiceError;
use crate::handlers::require_role;
use crate::state::AppState;
use crate::usecase::status::{GetOrderStatusUseCase, SyncOrderStatusInput, SyncOrderStatusUseCase};

#[derive(Debug, Serialize)]
pub struct OrderStatusResponse {
    pub order_id: OrderId,
    pub status: OrderStatus,
    #[serde(serialize_with = "to_rfc3339_ms_opt")]
    pub picked_up_at: Option<DateTime<Utc>>,
    #[serde(serialize_with = "to_rfc3339_ms_opt")]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
}

impl From<OrderHandoffState> for OrderStatusResponse {
    fn from(state: OrderHandoffState) -> Self {
        Self {
            order_id: state.order_id,
            status: state.status,
            picked_up_at: state.picked_up_at,
            delivered_at: state.delivered_at,
            updated_at: state.updated_at,
        }
    }
}

// ── GET /orders/{order_id} ───────────────────────────────────────────────────

pub async fn get_order(
    State(state): State<AppState>,
    _identity: IdentityHeaders,
    Path(order_id): Path<OrderId>,
) -> Result<Json<OrderStatusResponse>, HandoffServiceError> {
    let usecase = GetOrderStatusUseCase {
        orders: state.order_repo(),
    };
    let order = usecase.execute(order_id).await?;
    Ok(Json(order.into()))
}

// ── PUT /orders/{order_id}/status ────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SyncStatusRequest {
    pub status: OrderStatus,
}

pub async fn sync_status(
    State(state): State<AppState>,
    identity: IdentityHeaders,
    Path(order_id): Path<OrderId>,
    Json(body): Json<SyncStatusRequest>,
) -> Result<Json<OrderStatusResponse>, HandoffServiceError> {
    require_role(&identity, &[UserRole::Vendor, UserRole::Admin])?;
    let usecase = SyncOrderStatusUseCase {
        orders: state.order_repo(),
        notifier: state.notifier(),
        clock: state.clock(),
    };
    let order = usecase
        .execute(SyncOrderStatusInput {
            order_id,
            status: body.status,
        })
        .await?;
    Ok(Json(order.into()))
}
