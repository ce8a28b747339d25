use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use souq_core::serde::to_rfc3339_ms;
use souq_domain::id::OrderId;
use souq_domain::order::HandoffKind;
use souq_identity::identity::IdentityHeaders;

use crate::domain::policy::{self, issuer_roles};
use crate::domain::repository::Clock;
use crate::domain::types::HandoffRecord;
use crate::error::HandoffServiceError;
use crate::handlers::require_role;
use crate::infra::db::{DbHandoffRecordRepository, DbOrderRepository};
use crate::infra::notifier::OrderChangeHub;
use crate::infra::system::{SystemClock, ThreadRngOtp};
use crate::state::AppState;
use crate::usecase::generate::{GenerateCodeInput, GenerateCodeUseCase};

/// The only response that carries the OTP and QR payload; served to the issuing party.
#[derive(Debug, Serialize)]
pub struct HandoffCodeResponse {
    pub order_id: OrderId,
    #[serde(rename = "type")]
    pub kind: HandoffKind,
    pub otp: String,
    /// `XXX-XXX`
    pub otp_display: String,
    pub qr_payload: String,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub issued_at: DateTime<Utc>,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub expires_at: DateTime<Utc>,
    pub expires_in_secs: i64,
    /// `m:ss` countdown as of the response
    pub expires_in_display: String,
}

impl HandoffCodeResponse {
    fn new(record: HandoffRecord, now: DateTime<Utc>) -> Self {
        Self {
            order_id: record.order_id,
            kind: record.kind,
            otp_display: record.otp.grouped(),
            otp: record.otp.as_str().to_owned(),
            qr_payload: record.code_payload,
            issued_at: record.issued_at,
            expires_at: record.expires_at,
            expires_in_secs: policy::seconds_remaining(record.expires_at, now),
            expires_in_display: policy::remaining_label(record.expires_at, now),
        }
    }
}

// ── GET /orders/{order_id}/handoffs/{type}/code ──────────────────────────────

/// Opening the code screen: reuse the current code while it is still good.
pub async fn get_code(
    State(state): State<AppState>,
    identity: IdentityHeaders,
    Path((order_id, kind)): Path<(OrderId, HandoffKind)>,
) -> Result<Json<HandoffCodeResponse>, HandoffServiceError> {
    require_role(&identity, issuer_roles(kind))?;
    let record = generate_usecase(&state)
        .ensure(GenerateCodeInput {
            order_id,
            kind,
            issued_by: identity.user_id,
        })
        .await?;
    Ok(Json(HandoffCodeResponse::new(record, state.clock().now())))
}

// ── POST /orders/{order_id}/handoffs/{type}/code ─────────────────────────────

/// Explicit regenerate: every earlier code for this leg stops working.
pub async fn regenerate_code(
    State(state): State<AppState>,
    identity: IdentityHeaders,
    Path((order_id, kind)): Path<(OrderId, HandoffKind)>,
) -> Result<Json<HandoffCodeResponse>, HandoffServiceError> {
    require_role(&identity, issuer_roles(kind))?;
    let record = generate_usecase(&state)
        .execute(GenerateCodeInput {
            order_id,
            kind,
            issued_by: identity.user_id,
        })
        .await?;
    Ok(Json(HandoffCodeResponse::new(record, state.clock().now())))
}

fn generate_usecase(
    state: &AppState,
) -> GenerateCodeUseCase<
    DbOrderRepository,
    DbHandoffRecordRepository,
    OrderChangeHub,
    SystemClock,
    ThreadRngOtp,
> {
    GenerateCodeUseCase {
        orders: state.order_repo(),
        handoffs: state.handoff_repo(),
        notifier: state.notifier(),
        clock: state.clock(),
        otps: state.otp_source(),
        policy: state.policy,
    }
}
