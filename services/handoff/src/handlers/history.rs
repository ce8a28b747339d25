use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use souq_core::serde::{to_rfc3339_ms, to_rfc3339_ms_opt};
use souq_domain::id::{HandoffId, OrderId, UserId};
use souq_domain::order::{HandoffKind, VerificationMethod};
use souq_identity::identity::IdentityHeaders;

use crate::domain::repository::Clock;
use crate::domain::types::HandoffRecord;
use crate::error::HandoffServiceError;
use crate::state::AppState;
use crate::usecase::history::ListHandoffsUseCase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
    Active,
    Expired,
    Consumed,
    Superseded,
}

impl RecordState {
    fn of(record: &HandoffRecord, now: DateTime<Utc>) -> Self {
        if record.is_consumed() {
            Self::Consumed
        } else if record.superseded_at.is_some() {
            Self::Superseded
        } else if record.is_expired_at(now) {
            Self::Expired
        } else {
            Self::Active
        }
    }
}

/// Audit view of an issued code. Carries no OTP or QR payload.
#[derive(Debug, Serialize)]
pub struct HandoffRecordResponse {
    pub id: HandoffId,
    #[serde(rename = "type")]
    pub kind: HandoffKind,
    pub state: RecordState,
    pub issued_by: UserId,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub issued_at: DateTime<Utc>,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub expires_at: DateTime<Utc>,
    #[serde(serialize_with = "to_rfc3339_ms_opt")]
    pub consumed_at: Option<DateTime<Utc>>,
    #[serde(serialize_with = "to_rfc3339_ms_opt")]
    pub superseded_at: Option<DateTime<Utc>>,
    pub verified_by: Option<UserId>,
    pub verified_method: Option<VerificationMethod>,
    pub signature_data: Option<String>,
    pub photo_url: Option<String>,
}

impl HandoffRecordResponse {
    fn from_record(record: HandoffRecord, now: DateTime<Utc>) -> Self {
        Self {
            id: record.id,
            kind: record.kind,
            state: RecordState::of(&record, now),
            issued_by: record.issued_by,
            issued_at: record.issued_at,
            expires_at: record.expires_at,
            consumed_at: record.consumed_at,
            superseded_at: record.superseded_at,
            verified_by: record.verified_by,
            verified_method: record.verified_method,
            signature_data: record.proof.signature_data,
            photo_url: record.proof.photo_url,
        }
    }
}

// ── GET /orders/{order_id}/handoffs ──────────────────────────────────────────

pub async fn list_handoffs(
    State(state): State<AppState>,
    _identity: IdentityHeaders,
    Path(order_id): Path<OrderId>,
) -> Result<Json<Vec<HandoffRecordResponse>>, HandoffServiceError> {
    let usecase = ListHandoffsUseCase {
        orders: state.order_repo(),
        handoffs: state.handoff_repo(),
    };
    let records = usecase.execute(order_id).await?;
    let now = state.clock().now();
    let body = records
        .into_iter()
        .map(|record| HandoffRecordResponse::from_record(record, now))
        .collect();
    Ok(Json(body))
}
