use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use souq_core::serde::to_rfc3339_ms;
use souq_domain::id::{HandoffId, OrderId};
use souq_domain::order::{HandoffKind, OrderStatus, VerificationMethod};
use souq_identity::identity::IdentityHeaders;

use crate::domain::code::PresentedCode;
use crate::domain::types::DeliveryProof;
use crate::domain::policy::verifier_roles;
use crate::error::HandoffServiceError;
use crate::handlers::require_role;
use crate::state::AppState;
use crate::usecase::complete::{CompleteHandoffInput, CompleteHandoffUseCase};
use crate::usecase::validate::ValidateCodeUseCase;

#[derive(Deserialize)]
pub struct VerifyRequest {
    pub method: VerificationMethod,
    /// Decoded QR string or the typed digits.
    pub code: String,
    /// Recipient signature, delivery only.
    #[serde(default)]
    pub signature: Option<String>,
    /// Photo of the handed-over order, delivery only.
    #[serde(default)]
    pub photo_url: Option<String>,
}

impl VerifyRequest {
    fn into_parts(self) -> (PresentedCode, DeliveryProof) {
        let presented = match self.method {
            VerificationMethod::Qr => PresentedCode::Qr(self.code),
            VerificationMethod::Otp => PresentedCode::Otp(self.code),
        };
        let proof = DeliveryProof {
            signature_data: self.signature.filter(|s| !s.trim().is_empty()),
            photo_url: self.photo_url.filter(|s| !s.trim().is_empty()),
        };
        (presented, proof)
    }
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub order_id: OrderId,
    #[serde(rename = "type")]
    pub kind: HandoffKind,
    pub record_id: HandoffId,
    pub method: VerificationMethod,
    pub status: OrderStatus,
    pub passed_through: Vec<OrderStatus>,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub verified_at: DateTime<Utc>,
}

// ── POST /orders/{order_id}/handoffs/{type}/verify ───────────────────────────

pub async fn verify_handoff(
    State(state): State<AppState>,
    identity: IdentityHeaders,
    Path((order_id, kind)): Path<(OrderId, HandoffKind)>,
    Json(body): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, HandoffServiceError> {
    require_role(&identity, verifier_roles(kind))?;
    let usecase = CompleteHandoffUseCase {
        orders: state.order_repo(),
        validator: ValidateCodeUseCase {
            handoffs: state.handoff_repo(),
            clock: state.clock(),
        },
        notifier: state.notifier(),
    };
    let (presented, proof) = body.into_parts();
    let output = usecase
        .execute(CompleteHandoffInput {
            order_id,
            kind,
            presented,
            verified_by: identity.user_id,
            proof,
        })
        .await?;
    Ok(Json(VerifyResponse {
        order_id,
        kind,
        record_id: output.accepted.record.id,
        method: output.accepted.method,
        status: output.state.status,
        passed_through: output.transition.passed_through,
        verified_at: output.accepted.at,
    }))
}
