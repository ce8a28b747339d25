use anyhow::Context as _;
use chrono::{DateTime, Utc};

use souq_domain::id::{HandoffId, OrderId, UserId};
use souq_domain::order::HandoffKind;

use crate::domain::code::CodePayload;
use crate::domain::policy::{self, HandoffPolicy};
use crate::domain::repository::{
    ChangeNotifier, Clock, HandoffRecordRepository, OrderStatusRepository, OtpSource,
};
use crate::domain::state_machine;
use crate::domain::types::{
    DeliveryProof, HandoffRecord, OrderChange, OrderChangeEvent, OrderHandoffState,
};
use crate::error::HandoffServiceError;
use crate::usecase::publish_or_warn;

pub struct GenerateCodeInput {
    pub order_id: OrderId,
    pub kind: HandoffKind,
    pub issued_by: UserId,
}

pub struct GenerateCodeUseCase<O, H, N, C, G>
where
    O: OrderStatusRepository,
    H: HandoffRecordRepository,
    N: ChangeNotifier,
    C: Clock,
    G: OtpSource,
{
    pub orders: O,
    pub handoffs: H,
    pub notifier: N,
    pub clock: C,
    pub otps: G,
    pub policy: HandoffPolicy,
}

impl<O, H, N, C, G> GenerateCodeUseCase<O, H, N, C, G>
where
    O: OrderStatusRepository,
    H: HandoffRecordRepository,
    N: ChangeNotifier,
    C: Clock,
    G: OtpSource,
{
    /// Issue a fresh code, superseding the current one for this leg.
    pub async fn execute(
        &self,
        input: GenerateCodeInput,
    ) -> Result<HandoffRecord, HandoffServiceError> {
        let state = self.load_issuable(input.order_id, input.kind).await?;
        let record = self.draft(&input, self.clock.now())?;

        // 3. Replace the active record for this leg
        self.handoffs.supersede_and_insert(&record).await?;

        self.announce(&state, &record).await;
        Ok(record)
    }

    /// Return the current code while it can still be used; issue a new one otherwise.
    pub async fn ensure(
        &self,
        input: GenerateCodeInput,
    ) -> Result<HandoffRecord, HandoffServiceError> {
        let state = self.load_issuable(input.order_id, input.kind).await?;
        let now = self.clock.now();
        if let Some(active) = self
            .handoffs
            .load_active(input.order_id, input.kind)
            .await?
        {
            if active.is_usable_at(now) {
                return Ok(active);
            }
        }
        let record = self.draft(&input, now)?;

        // 3. Insert unless a concurrent caller issued one since the read above
        let current = self.handoffs.insert_unless_usable(&record, now).await?;
        if current.id == record.id {
            self.announce(&state, &current).await;
        }
        Ok(current)
    }

    async fn load_issuable(
        &self,
        order_id: OrderId,
        kind: HandoffKind,
    ) -> Result<OrderHandoffState, HandoffServiceError> {
        let state = self
            .orders
            .find(order_id)
            .await?
            .ok_or(HandoffServiceError::OrderNotFound)?;
        state_machine::ensure_issuable(state.status, kind)?;
        Ok(state)
    }

    fn draft(
        &self,
        input: &GenerateCodeInput,
        now: DateTime<Utc>,
    ) -> Result<HandoffRecord, HandoffServiceError> {
        // 1. Draw the OTP and fix the validity window
        let otp = self.otps.next_otp();
        let issued_at = policy::issue_instant(now);
        let expires_at = self.policy.expires_at(input.kind, issued_at);

        // 2. Encode what the QR image carries
        let code_payload = CodePayload::new(input.order_id, input.kind, &otp, issued_at)
            .encode()
            .context("encode qr payload")?;

        Ok(HandoffRecord {
            id: HandoffId::new(),
            order_id: input.order_id,
            kind: input.kind,
            code_payload,
            otp,
            issued_by: input.issued_by,
            issued_at,
            expires_at,
            consumed_at: None,
            superseded_at: None,
            verified_by: None,
            verified_method: None,
            proof: DeliveryProof::default(),
        })
    }

    /// Tell watchers a new code exists. The code itself stays private.
    async fn announce(&self, state: &OrderHandoffState, record: &HandoffRecord) {
        publish_or_warn(
            &self.notifier,
            OrderChangeEvent {
                order_id: record.order_id,
                status: state.status,
                change: OrderChange::CodeIssued {
                    kind: record.kind,
                    expires_at: record.expires_at,
                },
                at: record.issued_at,
            },
        )
        .await;
    }
}
