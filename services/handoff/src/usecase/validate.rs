use chrono::{DateTime, Utc};

use souq_domain::id::{OrderId, UserId};
use souq_domain::order::{HandoffKind, VerificationMethod};

use crate::domain::code::PresentedCode;
use crate::domain::repository::{Clock, HandoffRecordRepository};
use crate::domain::types::{Consumption, DeliveryProof, HandoffRecord};
use crate::domain::validator;
use crate::error::{HandoffServiceError, Rejection};

pub struct ValidateCodeInput {
    pub order_id: OrderId,
    pub kind: HandoffKind,
    pub presented: PresentedCode,
    pub verified_by: UserId,
    /// Kept on delivery records only.
    pub proof: DeliveryProof,
}

/// A consumed code. `record` already reflects the consumption.
#[derive(Debug, Clone)]
pub struct Accepted {
    pub record: HandoffRecord,
    pub method: VerificationMethod,
    pub at: DateTime<Utc>,
}

pub struct ValidateCodeUseCase<H, C>
where
    H: HandoffRecordRepository,
    C: Clock,
{
    pub handoffs: H,
    pub clock: C,
}

impl<H, C> ValidateCodeUseCase<H, C>
where
    H: HandoffRecordRepository,
    C: Clock,
{
    /// Check the presented code and consume the record on success.
    pub async fn execute(&self, input: ValidateCodeInput) -> Result<Accepted, HandoffServiceError> {
        let now = self.clock.now();
        let active = self
            .handoffs
            .load_active(input.order_id, input.kind)
            .await?;
        let record = validator::check(
            active.as_ref(),
            input.order_id,
            input.kind,
            &input.presented,
            now,
        )?;

        let method = input.presented.method();
        let consumption = Consumption {
            record_id: record.id,
            consumed_at: now,
            verified_by: input.verified_by,
            method,
            proof: input.proof.for_kind(input.kind),
        };
        // A concurrent validation of the same code may have won between load and here.
        if !self.handoffs.consume(&consumption).await? {
            return Err(Rejection::CodeAlreadyUsed.into());
        }

        let mut consumed = record.clone();
        consumed.consumed_at = Some(now);
        consumed.verified_by = Some(input.verified_by);
        consumed.verified_method = Some(method);
        consumed.proof = consumption.proof;
        Ok(Accepted {
            record: consumed,
            method,
            at: now,
        })
    }
}
