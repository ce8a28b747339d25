use souq_domain::id::{OrderId, UserId};
use souq_domain::order::HandoffKind;

use crate::domain::code::PresentedCode;
use crate::domain::repository::{
    ChangeNotifier, Clock, HandoffRecordRepository, OrderStatusRepository,
};
use crate::domain::state_machine;
use crate::domain::types::{
    DeliveryProof, OrderChange, OrderChangeEvent, OrderHandoffState, Transition,
};
use crate::error::{HandoffServiceError, Rejection};
use crate::usecase::publish_or_warn;
use crate::usecase::validate::{Accepted, ValidateCodeInput, ValidateCodeUseCase};

pub struct CompleteHandoffInput {
    pub order_id: OrderId,
    pub kind: HandoffKind,
    pub presented: PresentedCode,
    pub verified_by: UserId,
    pub proof: DeliveryProof,
}

#[derive(Debug)]
pub struct CompleteHandoffOutput {
    pub accepted: Accepted,
    pub state: OrderHandoffState,
    pub transition: Transition,
}

/// Verify a presented code and move the order forward.
pub struct CompleteHandoffUseCase<O, H, N, C>
where
    O: OrderStatusRepository,
    H: HandoffRecordRepository,
    N: ChangeNotifier,
    C: Clock,
{
    pub orders: O,
    pub validator: ValidateCodeUseCase<H, C>,
    pub notifier: N,
}

impl<O, H, N, C> CompleteHandoffUseCase<O, H, N, C>
where
    O: OrderStatusRepository,
    H: HandoffRecordRepository,
    N: ChangeNotifier,
    C: Clock,
{
    pub async fn execute(
        &self,
        input: CompleteHandoffInput,
    ) -> Result<CompleteHandoffOutput, HandoffServiceError> {
        // 1. Status guard runs before the code is examined
        let state = self
            .orders
            .find(input.order_id)
            .await?
            .ok_or(HandoffServiceError::OrderNotFound)?;
        state_machine::guard_verification(state.status, input.kind)?;

        // 2. Validate and consume
        let accepted = self
            .validator
            .execute(ValidateCodeInput {
                order_id: input.order_id,
                kind: input.kind,
                presented: input.presented,
                verified_by: input.verified_by,
                proof: input.proof,
            })
            .await?;

        // 3. Advance, conditional on the status read in step 1
        let transition = state_machine::advance(&state, input.kind, accepted.at)?;
        if !self.orders.apply(&transition).await? {
            tracing::warn!(
                order_id = %input.order_id,
                kind = %input.kind,
                record_id = %accepted.record.id,
                "code consumed but order moved concurrently"
            );
            return Err(Rejection::AlreadyAdvanced.into());
        }
        let state = transition.applied_to(&state);

        tracing::info!(
            order_id = %state.order_id,
            kind = %input.kind,
            method = %accepted.method,
            status = %state.status,
            "handoff completed"
        );

        // 4. Fan out
        publish_or_warn(
            &self.notifier,
            OrderChangeEvent {
                order_id: state.order_id,
                status: state.status,
                change: OrderChange::HandoffCompleted {
                    kind: input.kind,
                    method: accepted.method,
                    passed_through: transition.passed_through.clone(),
                },
                at: transition.at,
            },
        )
        .await;

        Ok(CompleteHandoffOutput {
            accepted,
            state,
            transition,
        })
    }
}
