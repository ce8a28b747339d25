use souq_domain::id::OrderId;
use souq_domain::order::OrderStatus;

use crate::domain::repository::{ChangeNotifier, Clock, OrderStatusRepository};
use crate::domain::state_machine::{self, SyncPlan};
use crate::domain::types::{OrderChange, OrderChangeEvent, OrderHandoffState};
use crate::error::{HandoffServiceError, Rejection};
use crate::usecase::publish_or_warn;

pub struct GetOrderStatusUseCase<O>
where
    O: OrderStatusRepository,
{
    pub orders: O,
}

impl<O> GetOrderStatusUseCase<O>
where
    O: OrderStatusRepository,
{
    pub async fn execute(&self, order_id: OrderId) -> Result<OrderHandoffState, HandoffServiceError> {
        self.orders
            .find(order_id)
            .await?
            .ok_or(HandoffServiceError::OrderNotFound)
    }
}

pub struct SyncOrderStatusInput {
    pub order_id: OrderId,
    pub status: OrderStatus,
}

/// Status intake from the order service (ready for pickup, cancelled).
pub struct SyncOrderStatusUseCase<O, N, C>
where
    O: OrderStatusRepository,
    N: ChangeNotifier,
    C: Clock,
{
    pub orders: O,
    pub notifier: N,
    pub clock: C,
}

impl<O, N, C> SyncOrderStatusUseCase<O, N, C>
where
    O: OrderStatusRepository,
    N: ChangeNotifier,
    C: Clock,
{
    pub async fn execute(
        &self,
        input: SyncOrderStatusInput,
    ) -> Result<OrderHandoffState, HandoffServiceError> {
        let now = self.clock.now();
        let current = self.orders.find(input.order_id).await?;

        let (state, from) =
            match state_machine::plan_sync(input.order_id, current.as_ref(), input.status, now)? {
                SyncPlan::Unchanged => {
                    // plan_sync only returns Unchanged for a known order
                    return current.ok_or(HandoffServiceError::OrderNotFound);
                }
                SyncPlan::Register(state) => {
                    self.orders.insert(&state).await?;
                    (state, None)
                }
                SyncPlan::Move(transition) => {
                    let Some(current) = current else {
                        return Err(HandoffServiceError::OrderNotFound);
                    };
                    if !self.orders.apply(&transition).await? {
                        // Lost a race with a concurrent status write.
                        return Err(Rejection::InvalidState.into());
                    }
                    (transition.applied_to(&current), Some(transition.from))
                }
            };

        tracing::info!(
            order_id = %state.order_id,
            status = %state.status,
            from = from.map(OrderStatus::as_str),
            "order status synced"
        );

        publish_or_warn(
            &self.notifier,
            OrderChangeEvent {
                order_id: state.order_id,
                status: state.status,
                change: OrderChange::StatusSynced { from },
                at: now,
            },
        )
        .await;

        Ok(state)
    }
}
