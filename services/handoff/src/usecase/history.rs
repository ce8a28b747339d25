use souq_domain::id::OrderId;

use crate::domain::repository::{HandoffRecordRepository, OrderStatusRepository};
use crate::domain::types::HandoffRecord;
use crate::error::HandoffServiceError;

/// Audit trail of every code issued for an order.
pub struct ListHandoffsUseCase<O, H>
where
    O: OrderStatusRepository,
    H: HandoffRecordRepository,
{
    pub orders: O,
    pub handoffs: H,
}

impl<O, H> ListHandoffsUseCase<O, H>
where
    O: OrderStatusRepository,
    H: HandoffRecordRepository,
{
    pub async fn execute(&self, order_id: OrderId) -> Result<Vec<HandoffRecord>, HandoffServiceError> {
        if self.orders.find(order_id).await?.is_none() {
            return Err(HandoffServiceError::OrderNotFound);
        }
        self.handoffs.list_by_order(order_id).await
    }
}
