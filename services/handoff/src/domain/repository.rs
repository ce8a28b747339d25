#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};

use souq_domain::id::OrderId;
use souq_domain::order::HandoffKind;

use crate::domain::code::Otp;
use crate::domain::types::{
    Consumption, HandoffRecord, OrderChangeEvent, OrderHandoffState, Transition,
};
use crate::error::HandoffServiceError;

/// Handoff-relevant fields of the order row.
pub trait OrderStatusRepository: Send + Sync {
    async fn find(&self, order_id: OrderId)
    -> Result<Option<OrderHandoffState>, HandoffServiceError>;

    async fn insert(&self, state: &OrderHandoffState) -> Result<(), HandoffServiceError>;

    /// Apply a transition only if the order is still in `transition.from`.
    /// Returns `false` when another writer moved the order first.
    async fn apply(&self, transition: &Transition) -> Result<bool, HandoffServiceError>;
}

/// Issued handoff codes, including the superseded and consumed audit trail.
pub trait HandoffRecordRepository: Send + Sync {
    /// The current (non-superseded) record for this leg, consumed or not.
    async fn load_active(
        &self,
        order_id: OrderId,
        kind: HandoffKind,
    ) -> Result<Option<HandoffRecord>, HandoffServiceError>;

    /// Mark the previous active record of the same leg superseded and insert `record`,
    /// in one transaction, serialized with other issuers of the same order.
    async fn supersede_and_insert(&self, record: &HandoffRecord)
    -> Result<(), HandoffServiceError>;

    /// Insert `record` as in [`Self::supersede_and_insert`] unless the leg already has a
    /// record usable at `now`. Issuers of the same order are serialized, so concurrent
    /// callers agree on one record. Returns the record that is active afterwards.
    async fn insert_unless_usable(
        &self,
        record: &HandoffRecord,
        now: DateTime<Utc>,
    ) -> Result<HandoffRecord, HandoffServiceError>;

    /// Consume a record if it is still unconsumed and current.
    /// Returns `true` only for the caller whose update took effect.
    async fn consume(&self, consumption: &Consumption) -> Result<bool, HandoffServiceError>;

    /// Every record of the order, oldest first.
    async fn list_by_order(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<HandoffRecord>, HandoffServiceError>;
}

/// Pushes order changes to whoever is watching.
pub trait ChangeNotifier: Send + Sync {
    async fn publish(&self, event: OrderChangeEvent) -> Result<(), HandoffServiceError>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub trait OtpSource: Send + Sync {
    fn next_otp(&self) -> Otp;
}
