use chrono::{DateTime, Utc};
use serde::Serialize;

use souq_core::serde::to_rfc3339_ms;
use souq_domain::id::{HandoffId, OrderId, UserId};
use souq_domain::order::{HandoffKind, OrderStatus, VerificationMethod};

use crate::domain::code::Otp;
use crate::domain::policy;

/// One issued pickup or delivery code.
///
/// `code_payload` and `otp` are secrets: they are returned to the issuing party only and
/// never appear in change events or the audit listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoffRecord {
    pub id: HandoffId,
    pub order_id: OrderId,
    pub kind: HandoffKind,
    pub code_payload: String,
    pub otp: Otp,
    pub issued_by: UserId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
    pub superseded_at: Option<DateTime<Utc>>,
    pub verified_by: Option<UserId>,
    pub verified_method: Option<VerificationMethod>,
    pub proof: DeliveryProof,
}

impl HandoffRecord {
    pub fn is_consumed(&self) -> bool {
        self.consumed_at.is_some()
    }

    /// A code is still valid at exactly `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        self.superseded_at.is_none() && !self.is_consumed() && !self.is_expired_at(now)
    }

    pub fn seconds_remaining(&self, now: DateTime<Utc>) -> i64 {
        policy::seconds_remaining(self.expires_at, now)
    }
}

/// Handoff-relevant view of an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderHandoffState {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub picked_up_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl OrderHandoffState {
    pub fn new(order_id: OrderId, status: OrderStatus, at: DateTime<Utc>) -> Self {
        Self {
            order_id,
            status,
            picked_up_at: None,
            delivered_at: None,
            updated_at: at,
        }
    }
}

/// Optional proof captured when the customer receives the order. Always empty on pickup
/// records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryProof {
    pub signature_data: Option<String>,
    pub photo_url: Option<String>,
}

impl DeliveryProof {
    /// Proof as recorded for a handoff of `kind`.
    pub fn for_kind(self, kind: HandoffKind) -> Self {
        match kind {
            HandoffKind::Delivery => self,
            HandoffKind::Pickup => Self::default(),
        }
    }
}

/// Marks a record consumed. Applied only if the record is still unconsumed and current.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consumption {
    pub record_id: HandoffId,
    pub consumed_at: DateTime<Utc>,
    pub verified_by: UserId,
    pub method: VerificationMethod,
    pub proof: DeliveryProof,
}

/// Timestamp column a transition fills in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Milestone {
    PickedUp,
    Delivered,
}

/// A status change computed by the state machine and applied conditionally on `from`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub order_id: OrderId,
    pub from: OrderStatus,
    pub to: OrderStatus,
    /// Every status entered, in order, ending with `to`.
    pub passed_through: Vec<OrderStatus>,
    pub milestone: Option<Milestone>,
    pub at: DateTime<Utc>,
}

impl Transition {
    /// The state the order is in once this transition has been applied to `state`.
    pub fn applied_to(&self, state: &OrderHandoffState) -> OrderHandoffState {
        let mut next = state.clone();
        next.status = self.to;
        next.updated_at = self.at;
        match self.milestone {
            Some(Milestone::PickedUp) => next.picked_up_at = Some(self.at),
            Some(Milestone::Delivered) => next.delivered_at = Some(self.at),
            None => {}
        }
        next
    }
}

/// Pushed to everyone watching an order. Never carries an OTP or QR payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderChangeEvent {
    pub order_id: OrderId,
    pub status: OrderStatus,
    #[serde(flatten)]
    pub change: OrderChange,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum OrderChange {
    /// A new code was issued (first issue or regeneration); older codes are dead.
    CodeIssued {
        kind: HandoffKind,
        #[serde(serialize_with = "to_rfc3339_ms")]
        expires_at: DateTime<Utc>,
    },
    HandoffCompleted {
        kind: HandoffKind,
        method: VerificationMethod,
        passed_through: Vec<OrderStatus>,
    },
    /// Status pushed by the order service.
    StatusSynced { from: Option<OrderStatus> },
}
