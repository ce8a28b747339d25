//! Handoff lifecycle of an order.
//!
//! ```text
//! preparing ─sync─▶ awaiting_pickup ─pickup─▶ picked_up ─auto─▶ awaiting_delivery ─delivery─▶ delivered
//!     └──────────────────┴────────────────────────┴──────sync───────────┴──────▶ cancelled
//! ```
//!
//! Only `preparing`, `awaiting_pickup` and `cancelled` are reachable from outside; every
//! later status requires a consumed handoff code.

use chrono::{DateTime, Utc};

use souq_domain::id::OrderId;
use souq_domain::order::{HandoffKind, OrderStatus};

use crate::domain::types::{Milestone, OrderHandoffState, Transition};
use crate::error::Rejection;

/// Whether a code of `kind` may be issued while the order is in `status`.
pub fn ensure_issuable(status: OrderStatus, kind: HandoffKind) -> Result<(), Rejection> {
    let allowed = match kind {
        HandoffKind::Pickup => status == OrderStatus::AwaitingPickup,
        HandoffKind::Delivery => {
            matches!(status, OrderStatus::PickedUp | OrderStatus::AwaitingDelivery)
        }
    };
    if allowed {
        Ok(())
    } else {
        Err(Rejection::InvalidState)
    }
}

/// Runs before any code is looked at. A leg already behind the order reports
/// `AlreadyAdvanced` so a repeated scan reads as "done", not as an error in the code.
pub fn guard_verification(status: OrderStatus, kind: HandoffKind) -> Result<(), Rejection> {
    use souq_domain::order::OrderStatus::{
        AwaitingDelivery, AwaitingPickup, Cancelled, Delivered, PickedUp, Preparing,
    };
    match (kind, status) {
        (HandoffKind::Pickup, AwaitingPickup) => Ok(()),
        (HandoffKind::Pickup, PickedUp | AwaitingDelivery | Delivered) => {
            Err(Rejection::AlreadyAdvanced)
        }
        (HandoffKind::Delivery, PickedUp | AwaitingDelivery) => Ok(()),
        (HandoffKind::Delivery, Delivered) => Err(Rejection::AlreadyAdvanced),
        (_, Preparing | Cancelled) | (HandoffKind::Delivery, AwaitingPickup) => {
            Err(Rejection::InvalidState)
        }
    }
}

/// Transition taken once a code of `kind` has been accepted. Pickup runs straight
/// through `picked_up` into `awaiting_delivery`.
pub fn advance(
    state: &OrderHandoffState,
    kind: HandoffKind,
    at: DateTime<Utc>,
) -> Result<Transition, Rejection> {
    guard_verification(state.status, kind)?;
    let (to, passed_through, milestone) = match kind {
        HandoffKind::Pickup => (
            OrderStatus::AwaitingDelivery,
            vec![OrderStatus::PickedUp, OrderStatus::AwaitingDelivery],
            Milestone::PickedUp,
        ),
        HandoffKind::Delivery => (
            OrderStatus::Delivered,
            vec![OrderStatus::Delivered],
            Milestone::Delivered,
        ),
    };
    Ok(Transition {
        order_id: state.order_id,
        from: state.status,
        to,
        passed_through,
        milestone: Some(milestone),
        at,
    })
}

/// Outcome of a status pushed by the order service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncPlan {
    /// First time this order is seen.
    Register(OrderHandoffState),
    Move(Transition),
    Unchanged,
}

/// Decide how an externally reported status applies. Statuses gated by a handoff can
/// never be set this way.
pub fn plan_sync(
    order_id: OrderId,
    current: Option<&OrderHandoffState>,
    target: OrderStatus,
    at: DateTime<Utc>,
) -> Result<SyncPlan, Rejection> {
    let Some(current) = current else {
        return match target {
            OrderStatus::Preparing | OrderStatus::AwaitingPickup => Ok(SyncPlan::Register(
                OrderHandoffState::new(order_id, target, at),
            )),
            _ => Err(Rejection::InvalidState),
        };
    };

    if current.status == target {
        return Ok(SyncPlan::Unchanged);
    }

    let allowed = match (current.status, target) {
        (OrderStatus::Preparing, OrderStatus::AwaitingPickup) => true,
        (from, OrderStatus::Cancelled) => from != OrderStatus::Delivered,
        _ => false,
    };
    if !allowed {
        return Err(Rejection::InvalidState);
    }

    Ok(SyncPlan::Move(Transition {
        order_id,
        from: current.status,
        to: target,
        passed_through: vec![target],
        milestone: None,
        at,
    }))
}
