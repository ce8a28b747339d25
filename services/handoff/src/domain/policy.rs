use chrono::{DateTime, Duration, SubsecRound, Utc};

use souq_domain::order::HandoffKind;
use souq_domain::user::UserRole;

/// Default pickup code lifetime.
pub const DEFAULT_PICKUP_WINDOW_SECS: i64 = 15 * 60;

/// Default delivery code lifetime.
pub const DEFAULT_DELIVERY_WINDOW_SECS: i64 = 30 * 60;

/// Longest accepted validity window.
pub const MAX_WINDOW_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("code validity windows must be positive")]
    NonPositiveWindow,
    #[error("pickup window must be shorter than delivery window")]
    PickupNotShorter,
    #[error("code validity windows must not exceed {MAX_WINDOW_SECS} seconds")]
    WindowTooLong,
}

/// Validity windows per handoff kind. Pickup is a short counter exchange, delivery
/// accounts for travel and finding the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandoffPolicy {
    pickup_window: Duration,
    delivery_window: Duration,
}

impl HandoffPolicy {
    pub fn new(pickup_window: Duration, delivery_window: Duration) -> Result<Self, PolicyError> {
        if pickup_window <= Duration::zero() || delivery_window <= Duration::zero() {
            return Err(PolicyError::NonPositiveWindow);
        }
        if delivery_window > Duration::seconds(MAX_WINDOW_SECS) {
            return Err(PolicyError::WindowTooLong);
        }
        if pickup_window >= delivery_window {
            return Err(PolicyError::PickupNotShorter);
        }
        Ok(Self {
            pickup_window,
            delivery_window,
        })
    }

    pub fn from_secs(pickup_secs: i64, delivery_secs: i64) -> Result<Self, PolicyError> {
        let window = |secs| Duration::try_seconds(secs).ok_or(PolicyError::WindowTooLong);
        Self::new(window(pickup_secs)?, window(delivery_secs)?)
    }

    pub fn window(&self, kind: HandoffKind) -> Duration {
        match kind {
            HandoffKind::Pickup => self.pickup_window,
            HandoffKind::Delivery => self.delivery_window,
        }
    }

    pub fn expires_at(&self, kind: HandoffKind, issued_at: DateTime<Utc>) -> DateTime<Utc> {
        issued_at + self.window(kind)
    }
}

impl Default for HandoffPolicy {
    fn default() -> Self {
        Self {
            pickup_window: Duration::seconds(DEFAULT_PICKUP_WINDOW_SECS),
            delivery_window: Duration::seconds(DEFAULT_DELIVERY_WINDOW_SECS),
        }
    }
}

/// Issue timestamps are stored and embedded in the QR payload at millisecond precision,
/// so both sides compare equal after a round trip.
pub fn issue_instant(now: DateTime<Utc>) -> DateTime<Utc> {
    now.trunc_subsecs(3)
}

/// Whole seconds until expiry, floored at zero.
pub fn seconds_remaining(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (expires_at - now).num_seconds().max(0)
}

/// Countdown label shown next to the code, e.g. `14:05` or `Expired`.
pub fn remaining_label(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    if now > expires_at {
        return "Expired".to_owned();
    }
    let secs = seconds_remaining(expires_at, now);
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Who may display a code for this leg: the party handing the order over.
pub fn issuer_roles(kind: HandoffKind) -> &'static [UserRole] {
    match kind {
        HandoffKind::Pickup => &[UserRole::Vendor, UserRole::Admin],
        HandoffKind::Delivery => &[UserRole::Driver, UserRole::Admin],
    }
}

/// Who may scan or type the code for this leg: the party receiving the order.
pub fn verifier_roles(kind: HandoffKind) -> &'static [UserRole] {
    match kind {
        HandoffKind::Pickup => &[UserRole::Driver, UserRole::Admin],
        HandoffKind::Delivery => &[UserRole::Customer, UserRole::Admin],
    }
}
