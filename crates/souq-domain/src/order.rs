//! Order handoff domain types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which leg of the delivery a handoff code attests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandoffKind {
    /// Vendor hands the order to the driver.
    Pickup,
    /// Driver hands the order to the customer.
    Delivery,
}

impl HandoffKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pickup => "pickup",
            Self::Delivery => "delivery",
        }
    }
}

impl fmt::Display for HandoffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string cannot be parsed as a [`HandoffKind`].
#[derive(Debug, Error)]
#[error("unknown handoff kind: {0:?}")]
pub struct UnknownHandoffKind(pub String);

impl FromStr for HandoffKind {
    type Err = UnknownHandoffKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pickup" => Ok(Self::Pickup),
            "delivery" => Ok(Self::Delivery),
            other => Err(UnknownHandoffKind(other.to_owned())),
        }
    }
}

/// Handoff-relevant slice of an order's lifecycle.
///
/// `Preparing` and `Cancelled` are driven by the order service; the remaining
/// states are only entered through a verified handoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Preparing,
    AwaitingPickup,
    PickedUp,
    AwaitingDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Preparing => "preparing",
            Self::AwaitingPickup => "awaiting_pickup",
            Self::PickedUp => "picked_up",
            Self::AwaitingDelivery => "awaiting_delivery",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Statuses only reachable by consuming a handoff code.
    pub fn is_handoff_gated(self) -> bool {
        matches!(
            self,
            Self::PickedUp | Self::AwaitingDelivery | Self::Delivered
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string cannot be parsed as an [`OrderStatus`].
#[derive(Debug, Error)]
#[error("unknown order status: {0:?}")]
pub struct UnknownOrderStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownOrderStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "preparing" => Ok(Self::Preparing),
            "awaiting_pickup" => Ok(Self::AwaitingPickup),
            "picked_up" => Ok(Self::PickedUp),
            "awaiting_delivery" => Ok(Self::AwaitingDelivery),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownOrderStatus(other.to_owned())),
        }
    }
}

/// How the counterparty presented the code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMethod {
    /// Camera scan of the QR payload.
    Qr,
    /// Manually typed six-digit code.
    Otp,
}

impl VerificationMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Qr => "qr",
            Self::Otp => "otp",
        }
    }
}

impl fmt::Display for VerificationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string cannot be parsed as a [`VerificationMethod`].
#[derive(Debug, Error)]
#[error("unknown verification method: {0:?}")]
pub struct UnknownVerificationMethod(pub String);

impl FromStr for VerificationMethod {
    type Err = UnknownVerificationMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "qr" => Ok(Self::Qr),
            "otp" => Ok(Self::Otp),
            other => Err(UnknownVerificationMethod(other.to_owned())),
        }
    }
}
