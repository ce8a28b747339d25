//! User domain types.

use serde::{Deserialize, Serialize};

/// Marketplace role of the caller.
///
/// Wire format: `u8` (0 = Customer, 1 = Vendor, 2 = Driver, 3 = Admin).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Customer = 0,
    Vendor = 1,
    Driver = 2,
    Admin = 3,
}

impl UserRole {
    /// Convert from `u8` wire value. Returns `None` for unknown values.
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Customer),
            1 => Some(Self::Vendor),
            2 => Some(Self::Driver),
            3 => Some(Self::Admin),
            _ => None,
        }
    }

    /// Convert to `u8` wire value.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}
