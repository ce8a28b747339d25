//! Mock identity helpers for router tests.
//!
//! Services behind the gateway receive `x-souq-user-id` + `x-souq-user-role` headers
//! injected by the gateway. In tests, `MockAuth` produces these headers directly
//! so no real gateway is needed.

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use uuid::Uuid;

use souq_domain::id::UserId;
use souq_domain::user::UserRole;
use souq_identity::identity::{USER_ID_HEADER, USER_ROLE_HEADER};

/// Configurable identity injected into test requests.
pub struct MockAuth {
    pub user_id: UserId,
    pub user_role: UserRole,
}

impl MockAuth {
    pub fn new(user_id: Uuid, user_role: UserRole) -> Self {
        Self {
            user_id: UserId(user_id),
            user_role,
        }
    }

    pub fn customer() -> Self {
        Self::new(Uuid::new_v4(), UserRole::Customer)
    }

    pub fn vendor() -> Self {
        Self::new(Uuid::new_v4(), UserRole::Vendor)
    }

    pub fn driver() -> Self {
        Self::new(Uuid::new_v4(), UserRole::Driver)
    }

    pub fn admin() -> Self {
        Self::new(Uuid::new_v4(), UserRole::Admin)
    }

    /// Return headers as if the gateway injected them.
    pub fn headers(&self) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(
            HeaderName::from_static(USER_ID_HEADER),
            HeaderValue::from_str(&self.user_id.to_string()).unwrap(),
        );
        map.insert(
            HeaderName::from_static(USER_ROLE_HEADER),
            HeaderValue::from_str(&self.user_role.as_u8().to_string()).unwrap(),
        );
        map
    }
}
