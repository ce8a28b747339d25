//! Gateway-injected identity headers extractor.

use axum::extract::FromRequestParts;
use http::StatusCode;
use http::request::Parts;
use uuid::Uuid;

use souq_domain::id::UserId;
use souq_domain::user::UserRole;

pub const USER_ID_HEADER: &str = "x-souq-user-id";
pub const USER_ROLE_HEADER: &str = "x-souq-user-role";

/// Caller identity injected by the gateway via `x-souq-user-id` and `x-souq-user-role` headers.
///
/// Returns 401 if either header is absent, the id is not a UUID, or the role is not a known
/// [`UserRole`]. Per-route role enforcement (403) is done by handlers after extraction.
#[derive(Debug, Clone, Copy)]
pub struct IdentityHeaders {
    pub user_id: UserId,
    pub user_role: UserRole,
}

impl IdentityHeaders {
    pub fn has_role(&self, allowed: &[UserRole]) -> bool {
        allowed.contains(&self.user_role)
    }
}

impl<S> FromRequestParts<S> for IdentityHeaders
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    // axum-core 0.5 declares this as `fn -> impl Future + Send`; read the headers
    // synchronously and return a 'static future so no borrow of `parts` is captured.
    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<Uuid>().ok());

        let user_role = parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u8>().ok())
            .and_then(UserRole::from_u8);

        async move {
            let user_id = user_id.ok_or(StatusCode::UNAUTHORIZED)?;
            let user_role = user_role.ok_or(StatusCode::UNAUTHORIZED)?;
            Ok(Self {
                user_id: UserId(user_id),
                user_role,
            })
        }
    }
}
