pub mod code;
pub mod events;
pub mod health;
pub mod history;
pub mod order;
pub mod verify;

use souq_domain::user::UserRole;
use souq_identity::identity::IdentityHeaders;

use crate::error::HandoffServiceError;

fn require_role(identity: &IdentityHeaders, allowed: &[UserRole]) -> Result<(), HandoffServiceError> {
    if identity.has_role(allowed) {
        Ok(())
    } else {
        Err(HandoffServiceError::Forbidden)
    }
}
