//! Pure acceptance check of a presented code against the stored active record.
//!
//! The order of checks is observable: a consumed code reports `CodeAlreadyUsed` even if
//! it has also expired, and an expired code reports `CodeExpired` even if the presented
//! value is wrong.

use chrono::{DateTime, Utc};

use souq_domain::id::OrderId;
use souq_domain::order::HandoffKind;

use crate::domain::code::{CodePayload, Otp, PresentedCode};
use crate::domain::types::HandoffRecord;
use crate::error::Rejection;

pub fn check<'a>(
    active: Option<&'a HandoffRecord>,
    order_id: OrderId,
    kind: HandoffKind,
    presented: &PresentedCode,
    now: DateTime<Utc>,
) -> Result<&'a HandoffRecord, Rejection> {
    let record = active.ok_or(Rejection::NoActiveCode)?;
    if record.is_consumed() {
        return Err(Rejection::CodeAlreadyUsed);
    }
    if record.is_expired_at(now) {
        return Err(Rejection::CodeExpired);
    }

    match presented {
        PresentedCode::Qr(raw) => {
            let payload = CodePayload::decode(raw)?;
            if payload.order_id != order_id {
                return Err(Rejection::OrderMismatch);
            }
            if payload.kind != kind {
                return Err(Rejection::TypeMismatch);
            }
            if payload.otp != record.otp.as_str() || payload.issued_at != record.issued_at {
                return Err(Rejection::CodeMismatch);
            }
        }
        PresentedCode::Otp(digits) => {
            let otp = Otp::parse(digits)?;
            if otp != record.otp {
                return Err(Rejection::CodeMismatch);
            }
        }
    }

    Ok(record)
}
