//! The two presentations of a handoff code: the six-digit OTP a person types and the
//! QR payload a camera scans.

use std::fmt;

use chrono::{DateTime, Utc};
use rand::RngExt;
use serde::{Deserialize, Serialize};

use souq_domain::id::OrderId;
use souq_domain::order::{HandoffKind, VerificationMethod};

use crate::error::Rejection;

/// Number of digits in an OTP.
pub const OTP_LEN: usize = 6;

/// OTPs are drawn uniformly from `0..OTP_SPACE` and zero-padded.
const OTP_SPACE: u32 = 1_000_000;

/// Current QR payload layout version.
pub const PAYLOAD_VERSION: u8 = 1;

/// Six ASCII digits. Only constructible through [`Otp::parse`] or from a number, so a
/// value of this type always satisfies the format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Otp(String);

impl Otp {
    /// Accept exactly six ASCII digits; no separators, no whitespace.
    pub fn parse(input: &str) -> Result<Self, Rejection> {
        if input.len() == OTP_LEN && input.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(input.to_owned()))
        } else {
            Err(Rejection::InvalidFormat)
        }
    }

    pub fn from_number(n: u32) -> Self {
        Self(format!("{:06}", n % OTP_SPACE))
    }

    /// Draw from the thread-local CSPRNG (OS-seeded ChaCha).
    pub fn random() -> Self {
        let mut rng = rand::rng();
        Self::from_number(rng.random_range(0..OTP_SPACE))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Display form `XXX-XXX`, easier to read aloud at the counter.
    pub fn grouped(&self) -> String {
        format!("{}-{}", &self.0[..3], &self.0[3..])
    }
}

impl fmt::Display for Otp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the QR image encodes.
///
/// Serialized as compact JSON:
/// `{"v":1,"order_id":"…","type":"pickup","otp":"482193","issued_at":"2026-10-17T09:30:00.123Z"}`.
/// The persisted record stays authoritative; the payload only identifies which record the
/// scanner claims to hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CodePayload {
    pub v: u8,
    pub order_id: OrderId,
    #[serde(rename = "type")]
    pub kind: HandoffKind,
    pub otp: String,
    pub issued_at: DateTime<Utc>,
}

impl CodePayload {
    pub fn new(order_id: OrderId, kind: HandoffKind, otp: &Otp, issued_at: DateTime<Utc>) -> Self {
        Self {
            v: PAYLOAD_VERSION,
            order_id,
            kind,
            otp: otp.as_str().to_owned(),
            issued_at,
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a scanned string. Anything that is not exactly a current-version payload
    /// with a well-formed OTP is `MalformedPayload`.
    pub fn decode(raw: &str) -> Result<Self, Rejection> {
        let payload: Self =
            serde_json::from_str(raw.trim()).map_err(|_| Rejection::MalformedPayload)?;
        if payload.v != PAYLOAD_VERSION {
            return Err(Rejection::MalformedPayload);
        }
        Otp::parse(&payload.otp).map_err(|_| Rejection::MalformedPayload)?;
        Ok(payload)
    }
}

/// A code as presented by the counterparty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresentedCode {
    /// Decoded QR string, exactly as the scanner produced it.
    Qr(String),
    /// Manually typed digits.
    Otp(String),
}

impl PresentedCode {
    pub fn method(&self) -> VerificationMethod {
        match self {
            Self::Qr(_) => VerificationMethod::Qr,
            Self::Otp(_) => VerificationMethod::Otp,
        }
    }
}
