use chrono::{DateTime, Utc};

use crate::domain::code::Otp;
use crate::domain::repository::{Clock, OtpSource};

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// OTPs from the thread-local CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngOtp;

impl OtpSource for ThreadRngOtp {
    fn next_otp(&self) -> Otp {
        Otp::random()
    }
}
