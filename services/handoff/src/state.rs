use sea_orm::DatabaseConnection;

use crate::domain::policy::HandoffPolicy;
use crate::infra::db::{DbHandoffRecordRepository, DbOrderRepository};
use crate::infra::notifier::OrderChangeHub;
use crate::infra::system::{SystemClock, ThreadRngOtp};

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub hub: OrderChangeHub,
    pub policy: HandoffPolicy,
}

impl AppState {
    pub fn order_repo(&self) -> DbOrderRepository {
        DbOrderRepository {
            db: self.db.clone(),
        }
    }

    pub fn handoff_repo(&self) -> DbHandoffRecordRepository {
        DbHandoffRecordRepository {
            db: self.db.clone(),
        }
    }

    pub fn notifier(&self) -> OrderChangeHub {
        self.hub.clone()
    }

    pub fn clock(&self) -> SystemClock {
        SystemClock
    }

    pub fn otp_source(&self) -> ThreadRngOtp {
        ThreadRngOtp
    }
}
