use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    sea_query::Expr,
};

use souq_domain::id::{HandoffId, OrderId, UserId};
use souq_domain::order::{HandoffKind, OrderStatus, VerificationMethod};
use souq_handoff_schema::{handoff_records, orders};

use crate::domain::code::Otp;
use crate::domain::repository::{HandoffRecordRepository, OrderStatusRepository};
use crate::domain::types::{
    Consumption, DeliveryProof, HandoffRecord, Milestone, OrderHandoffState, Transition,
};
use crate::error::HandoffServiceError;

// ── Order status repository ──────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbOrderRepository {
    pub db: DatabaseConnection,
}

impl OrderStatusRepository for DbOrderRepository {
    async fn find(
        &self,
        order_id: OrderId,
    ) -> Result<Option<OrderHandoffState>, HandoffServiceError> {
        let model = orders::Entity::find_by_id(order_id.0)
            .one(&self.db)
            .await
            .context("find order")?;
        match model {
            Some(model) => Ok(Some(order_from_model(model)?)),
            None => Ok(None),
        }
    }

    async fn insert(&self, state: &OrderHandoffState) -> Result<(), HandoffServiceError> {
        orders::ActiveModel {
            id: Set(state.order_id.0),
            status: Set(state.status.as_str().to_owned()),
            picked_up_at: Set(state.picked_up_at),
            delivered_at: Set(state.delivered_at),
            created_at: Set(state.updated_at),
            updated_at: Set(state.updated_at),
        }
        .insert(&self.db)
        .await
        .context("insert order")?;
        Ok(())
    }

    async fn apply(&self, transition: &Transition) -> Result<bool, HandoffServiceError> {
        let mut update = orders::Entity::update_many()
            .col_expr(orders::Column::Status, Expr::value(transition.to.as_str()))
            .col_expr(orders::Column::UpdatedAt, Expr::value(transition.at));
        update = match transition.milestone {
            Some(Milestone::PickedUp) => {
                update.col_expr(orders::Column::PickedUpAt, Expr::value(transition.at))
            }
            Some(Milestone::Delivered) => {
                update.col_expr(orders::Column::DeliveredAt, Expr::value(transition.at))
            }
            None => update,
        };
        let result = update
            .filter(orders::Column::Id.eq(transition.order_id.0))
            .filter(orders::Column::Status.eq(transition.from.as_str()))
            .exec(&self.db)
            .await
            .context("apply order transition")?;
        Ok(result.rows_affected == 1)
    }
}

fn order_from_model(m: orders::Model) -> anyhow::Result<OrderHandoffState> {
    Ok(OrderHandoffState {
        order_id: OrderId(m.id),
        status: m.status.parse::<OrderStatus>().context("stored order status")?,
        picked_up_at: m.picked_up_at,
        delivered_at: m.delivered_at,
        updated_at: m.updated_at,
    })
}

// ── Handoff record repository ────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbHandoffRecordRepository {
    pub db: DatabaseConnection,
}

impl HandoffRecordRepository for DbHandoffRecordRepository {
    async fn load_active(
        &self,
        order_id: OrderId,
        kind: HandoffKind,
    ) -> Result<Option<HandoffRecord>, HandoffServiceError> {
        let model = find_active(&self.db, order_id, kind)
            .await
            .context("load active handoff record")?;
        match model {
            Some(model) => Ok(Some(record_from_model(model)?)),
            None => Ok(None),
        }
    }

    async fn supersede_and_insert(
        &self,
        record: &HandoffRecord,
    ) -> Result<(), HandoffServiceError> {
        self.db
            .transaction::<_, (), sea_orm::DbErr>(|txn| {
                let record = record.clone();
                Box::pin(async move {
                    lock_order(txn, record.order_id).await?;
                    supersede_active(txn, &record).await?;
                    insert_record(txn, &record).await?;
                    Ok(())
                })
            })
            .await
            .context("supersede and insert handoff record")?;
        Ok(())
    }

    async fn insert_unless_usable(
        &self,
        record: &HandoffRecord,
        now: DateTime<Utc>,
    ) -> Result<HandoffRecord, HandoffServiceError> {
        let existing = self
            .db
            .transaction::<_, Option<handoff_records::Model>, sea_orm::DbErr>(|txn| {
                let record = record.clone();
                Box::pin(async move {
                    lock_order(txn, record.order_id).await?;
                    if let Some(active) = find_active(txn, record.order_id, record.kind).await? {
                        if active.consumed_at.is_none() && now <= active.expires_at {
                            return Ok(Some(active));
                        }
                    }
                    supersede_active(txn, &record).await?;
                    insert_record(txn, &record).await?;
                    Ok(None)
                })
            })
            .await
            .context("issue handoff record unless usable")?;
        match existing {
            Some(model) => Ok(record_from_model(model)?),
            None => Ok(record.clone()),
        }
    }

    async fn consume(&self, consumption: &Consumption) -> Result<bool, HandoffServiceError> {
        let result = handoff_records::Entity::update_many()
            .col_expr(
                handoff_records::Column::ConsumedAt,
                Expr::value(consumption.consumed_at),
            )
            .col_expr(
                handoff_records::Column::VerifiedBy,
                Expr::value(consumption.verified_by.0),
            )
            .col_expr(
                handoff_records::Column::VerifiedMethod,
                Expr::value(consumption.method.as_str()),
            )
            .col_expr(
                handoff_records::Column::SignatureData,
                Expr::value(consumption.proof.signature_data.clone()),
            )
            .col_expr(
                handoff_records::Column::PhotoUrl,
                Expr::value(consumption.proof.photo_url.clone()),
            )
            .filter(handoff_records::Column::Id.eq(consumption.record_id.0))
            .filter(handoff_records::Column::ConsumedAt.is_null())
            .filter(handoff_records::Column::SupersededAt.is_null())
            .exec(&self.db)
            .await
            .context("consume handoff record")?;
        Ok(result.rows_affected == 1)
    }

    async fn list_by_order(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<HandoffRecord>, HandoffServiceError> {
        let models = handoff_records::Entity::find()
            .filter(handoff_records::Column::OrderId.eq(order_id.0))
            .order_by_asc(handoff_records::Column::IssuedAt)
            .order_by_asc(handoff_records::Column::Id)
            .all(&self.db)
            .await
            .context("list handoff records")?;
        let records = models
            .into_iter()
            .map(record_from_model)
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(records)
    }
}

/// `SELECT ... FOR UPDATE` on the order row; issuers of one order queue behind it.
async fn lock_order(txn: &DatabaseTransaction, order_id: OrderId) -> Result<(), sea_orm::DbErr> {
    orders::Entity::find_by_id(order_id.0)
        .lock_exclusive()
        .one(txn)
        .await?;
    Ok(())
}

async fn find_active<C: ConnectionTrait>(
    conn: &C,
    order_id: OrderId,
    kind: HandoffKind,
) -> Result<Option<handoff_records::Model>, sea_orm::DbErr> {
    handoff_records::Entity::find()
        .filter(handoff_records::Column::OrderId.eq(order_id.0))
        .filter(handoff_records::Column::Kind.eq(kind.as_str()))
        .filter(handoff_records::Column::SupersededAt.is_null())
        .order_by_desc(handoff_records::Column::IssuedAt)
        .one(conn)
        .await
}

async fn supersede_active(
    txn: &DatabaseTransaction,
    record: &HandoffRecord,
) -> Result<(), sea_orm::DbErr> {
    handoff_records::Entity::update_many()
        .col_expr(
            handoff_records::Column::SupersededAt,
            Expr::value(record.issued_at),
        )
        .filter(handoff_records::Column::OrderId.eq(record.order_id.0))
        .filter(handoff_records::Column::Kind.eq(record.kind.as_str()))
        .filter(handoff_records::Column::SupersededAt.is_null())
        .exec(txn)
        .await?;
    Ok(())
}

async fn insert_record(
    txn: &DatabaseTransaction,
    record: &HandoffRecord,
) -> Result<(), sea_orm::DbErr> {
    handoff_records::ActiveModel {
        id: Set(record.id.0),
        order_id: Set(record.order_id.0),
        kind: Set(record.kind.as_str().to_owned()),
        code_payload: Set(record.code_payload.clone()),
        otp: Set(record.otp.as_str().to_owned()),
        issued_by: Set(record.issued_by.0),
        issued_at: Set(record.issued_at),
        expires_at: Set(record.expires_at),
        consumed_at: Set(record.consumed_at),
        superseded_at: Set(record.superseded_at),
        verified_by: Set(record.verified_by.map(|u| u.0)),
        verified_method: Set(record.verified_method.map(|m| m.as_str().to_owned())),
        signature_data: Set(record.proof.signature_data.clone()),
        photo_url: Set(record.proof.photo_url.clone()),
    }
    .insert(txn)
    .await?;
    Ok(())
}

fn record_from_model(m: handoff_records::Model) -> anyhow::Result<HandoffRecord> {
    Ok(HandoffRecord {
        id: HandoffId(m.id),
        order_id: OrderId(m.order_id),
        kind: m.kind.parse::<HandoffKind>().context("stored handoff kind")?,
        code_payload: m.code_payload,
        otp: Otp::parse(&m.otp).context("stored otp")?,
        issued_by: UserId(m.issued_by),
        issued_at: m.issued_at,
        expires_at: m.expires_at,
        consumed_at: m.consumed_at,
        superseded_at: m.superseded_at,
        verified_by: m.verified_by.map(UserId),
        verified_method: m
            .verified_method
            .map(|s| s.parse::<VerificationMethod>())
            .transpose()
            .context("stored verification method")?,
        proof: DeliveryProof {
            signature_data: m.signature_data,
            photo_url: m.photo_url,
        },
    })
}
