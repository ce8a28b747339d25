use sea_orm::entity::prelude::*;

/// One issued pickup or delivery code. Rows are never deleted; superseded and consumed
/// rows form the handoff audit trail of the order.
/// At most one row per (order_id, kind) has `superseded_at IS NULL`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "handoff_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub order_id: Uuid,
    /// "pickup" or "delivery".
    pub kind: String,
    /// Serialized QR payload.
    #[sea_orm(column_type = "Text")]
    pub code_payload: String,
    pub otp: String,
    pub issued_by: Uuid,
    pub issued_at: chrono::DateTime<chrono::Utc>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub consumed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub superseded_at: Option<chrono::DateTime<chrono::Utc>>,
    pub verified_by: Option<Uuid>,
    /// "qr" or "otp"; set together with `consumed_at`.
    pub verified_method: Option<String>,
    /// Recipient signature captured at delivery, as sent by the client.
    #[sea_orm(column_type = "Text", nullable)]
    pub signature_data: Option<String>,
    /// Photo of the delivered order.
    pub photo_url: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::orders::Entity",
        from = "Column::OrderId",
        to = "super::orders::Column::Id"
    )]
    Order,
}

impl Related<super::orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
