use sea_orm::entity::prelude::*;

/// Handoff-relevant mirror of an order: its lifecycle status and handoff timestamps.
/// The canonical order row lives in the order service.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// `OrderStatus` column value (e.g. "awaiting_pickup").
    pub status: String,
    pub picked_up_at: Option<chrono::DateTime<chrono::Utc>>,
    pub delivered_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::handoff_records::Entity")]
    HandoffRecords,
}

impl Related<super::handoff_records::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::HandoffRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
