use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(handoff_records_table()).await?;

        manager
            .create_index(
                Index::create()
                    .table(HandoffRecords::Table)
                    .col(HandoffRecords::OrderId)
                    .col(HandoffRecords::Kind)
                    .name("idx_handoff_records_order_id_kind")
                    .to_owned(),
            )
            .await?;

        // One active (non-superseded) code per order and leg.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS uq_handoff_records_active \
                 ON handoff_records (order_id, kind) WHERE superseded_at IS NULL",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(HandoffRecords::Table).to_owned())
            .await
    }
}

fn handoff_records_table() -> TableCreateStatement {
    Table::create()
        .table(HandoffRecords::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(HandoffRecords::Id)
                .uuid()
                .not_null()
                .primary_key(),
        )
        .col(ColumnDef::new(HandoffRecords::OrderId).uuid().not_null())
        .col(ColumnDef::new(HandoffRecords::Kind).string().not_null())
        .col(ColumnDef::new(HandoffRecords::CodePayload).text().not_null())
        .col(ColumnDef::new(HandoffRecords::Otp).string_len(6).not_null())
        .col(ColumnDef::new(HandoffRecords::IssuedBy).uuid().not_null())
        .col(
            ColumnDef::new(HandoffRecords::IssuedAt)
                .timestamp_with_time_zone()
                .not_null(),
        )
        .col(
            ColumnDef::new(HandoffRecords::ExpiresAt)
                .timestamp_with_time_zone()
                .not_null(),
        )
        .col(ColumnDef::new(HandoffRecords::ConsumedAt).timestamp_with_time_zone())
        .col(ColumnDef::new(HandoffRecords::SupersededAt).timestamp_with_time_zone())
        .col(ColumnDef::new(HandoffRecords::VerifiedBy).uuid())
        .col(ColumnDef::new(HandoffRecords::VerifiedMethod).string())
        .foreign_key(
            ForeignKey::create()
                .from(HandoffRecords::Table, HandoffRecords::OrderId)
                .to(Orders::Table, Orders::Id)
                .on_delete(ForeignKeyAction::Restrict),
        )
        .to_owned()
}

#[derive(Iden)]
enum HandoffRecords {
    Table,
    Id,
    OrderId,
    Kind,
    CodePayload,
    Otp,
    IssuedBy,
    IssuedAt,
    ExpiresAt,
    ConsumedAt,
    SupersededAt,
    VerifiedBy,
    VerifiedMethod,
}

#[derive(Iden)]
enum Orders {
    Table,
    Id,
}
