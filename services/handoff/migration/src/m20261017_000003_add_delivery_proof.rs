use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(HandoffRecords::Table)
                    .add_column(ColumnDef::new(HandoffRecords::SignatureData).text())
                    .add_column(ColumnDef::new(HandoffRecords::PhotoUrl).string())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(HandoffRecords::Table)
                    .drop_column(HandoffRecords::SignatureData)
                    .drop_column(HandoffRecords::PhotoUrl)
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
enum HandoffRecords {
    Table,
    SignatureData,
    PhotoUrl,
}
