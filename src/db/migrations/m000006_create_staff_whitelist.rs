use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(StaffWhitelist::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StaffWhitelist::UserId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(StaffWhitelist::Level)
                            .string_len(16)
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StaffWhitelist::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum StaffWhitelist {
    Table,
    UserId,
    Level,
}
