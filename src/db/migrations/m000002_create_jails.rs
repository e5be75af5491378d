use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Jails::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Jails::GuildId).big_integer().not_null())
                    .col(ColumnDef::new(Jails::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Jails::RoleId).big_integer().not_null())
                    .col(ColumnDef::new(Jails::Reason).string())
                    .col(ColumnDef::new(Jails::CreatedAt).date_time().not_null())
                    .col(ColumnDef::new(Jails::ExpiresAt).date_time())
                    .primary_key(
                        Index::create()
                            .name("pk-jails")
                            .col(Jails::GuildId)
                            .col(Jails::UserId),
                    )
                    .to_owned(),
            )
            .await?;

        // Index for the startup re-arm pass
        manager
            .create_index(
                Index::create()
                    .name("idx-jails-expires-at")
                    .table(Jails::Table)
                    .col(Jails::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Jails::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Jails {
    Table,
    GuildId,
    UserId,
    RoleId,
    Reason,
    CreatedAt,
    ExpiresAt,
}
