use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Punishments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Punishments::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Punishments::GuildId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Punishments::UserId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Punishments::ModeratorId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Punishments::Action)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Punishments::Reason).string())
                    .col(ColumnDef::new(Punishments::CreatedAt).date_time().not_null())
                    .col(ColumnDef::new(Punishments::ExpiresAt).date_time())
                    .to_owned(),
            )
            .await?;

        // History queries are always guild- or (guild, user)-scoped
        manager
            .create_index(
                Index::create()
                    .name("idx-punishments-guild")
                    .table(Punishments::Table)
                    .col(Punishments::GuildId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-punishments-guild-user")
                    .table(Punishments::Table)
                    .col(Punishments::GuildId)
                    .col(Punishments::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Notes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Notes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Notes::GuildId).big_integer().not_null())
                    .col(ColumnDef::new(Notes::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Notes::ModeratorId).big_integer().not_null())
                    .col(ColumnDef::new(Notes::Text).string().not_null())
                    .col(ColumnDef::new(Notes::CreatedAt).date_time().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-notes-guild-user")
                    .table(Notes::Table)
                    .col(Notes::GuildId)
                    .col(Notes::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Notes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Punishments::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Punishments {
    Table,
    Id,
    GuildId,
    UserId,
    ModeratorId,
    Action,
    Reason,
    CreatedAt,
    ExpiresAt,
}

#[derive(DeriveIden)]
enum Notes {
    Table,
    Id,
    GuildId,
    UserId,
    ModeratorId,
    Text,
    CreatedAt,
}
