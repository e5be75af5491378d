use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AutoRoles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AutoRoles::GuildId).big_integer().not_null())
                    .col(ColumnDef::new(AutoRoles::Trigger).string().not_null())
                    .col(ColumnDef::new(AutoRoles::RoleId).big_integer().not_null())
                    .primary_key(
                        Index::create()
                            .name("pk-auto-roles")
                            .col(AutoRoles::GuildId)
                            .col(AutoRoles::Trigger),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ReactionRoles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReactionRoles::GuildId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReactionRoles::MessageId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ReactionRoles::Emoji).string().not_null())
                    .col(
                        ColumnDef::new(ReactionRoles::RoleId)
                            .big_integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .name("pk-reaction-roles")
                            .col(ReactionRoles::GuildId)
                            .col(ReactionRoles::MessageId)
                            .col(ReactionRoles::Emoji),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReactionRoles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AutoRoles::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AutoRoles {
    Table,
    GuildId,
    Trigger,
    RoleId,
}

#[derive(DeriveIden)]
enum ReactionRoles {
    Table,
    GuildId,
    MessageId,
    Emoji,
    RoleId,
}
