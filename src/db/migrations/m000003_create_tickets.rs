use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tickets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tickets::Id)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Tickets::Priority).string_len(16).not_null())
                    .col(ColumnDef::new(Tickets::Status).string_len(16).not_null())
                    .col(ColumnDef::new(Tickets::ReporterId).big_integer())
                    .col(ColumnDef::new(Tickets::EscalatedBy).big_integer())
                    .col(ColumnDef::new(Tickets::UpdatedAt).date_time().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TicketChannels::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TicketChannels::TicketId)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TicketChannels::GuildId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TicketChannels::ChannelId)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Closure requests resolve the ticket from (guild, channel)
        manager
            .create_index(
                Index::create()
                    .name("idx-ticket-channels-guild-channel")
                    .table(TicketChannels::Table)
                    .col(TicketChannels::GuildId)
                    .col(TicketChannels::ChannelId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TicketConfigs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TicketConfigs::GuildId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TicketConfigs::CategoryId)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TicketTranscripts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TicketTranscripts::GuildId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TicketTranscripts::ChannelId)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TicketTranscripts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TicketConfigs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TicketChannels::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tickets::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Tickets {
    Table,
    Id,
    Priority,
    Status,
    ReporterId,
    EscalatedBy,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum TicketChannels {
    Table,
    TicketId,
    GuildId,
    ChannelId,
}

#[derive(DeriveIden)]
enum TicketConfigs {
    Table,
    GuildId,
    CategoryId,
}

#[derive(DeriveIden)]
enum TicketTranscripts {
    Table,
    GuildId,
    ChannelId,
}
