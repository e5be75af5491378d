//! Support-ticket lifecycle: open -> escalated (re-entrant) -> closed.
//!
//! Ticket ids are globally sequential across guilds. `create_ticket` computes
//! max(id)+1 and inserts inside one transaction; the single-connection pool
//! serializes the allocation, so two concurrent creates cannot collide.

use crate::db::entities::tickets::{TicketPriority, TicketStatus};
use crate::db::entities::{ticket_channels, ticket_configs, ticket_transcripts, tickets};
use crate::error::CoreResult;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

pub struct TicketService {
    db: DatabaseConnection,
}

impl TicketService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Opens a new ticket with the next sequential id (1 if the table is
    /// empty). Unknown priority strings are stored as medium.
    pub async fn create_ticket(
        &self,
        reporter_id: u64,
        priority: &str,
    ) -> CoreResult<tickets::Model> {
        let txn = self.db.begin().await?;

        let next_id = tickets::Entity::find()
            .order_by_desc(tickets::Column::Id)
            .one(&txn)
            .await?
            .map(|t| t.id + 1)
            .unwrap_or(1);

        let model = tickets::ActiveModel {
            id: Set(next_id),
            priority: Set(TicketPriority::from_input(priority)),
            status: Set(TicketStatus::Open),
            reporter_id: Set(Some(reporter_id as i64)),
            escalated_by: Set(None),
            updated_at: Set(Utc::now().naive_utc()),
        };
        let ticket = model.insert(&txn).await?;

        txn.commit().await?;
        Ok(ticket)
    }

    /// Escalates a ticket, creating it first if no row with `ticket_id`
    /// exists yet (such tickets have no reporter). Re-escalation is allowed
    /// and only updates priority/escalator/timestamp.
    pub async fn escalate_ticket(
        &self,
        ticket_id: i32,
        priority: &str,
        escalated_by: u64,
    ) -> CoreResult<tickets::Model> {
        let now = Utc::now().naive_utc();
        let priority = TicketPriority::from_input(priority);

        let existing = tickets::Entity::find_by_id(ticket_id).one(&self.db).await?;
        let ticket = match existing {
            Some(ticket) => {
                let mut model: tickets::ActiveModel = ticket.into();
                model.priority = Set(priority);
                model.status = Set(TicketStatus::Escalated);
                model.escalated_by = Set(Some(escalated_by as i64));
                model.updated_at = Set(now);
                model.update(&self.db).await?
            }
            None => {
                let model = tickets::ActiveModel {
                    id: Set(ticket_id),
                    priority: Set(priority),
                    status: Set(TicketStatus::Escalated),
                    reporter_id: Set(None),
                    escalated_by: Set(Some(escalated_by as i64)),
                    updated_at: Set(now),
                };
                model.insert(&self.db).await?
            }
        };

        Ok(ticket)
    }

    /// Closes a ticket. Closed is terminal; re-opening is modeled as a new
    /// ticket. Returns `None` for an unknown id.
    pub async fn close_ticket(&self, ticket_id: i32) -> CoreResult<Option<tickets::Model>> {
        let Some(ticket) = tickets::Entity::find_by_id(ticket_id).one(&self.db).await? else {
            return Ok(None);
        };

        let mut model: tickets::ActiveModel = ticket.into();
        model.status = Set(TicketStatus::Closed);
        model.updated_at = Set(Utc::now().naive_utc());
        Ok(Some(model.update(&self.db).await?))
    }

    pub async fn get_ticket(&self, ticket_id: i32) -> CoreResult<Option<tickets::Model>> {
        Ok(tickets::Entity::find_by_id(ticket_id).one(&self.db).await?)
    }

    /// Records the 1:1 ticket-to-channel link; re-linking overwrites.
    pub async fn link_channel(
        &self,
        ticket_id: i32,
        guild_id: u64,
        channel_id: u64,
    ) -> CoreResult<()> {
        let model = ticket_channels::ActiveModel {
            ticket_id: Set(ticket_id),
            guild_id: Set(guild_id as i64),
            channel_id: Set(channel_id as i64),
        };

        ticket_channels::Entity::insert(model)
            .on_conflict(
                OnConflict::column(ticket_channels::Column::TicketId)
                    .update_columns([
                        ticket_channels::Column::GuildId,
                        ticket_channels::Column::ChannelId,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(())
    }

    pub async fn get_channel_for_ticket(&self, ticket_id: i32) -> CoreResult<Option<u64>> {
        Ok(ticket_channels::Entity::find_by_id(ticket_id)
            .one(&self.db)
            .await?
            .map(|link| link.channel_id as u64))
    }

    /// Resolves a ticket from an incoming closure request's channel.
    pub async fn get_ticket_by_channel(
        &self,
        guild_id: u64,
        channel_id: u64,
    ) -> CoreResult<Option<tickets::Model>> {
        let link = ticket_channels::Entity::find()
            .filter(ticket_channels::Column::GuildId.eq(guild_id as i64))
            .filter(ticket_channels::Column::ChannelId.eq(channel_id as i64))
            .one(&self.db)
            .await?;

        let Some(link) = link else {
            return Ok(None);
        };

        Ok(tickets::Entity::find_by_id(link.ticket_id)
            .one(&self.db)
            .await?)
    }

    /// Most-recently-updated open ticket for a reporter in a guild; used to
    /// prevent duplicate ticket creation. Guild scoping goes through the
    /// channel link, so unlinked tickets are not considered.
    pub async fn get_open_ticket_for_user(
        &self,
        guild_id: u64,
        user_id: u64,
    ) -> CoreResult<Option<tickets::Model>> {
        Ok(tickets::Entity::find()
            .inner_join(ticket_channels::Entity)
            .filter(ticket_channels::Column::GuildId.eq(guild_id as i64))
            .filter(tickets::Column::ReporterId.eq(user_id as i64))
            .filter(tickets::Column::Status.eq(TicketStatus::Open))
            .order_by_desc(tickets::Column::UpdatedAt)
            .one(&self.db)
            .await?)
    }

    pub async fn set_category(&self, guild_id: u64, category_id: u64) -> CoreResult<()> {
        let model = ticket_configs::ActiveModel {
            guild_id: Set(guild_id as i64),
            category_id: Set(category_id as i64),
        };

        ticket_configs::Entity::insert(model)
            .on_conflict(
                OnConflict::column(ticket_configs::Column::GuildId)
                    .update_column(ticket_configs::Column::CategoryId)
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(())
    }

    pub async fn get_category(&self, guild_id: u64) -> CoreResult<Option<u64>> {
        Ok(ticket_configs::Entity::find_by_id(guild_id as i64)
            .one(&self.db)
            .await?
            .map(|config| config.category_id as u64))
    }

    pub async fn set_transcript_channel(&self, guild_id: u64, channel_id: u64) -> CoreResult<()> {
        let model = ticket_transcripts::ActiveModel {
            guild_id: Set(guild_id as i64),
            channel_id: Set(channel_id as i64),
        };

        ticket_transcripts::Entity::insert(model)
            .on_conflict(
                OnConflict::column(ticket_transcripts::Column::GuildId)
                    .update_column(ticket_transcripts::Column::ChannelId)
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(())
    }

    pub async fn get_transcript_channel(&self, guild_id: u64) -> CoreResult<Option<u64>> {
        Ok(ticket_transcripts::Entity::find_by_id(guild_id as i64)
            .one(&self.db)
            .await?
            .map(|config| config.channel_id as u64))
    }
}
