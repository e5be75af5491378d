//! Punishment/note history and jail state.
//!
//! Punishments and notes are append-only: rows are inserted, queried and
//! exported, never mutated. Jail state is keyed by (guild, user) with upsert
//! semantics; clearing returns the prior value so callers can reverse an
//! externally-applied role grant without a second read.

use crate::db::entities::{jails, notes, punishments};
use crate::db::entities::punishments::PunishmentKind;
use crate::error::CoreResult;
use chrono::{NaiveDateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

/// Input for a new punishment record; `created_at` is set on insert.
#[derive(Debug, Clone)]
pub struct NewPunishment {
    pub user_id: u64,
    pub moderator_id: u64,
    pub kind: PunishmentKind,
    pub reason: Option<String>,
    pub expires_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone)]
pub struct NewNote {
    pub user_id: u64,
    pub moderator_id: u64,
    pub text: String,
}

/// Input for jail state; overwrites any existing jail for the same
/// (guild, user) pair.
#[derive(Debug, Clone)]
pub struct NewJail {
    pub guild_id: u64,
    pub user_id: u64,
    pub role_id: u64,
    pub reason: Option<String>,
    pub expires_at: Option<NaiveDateTime>,
}

pub struct HistoryService {
    db: DatabaseConnection,
}

impl HistoryService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn add_punishment(
        &self,
        guild_id: u64,
        record: NewPunishment,
    ) -> CoreResult<punishments::Model> {
        let model = punishments::ActiveModel {
            guild_id: Set(guild_id as i64),
            user_id: Set(record.user_id as i64),
            moderator_id: Set(record.moderator_id as i64),
            action: Set(record.kind),
            reason: Set(record.reason),
            created_at: Set(Utc::now().naive_utc()),
            expires_at: Set(record.expires_at),
            ..Default::default()
        };

        Ok(model.insert(&self.db).await?)
    }

    pub async fn add_note(&self, guild_id: u64, record: NewNote) -> CoreResult<notes::Model> {
        let model = notes::ActiveModel {
            guild_id: Set(guild_id as i64),
            user_id: Set(record.user_id as i64),
            moderator_id: Set(record.moderator_id as i64),
            text: Set(record.text),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        };

        Ok(model.insert(&self.db).await?)
    }

    /// All punishments for a guild in creation order.
    pub async fn get_punishments(&self, guild_id: u64) -> CoreResult<Vec<punishments::Model>> {
        Ok(punishments::Entity::find()
            .filter(punishments::Column::GuildId.eq(guild_id as i64))
            .order_by_asc(punishments::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    pub async fn get_punishments_for_user(
        &self,
        guild_id: u64,
        user_id: u64,
    ) -> CoreResult<Vec<punishments::Model>> {
        Ok(punishments::Entity::find()
            .filter(punishments::Column::GuildId.eq(guild_id as i64))
            .filter(punishments::Column::UserId.eq(user_id as i64))
            .order_by_asc(punishments::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    pub async fn get_notes(&self, guild_id: u64) -> CoreResult<Vec<notes::Model>> {
        Ok(notes::Entity::find()
            .filter(notes::Column::GuildId.eq(guild_id as i64))
            .order_by_asc(notes::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    pub async fn get_notes_for_user(
        &self,
        guild_id: u64,
        user_id: u64,
    ) -> CoreResult<Vec<notes::Model>> {
        Ok(notes::Entity::find()
            .filter(notes::Column::GuildId.eq(guild_id as i64))
            .filter(notes::Column::UserId.eq(user_id as i64))
            .order_by_asc(notes::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    /// Upserts jail state for (guild, user), overwriting every field of an
    /// existing row including timestamps.
    pub async fn set_jail(&self, state: NewJail) -> CoreResult<jails::Model> {
        let guild_id = state.guild_id;
        let user_id = state.user_id;

        let model = jails::ActiveModel {
            guild_id: Set(guild_id as i64),
            user_id: Set(user_id as i64),
            role_id: Set(state.role_id as i64),
            reason: Set(state.reason),
            created_at: Set(Utc::now().naive_utc()),
            expires_at: Set(state.expires_at),
        };

        jails::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([jails::Column::GuildId, jails::Column::UserId])
                    .update_columns([
                        jails::Column::RoleId,
                        jails::Column::Reason,
                        jails::Column::CreatedAt,
                        jails::Column::ExpiresAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        let stored = self.get_jail(guild_id, user_id).await?;
        // The row was just written on this connection
        Ok(stored.expect("jail row present after upsert"))
    }

    pub async fn get_jail(&self, guild_id: u64, user_id: u64) -> CoreResult<Option<jails::Model>> {
        Ok(jails::Entity::find_by_id((guild_id as i64, user_id as i64))
            .one(&self.db)
            .await?)
    }

    /// Deletes the jail row for (guild, user) and returns the prior value,
    /// or `None` (and no mutation) if the user was not jailed.
    pub async fn clear_jail(
        &self,
        guild_id: u64,
        user_id: u64,
    ) -> CoreResult<Option<jails::Model>> {
        let existing = self.get_jail(guild_id, user_id).await?;
        let Some(state) = existing else {
            return Ok(None);
        };

        jails::Entity::delete_by_id((guild_id as i64, user_id as i64))
            .exec(&self.db)
            .await?;

        Ok(Some(state))
    }

    /// Jail rows carrying an expiry, for the startup re-arm pass.
    pub async fn jails_with_expiry(&self) -> CoreResult<Vec<jails::Model>> {
        Ok(jails::Entity::find()
            .filter(jails::Column::ExpiresAt.is_not_null())
            .all(&self.db)
            .await?)
    }
}
