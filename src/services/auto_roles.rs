//! Trigger-name to role mappings (e.g. "verify" -> verified role).

use crate::db::entities::auto_roles;
use crate::error::CoreResult;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::collections::HashMap;

pub struct AutoRoleService {
    db: DatabaseConnection,
}

impl AutoRoleService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn normalize(trigger: &str) -> String {
        trigger.trim().to_lowercase()
    }

    /// Maps a trigger to a role for the guild, overwriting any existing
    /// mapping. A blank trigger is a no-op.
    pub async fn set_role(&self, guild_id: u64, trigger: &str, role_id: u64) -> CoreResult<()> {
        let trigger = Self::normalize(trigger);
        if trigger.is_empty() {
            return Ok(());
        }

        let model = auto_roles::ActiveModel {
            guild_id: Set(guild_id as i64),
            trigger: Set(trigger),
            role_id: Set(role_id as i64),
        };

        auto_roles::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([auto_roles::Column::GuildId, auto_roles::Column::Trigger])
                    .update_column(auto_roles::Column::RoleId)
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(())
    }

    pub async fn get_role(&self, guild_id: u64, trigger: &str) -> CoreResult<Option<u64>> {
        let trigger = Self::normalize(trigger);
        Ok(auto_roles::Entity::find_by_id((guild_id as i64, trigger))
            .one(&self.db)
            .await?
            .map(|mapping| mapping.role_id as u64))
    }

    /// Full trigger map for a guild, for management/display surfaces.
    pub async fn all_triggers(&self, guild_id: u64) -> CoreResult<HashMap<String, u64>> {
        let rows = auto_roles::Entity::find()
            .filter(auto_roles::Column::GuildId.eq(guild_id as i64))
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.trigger, row.role_id as u64))
            .collect())
    }

    /// Removes a trigger mapping; succeeds whether or not it existed.
    pub async fn clear_trigger(&self, guild_id: u64, trigger: &str) -> CoreResult<()> {
        let trigger = Self::normalize(trigger);
        if trigger.is_empty() {
            return Ok(());
        }

        auto_roles::Entity::delete_by_id((guild_id as i64, trigger))
            .exec(&self.db)
            .await?;

        Ok(())
    }
}
