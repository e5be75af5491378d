//! Staff whitelist and the staff-authority predicate.
//!
//! The core never authorizes anything itself; the collaborator layer
//! evaluates [`resolve_staff_authority`] before invoking core operations.

use crate::db::entities::staff_whitelist;
use crate::db::entities::staff_whitelist::StaffLevel;
use crate::error::CoreResult;
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, EntityTrait, Set};

/// What the collaborator layer knows about the acting member.
#[derive(Debug, Clone, Default)]
pub struct ActorContext {
    pub user_id: u64,
    pub is_guild_owner: bool,
    pub has_administrator: bool,
    pub role_ids: Vec<u64>,
}

/// Static staff configuration for a guild.
#[derive(Debug, Clone, Default)]
pub struct StaffConfig {
    pub owner_ids: Vec<u64>,
    pub staff_role_ids: Vec<u64>,
}

/// Pure capability predicate: guild owner and administrator always pass,
/// then configured owner ids, then staff-role membership, then the
/// whitelist lookup the caller already resolved.
pub fn resolve_staff_authority(
    actor: &ActorContext,
    config: &StaffConfig,
    whitelisted: bool,
) -> bool {
    if actor.is_guild_owner || actor.has_administrator {
        return true;
    }
    if config.owner_ids.contains(&actor.user_id) {
        return true;
    }
    if actor
        .role_ids
        .iter()
        .any(|role| config.staff_role_ids.contains(role))
    {
        return true;
    }
    whitelisted
}

pub struct WhitelistService {
    db: DatabaseConnection,
}

impl WhitelistService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn set_level(&self, user_id: u64, level: StaffLevel) -> CoreResult<()> {
        let model = staff_whitelist::ActiveModel {
            user_id: Set(user_id as i64),
            level: Set(level),
        };

        staff_whitelist::Entity::insert(model)
            .on_conflict(
                OnConflict::column(staff_whitelist::Column::UserId)
                    .update_column(staff_whitelist::Column::Level)
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(())
    }

    pub async fn get_level(&self, user_id: u64) -> CoreResult<Option<StaffLevel>> {
        Ok(staff_whitelist::Entity::find_by_id(user_id as i64)
            .one(&self.db)
            .await?
            .map(|entry| entry.level))
    }

    pub async fn is_whitelisted(&self, user_id: u64) -> CoreResult<bool> {
        Ok(self.get_level(user_id).await?.is_some())
    }

    /// Returns whether a row was actually removed.
    pub async fn remove(&self, user_id: u64) -> CoreResult<bool> {
        let result = staff_whitelist::Entity::delete_by_id(user_id as i64)
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Convenience over [`resolve_staff_authority`] that resolves the
    /// whitelist membership itself.
    pub async fn is_staff(&self, actor: &ActorContext, config: &StaffConfig) -> CoreResult<bool> {
        if resolve_staff_authority(actor, config, false) {
            return Ok(true);
        }
        self.is_whitelisted(actor.user_id).await
    }
}
