//! Reaction-role mappings: (message, emoji) -> role.
//!
//! Emoji keys are the exact external string representation (custom emoji ids
//! or unicode sequences); two renderings of the "same" emoji are different
//! keys on purpose.

use crate::db::entities::reaction_roles;
use crate::error::CoreResult;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::collections::HashMap;

pub struct ReactionRoleService {
    db: DatabaseConnection,
}

impl ReactionRoleService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn set_mapping(
        &self,
        guild_id: u64,
        message_id: u64,
        emoji: &str,
        role_id: u64,
    ) -> CoreResult<()> {
        let model = reaction_roles::ActiveModel {
            guild_id: Set(guild_id as i64),
            message_id: Set(message_id as i64),
            emoji: Set(emoji.to_string()),
            role_id: Set(role_id as i64),
        };

        reaction_roles::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    reaction_roles::Column::GuildId,
                    reaction_roles::Column::MessageId,
                    reaction_roles::Column::Emoji,
                ])
                .update_column(reaction_roles::Column::RoleId)
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(())
    }

    pub async fn get_mappings_for_message(
        &self,
        guild_id: u64,
        message_id: u64,
    ) -> CoreResult<HashMap<String, u64>> {
        let rows = reaction_roles::Entity::find()
            .filter(reaction_roles::Column::GuildId.eq(guild_id as i64))
            .filter(reaction_roles::Column::MessageId.eq(message_id as i64))
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.emoji, row.role_id as u64))
            .collect())
    }

    /// Removes every emoji mapping on a message.
    pub async fn clear_message(&self, guild_id: u64, message_id: u64) -> CoreResult<()> {
        reaction_roles::Entity::delete_many()
            .filter(reaction_roles::Column::GuildId.eq(guild_id as i64))
            .filter(reaction_roles::Column::MessageId.eq(message_id as i64))
            .exec(&self.db)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_test_db;

    #[tokio::test]
    async fn mappings_round_trip_until_cleared() {
        let db = connect_test_db().await;
        let reaction_roles = ReactionRoleService::new(db);

        reaction_roles.set_mapping(1, 100, "🔥", 555).await.unwrap();
        reaction_roles
            .set_mapping(1, 100, "<:custom:123456789>", 666)
            .await
            .unwrap();
        reaction_roles.set_mapping(1, 200, "🔥", 777).await.unwrap();

        let mappings = reaction_roles.get_mappings_for_message(1, 100).await.unwrap();
        assert_eq!(mappings.len(), 2);
        assert_eq!(mappings.get("🔥"), Some(&555));
        assert_eq!(mappings.get("<:custom:123456789>"), Some(&666));

        reaction_roles.clear_message(1, 100).await.unwrap();
        assert!(reaction_roles
            .get_mappings_for_message(1, 100)
            .await
            .unwrap()
            .is_empty());

        // Other messages keep their mappings
        let other = reaction_roles.get_mappings_for_message(1, 200).await.unwrap();
        assert_eq!(other.get("🔥"), Some(&777));
    }

    #[tokio::test]
    async fn re_setting_an_emoji_overwrites_the_role() {
        let db = connect_test_db().await;
        let reaction_roles = ReactionRoleService::new(db);

        reaction_roles.set_mapping(1, 100, "🔥", 555).await.unwrap();
        reaction_roles.set_mapping(1, 100, "🔥", 666).await.unwrap();

        let mappings = reaction_roles.get_mappings_for_message(1, 100).await.unwrap();
        assert_eq!(mappings.len(), 1);
        assert_eq!(mappings.get("🔥"), Some(&666));
    }
}
