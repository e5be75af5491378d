use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of recorded moderation action.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum PunishmentKind {
    #[sea_orm(string_value = "warn")]
    Warn,
    #[sea_orm(string_value = "timeout")]
    Timeout,
    #[sea_orm(string_value = "mute")]
    Mute,
    #[sea_orm(string_value = "kick")]
    Kick,
    #[sea_orm(string_value = "ban")]
    Ban,
    #[sea_orm(string_value = "softban")]
    Softban,
    #[sea_orm(string_value = "jail")]
    Jail,
    #[sea_orm(string_value = "pardon")]
    Pardon,
}

impl std::fmt::Display for PunishmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PunishmentKind::Warn => "Warn",
            PunishmentKind::Timeout => "Timeout",
            PunishmentKind::Mute => "Mute",
            PunishmentKind::Kick => "Kick",
            PunishmentKind::Ban => "Ban",
            PunishmentKind::Softban => "Softban",
            PunishmentKind::Jail => "Jail",
            PunishmentKind::Pardon => "Pardon",
        };
        write!(f, "{name}")
    }
}

/// Append-only punishment history. Rows are never updated or deleted.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Eq)]
#[sea_orm(table_name = "punishments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub guild_id: i64,
    pub user_id: i64,
    pub moderator_id: i64,
    pub action: PunishmentKind,
    pub reason: Option<String>,
    pub created_at: DateTime,
    pub expires_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
