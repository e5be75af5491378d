//! Collaborator interface to the chat platform.
//!
//! The core never talks to the gateway directly. Every external mutation goes
//! through [`PlatformClient`], implemented by the bot layer and mocked in
//! tests. Failures here must not corrupt local state; the recording rules for
//! each moderation flow decide whether history is written before or after the
//! platform call.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Failure of a platform-side mutation.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("member {user_id} not found in guild {guild_id}")]
    UnknownMember { guild_id: u64, user_id: u64 },

    #[error("role {0} not found")]
    UnknownRole(u64),

    #[error("channel {0} not found")]
    UnknownChannel(u64),

    #[error("missing permissions: {0}")]
    MissingPermissions(String),

    #[error("platform api error: {0}")]
    Api(String),
}

pub type PlatformResult<T> = Result<T, PlatformError>;

/// Guild/member/role/channel mutation as the core consumes it.
///
/// All operations are fallible external calls; none of them touch the store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlatformClient: Send + Sync {
    async fn add_role<'a>(
        &self,
        guild_id: u64,
        user_id: u64,
        role_id: u64,
        reason: Option<&'a str>,
    ) -> PlatformResult<()>;

    async fn remove_role<'a>(
        &self,
        guild_id: u64,
        user_id: u64,
        role_id: u64,
        reason: Option<&'a str>,
    ) -> PlatformResult<()>;

    async fn member_has_role(
        &self,
        guild_id: u64,
        user_id: u64,
        role_id: u64,
    ) -> PlatformResult<bool>;

    /// Set or clear a member's communication timeout. `None` clears it.
    async fn timeout_member<'a>(
        &self,
        guild_id: u64,
        user_id: u64,
        until: Option<DateTime<Utc>>,
        reason: Option<&'a str>,
    ) -> PlatformResult<()>;

    async fn kick_member<'a>(
        &self,
        guild_id: u64,
        user_id: u64,
        reason: Option<&'a str>,
    ) -> PlatformResult<()>;

    async fn ban_member<'a>(
        &self,
        guild_id: u64,
        user_id: u64,
        delete_message_days: u8,
        reason: Option<&'a str>,
    ) -> PlatformResult<()>;

    async fn unban_member<'a>(
        &self,
        guild_id: u64,
        user_id: u64,
        reason: Option<&'a str>,
    ) -> PlatformResult<()>;

    async fn is_timed_out(&self, guild_id: u64, user_id: u64) -> PlatformResult<bool>;

    async fn is_banned(&self, guild_id: u64, user_id: u64) -> PlatformResult<bool>;

    /// Lock or unlock a text channel for the default role.
    async fn set_channel_locked<'a>(
        &self,
        guild_id: u64,
        channel_id: u64,
        locked: bool,
        reason: Option<&'a str>,
    ) -> PlatformResult<()>;

    async fn send_message(&self, channel_id: u64, content: &str) -> PlatformResult<()>;
}
