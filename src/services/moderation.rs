//! End-to-end moderation flows: durable record first-class, platform
//! mutation through the collaborator trait, timed reversals through the
//! scheduler.
//!
//! Recording order follows the action's nature: destructive actions
//! (kick/ban/softban) attempt the platform effect first so a failure
//! short-circuits before history is written; mute/timeout/jail record after
//! the platform call succeeds; warn records unconditionally because the
//! record itself is the primary value. Reversal callbacks re-read current
//! state before mutating anything, since it may have changed since
//! scheduling (pardon, re-mute, manual removal).

use crate::audit::{AuditEvent, AuditSink};
use crate::db::entities::punishments::PunishmentKind;
use crate::db::entities::{notes, punishments};
use crate::error::CoreResult;
use crate::platform::PlatformClient;
use crate::services::history::{HistoryService, NewJail, NewNote, NewPunishment};
use crate::services::scheduler::Scheduler;
use chrono::{NaiveDateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Minimum delay callers hand to the scheduler for timed reversals.
const MIN_DELAY: Duration = Duration::from_secs(1);

fn mute_identifier(guild_id: u64, user_id: u64) -> String {
    format!("mute:{guild_id}:{user_id}")
}

fn timeout_identifier(user_id: u64) -> String {
    format!("timeout:{user_id}")
}

fn jail_identifier(guild_id: u64, user_id: u64) -> String {
    format!("jail:{guild_id}:{user_id}")
}

fn lock_identifier(guild_id: u64, channel_id: u64) -> String {
    format!("lock:{guild_id}:{channel_id}")
}

fn expiry_after(delay: Duration) -> NaiveDateTime {
    Utc::now().naive_utc() + chrono::Duration::from_std(delay).unwrap_or(chrono::Duration::zero())
}

pub struct ModerationService {
    history: Arc<HistoryService>,
    scheduler: Scheduler,
    platform: Arc<dyn PlatformClient>,
    audit: Arc<dyn AuditSink>,
}

impl ModerationService {
    pub fn new(
        history: Arc<HistoryService>,
        scheduler: Scheduler,
        platform: Arc<dyn PlatformClient>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            history,
            scheduler,
            platform,
            audit,
        }
    }

    /// Applies the mute role, records the punishment, and for timed mutes
    /// arms a reversal under `mute:<guild>:<user>`. Re-muting replaces any
    /// pending reversal.
    pub async fn mute(
        &self,
        guild_id: u64,
        user_id: u64,
        moderator_id: u64,
        mute_role_id: u64,
        duration: Option<Duration>,
        reason: Option<&str>,
    ) -> CoreResult<punishments::Model> {
        self.platform
            .add_role(guild_id, user_id, mute_role_id, reason)
            .await?;

        let record = self
            .history
            .add_punishment(
                guild_id,
                NewPunishment {
                    user_id,
                    moderator_id,
                    kind: PunishmentKind::Mute,
                    reason: reason.map(str::to_string),
                    expires_at: duration.map(expiry_after),
                },
            )
            .await?;

        if let Some(delay) = duration {
            let platform = Arc::clone(&self.platform);
            self.scheduler.schedule(
                mute_identifier(guild_id, user_id),
                delay.max(MIN_DELAY),
                async move {
                    // The role may already be gone (manual unmute, pardon)
                    if platform
                        .member_has_role(guild_id, user_id, mute_role_id)
                        .await?
                    {
                        platform
                            .remove_role(guild_id, user_id, mute_role_id, Some("Mute expired"))
                            .await?;
                    }
                    Ok(())
                },
            )?;
        }

        let mut event = AuditEvent::new("Mute", moderator_id)
            .target(user_id)
            .reason(reason);
        if let Some(delay) = duration {
            event = event.duration_seconds(delay.as_secs());
        }
        self.audit.record(event).await;

        Ok(record)
    }

    /// Cancels any pending mute reversal and removes the role if present.
    pub async fn unmute(
        &self,
        guild_id: u64,
        user_id: u64,
        moderator_id: u64,
        mute_role_id: u64,
        reason: Option<&str>,
    ) -> CoreResult<()> {
        self.scheduler.cancel(&mute_identifier(guild_id, user_id));

        if self
            .platform
            .member_has_role(guild_id, user_id, mute_role_id)
            .await?
        {
            self.platform
                .remove_role(guild_id, user_id, mute_role_id, reason)
                .await?;
        }

        self.audit
            .record(
                AuditEvent::new("Unmute", moderator_id)
                    .target(user_id)
                    .reason(reason),
            )
            .await;

        Ok(())
    }

    /// Times the member out on the platform and arms a clearing reversal
    /// under `timeout:<user>`.
    pub async fn timeout(
        &self,
        guild_id: u64,
        user_id: u64,
        moderator_id: u64,
        duration: Duration,
        reason: Option<&str>,
    ) -> CoreResult<punishments::Model> {
        let until = Utc::now() + chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::zero());
        self.platform
            .timeout_member(guild_id, user_id, Some(until), reason)
            .await?;

        let record = self
            .history
            .add_punishment(
                guild_id,
                NewPunishment {
                    user_id,
                    moderator_id,
                    kind: PunishmentKind::Timeout,
                    reason: reason.map(str::to_string),
                    expires_at: Some(expiry_after(duration)),
                },
            )
            .await?;

        let platform = Arc::clone(&self.platform);
        self.scheduler.schedule(
            timeout_identifier(user_id),
            duration.max(MIN_DELAY),
            async move {
                platform
                    .timeout_member(guild_id, user_id, None, Some("Timeout expired"))
                    .await?;
                Ok(())
            },
        )?;

        self.audit
            .record(
                AuditEvent::new("Timeout", moderator_id)
                    .target(user_id)
                    .reason(reason)
                    .duration_seconds(duration.as_secs()),
            )
            .await;

        Ok(record)
    }

    /// Warn only writes history; there is no platform effect to fail.
    pub async fn warn(
        &self,
        guild_id: u64,
        user_id: u64,
        moderator_id: u64,
        reason: Option<&str>,
    ) -> CoreResult<punishments::Model> {
        let record = self
            .history
            .add_punishment(
                guild_id,
                NewPunishment {
                    user_id,
                    moderator_id,
                    kind: PunishmentKind::Warn,
                    reason: reason.map(str::to_string),
                    expires_at: None,
                },
            )
            .await?;

        self.audit
            .record(
                AuditEvent::new("Warn", moderator_id)
                    .target(user_id)
                    .reason(reason),
            )
            .await;

        Ok(record)
    }

    /// Notes record unconditionally, like warns.
    pub async fn note(
        &self,
        guild_id: u64,
        user_id: u64,
        moderator_id: u64,
        text: &str,
    ) -> CoreResult<notes::Model> {
        let record = self
            .history
            .add_note(
                guild_id,
                NewNote {
                    user_id,
                    moderator_id,
                    text: text.to_string(),
                },
            )
            .await?;

        self.audit
            .record(
                AuditEvent::new("Note", moderator_id)
                    .target(user_id)
                    .reason(Some(text)),
            )
            .await;

        Ok(record)
    }

    pub async fn kick(
        &self,
        guild_id: u64,
        user_id: u64,
        moderator_id: u64,
        reason: Option<&str>,
    ) -> CoreResult<punishments::Model> {
        self.platform.kick_member(guild_id, user_id, reason).await?;

        let record = self
            .history
            .add_punishment(
                guild_id,
                NewPunishment {
                    user_id,
                    moderator_id,
                    kind: PunishmentKind::Kick,
                    reason: reason.map(str::to_string),
                    expires_at: None,
                },
            )
            .await?;

        self.audit
            .record(
                AuditEvent::new("Kick", moderator_id)
                    .target(user_id)
                    .reason(reason),
            )
            .await;

        Ok(record)
    }

    pub async fn ban(
        &self,
        guild_id: u64,
        user_id: u64,
        moderator_id: u64,
        delete_message_days: u8,
        reason: Option<&str>,
    ) -> CoreResult<punishments::Model> {
        self.platform
            .ban_member(guild_id, user_id, delete_message_days, reason)
            .await?;

        let record = self
            .history
            .add_punishment(
                guild_id,
                NewPunishment {
                    user_id,
                    moderator_id,
                    kind: PunishmentKind::Ban,
                    reason: reason.map(str::to_string),
                    expires_at: None,
                },
            )
            .await?;

        self.audit
            .record(
                AuditEvent::new("Ban", moderator_id)
                    .target(user_id)
                    .reason(reason),
            )
            .await;

        Ok(record)
    }

    /// Ban with message pruning followed by an immediate unban.
    pub async fn softban(
        &self,
        guild_id: u64,
        user_id: u64,
        moderator_id: u64,
        reason: Option<&str>,
    ) -> CoreResult<punishments::Model> {
        self.platform
            .ban_member(guild_id, user_id, 1, reason)
            .await?;
        self.platform
            .unban_member(guild_id, user_id, Some("Softban release"))
            .await?;

        let record = self
            .history
            .add_punishment(
                guild_id,
                NewPunishment {
                    user_id,
                    moderator_id,
                    kind: PunishmentKind::Softban,
                    reason: reason.map(str::to_string),
                    expires_at: None,
                },
            )
            .await?;

        self.audit
            .record(
                AuditEvent::new("Softban", moderator_id)
                    .target(user_id)
                    .reason(reason),
            )
            .await;

        Ok(record)
    }

    /// Applies the jail role, upserts jail state (re-jailing overwrites and
    /// replaces any pending expiry), records the punishment, and for timed
    /// jails arms an expiry under `jail:<guild>:<user>`.
    pub async fn jail(
        &self,
        guild_id: u64,
        user_id: u64,
        moderator_id: u64,
        jail_role_id: u64,
        duration: Option<Duration>,
        reason: Option<&str>,
    ) -> CoreResult<punishments::Model> {
        self.platform
            .add_role(guild_id, user_id, jail_role_id, reason)
            .await?;

        // One expiry instant shared by the jail row and the punishment row
        let expires_at = duration.map(expiry_after);

        self.history
            .set_jail(NewJail {
                guild_id,
                user_id,
                role_id: jail_role_id,
                reason: reason.map(str::to_string),
                expires_at,
            })
            .await?;

        let record = self
            .history
            .add_punishment(
                guild_id,
                NewPunishment {
                    user_id,
                    moderator_id,
                    kind: PunishmentKind::Jail,
                    reason: reason.map(str::to_string),
                    expires_at,
                },
            )
            .await?;

        if let Some(delay) = duration {
            self.schedule_jail_expiry(guild_id, user_id, delay.max(MIN_DELAY))?;
        }

        let mut event = AuditEvent::new("Jail", moderator_id)
            .target(user_id)
            .reason(reason);
        if let Some(delay) = duration {
            event = event.duration_seconds(delay.as_secs());
        }
        self.audit.record(event).await;

        Ok(record)
    }

    fn schedule_jail_expiry(
        &self,
        guild_id: u64,
        user_id: u64,
        delay: Duration,
    ) -> CoreResult<()> {
        let history = Arc::clone(&self.history);
        let platform = Arc::clone(&self.platform);
        self.scheduler.schedule(
            jail_identifier(guild_id, user_id),
            delay,
            async move {
                // The stored row is the source of truth; it may have been
                // cleared or replaced since this timer was armed
                let Some(previous) = history.clear_jail(guild_id, user_id).await? else {
                    return Ok(());
                };
                let role_id = previous.role_id as u64;
                if platform.member_has_role(guild_id, user_id, role_id).await? {
                    platform
                        .remove_role(guild_id, user_id, role_id, Some("Jail expired"))
                        .await?;
                }
                Ok(())
            },
        )
    }

    /// Clears every active sanction for the user: jail state (reversing the
    /// stored role grant), the mute role if present, any platform timeout,
    /// and an active ban. Records one Pardon entry naming what was cleared;
    /// nothing is recorded when nothing was active. Returns the cleared
    /// sanction names.
    pub async fn pardon(
        &self,
        guild_id: u64,
        user_id: u64,
        moderator_id: u64,
        mute_role_id: Option<u64>,
        reason: Option<&str>,
    ) -> CoreResult<Vec<&'static str>> {
        let mut cleared = Vec::new();

        if let Some(previous) = self.history.clear_jail(guild_id, user_id).await? {
            self.scheduler.cancel(&jail_identifier(guild_id, user_id));
            let role_id = previous.role_id as u64;
            // Role removal is attempted but jail clearing stands regardless
            if let Ok(true) = self.platform.member_has_role(guild_id, user_id, role_id).await {
                let _ = self
                    .platform
                    .remove_role(guild_id, user_id, role_id, reason)
                    .await;
            }
            cleared.push("jail");
        }

        if let Some(mute_role_id) = mute_role_id {
            if let Ok(true) = self
                .platform
                .member_has_role(guild_id, user_id, mute_role_id)
                .await
            {
                if self
                    .platform
                    .remove_role(guild_id, user_id, mute_role_id, reason)
                    .await
                    .is_ok()
                {
                    self.scheduler.cancel(&mute_identifier(guild_id, user_id));
                    cleared.push("mute");
                }
            }
        }

        if let Ok(true) = self.platform.is_timed_out(guild_id, user_id).await {
            if self
                .platform
                .timeout_member(guild_id, user_id, None, reason)
                .await
                .is_ok()
            {
                self.scheduler.cancel(&timeout_identifier(user_id));
                cleared.push("timeout");
            }
        }

        if let Ok(true) = self.platform.is_banned(guild_id, user_id).await {
            if self
                .platform
                .unban_member(guild_id, user_id, reason)
                .await
                .is_ok()
            {
                cleared.push("ban");
            }
        }

        if cleared.is_empty() {
            return Ok(cleared);
        }

        let recorded_reason = reason
            .map(str::to_string)
            .unwrap_or_else(|| format!("Cleared: {}", cleared.join(", ")));
        self.history
            .add_punishment(
                guild_id,
                NewPunishment {
                    user_id,
                    moderator_id,
                    kind: PunishmentKind::Pardon,
                    reason: Some(recorded_reason),
                    expires_at: None,
                },
            )
            .await?;

        self.audit
            .record(
                AuditEvent::new("Pardon", moderator_id)
                    .target(user_id)
                    .reason(reason),
            )
            .await;

        Ok(cleared)
    }

    /// Locks a channel, optionally arming an unlock under
    /// `lock:<guild>:<channel>`.
    pub async fn lock_channel(
        &self,
        guild_id: u64,
        channel_id: u64,
        moderator_id: u64,
        duration: Option<Duration>,
        reason: Option<&str>,
    ) -> CoreResult<()> {
        self.platform
            .set_channel_locked(guild_id, channel_id, true, reason)
            .await?;

        if let Some(delay) = duration {
            let platform = Arc::clone(&self.platform);
            self.scheduler.schedule(
                lock_identifier(guild_id, channel_id),
                delay.max(MIN_DELAY),
                async move {
                    platform
                        .set_channel_locked(guild_id, channel_id, false, Some("Timed lock expired"))
                        .await?;
                    Ok(())
                },
            )?;
        }

        let mut event = AuditEvent::new("Lock", moderator_id).reason(reason);
        if let Some(delay) = duration {
            event = event.duration_seconds(delay.as_secs());
        }
        self.audit.record(event).await;

        Ok(())
    }

    pub async fn unlock_channel(
        &self,
        guild_id: u64,
        channel_id: u64,
        moderator_id: u64,
        reason: Option<&str>,
    ) -> CoreResult<()> {
        self.scheduler.cancel(&lock_identifier(guild_id, channel_id));
        self.platform
            .set_channel_locked(guild_id, channel_id, false, reason)
            .await?;

        self.audit
            .record(AuditEvent::new("Unlock", moderator_id).reason(reason))
            .await;

        Ok(())
    }

    /// Defers a message send. Announcement identifiers carry a timestamp
    /// suffix so they are never superseded by a later announcement to the
    /// same channel. Returns the identifier for cancellation.
    pub fn schedule_announcement(
        &self,
        guild_id: u64,
        channel_id: u64,
        delay: Duration,
        content: &str,
    ) -> CoreResult<String> {
        let identifier = format!(
            "announce:{guild_id}:{channel_id}:{}",
            Utc::now().timestamp()
        );
        let platform = Arc::clone(&self.platform);
        let content = content.to_string();

        self.scheduler.schedule(
            identifier.clone(),
            delay.max(MIN_DELAY),
            async move {
                platform.send_message(channel_id, &content).await?;
                Ok(())
            },
        )?;

        Ok(identifier)
    }

    /// Startup reconciliation: re-arms an expiry timer for every persisted
    /// jail that carries one. Past-due jails fire effectively immediately.
    /// Mute/timeout punishment rows are deliberately not re-armed: a
    /// punishment row does not record which role implemented the mute, and
    /// platform timeouts lapse on the platform side regardless.
    pub async fn rearm_from_store(&self) -> CoreResult<usize> {
        let now = Utc::now().naive_utc();
        let mut armed = 0;

        for jail in self.history.jails_with_expiry().await? {
            let Some(expires_at) = jail.expires_at else {
                continue;
            };
            let delay = (expires_at - now).to_std().unwrap_or(Duration::ZERO);
            self.schedule_jail_expiry(jail.guild_id as u64, jail.user_id as u64, delay)?;
            armed += 1;
        }

        if armed > 0 {
            info!(count = armed, "re-armed persisted jail expiries");
        }
        Ok(armed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_test_db;
    use crate::platform::MockPlatformClient;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::time::sleep;

    struct RecordingSink {
        events: Mutex<Vec<AuditEvent>>,
    }

    impl RecordingSink {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                events: Mutex::new(Vec::new()),
            })
        }

        fn actions(&self) -> Vec<String> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .map(|e| e.action.clone())
                .collect()
        }
    }

    #[async_trait]
    impl AuditSink for RecordingSink {
        async fn record(&self, event: AuditEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    async fn service_with(
        platform: MockPlatformClient,
    ) -> (ModerationService, Arc<HistoryService>, Scheduler, Arc<RecordingSink>) {
        let db = connect_test_db().await;
        let history = Arc::new(HistoryService::new(db));
        let scheduler = Scheduler::new();
        let sink = RecordingSink::new();
        let service = ModerationService::new(
            Arc::clone(&history),
            scheduler.clone(),
            Arc::new(platform),
            sink.clone(),
        );
        (service, history, scheduler, sink)
    }

    #[tokio::test]
    async fn timed_mute_records_and_fires_an_idempotent_reversal() {
        let mut platform = MockPlatformClient::new();
        platform
            .expect_add_role()
            .times(1)
            .returning(|_, _, _, _| Ok(()));
        platform
            .expect_member_has_role()
            .times(1)
            .returning(|_, _, _| Ok(true));
        platform
            .expect_remove_role()
            .times(1)
            .withf(|_, _, _, reason| *reason == Some("Mute expired"))
            .returning(|_, _, _, _| Ok(()));

        let (service, history, scheduler, sink) = service_with(platform).await;

        let record = service
            .mute(1, 10, 7, 555, Some(Duration::from_secs(1)), Some("spam"))
            .await
            .unwrap();
        assert_eq!(record.action, PunishmentKind::Mute);
        assert_eq!(record.reason.as_deref(), Some("spam"));
        let expires = record.expires_at.unwrap();
        assert!(expires > record.created_at);

        assert!(scheduler.is_pending("mute:1:10"));
        sleep(Duration::from_millis(1300)).await;
        assert!(!scheduler.is_pending("mute:1:10"));

        let punishments = history.get_punishments_for_user(1, 10).await.unwrap();
        assert_eq!(punishments.len(), 1);
        assert_eq!(sink.actions(), vec!["Mute".to_string()]);
    }

    #[tokio::test]
    async fn mute_reversal_skips_removal_when_the_role_is_already_gone() {
        let mut platform = MockPlatformClient::new();
        platform
            .expect_add_role()
            .times(1)
            .returning(|_, _, _, _| Ok(()));
        platform
            .expect_member_has_role()
            .times(1)
            .returning(|_, _, _| Ok(false));
        platform.expect_remove_role().never();

        let (service, _history, scheduler, _sink) = service_with(platform).await;

        service
            .mute(1, 10, 7, 555, Some(Duration::from_secs(1)), None)
            .await
            .unwrap();
        sleep(Duration::from_millis(1300)).await;
        assert!(!scheduler.is_pending("mute:1:10"));
    }

    #[tokio::test]
    async fn unmute_cancels_the_pending_reversal() {
        let mut platform = MockPlatformClient::new();
        platform
            .expect_add_role()
            .times(1)
            .returning(|_, _, _, _| Ok(()));
        platform
            .expect_member_has_role()
            .times(1)
            .returning(|_, _, _| Ok(true));
        platform
            .expect_remove_role()
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        let (service, _history, scheduler, _sink) = service_with(platform).await;

        service
            .mute(1, 10, 7, 555, Some(Duration::from_secs(60)), None)
            .await
            .unwrap();
        assert!(scheduler.is_pending("mute:1:10"));

        service.unmute(1, 10, 7, 555, Some("appeal")).await.unwrap();
        assert!(!scheduler.is_pending("mute:1:10"));
    }

    #[tokio::test]
    async fn timeout_arms_a_clearing_reversal() {
        let mut platform = MockPlatformClient::new();
        platform
            .expect_timeout_member()
            .times(1)
            .withf(|_, _, until, _| until.is_some())
            .returning(|_, _, _, _| Ok(()));
        platform
            .expect_timeout_member()
            .times(1)
            .withf(|_, _, until, _| until.is_none())
            .returning(|_, _, _, _| Ok(()));

        let (service, history, scheduler, _sink) = service_with(platform).await;

        let record = service
            .timeout(1, 10, 7, Duration::from_secs(1), Some("flood"))
            .await
            .unwrap();
        assert_eq!(record.action, PunishmentKind::Timeout);
        assert!(record.expires_at.is_some());
        assert!(scheduler.is_pending("timeout:10"));

        sleep(Duration::from_millis(1300)).await;
        assert!(!scheduler.is_pending("timeout:10"));

        let punishments = history.get_punishments_for_user(1, 10).await.unwrap();
        assert_eq!(punishments.len(), 1);
    }

    #[tokio::test]
    async fn failed_ban_writes_no_history() {
        let mut platform = MockPlatformClient::new();
        platform.expect_ban_member().times(1).returning(|_, _, _, _| {
            Err(crate::platform::PlatformError::MissingPermissions(
                "ban_members".to_string(),
            ))
        });

        let (service, history, _scheduler, sink) = service_with(platform).await;

        let result = service.ban(1, 10, 7, 0, Some("raid")).await;
        assert!(result.is_err());
        assert!(history.get_punishments(1).await.unwrap().is_empty());
        assert!(sink.actions().is_empty());
    }

    #[tokio::test]
    async fn warn_records_without_any_platform_call() {
        let platform = MockPlatformClient::new();
        let (service, history, _scheduler, _sink) = service_with(platform).await;

        let record = service.warn(1, 10, 7, Some("language")).await.unwrap();
        assert_eq!(record.action, PunishmentKind::Warn);
        assert_eq!(history.get_punishments(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn note_records_and_emits_an_audit_event() {
        let platform = MockPlatformClient::new();
        let (service, history, _scheduler, sink) = service_with(platform).await;

        let record = service.note(1, 10, 7, "prefers appeals via DM").await.unwrap();
        assert_eq!(record.text, "prefers appeals via DM");

        let notes = history.get_notes_for_user(1, 10).await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(sink.actions(), vec!["Note".to_string()]);
    }

    #[tokio::test]
    async fn softban_bans_then_releases() {
        let mut platform = MockPlatformClient::new();
        platform
            .expect_ban_member()
            .times(1)
            .withf(|_, _, days, _| *days == 1)
            .returning(|_, _, _, _| Ok(()));
        platform
            .expect_unban_member()
            .times(1)
            .returning(|_, _, _| Ok(()));

        let (service, history, _scheduler, _sink) = service_with(platform).await;

        let record = service.softban(1, 10, 7, Some("spam links")).await.unwrap();
        assert_eq!(record.action, PunishmentKind::Softban);
        assert_eq!(history.get_punishments(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn jail_then_pardon_round_trips_the_stored_role() {
        let mut platform = MockPlatformClient::new();
        platform
            .expect_add_role()
            .times(1)
            .returning(|_, _, _, _| Ok(()));
        platform
            .expect_member_has_role()
            .times(1)
            .withf(|_, _, role| *role == 555)
            .returning(|_, _, _| Ok(true));
        platform
            .expect_remove_role()
            .times(1)
            .withf(|_, _, role, _| *role == 555)
            .returning(|_, _, _, _| Ok(()));
        platform
            .expect_is_timed_out()
            .times(1)
            .returning(|_, _| Ok(false));
        platform
            .expect_is_banned()
            .times(1)
            .returning(|_, _| Ok(false));

        let (service, history, _scheduler, sink) = service_with(platform).await;

        service
            .jail(1, 10, 7, 555, None, Some("investigation"))
            .await
            .unwrap();

        let state = history.get_jail(1, 10).await.unwrap().unwrap();
        assert_eq!(state.role_id, 555);
        assert_eq!(state.reason.as_deref(), Some("investigation"));

        let cleared = service.pardon(1, 10, 7, None, None).await.unwrap();
        assert_eq!(cleared, vec!["jail"]);
        assert!(history.get_jail(1, 10).await.unwrap().is_none());

        let kinds: Vec<_> = history
            .get_punishments_for_user(1, 10)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.action)
            .collect();
        assert_eq!(kinds, vec![PunishmentKind::Jail, PunishmentKind::Pardon]);
        assert_eq!(sink.actions(), vec!["Jail".to_string(), "Pardon".to_string()]);
    }

    #[tokio::test]
    async fn timed_jail_stores_one_expiry_instant() {
        let mut platform = MockPlatformClient::new();
        platform
            .expect_add_role()
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        let (service, history, scheduler, _sink) = service_with(platform).await;

        let record = service
            .jail(1, 10, 7, 555, Some(Duration::from_secs(3600)), None)
            .await
            .unwrap();
        let state = history.get_jail(1, 10).await.unwrap().unwrap();
        assert_eq!(state.expires_at, record.expires_at);
        assert!(state.expires_at.is_some());

        scheduler.cancel("jail:1:10");
    }

    #[tokio::test]
    async fn pardon_with_nothing_active_records_nothing() {
        let mut platform = MockPlatformClient::new();
        platform
            .expect_is_timed_out()
            .times(1)
            .returning(|_, _| Ok(false));
        platform
            .expect_is_banned()
            .times(1)
            .returning(|_, _| Ok(false));

        let (service, history, _scheduler, _sink) = service_with(platform).await;

        let cleared = service.pardon(1, 10, 7, None, None).await.unwrap();
        assert!(cleared.is_empty());
        assert!(history.get_punishments(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn timed_lock_unlocks_itself() {
        let mut platform = MockPlatformClient::new();
        platform
            .expect_set_channel_locked()
            .times(1)
            .withf(|_, _, locked, _| *locked)
            .returning(|_, _, _, _| Ok(()));
        platform
            .expect_set_channel_locked()
            .times(1)
            .withf(|_, _, locked, _| !*locked)
            .returning(|_, _, _, _| Ok(()));

        let (service, _history, scheduler, _sink) = service_with(platform).await;

        service
            .lock_channel(1, 9000, 7, Some(Duration::from_secs(1)), Some("raid"))
            .await
            .unwrap();
        assert!(scheduler.is_pending("lock:1:9000"));

        sleep(Duration::from_millis(1300)).await;
        assert!(!scheduler.is_pending("lock:1:9000"));
    }

    #[tokio::test]
    async fn announcements_send_after_the_delay() {
        let mut platform = MockPlatformClient::new();
        platform
            .expect_send_message()
            .times(1)
            .withf(|channel, content| *channel == 9000 && content == "movie night!")
            .returning(|_, _| Ok(()));

        let (service, _history, scheduler, _sink) = service_with(platform).await;

        let identifier = service
            .schedule_announcement(1, 9000, Duration::from_secs(1), "movie night!")
            .unwrap();
        assert!(identifier.starts_with("announce:1:9000:"));
        assert!(scheduler.is_pending(&identifier));

        sleep(Duration::from_millis(1300)).await;
        assert!(!scheduler.is_pending(&identifier));
    }

    #[tokio::test]
    async fn rearm_restores_timers_for_persisted_jails() {
        let mut platform = MockPlatformClient::new();
        platform
            .expect_member_has_role()
            .times(1)
            .returning(|_, _, _| Ok(true));
        platform
            .expect_remove_role()
            .times(1)
            .withf(|_, _, _, reason| *reason == Some("Jail expired"))
            .returning(|_, _, _, _| Ok(()));

        let (service, history, _scheduler, _sink) = service_with(platform).await;

        // Simulate state left behind by a previous process: already past due
        history
            .set_jail(NewJail {
                guild_id: 1,
                user_id: 10,
                role_id: 555,
                reason: None,
                expires_at: Some(Utc::now().naive_utc() - chrono::Duration::minutes(5)),
            })
            .await
            .unwrap();
        // Permanent jail must not be re-armed
        history
            .set_jail(NewJail {
                guild_id: 1,
                user_id: 11,
                role_id: 555,
                reason: None,
                expires_at: None,
            })
            .await
            .unwrap();

        let armed = service.rearm_from_store().await.unwrap();
        assert_eq!(armed, 1);

        sleep(Duration::from_millis(300)).await;
        assert!(history.get_jail(1, 10).await.unwrap().is_none());
        assert!(history.get_jail(1, 11).await.unwrap().is_some());
    }
}
