//! Structured "action performed" events handed to the collaborator layer.
//!
//! The sink owns delivery, formatting and fallback; recording is infallible
//! at this boundary.

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};

/// A moderation action performed by a staff member.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub action: String,
    pub executor_id: u64,
    pub target_id: Option<u64>,
    pub reason: Option<String>,
    pub duration_seconds: Option<u64>,
    pub created_at: NaiveDateTime,
}

impl AuditEvent {
    pub fn new(action: impl Into<String>, executor_id: u64) -> Self {
        Self {
            action: action.into(),
            executor_id,
            target_id: None,
            reason: None,
            duration_seconds: None,
            created_at: Utc::now().naive_utc(),
        }
    }

    pub fn target(mut self, target_id: u64) -> Self {
        self.target_id = Some(target_id);
        self
    }

    pub fn reason(mut self, reason: Option<&str>) -> Self {
        self.reason = reason.map(str::to_string);
        self
    }

    pub fn duration_seconds(mut self, seconds: u64) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }
}

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: AuditEvent);
}

/// Fallback sink that writes events to the tracing log.
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, event: AuditEvent) {
        tracing::info!(
            action = %event.action,
            executor = event.executor_id,
            target = ?event.target_id,
            reason = ?event.reason,
            duration_seconds = ?event.duration_seconds,
            "moderation action"
        );
    }
}
