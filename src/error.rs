//! Error types shared across the core services.

use thiserror::Error;

use crate::platform::PlatformError;

/// Errors surfaced by the store, scheduler and moderation flows.
///
/// "Row not found" is not an error at the service boundary; lookups return
/// `Ok(None)` instead.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Underlying persistence failure (IO, constraint violation).
    #[error("storage error: {0}")]
    Storage(#[from] sea_orm::DbErr),

    /// No async runtime was available to register a timed action. Callers
    /// must report this instead of claiming the timed reversal was armed.
    #[error("scheduler unavailable: could not register '{identifier}'")]
    SchedulerUnavailable { identifier: String },

    /// A platform-side mutation (role change, timeout, ban) failed.
    #[error("platform action failed: {0}")]
    Platform(#[from] PlatformError),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduler_unavailable_names_the_identifier() {
        let err = CoreError::SchedulerUnavailable {
            identifier: "mute:1:2".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "scheduler unavailable: could not register 'mute:1:2'"
        );
    }
}
