//! Moderation backend for chat communities: a durable SQLite store for
//! punishments, notes, jail state, tickets, incidents, role mappings and the
//! staff whitelist, plus an in-process scheduler for deferred, cancelable
//! moderation reversals.
//!
//! The gateway/bot layer is a collaborator: it implements
//! [`platform::PlatformClient`] and consumes the services wired together in
//! [`CoreServices`].

pub mod audit;
pub mod db;
pub mod error;
pub mod platform;
pub mod services;

pub use error::{CoreError, CoreResult};

use crate::audit::AuditSink;
use crate::db::migrations::Migrator;
use crate::platform::PlatformClient;
use crate::services::auto_roles::AutoRoleService;
use crate::services::history::HistoryService;
use crate::services::incidents::IncidentService;
use crate::services::moderation::ModerationService;
use crate::services::reaction_roles::ReactionRoleService;
use crate::services::scheduler::Scheduler;
use crate::services::tickets::TicketService;
use crate::services::whitelist::WhitelistService;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use tracing::info;

/// Everything the bot layer needs, wired over one database connection.
pub struct CoreServices {
    pub db: DatabaseConnection,
    pub scheduler: Scheduler,
    pub history: Arc<HistoryService>,
    pub tickets: TicketService,
    pub incidents: IncidentService,
    pub auto_roles: AutoRoleService,
    pub reaction_roles: ReactionRoleService,
    pub whitelist: WhitelistService,
    pub moderation: ModerationService,
}

impl CoreServices {
    /// Connects, runs pending migrations and wires every service.
    ///
    /// Call [`ModerationService::rearm_from_store`] afterwards to restore
    /// timers for jail state persisted by a previous process.
    pub async fn connect(
        database_url: &str,
        platform: Arc<dyn PlatformClient>,
        audit: Arc<dyn AuditSink>,
    ) -> CoreResult<Self> {
        let db = db::establish_connection(database_url).await?;
        Migrator::up(&db, None).await?;
        info!("migrations applied");

        Ok(Self::new(db, platform, audit))
    }

    /// Wires services over an already connected and migrated database.
    pub fn new(
        db: DatabaseConnection,
        platform: Arc<dyn PlatformClient>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        let scheduler = Scheduler::new();
        let history = Arc::new(HistoryService::new(db.clone()));
        let moderation = ModerationService::new(
            Arc::clone(&history),
            scheduler.clone(),
            platform,
            audit,
        );

        Self {
            tickets: TicketService::new(db.clone()),
            incidents: IncidentService::new(db.clone()),
            auto_roles: AutoRoleService::new(db.clone()),
            reaction_roles: ReactionRoleService::new(db.clone()),
            whitelist: WhitelistService::new(db.clone()),
            history,
            moderation,
            scheduler,
            db,
        }
    }
}
