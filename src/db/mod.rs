use sea_orm::{Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

pub mod entities;
pub mod migrations;

/// Connects to the backing SQLite database.
///
/// The pool is capped at a single connection: all physical reads and writes
/// are serialized through it, which is the consistency guarantee ticket-id
/// allocation and the upsert paths rely on. Do not raise the cap without
/// replacing that guarantee.
pub async fn establish_connection(database_url: &str) -> Result<DatabaseConnection, sea_orm::DbErr> {
    let mut opt = sea_orm::ConnectOptions::new(database_url.to_string());
    opt.max_connections(1)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .sqlx_logging(true)
        .sqlx_logging_level(tracing::log::LevelFilter::Debug);

    info!("Connecting to database...");
    let db = Database::connect(opt).await?;
    info!("Database connection established");

    Ok(db)
}

#[cfg(test)]
pub(crate) async fn connect_test_db() -> DatabaseConnection {
    use sea_orm_migration::MigratorTrait;

    let db = establish_connection("sqlite::memory:")
        .await
        .expect("in-memory database");
    migrations::Migrator::up(&db, None)
        .await
        .expect("migrations");
    db
}
