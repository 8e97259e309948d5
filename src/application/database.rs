use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, Statement,
};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;

use crate::config::CONFIG;
use crate::error::{AppError, Result};
use crate::migrations::Migrator;

pub type DbConn = DatabaseConnection;

/// Create a new database connection and run migrations using config
pub async fn connect() -> Result<DbConn> {
    connect_with_url(&CONFIG.database.database_url, CONFIG.database.max_connections).await
}

/// Create a new database connection with a specific URL and run migrations
pub async fn connect_with_url(database_url: &str, max_connections: u32) -> Result<DbConn> {
    tracing::info!("Connecting to database...");

    let mut opts = ConnectOptions::new(database_url);
    opts.max_connections(max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .sqlx_logging(false);

    let db = Database::connect(opts)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to connect to database: {}", e)))?;

    ensure_sqlite_foreign_keys(&db).await?;

    tracing::info!("Running database migrations...");
    Migrator::up(&db, None)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to run migrations: {}", e)))?;
    tracing::info!("Database migrations completed");

    Ok(db)
}

/// Turn on and confirm SQLite foreign key enforcement; the schema's cascades
/// and `SET NULL` rules rely on it. sqlx enables it on every new pooled
/// connection, this covers the first one explicitly.
async fn ensure_sqlite_foreign_keys(db: &DbConn) -> Result<()> {
    if db.get_database_backend() != DbBackend::Sqlite {
        return Ok(());
    }

    db.execute_unprepared("PRAGMA foreign_keys = ON").await?;

    let enabled = match db
        .query_one(Statement::from_string(DbBackend::Sqlite, "PRAGMA foreign_keys"))
        .await?
    {
        Some(row) => row.try_get_by_index::<i32>(0)?,
        None => 0,
    };
    if enabled != 1 {
        return Err(AppError::Internal(
            "SQLite foreign key enforcement could not be enabled".to_string(),
        ));
    }

    tracing::debug!("SQLite foreign keys enabled");
    Ok(())
}
