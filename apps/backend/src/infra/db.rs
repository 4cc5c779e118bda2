//! Connection setup for the SeaORM-backed store.

use std::time::Duration;

use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use tracing::info;

use crate::config::db::{db_url_for, DbKind, DbOwner, DbProfile};
use crate::error::AppError;

/// Open a pool for `kind`. Does NOT run migrations.
pub async fn connect_db(
    kind: DbKind,
    profile: DbProfile,
    owner: DbOwner,
) -> Result<DatabaseConnection, AppError> {
    let url = db_url_for(kind, profile, owner)?;

    let mut opts = ConnectOptions::new(url);
    opts.connect_timeout(Duration::from_secs(5))
        .acquire_timeout(Duration::from_secs(5))
        .sqlx_logging(false);
    if kind == DbKind::SqliteMemory {
        // every pooled connection would otherwise see its own empty database
        opts.max_connections(1).min_connections(1);
    }

    let conn = Database::connect(opts).await?;
    if matches!(kind, DbKind::SqliteFile | DbKind::SqliteMemory) {
        conn.execute_unprepared("PRAGMA foreign_keys = ON;").await?;
    }

    info!(db_kind = %kind, profile = ?profile, "database connected");
    Ok(conn)
}

/// Connect and bring the schema up to date.
pub async fn bootstrap_db(
    kind: DbKind,
    profile: DbProfile,
    owner: DbOwner,
) -> Result<DatabaseConnection, AppError> {
    let conn = connect_db(kind, profile, owner).await?;
    Migrator::up(&conn, None).await?;
    let version = migration::get_latest_migration_version(&conn).await?;
    info!(db_kind = %kind, migration = ?version, "database migrated");
    Ok(conn)
}
