use std::path::Path;

use migration::Migrator;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

/// Opens a fresh in-memory SQLite database with every migration applied.
///
/// Pinned to one connection: each extra connection would open its own empty
/// in-memory database.
pub async fn setup_test_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1).sqlx_logging(false);

    migrated(options).await
}

/// Opens a migrated SQLite file at `path` behind a pool of `max_connections`,
/// so statements from different tasks really run side by side.
pub async fn setup_pooled_test_db(path: &Path, max_connections: u32) -> DatabaseConnection {
    let mut options = ConnectOptions::new(util::database::database_url(
        &path.to_string_lossy(),
    ));
    options
        .max_connections(max_connections)
        .min_connections(max_connections)
        .sqlx_logging(false);

    migrated(options).await
}

async fn migrated(options: ConnectOptions) -> DatabaseConnection {
    let db = Database::connect(options)
        .await
        .expect("Failed to connect to test db");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}
