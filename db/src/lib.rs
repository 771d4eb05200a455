pub mod models;
pub mod test_utils;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use util::{config, database};

/// Connects to the database configured by `DATABASE_PATH`.
///
/// A file path gets its parent directory created first; a DSN is handed to the
/// driver as is.
pub async fn connect() -> Result<DatabaseConnection, DbErr> {
    let path_or_url = config::database_path();

    database::ensure_parent_dir(&path_or_url).map_err(|e| {
        DbErr::Custom(format!(
            "cannot create directory for database {path_or_url}: {e}"
        ))
    })?;

    let mut options = ConnectOptions::new(database::database_url(&path_or_url));
    options.sqlx_logging(false);

    tracing::debug!(path = %path_or_url, "connecting to database");
    Database::connect(options).await
}
