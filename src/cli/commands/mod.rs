pub mod review;
pub mod status;

use std::sync::Arc;

use anyhow::Result;
use sqlx::SqlitePool;

use crate::adapters::sqlite::{initialize_database, SqliteGameRepository, SqliteProfileRepository};
use crate::domain::models::Config;
use crate::domain::ports::{GameRepository, ProfileRepository};

/// Open (and migrate) the configured database.
pub(crate) async fn open_database(config: &Config) -> Result<SqlitePool> {
    let url = format!("sqlite:{}", config.database.path);
    Ok(initialize_database(&url).await?)
}

/// Repository pair over one pool.
pub(crate) fn repositories(
    pool: &SqlitePool,
) -> (Arc<dyn GameRepository>, Arc<dyn ProfileRepository>) {
    (
        Arc::new(SqliteGameRepository::new(pool.clone())),
        Arc::new(SqliteProfileRepository::new(pool.clone())),
    )
}
