use anyhow::Context;

use crate::cli::{utils, OutputFormat};
use crate::config::{self, StorageBackend};
use crate::database::DatabaseManager;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let config = config::config();
    if config.database.backend == StorageBackend::Memory {
        return utils::output_success(output_format, "In-memory storage needs no migrations", None);
    }

    let pool = DatabaseManager::connect(config)
        .await
        .context("failed to connect to database")?;
    DatabaseManager::migrate(&pool).await.context("migration failed")?;
    pool.close().await;

    utils::output_success(output_format, "Database migrations applied", None)
}
