//! 마이그레이션 적용.
//!
//! ```bash
//! sigbot migrate --db-url "postgres://..."
//! ```

use anyhow::{Context, Result};
use sigbot_api::{mask_database_url, repository::PgPreferenceRepository};
use tracing::info;

/// 내장 마이그레이션을 적용합니다.
pub async fn apply_migrations(db_url: &str) -> Result<()> {
    info!(url = %mask_database_url(db_url), "마이그레이션 적용 시작");

    let repository = PgPreferenceRepository::connect(db_url, 1)
        .await
        .context("failed to connect to database")?;
    repository
        .migrate()
        .await
        .context("failed to apply migrations")?;

    Ok(())
}
