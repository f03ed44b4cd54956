//! 선호 설정 Repository (PostgreSQL)
//!
//! `user_preferences` 테이블을 다룹니다.
//!
//! # 주요 기능
//! - 매칭용 전체 스냅샷 조회
//! - 구독 등록 / 종목별·ID별·사용자별 삭제
//! - 마이그레이션 실행

use std::time::Duration;

use async_trait::async_trait;
use sigbot_core::{
    repository::{decode_valid, instrument_key},
    NewPreference, Preference, PreferenceRecord, PreferenceRepository, StoreError, StoreResult,
};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use tracing::{debug, info};

/// DB 행.
#[derive(Debug, Clone, FromRow)]
struct PreferenceRow {
    id: i64,
    user_id: i64,
    market: String,
    instrument: String,
    style: String,
    timeframe: String,
}

impl From<PreferenceRow> for PreferenceRecord {
    fn from(row: PreferenceRow) -> Self {
        Self {
            id: Some(row.id),
            user_id: row.user_id,
            market: row.market,
            instrument: row.instrument,
            style: row.style,
            timeframe: row.timeframe,
        }
    }
}

/// sqlx 에러를 저장소 에러로 변환합니다.
fn map_sqlx_error(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(e.to_string())
        }
        other => StoreError::Database(other.to_string()),
    }
}

/// PostgreSQL 선호 설정 저장소.
#[derive(Debug, Clone)]
pub struct PgPreferenceRepository {
    pool: PgPool,
}

impl PgPreferenceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 연결 풀을 만들어 저장소를 생성합니다.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        Ok(Self::new(pool))
    }

    /// 내장 마이그레이션을 실행합니다.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("user_preferences 마이그레이션 완료");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl PreferenceRepository for PgPreferenceRepository {
    async fn snapshot(&self) -> StoreResult<Vec<PreferenceRecord>> {
        let rows = sqlx::query_as::<_, PreferenceRow>(
            r#"
            SELECT id, user_id, market, instrument, style, timeframe
            FROM user_preferences
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        debug!(rows = rows.len(), "선호 설정 스냅샷 조회");
        Ok(rows.into_iter().map(PreferenceRecord::from).collect())
    }

    async fn save_preference(&self, preference: NewPreference) -> StoreResult<bool> {
        let record = preference.to_record();

        let result = sqlx::query(
            r#"
            INSERT INTO user_preferences (user_id, market, instrument, style, timeframe)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(record.user_id)
        .bind(&record.market)
        .bind(&record.instrument)
        .bind(&record.style)
        .bind(&record.timeframe)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        debug!(
            user_id = record.user_id,
            instrument = %record.instrument,
            style = %record.style,
            "선호 설정 저장"
        );
        Ok(result.rows_affected() > 0)
    }

    async fn delete_preference(&self, user_id: i64, instrument: &str) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM user_preferences
            WHERE user_id = $1 AND UPPER(TRIM(instrument)) = $2
            "#,
        )
        .bind(user_id)
        .bind(instrument_key(instrument))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_preference_by_id(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM user_preferences WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_all_preferences(&self, user_id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM user_preferences WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        debug!(user_id, removed = result.rows_affected(), "사용자 선호 설정 전체 삭제");
        Ok(result.rows_affected() > 0)
    }

    async fn list_for_user(&self, user_id: i64) -> StoreResult<Vec<Preference>> {
        let rows = sqlx::query_as::<_, PreferenceRow>(
            r#"
            SELECT id, user_id, market, instrument, style, timeframe
            FROM user_preferences
            WHERE user_id = $1
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(decode_valid(
            rows.into_iter().map(PreferenceRecord::from).collect(),
        ))
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
