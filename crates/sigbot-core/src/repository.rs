//! 선호 설정 저장소 포트.
//!
//! 매처는 [`PreferenceRepository::snapshot`]으로 전체 스냅샷만 읽습니다.
//! 등록/삭제는 구독 관리 경로에서만 사용합니다.
//!
//! 구현체:
//! - [`InMemoryPreferenceRepository`]: DB 없이 실행할 때와 테스트용
//! - `PgPreferenceRepository` (sigbot-api): PostgreSQL

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::domain::{DomainError, NewPreference, Preference, PreferenceRecord};

/// 저장소 에러.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// 쿼리 실행 실패
    #[error("database error: {0}")]
    Database(String),

    /// 저장소에 연결할 수 없음
    #[error("preference store unavailable: {0}")]
    Unavailable(String),

    /// 저장된 행 검증 실패
    #[error(transparent)]
    InvalidRecord(#[from] DomainError),
}

/// 저장소 결과 타입.
pub type StoreResult<T> = Result<T, StoreError>;

/// 선호 설정 저장소.
#[async_trait]
pub trait PreferenceRepository: Send + Sync {
    /// 전체 선호 설정 스냅샷 (저장된 그대로).
    async fn snapshot(&self) -> StoreResult<Vec<PreferenceRecord>>;

    /// 선호 설정 저장. 행이 기록되면 `true`.
    async fn save_preference(&self, preference: NewPreference) -> StoreResult<bool>;

    /// 사용자의 특정 종목 선호 설정 삭제. 삭제된 행이 있으면 `true`.
    async fn delete_preference(&self, user_id: i64, instrument: &str) -> StoreResult<bool>;

    /// ID로 선호 설정 삭제.
    async fn delete_preference_by_id(&self, id: i64) -> StoreResult<bool>;

    /// 사용자의 모든 선호 설정 삭제.
    async fn delete_all_preferences(&self, user_id: i64) -> StoreResult<bool>;

    /// 사용자의 선호 설정 목록 (검증 실패 행 제외).
    async fn list_for_user(&self, user_id: i64) -> StoreResult<Vec<Preference>>;

    /// 저장소 종류 이름 (헬스 체크용).
    fn backend(&self) -> &'static str;
}

/// 종목 비교용 키. 등록 시 대문자로 저장하므로 삭제도 같은 규칙을 따른다.
pub fn instrument_key(instrument: &str) -> String {
    instrument.trim().to_uppercase()
}

/// 검증 실패 행을 경고 후 제외하고 변환합니다.
pub fn decode_valid(records: Vec<PreferenceRecord>) -> Vec<Preference> {
    records
        .into_iter()
        .filter_map(|record| match Preference::try_from(&record) {
            Ok(pref) => Some(pref),
            Err(e) => {
                warn!(user_id = record.user_id, id = ?record.id, error = %e, "잘못된 선호 설정 행 제외");
                None
            }
        })
        .collect()
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: i64,
    rows: Vec<PreferenceRecord>,
}

/// 메모리 기반 저장소.
#[derive(Debug, Default)]
pub struct InMemoryPreferenceRepository {
    state: RwLock<MemoryState>,
}

impl InMemoryPreferenceRepository {
    /// 빈 저장소 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// 주어진 행으로 초기화합니다. 검증하지 않고 그대로 보관합니다.
    pub fn with_records(records: Vec<PreferenceRecord>) -> Self {
        let next_id = records.iter().filter_map(|r| r.id).max().unwrap_or(0);
        Self {
            state: RwLock::new(MemoryState {
                next_id,
                rows: records,
            }),
        }
    }

    /// 저장된 행 수.
    pub async fn len(&self) -> usize {
        self.state.read().await.rows.len()
    }

    /// 비어 있는지 여부.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.rows.is_empty()
    }

    async fn remove_where<F>(&self, predicate: F) -> usize
    where
        F: Fn(&PreferenceRecord) -> bool + Send,
    {
        let mut state = self.state.write().await;
        let before = state.rows.len();
        state.rows.retain(|row| !predicate(row));
        before - state.rows.len()
    }
}

#[async_trait]
impl PreferenceRepository for InMemoryPreferenceRepository {
    async fn snapshot(&self) -> StoreResult<Vec<PreferenceRecord>> {
        Ok(self.state.read().await.rows.clone())
    }

    async fn save_preference(&self, preference: NewPreference) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        state.next_id += 1;

        let mut record = preference.to_record();
        record.id = Some(state.next_id);
        debug!(id = state.next_id, user_id = record.user_id, instrument = %record.instrument, "선호 설정 저장");
        state.rows.push(record);

        Ok(true)
    }

    async fn delete_preference(&self, user_id: i64, instrument: &str) -> StoreResult<bool> {
        let key = instrument_key(instrument);
        let removed = self
            .remove_where(|row| row.user_id == user_id && instrument_key(&row.instrument) == key)
            .await;
        Ok(removed > 0)
    }

    async fn delete_preference_by_id(&self, id: i64) -> StoreResult<bool> {
        let removed = self.remove_where(|row| row.id == Some(id)).await;
        Ok(removed > 0)
    }

    async fn delete_all_preferences(&self, user_id: i64) -> StoreResult<bool> {
        let removed = self.remove_where(|row| row.user_id == user_id).await;
        Ok(removed > 0)
    }

    async fn list_for_user(&self, user_id: i64) -> StoreResult<Vec<Preference>> {
        let rows: Vec<PreferenceRecord> = self
            .state
            .read()
            .await
            .rows
            .iter()
            .filter(|row| row.user_id == user_id)
            .cloned()
            .collect();

        Ok(decode_valid(rows))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MarketKind, Timeframe, TradingStyle};

    #[tokio::test]
    async fn test_save_and_snapshot() {
        let repo = InMemoryPreferenceRepository::new();
        assert!(repo
            .save_preference(NewPreference::new(1, MarketKind::Forex, "eurusd", TradingStyle::Swing))
            .await
            .unwrap());

        let snapshot = repo.snapshot().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, Some(1));
        assert_eq!(snapshot[0].instrument, "EURUSD");
        assert_eq!(snapshot[0].timeframe, "4h");
    }

    #[tokio::test]
    async fn test_delete_by_instrument_is_case_insensitive() {
        let repo = InMemoryPreferenceRepository::new();
        repo.save_preference(NewPreference::detected(1, "BTCUSD", TradingStyle::Scalp))
            .await
            .unwrap();
        repo.save_preference(NewPreference::detected(1, "EURUSD", TradingStyle::Scalp))
            .await
            .unwrap();

        assert!(repo.delete_preference(1, "btcusd").await.unwrap());
        assert!(!repo.delete_preference(1, "btcusd").await.unwrap());
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_delete_by_id_and_all() {
        let repo = InMemoryPreferenceRepository::new();
        for instrument in ["EURUSD", "GBPUSD", "USDJPY"] {
            repo.save_preference(NewPreference::detected(9, instrument, TradingStyle::Intraday))
                .await
                .unwrap();
        }
        repo.save_preference(NewPreference::detected(10, "EURUSD", TradingStyle::Intraday))
            .await
            .unwrap();

        assert!(repo.delete_preference_by_id(2).await.unwrap());
        assert!(!repo.delete_preference_by_id(2).await.unwrap());
        assert!(repo.delete_all_preferences(9).await.unwrap());
        assert!(!repo.delete_all_preferences(9).await.unwrap());
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_list_for_user_skips_invalid_rows() {
        let repo = InMemoryPreferenceRepository::with_records(vec![
            PreferenceRecord {
                id: Some(3),
                user_id: 1,
                market: "forex".to_string(),
                instrument: "EURUSD".to_string(),
                style: "scalp30".to_string(),
                timeframe: "30".to_string(),
            },
            PreferenceRecord {
                id: Some(4),
                user_id: 1,
                market: "metals".to_string(),
                instrument: "XAUUSD".to_string(),
                style: "swing".to_string(),
                timeframe: "4h".to_string(),
            },
        ]);

        let prefs = repo.list_for_user(1).await.unwrap();
        assert_eq!(prefs.len(), 1);
        assert_eq!(prefs[0].timeframe, Timeframe::M30);

        // 다음 ID는 기존 최대값 이후
        repo.save_preference(NewPreference::detected(1, "GBPUSD", TradingStyle::Test))
            .await
            .unwrap();
        let ids: Vec<_> = repo.snapshot().await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![Some(3), Some(4), Some(5)]);
    }
}
