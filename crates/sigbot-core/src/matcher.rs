//! 구독자 매칭.
//!
//! 수신 신호와 전체 선호 설정 스냅샷을 비교하여 신호를 받을 사용자를 고릅니다.
//!
//! # 매칭 규칙
//!
//! ```text
//! signal.market      (비어 있으면 detect_market(instrument))
//! signal.instrument
//! signal.timeframe → normalize_timeframe()
//!        │
//!        ▼
//! 각 PreferenceRecord
//!        │  market == && instrument == && normalize(timeframe) ==
//!        ▼
//! user_id 기준 중복 제거 (먼저 나온 행 유지)
//! ```
//!
//! 비교에는 시장, 종목, 정규화된 타임프레임만 사용합니다. 시장과 종목은 저장된
//! 문자열 그대로 비교하며 스타일은 매칭에 관여하지 않습니다.
//!
//! 어떤 경우에도 에러를 반환하지 않습니다. 실패는 빈 결과 또는 부분 결과로 이어지고
//! 진단은 로그로만 남깁니다. 따라서 호출자는 "매칭 없음"과 "저장소 장애"를 구분할 수 없습니다.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, error, warn};

use crate::{
    domain::{normalize_timeframe, InboundSignal, PreferenceRecord, Timeframe, TradingStyle},
    repository::PreferenceRepository,
};

/// 매칭 통계.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MatchStats {
    /// 검사한 행 수
    pub scanned: usize,
    /// 결과에 포함된 사용자 수
    pub matched: usize,
    /// 같은 사용자의 중복 매칭으로 제외된 행 수
    pub duplicates: usize,
}

/// 매칭된 구독자.
///
/// 저장된 행을 검증 없이 옮긴 값입니다. 스타일은 알 수 있을 때만 채워집니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subscriber {
    pub id: Option<i64>,
    /// 텔레그램 사용자 ID (개인 채팅에서는 chat_id와 같음)
    pub user_id: i64,
    pub market: String,
    pub instrument: String,
    pub style: Option<TradingStyle>,
    /// 저장된 타임프레임을 정규화한 값
    pub timeframe: Timeframe,
}

impl Subscriber {
    fn from_record(record: &PreferenceRecord, timeframe: Timeframe) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            market: record.market.clone(),
            instrument: record.instrument.clone(),
            style: record.style.parse().ok(),
            timeframe,
        }
    }
}

/// 매칭 결과.
#[derive(Debug, Clone, Default)]
pub struct MatchOutcome {
    /// 사용자당 최대 한 명 (스냅샷 순서)
    pub subscribers: Vec<Subscriber>,
    pub stats: MatchStats,
}

/// 신호에 맞는 구독자를 찾습니다.
pub fn match_subscribers(signal: &InboundSignal, snapshot: &[PreferenceRecord]) -> Vec<Subscriber> {
    match_with_stats(signal, snapshot).subscribers
}

/// [`match_subscribers`]와 같지만 통계를 함께 반환합니다.
pub fn match_with_stats(signal: &InboundSignal, snapshot: &[PreferenceRecord]) -> MatchOutcome {
    let mut outcome = MatchOutcome::default();

    if snapshot.is_empty() {
        warn!(instrument = %signal.instrument, "선호 설정 스냅샷이 비어 있음 - 구독자 없음");
        return outcome;
    }

    let market = signal.market_key();
    let signal_tf = signal.canonical_timeframe();

    let mut seen_users = HashSet::new();

    for record in snapshot {
        outcome.stats.scanned += 1;

        if record.market != market || record.instrument != signal.instrument {
            continue;
        }
        let timeframe = normalize_timeframe(&record.timeframe);
        if timeframe != signal_tf {
            continue;
        }

        if !seen_users.insert(record.user_id) {
            outcome.stats.duplicates += 1;
            debug!(user_id = record.user_id, id = ?record.id, "중복 매칭 제외");
            continue;
        }

        outcome.subscribers.push(Subscriber::from_record(record, timeframe));
    }

    outcome.stats.matched = outcome.subscribers.len();

    debug!(
        instrument = %signal.instrument,
        market = %market,
        timeframe = %signal_tf,
        scanned = outcome.stats.scanned,
        matched = outcome.stats.matched,
        duplicates = outcome.stats.duplicates,
        "구독자 매칭 완료"
    );

    outcome
}

/// 저장소에서 최신 스냅샷을 읽어 구독자를 찾습니다.
///
/// 호출마다 전체 스냅샷을 새로 읽습니다. 조회 실패는 빈 결과로 처리합니다.
pub async fn find_subscribers(
    repository: &dyn PreferenceRepository,
    signal: &InboundSignal,
) -> MatchOutcome {
    match repository.snapshot().await {
        Ok(snapshot) => match_with_stats(signal, &snapshot),
        Err(e) => {
            error!(
                instrument = %signal.instrument,
                error = %e,
                "선호 설정 스냅샷 조회 실패 - 구독자 없음으로 처리"
            );
            MatchOutcome::default()
        }
    }
}
