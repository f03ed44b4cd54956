//! 도메인 타입.

pub mod market;
pub mod preference;
pub mod signal;
pub mod style;
pub mod timeframe;

pub use market::{detect_market, MarketKind};
pub use preference::{decode_snapshot, NewPreference, Preference, PreferenceRecord};
pub use signal::InboundSignal;
pub use style::{style_timeframe, TradingStyle};
pub use timeframe::{normalize_optional, normalize_timeframe, Timeframe, DEFAULT_TIMEFRAME};

/// 도메인 값 파싱/검증 에러.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// 알 수 없는 시장 이름
    #[error("unknown market: {0}")]
    UnknownMarket(String),

    /// 알 수 없는 트레이딩 스타일
    #[error("unknown trading style: {0}")]
    UnknownStyle(String),

    /// 검증에 실패한 선호 설정 행
    #[error("invalid preference record: {0}")]
    InvalidRecord(String),

    /// 객체가 아닌 신호 페이로드
    #[error("signal payload must be a JSON object: {0}")]
    MalformedSignal(String),
}
