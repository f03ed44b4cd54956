//! # Sigbot Core
//!
//! 트레이딩 신호 중계 봇의 도메인 타입과 구독자 매칭.
//!
//! - [`domain::timeframe`] - 타임프레임 정규화
//! - [`domain::market`] - 심볼 기반 시장 분류
//! - [`domain::style`] - 트레이딩 스타일과 타임프레임 매핑
//! - [`domain::preference`] - 구독 선호 설정
//! - [`domain::signal`] - 웹훅 수신 신호
//! - [`matcher`] - 신호와 선호 설정 매칭
//! - [`repository`] - 선호 설정 저장소 포트
//! - [`rate_limit`] - 외부 호출 속도 제한

pub mod domain;
pub mod matcher;
pub mod rate_limit;
pub mod repository;

pub use domain::*;
pub use matcher::{
    find_subscribers, match_subscribers, match_with_stats, MatchOutcome, MatchStats, Subscriber,
};
pub use rate_limit::{Clock, ManualClock, RateLimiter, SystemClock};
pub use repository::{
    InMemoryPreferenceRepository, PreferenceRepository, StoreError, StoreResult,
};
