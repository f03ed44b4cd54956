//! 트레이딩 스타일.
//!
//! 사용자가 고르는 스타일이 곧 수신할 신호의 타임프레임을 결정합니다.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, Timeframe};

/// 사용자 트레이딩 스타일.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum TradingStyle {
    /// 테스트용 (1분봉)
    Test,
    /// 스캘핑 (15분봉)
    Scalp,
    /// 30분 스캘핑
    Scalp30,
    /// 데이 트레이딩 (1시간봉)
    Intraday,
    /// 스윙 (4시간봉)
    Swing,
}

impl TradingStyle {
    /// 모든 스타일 (메뉴/도움말 표시 순서).
    pub const ALL: [TradingStyle; 5] = [
        TradingStyle::Test,
        TradingStyle::Scalp,
        TradingStyle::Scalp30,
        TradingStyle::Intraday,
        TradingStyle::Swing,
    ];

    /// 저장/전송용 이름.
    pub fn as_str(&self) -> &'static str {
        match self {
            TradingStyle::Test => "test",
            TradingStyle::Scalp => "scalp",
            TradingStyle::Scalp30 => "scalp30",
            TradingStyle::Intraday => "intraday",
            TradingStyle::Swing => "swing",
        }
    }

    /// 스타일에 고정된 타임프레임.
    pub fn timeframe(&self) -> Timeframe {
        match self {
            TradingStyle::Test => Timeframe::M1,
            TradingStyle::Scalp => Timeframe::M15,
            TradingStyle::Scalp30 => Timeframe::M30,
            TradingStyle::Intraday => Timeframe::H1,
            TradingStyle::Swing => Timeframe::H4,
        }
    }
}

/// `STYLE_TIMEFRAME_MAP[style]`.
pub fn style_timeframe(style: TradingStyle) -> Timeframe {
    style.timeframe()
}

impl fmt::Display for TradingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradingStyle {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "test" => Ok(TradingStyle::Test),
            "scalp" => Ok(TradingStyle::Scalp),
            "scalp30" => Ok(TradingStyle::Scalp30),
            "intraday" => Ok(TradingStyle::Intraday),
            "swing" => Ok(TradingStyle::Swing),
            _ => Err(DomainError::UnknownStyle(s.to_string())),
        }
    }
}
