//! 시장 분류.
//!
//! 심볼 문자열만으로 시장(forex, crypto, commodities, indices)을 판별합니다.
//! 판별 순서는 고정입니다: 원자재 → 암호화폐 → 지수 → 외환(기본값).

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// 원자재 심볼 (완전 일치).
pub const COMMODITY_SYMBOLS: [&str; 4] = ["XAUUSD", "XAGUSD", "WTIUSD", "BCOUSD"];

/// 암호화폐 기준 통화 (부분 문자열 일치).
pub const CRYPTO_BASES: [&str; 8] = ["BTC", "ETH", "XRP", "SOL", "BNB", "ADA", "DOT", "LINK"];

/// 지수 심볼 (완전 일치).
pub const INDEX_SYMBOLS: [&str; 9] = [
    "US30", "US500", "US100", "UK100", "DE40", "FR40", "JP225", "AU200", "HK50",
];

/// 시장 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum MarketKind {
    Forex,
    Crypto,
    Commodities,
    Indices,
}

impl MarketKind {
    /// 모든 시장 종류.
    pub const ALL: [MarketKind; 4] = [
        MarketKind::Forex,
        MarketKind::Crypto,
        MarketKind::Commodities,
        MarketKind::Indices,
    ];

    /// 저장/전송용 소문자 이름.
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketKind::Forex => "forex",
            MarketKind::Crypto => "crypto",
            MarketKind::Commodities => "commodities",
            MarketKind::Indices => "indices",
        }
    }
}

impl fmt::Display for MarketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarketKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "forex" => Ok(MarketKind::Forex),
            "crypto" => Ok(MarketKind::Crypto),
            "commodities" => Ok(MarketKind::Commodities),
            "indices" => Ok(MarketKind::Indices),
            _ => Err(DomainError::UnknownMarket(s.to_string())),
        }
    }
}

/// 심볼로 시장을 판별합니다.
///
/// 대소문자를 구분하지 않습니다. 여러 분류에 걸리는 심볼은 먼저 검사한 분류가 이깁니다.
pub fn detect_market(symbol: &str) -> MarketKind {
    let symbol = symbol.trim().to_uppercase();

    if COMMODITY_SYMBOLS.contains(&symbol.as_str()) {
        MarketKind::Commodities
    } else if CRYPTO_BASES.iter().any(|base| symbol.contains(base)) {
        MarketKind::Crypto
    } else if INDEX_SYMBOLS.contains(&symbol.as_str()) {
        MarketKind::Indices
    } else {
        MarketKind::Forex
    }
}
