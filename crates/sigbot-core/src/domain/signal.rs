//! 웹훅으로 들어오는 트레이딩 신호.
//!
//! 신호는 저장하지 않습니다. 웹훅 호출마다 만들어지고 매칭/발송 후 버려집니다.
//! 페이로드 스키마는 강제하지 않고 키 존재 여부만 확인합니다:
//!
//! - 종목: `instrument`, 없으면 `symbol`
//! - 타임프레임: `interval`, 없으면 `timeframe` (문자열 또는 숫자)
//! - 시장: `market` (선택, 비어 있으면 종목으로 판별)
//!
//! 나머지 키(`price`, `action`, `message` 등)는 [`InboundSignal::extra`]에 보관하여
//! 메시지 포맷에 사용합니다.

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::domain::{detect_market, normalize_optional, DomainError, Timeframe};

const INSTRUMENT_KEYS: [&str; 2] = ["instrument", "symbol"];
const TIMEFRAME_KEYS: [&str; 2] = ["interval", "timeframe"];
const MARKET_KEY: &str = "market";

/// 수신 신호.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InboundSignal {
    /// 종목 심볼 (앞뒤 공백만 제거)
    pub instrument: String,
    /// 원본 타임프레임 표기
    pub timeframe: Option<String>,
    /// 원본 시장 표기
    pub market: Option<String>,
    /// 그 밖의 페이로드 필드
    pub extra: Map<String, JsonValue>,
}

impl InboundSignal {
    /// 새 신호를 생성합니다.
    pub fn new(instrument: impl Into<String>, timeframe: impl Into<String>) -> Self {
        Self {
            instrument: instrument.into().trim().to_string(),
            timeframe: Some(timeframe.into()),
            market: None,
            extra: Map::new(),
        }
    }

    /// 시장을 명시합니다.
    pub fn with_market(mut self, market: impl Into<String>) -> Self {
        self.market = Some(market.into());
        self
    }

    /// 부가 필드를 추가합니다.
    pub fn with_extra(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// 웹훅 JSON 본문에서 신호를 만듭니다.
    ///
    /// 본문이 객체가 아니면 에러입니다. 키가 없으면 기본값을 사용합니다.
    pub fn from_value(value: &JsonValue) -> Result<Self, DomainError> {
        let object = value
            .as_object()
            .ok_or_else(|| DomainError::MalformedSignal(value.to_string()))?;

        let instrument = first_scalar(object, &INSTRUMENT_KEYS).unwrap_or_default();
        let timeframe = first_scalar(object, &TIMEFRAME_KEYS);
        let market = object.get(MARKET_KEY).and_then(scalar_to_string);

        let extra = object
            .iter()
            .filter(|(key, _)| {
                !INSTRUMENT_KEYS.contains(&key.as_str())
                    && !TIMEFRAME_KEYS.contains(&key.as_str())
                    && key.as_str() != MARKET_KEY
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(Self {
            instrument: instrument.trim().to_string(),
            timeframe,
            market,
            extra,
        })
    }

    /// 매칭에 사용할 시장 키.
    ///
    /// 명시된 시장이 있으면 대소문자를 그대로 유지한 채 앞뒤 공백만 제거합니다.
    /// 비어 있으면 종목으로 판별한 시장의 이름(`forex` 등)입니다.
    pub fn market_key(&self) -> String {
        match self.market.as_deref().map(str::trim) {
            Some(explicit) if !explicit.is_empty() => explicit.to_string(),
            _ => detect_market(&self.instrument).as_str().to_string(),
        }
    }

    /// 정규화된 타임프레임.
    pub fn canonical_timeframe(&self) -> Timeframe {
        normalize_optional(self.timeframe.as_deref())
    }

    /// 부가 필드를 문자열로 조회합니다 (문자열/숫자만).
    pub fn extra_str(&self, key: &str) -> Option<String> {
        self.extra.get(key).and_then(scalar_to_string)
    }
}

fn first_scalar(object: &Map<String, JsonValue>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find_map(scalar_to_string)
}

fn scalar_to_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_from_value_with_aliases() {
        let signal = InboundSignal::from_value(&json!({
            "symbol": "EURUSD",
            "interval": 60,
            "price": 1.0842,
            "action": "buy"
        }))
        .unwrap();

        assert_eq!(signal.instrument, "EURUSD");
        assert_eq!(signal.timeframe.as_deref(), Some("60"));
        assert_eq!(signal.canonical_timeframe(), Timeframe::H1);
        assert_eq!(signal.extra_str("action").as_deref(), Some("buy"));
        assert_eq!(signal.extra_str("price").as_deref(), Some("1.0842"));
        assert!(!signal.extra.contains_key("symbol"));
    }

    #[test]
    fn test_instrument_key_wins_over_symbol() {
        let signal = InboundSignal::from_value(&json!({
            "instrument": "GBPUSD",
            "symbol": "EURUSD",
            "timeframe": "4h"
        }))
        .unwrap();

        assert_eq!(signal.instrument, "GBPUSD");
        assert_eq!(signal.canonical_timeframe(), Timeframe::H4);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let signal = InboundSignal::from_value(&json!({})).unwrap();
        assert_eq!(signal.instrument, "");
        assert_eq!(signal.canonical_timeframe(), Timeframe::H1);
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(InboundSignal::from_value(&json!(["EURUSD"])).is_err());
        assert!(InboundSignal::from_value(&json!("EURUSD")).is_err());
    }

    #[test]
    fn test_market_key() {
        let detected = InboundSignal::new("BTCUSD", "1h");
        assert_eq!(detected.market_key(), "crypto");

        let blank = InboundSignal::new("US30", "1h").with_market("  ");
        assert_eq!(blank.market_key(), "indices");

        let explicit = InboundSignal::new("BTCUSD", "1h").with_market(" forex ");
        assert_eq!(explicit.market_key(), "forex");

        // 명시된 값은 검증하거나 소문자로 바꾸지 않는다
        let cased = InboundSignal::new("EURUSD", "1h").with_market("Forex");
        assert_eq!(cased.market_key(), "Forex");

        let unknown = InboundSignal::new("AAPL", "1h").with_market("stocks");
        assert_eq!(unknown.market_key(), "stocks");
    }
}
