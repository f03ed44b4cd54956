//! 구독 선호 설정.
//!
//! 사용자 한 명이 (시장, 종목, 스타일) 조합마다 한 행씩 가집니다.
//! 타임프레임은 스타일에서 결정되며 조회 편의를 위해 함께 저장합니다.
//!
//! - [`PreferenceRecord`]: 저장소에서 읽은 그대로의 느슨한 행 (모든 컬럼이 문자열)
//! - [`Preference`]: 검증이 끝난 타입 있는 값
//! - [`NewPreference`]: 등록 요청 (타임프레임 불변식 보정 포함)

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::warn;

use crate::domain::{
    detect_market, normalize_timeframe, DomainError, MarketKind, Timeframe, TradingStyle,
};

/// 저장소에 기록된 그대로의 선호 설정 행.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceRecord {
    #[serde(default)]
    pub id: Option<i64>,
    pub user_id: i64,
    #[serde(default)]
    pub market: String,
    #[serde(default)]
    pub instrument: String,
    #[serde(default)]
    pub style: String,
    #[serde(default)]
    pub timeframe: String,
}

/// 검증된 선호 설정.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct Preference {
    pub id: Option<i64>,
    /// 텔레그램 사용자 ID (개인 채팅에서는 chat_id와 같음)
    pub user_id: i64,
    pub market: MarketKind,
    pub instrument: String,
    pub style: TradingStyle,
    /// 저장된 타임프레임을 정규화한 값
    #[cfg_attr(feature = "utoipa-support", schema(value_type = String, example = "1h"))]
    pub timeframe: Timeframe,
}

impl TryFrom<&PreferenceRecord> for Preference {
    type Error = DomainError;

    fn try_from(record: &PreferenceRecord) -> Result<Self, Self::Error> {
        if record.instrument.trim().is_empty() {
            return Err(DomainError::InvalidRecord(format!(
                "user {} has a preference without instrument",
                record.user_id
            )));
        }

        let market = record.market.parse::<MarketKind>()?;
        let style = record.style.parse::<TradingStyle>()?;

        Ok(Self {
            id: record.id,
            user_id: record.user_id,
            market,
            instrument: record.instrument.clone(),
            style,
            timeframe: normalize_timeframe(&record.timeframe),
        })
    }
}

impl TryFrom<PreferenceRecord> for Preference {
    type Error = DomainError;

    fn try_from(record: PreferenceRecord) -> Result<Self, Self::Error> {
        Preference::try_from(&record)
    }
}

impl From<&Preference> for PreferenceRecord {
    fn from(pref: &Preference) -> Self {
        Self {
            id: pref.id,
            user_id: pref.user_id,
            market: pref.market.as_str().to_string(),
            instrument: pref.instrument.clone(),
            style: pref.style.as_str().to_string(),
            timeframe: pref.timeframe.to_string(),
        }
    }
}

/// 선호 설정 등록 요청.
///
/// `timeframe`은 항상 `style.timeframe()`과 같습니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPreference {
    pub user_id: i64,
    pub market: MarketKind,
    pub instrument: String,
    pub style: TradingStyle,
    pub timeframe: Timeframe,
}

impl NewPreference {
    /// 새 등록 요청을 생성합니다. 종목은 trim + 대문자로 저장합니다.
    pub fn new(user_id: i64, market: MarketKind, instrument: &str, style: TradingStyle) -> Self {
        Self {
            user_id,
            market,
            instrument: instrument.trim().to_uppercase(),
            style,
            timeframe: style.timeframe(),
        }
    }

    /// 시장을 심볼로 판별하여 등록 요청을 생성합니다.
    pub fn detected(user_id: i64, instrument: &str, style: TradingStyle) -> Self {
        let market = detect_market(instrument);
        Self::new(user_id, market, instrument, style)
    }

    /// 호출자가 지정한 타임프레임을 반영합니다.
    ///
    /// 스타일의 타임프레임과 다르면 스타일 쪽 값으로 보정합니다.
    pub fn with_timeframe(mut self, requested: &str) -> Self {
        let requested = normalize_timeframe(requested);
        let expected = self.style.timeframe();
        if requested != expected {
            warn!(
                user_id = self.user_id,
                instrument = %self.instrument,
                style = %self.style,
                requested = %requested,
                expected = %expected,
                "스타일과 맞지 않는 타임프레임 보정"
            );
        }
        self.timeframe = expected;
        self
    }

    /// 저장소에 기록할 행으로 변환합니다.
    pub fn to_record(&self) -> PreferenceRecord {
        PreferenceRecord {
            id: None,
            user_id: self.user_id,
            market: self.market.as_str().to_string(),
            instrument: self.instrument.clone(),
            style: self.style.as_str().to_string(),
            timeframe: self.timeframe.to_string(),
        }
    }
}

/// JSON 배열 스냅샷을 행 목록으로 디코딩합니다.
///
/// 객체가 아니거나 필수 필드가 없는 항목은 경고 로그를 남기고 건너뜁니다.
pub fn decode_snapshot(value: &JsonValue) -> Vec<PreferenceRecord> {
    let Some(entries) = value.as_array() else {
        warn!("선호 설정 스냅샷이 배열이 아님 - 빈 목록으로 처리");
        return Vec::new();
    };

    entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            if !entry.is_object() {
                warn!(index, entry = %entry, "객체가 아닌 선호 설정 항목 건너뜀");
                return None;
            }
            match serde_json::from_value::<PreferenceRecord>(entry.clone()) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(index, error = %e, "선호 설정 항목 디코딩 실패 - 건너뜀");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record(market: &str, style: &str, timeframe: &str) -> PreferenceRecord {
        PreferenceRecord {
            id: Some(1),
            user_id: 42,
            market: market.to_string(),
            instrument: "EURUSD".to_string(),
            style: style.to_string(),
            timeframe: timeframe.to_string(),
        }
    }

    #[test]
    fn test_record_to_preference_normalizes_timeframe() {
        let pref = Preference::try_from(record("forex", "intraday", "60")).unwrap();
        assert_eq!(pref.market, MarketKind::Forex);
        assert_eq!(pref.style, TradingStyle::Intraday);
        assert_eq!(pref.timeframe, Timeframe::H1);
    }

    #[test]
    fn test_invalid_record_is_rejected() {
        assert!(Preference::try_from(record("stocks", "intraday", "1h")).is_err());
        assert!(Preference::try_from(record("forex", "", "1h")).is_err());

        let mut blank = record("forex", "swing", "4h");
        blank.instrument = "  ".to_string();
        assert!(Preference::try_from(blank).is_err());
    }

    #[test]
    fn test_new_preference_derives_timeframe() {
        let pref = NewPreference::new(7, MarketKind::Forex, " eurusd ", TradingStyle::Swing);
        assert_eq!(pref.instrument, "EURUSD");
        assert_eq!(pref.timeframe, Timeframe::H4);
    }

    #[test]
    fn test_divergent_timeframe_is_corrected() {
        let pref = NewPreference::new(7, MarketKind::Crypto, "BTCUSD", TradingStyle::Scalp)
            .with_timeframe("1h");
        assert_eq!(pref.timeframe, Timeframe::M15);

        let same = NewPreference::new(7, MarketKind::Crypto, "BTCUSD", TradingStyle::Scalp)
            .with_timeframe("15");
        assert_eq!(same.timeframe, Timeframe::M15);
    }

    #[test]
    fn test_detected_market() {
        let pref = NewPreference::detected(1, "xauusd", TradingStyle::Intraday);
        assert_eq!(pref.market, MarketKind::Commodities);
        assert_eq!(pref.to_record().market, "commodities");
    }

    #[test]
    fn test_decode_snapshot_skips_malformed_entries() {
        let snapshot = json!([
            {"user_id": 1, "market": "forex", "instrument": "EURUSD", "style": "intraday", "timeframe": "60"},
            "not-a-mapping",
            42,
            {"market": "forex", "instrument": "EURUSD"},
        ]);

        let records = decode_snapshot(&snapshot);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].user_id, 1);
    }

    #[test]
    fn test_decode_snapshot_non_array() {
        assert!(decode_snapshot(&json!({"user_id": 1})).is_empty());
        assert!(decode_snapshot(&JsonValue::Null).is_empty());
    }
}
