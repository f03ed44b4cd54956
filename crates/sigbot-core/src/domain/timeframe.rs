//! 타임프레임 정규화.
//!
//! 웹훅 페이로드와 DB 행에는 같은 타임프레임이 여러 표기로 섞여 들어옵니다
//! (`"1"`, `"1m"`, `"60"`, `"\"1h\""` 등). 이 모듈은 이를 고정된 어휘로 모읍니다.
//!
//! | 입력 (분 단위 / 접미사) | 결과 |
//! |------------------------|------|
//! | `1` / `1m`             | 1m   |
//! | `5` / `5m`             | 5m   |
//! | `15` / `15m`           | 15m  |
//! | `30` / `30m`           | 30m  |
//! | `60` / `1h`            | 1h   |
//! | `120` / `2h`           | 2h   |
//! | `240` / `4h`           | 4h   |
//! | `1440` / `1d`          | 1d   |
//! | 빈 값                  | 1h (기본값) |
//! | 그 외                  | 원문 (trim + 소문자) |
//!
//! 테이블에 없는 표기는 에러 대신 [`Timeframe::Unrecognized`]로 그대로 통과시킵니다.
//! 같은 비표준 표기끼리는 여전히 서로 일치합니다.

use std::{convert::Infallible, fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// 타임프레임이 비어 있을 때 사용하는 기본값.
pub const DEFAULT_TIMEFRAME: Timeframe = Timeframe::H1;

/// 정규화된 타임프레임.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Timeframe {
    /// 1분
    M1,
    /// 5분
    M5,
    /// 15분
    M15,
    /// 30분
    M30,
    /// 1시간
    #[default]
    H1,
    /// 2시간
    H2,
    /// 4시간
    H4,
    /// 1일
    D1,
    /// 매핑 테이블에 없는 표기 (trim, 따옴표 제거, 소문자 변환된 원문)
    Unrecognized(String),
}

impl Timeframe {
    /// 표준 타임프레임 목록 (짧은 순).
    pub const CANONICAL: [Timeframe; 8] = [
        Timeframe::M1,
        Timeframe::M5,
        Timeframe::M15,
        Timeframe::M30,
        Timeframe::H1,
        Timeframe::H2,
        Timeframe::H4,
        Timeframe::D1,
    ];

    /// 표준 표기 문자열.
    pub fn as_str(&self) -> &str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::M30 => "30m",
            Timeframe::H1 => "1h",
            Timeframe::H2 => "2h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
            Timeframe::Unrecognized(raw) => raw,
        }
    }

    /// 분 단위 길이. 비표준 표기는 `None`.
    pub fn minutes(&self) -> Option<u32> {
        match self {
            Timeframe::M1 => Some(1),
            Timeframe::M5 => Some(5),
            Timeframe::M15 => Some(15),
            Timeframe::M30 => Some(30),
            Timeframe::H1 => Some(60),
            Timeframe::H2 => Some(120),
            Timeframe::H4 => Some(240),
            Timeframe::D1 => Some(1440),
            Timeframe::Unrecognized(_) => None,
        }
    }

    /// 표준 어휘에 속하는지 여부.
    pub fn is_canonical(&self) -> bool {
        !matches!(self, Timeframe::Unrecognized(_))
    }
}

/// 타임프레임 표기를 정규화합니다.
///
/// 순수 함수이며 멱등입니다: `normalize_timeframe(normalize_timeframe(x).as_str()) == normalize_timeframe(x)`.
pub fn normalize_timeframe(repr: &str) -> Timeframe {
    let cleaned = clean(repr);

    match cleaned.as_str() {
        "" => DEFAULT_TIMEFRAME,
        "1" | "1m" => Timeframe::M1,
        "5" | "5m" => Timeframe::M5,
        "15" | "15m" => Timeframe::M15,
        "30" | "30m" => Timeframe::M30,
        "60" | "1h" => Timeframe::H1,
        "120" | "2h" => Timeframe::H2,
        "240" | "4h" => Timeframe::H4,
        "1440" | "1d" => Timeframe::D1,
        _ => Timeframe::Unrecognized(cleaned),
    }
}

/// 선택적 입력 정규화. `None`은 기본값(1h).
pub fn normalize_optional(repr: Option<&str>) -> Timeframe {
    repr.map(normalize_timeframe).unwrap_or(DEFAULT_TIMEFRAME)
}

fn clean(repr: &str) -> String {
    repr.trim_matches(|c: char| c == '"' || c == '\'' || c.is_whitespace())
        .to_lowercase()
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(normalize_timeframe(s))
    }
}

impl Serialize for Timeframe {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Timeframe {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(normalize_timeframe(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_and_suffixed_forms_share_bucket() {
        let pairs = [
            ("1", "1m"),
            ("5", "5m"),
            ("15", "15m"),
            ("30", "30m"),
            ("60", "1h"),
            ("120", "2h"),
            ("240", "4h"),
            ("1440", "1d"),
        ];

        for (numeric, suffixed) in pairs {
            assert_eq!(normalize_timeframe(numeric), normalize_timeframe(suffixed));
            assert!(normalize_timeframe(numeric).is_canonical());
        }
    }

    #[test]
    fn test_quoted_input() {
        assert_eq!(normalize_timeframe("\"1m\""), Timeframe::M1);
        assert_eq!(normalize_timeframe("'240'"), Timeframe::H4);
        assert_eq!(normalize_timeframe("  \"1H\" "), Timeframe::H1);
    }

    #[test]
    fn test_empty_defaults_to_one_hour() {
        assert_eq!(normalize_timeframe(""), Timeframe::H1);
        assert_eq!(normalize_timeframe("   "), Timeframe::H1);
        assert_eq!(normalize_timeframe("\"\""), Timeframe::H1);
        assert_eq!(normalize_optional(None), Timeframe::H1);
    }

    #[test]
    fn test_unrecognized_passes_through_lowercased() {
        let tf = normalize_timeframe(" 3H ");
        assert_eq!(tf, Timeframe::Unrecognized("3h".to_string()));
        assert_eq!(tf.to_string(), "3h");
        assert!(!tf.is_canonical());
        assert_eq!(tf.minutes(), None);

        // 같은 비표준 표기끼리는 일치
        assert_eq!(normalize_timeframe("1W"), normalize_timeframe("1w"));
    }

    #[test]
    fn test_minutes() {
        assert_eq!(Timeframe::H4.minutes(), Some(240));
        assert_eq!(Timeframe::D1.minutes(), Some(1440));
    }

    #[test]
    fn test_serde_normalizes_on_deserialize() {
        let tf: Timeframe = serde_json::from_str("\"60\"").unwrap();
        assert_eq!(tf, Timeframe::H1);
        assert_eq!(serde_json::to_string(&Timeframe::M15).unwrap(), "\"15m\"");
    }
}
