//! 타임프레임 정규화 / 시장 분류 확인.
//!
//! ```bash
//! sigbot normalize 60 '"4H"' 1440 3h
//! sigbot detect EURUSD xauusd BTCUSDT US500
//! ```

use sigbot_core::{detect_market, normalize_timeframe};

/// 입력별 정규화 결과를 한 줄씩 반환합니다.
pub fn normalize_lines(inputs: &[String]) -> Vec<String> {
    inputs
        .iter()
        .map(|input| {
            let timeframe = normalize_timeframe(input);
            if timeframe.is_canonical() {
                format!("{}\t{}", input, timeframe)
            } else {
                format!("{}\t{}\t(unrecognized)", input, timeframe)
            }
        })
        .collect()
}

/// 입력별 시장 분류 결과를 한 줄씩 반환합니다.
pub fn detect_lines(symbols: &[String]) -> Vec<String> {
    symbols
        .iter()
        .map(|symbol| format!("{}\t{}", symbol, detect_market(symbol)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_normalize_lines() {
        let lines = normalize_lines(&strings(&["60", "\"4H\"", "3h"]));
        assert_eq!(lines[0], "60\t1h");
        assert_eq!(lines[1], "\"4H\"\t4h");
        assert_eq!(lines[2], "3h\t3h\t(unrecognized)");
    }

    #[test]
    fn test_detect_lines() {
        let lines = detect_lines(&strings(&["xauusd", "BTCUSDT", "US500", "EURUSD"]));
        assert_eq!(
            lines,
            vec![
                "xauusd\tcommodities",
                "BTCUSDT\tcrypto",
                "US500\tindices",
                "EURUSD\tforex"
            ]
        );
    }
}
