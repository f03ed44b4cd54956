//! 오프라인 구독자 매칭.
//!
//! JSON 스냅샷 파일과 신호 JSON으로 매처를 실행합니다.
//!
//! ```bash
//! sigbot match --signal '{"instrument":"EURUSD","interval":"60"}' --preferences prefs.json
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{json, Value as JsonValue};
use sigbot_core::{decode_snapshot, match_with_stats, InboundSignal};

/// 매칭을 실행하고 결과 JSON을 반환합니다.
pub fn run_match(signal: &str, snapshot: &JsonValue) -> Result<JsonValue> {
    let signal: JsonValue = serde_json::from_str(signal).context("signal is not valid JSON")?;
    let signal = InboundSignal::from_value(&signal)?;

    let records = decode_snapshot(snapshot);
    let outcome = match_with_stats(&signal, &records);

    Ok(json!({
        "instrument": signal.instrument,
        "market": signal.market_key(),
        "timeframe": signal.canonical_timeframe().to_string(),
        "stats": outcome.stats,
        "subscribers": outcome.subscribers,
    }))
}

/// 스냅샷 파일을 읽습니다.
pub fn load_snapshot(path: &Path) -> Result<JsonValue> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("{} is not valid JSON", path.display()))
}
