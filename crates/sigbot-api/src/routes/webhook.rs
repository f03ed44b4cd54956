//! 신호 웹훅 라우트.
//!
//! TradingView 등 외부 알림 서비스가 보내는 JSON 신호를 받아
//! 구독자에게 전달합니다.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use sigbot_core::InboundSignal;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::{
    error::{api_error, domain_error, ApiErrorResponse, ApiResult},
    services::DispatchReport,
    AppState,
};

/// 웹훅 비밀값 헤더.
pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

/// 웹훅 본문 (문서용).
///
/// 나열되지 않은 필드(`action`, `price`, `message` 등)는 알림에 그대로 사용됩니다.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SignalPayload {
    /// 종목 (`symbol`보다 우선)
    #[schema(example = "EURUSD")]
    pub instrument: Option<String>,
    pub symbol: Option<String>,
    /// 타임프레임 (`timeframe`보다 우선)
    #[schema(example = "60")]
    pub interval: Option<String>,
    pub timeframe: Option<String>,
    /// 시장. 없으면 종목으로 판별합니다.
    #[schema(example = "forex")]
    pub market: Option<String>,
}

/// 신호 수신.
#[utoipa::path(
    post,
    path = "/webhook/signal",
    tag = "webhook",
    request_body = SignalPayload,
    params(
        ("X-Webhook-Secret" = Option<String>, Header, description = "WEBHOOK_SECRET 설정 시 필수")
    ),
    responses(
        (status = 200, description = "신호 처리 완료", body = DispatchReport),
        (status = 400, description = "객체가 아닌 본문", body = ApiErrorResponse),
        (status = 401, description = "비밀값 불일치", body = ApiErrorResponse)
    )
)]
pub async fn receive_signal(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<JsonValue>,
) -> ApiResult<Json<DispatchReport>> {
    if let Some(expected) = state.webhook_secret.as_deref() {
        let provided = headers
            .get(WEBHOOK_SECRET_HEADER)
            .map(|v| v.as_bytes())
            .unwrap_or_default();
        if !constant_time_eq(provided, expected.as_bytes()) {
            warn!("웹훅 비밀값 불일치 - 요청 거부");
            return Err(api_error(
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Invalid webhook secret",
            ));
        }
    }

    let signal = InboundSignal::from_value(&body).map_err(domain_error)?;
    info!(
        instrument = %signal.instrument,
        timeframe = ?signal.timeframe,
        market = ?signal.market,
        "웹훅 신호 수신"
    );

    let report = state.dispatcher().handle(&signal).await;
    Ok(Json(report))
}

/// 타이밍 공격을 막기 위한 고정 시간 비교.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |diff, (x, y)| diff | (x ^ y)) == 0
}
