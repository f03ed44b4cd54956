//! 헬스 체크 라우트.

use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::AppState;

/// 헬스 체크 응답.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// 선호 설정 저장소 종류 (`memory`, `postgres`)
    pub store: String,
    /// 알림 전송 활성화 여부
    pub notifications_enabled: bool,
    pub uptime_secs: i64,
}

/// 서버 상태 조회.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "서버 정상", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: state.version.clone(),
        store: state.repository.backend().to_string(),
        notifications_enabled: state.notifications_enabled(),
        uptime_secs: (Utc::now() - state.started_at).num_seconds(),
    })
}
