//! API 라우트.
//!
//! - `GET  /health` - 헬스 체크
//! - `POST /webhook/signal` - 신호 웹훅
//! - `/api/v1/preferences` - 구독 선호 설정 관리

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

pub mod health;
pub mod preferences;
pub mod webhook;

pub use health::{health_check, HealthResponse};
pub use preferences::preferences_router;
pub use webhook::{receive_signal, SignalPayload, WEBHOOK_SECRET_HEADER};

/// 전체 API 라우터 생성.
pub fn create_api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/webhook/signal", post(receive_signal))
        .nest("/api/v1/preferences", preferences_router())
        .with_state(state)
}
