//! # Sigbot API
//!
//! 신호 웹훅 수신, 구독 선호 설정 REST API, Telegram 구독 관리 봇.
//!
//! - [`routes`] - Axum 라우트
//! - [`services`] - 신호 전달 / Telegram 명령 처리
//! - [`repository`] - PostgreSQL 저장소
//! - [`openapi`] - OpenAPI 문서와 Swagger UI

pub mod config;
pub mod error;
pub mod openapi;
pub mod repository;
pub mod routes;
pub mod services;
pub mod state;

pub use config::{mask_database_url, ServerConfig};
pub use state::AppState;
