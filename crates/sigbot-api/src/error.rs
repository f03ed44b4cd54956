//! API 에러 응답.
//!
//! 핸들러는 `(StatusCode, Json<ApiErrorResponse>)` 튜플로 실패를 반환합니다.

use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use sigbot_core::{DomainError, StoreError};
use tracing::error;
use utoipa::ToSchema;

/// 에러 응답 본문.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: `INVALID_STYLE`)
    pub code: String,
    /// 사람이 읽을 수 있는 메시지
    pub message: String,
}

impl ApiErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// 핸들러 에러 타입.
pub type ApiError = (StatusCode, Json<ApiErrorResponse>);

/// 핸들러 결과 타입.
pub type ApiResult<T> = Result<T, ApiError>;

/// 상태 코드와 메시지로 에러를 만듭니다.
pub fn api_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
    (status, Json(ApiErrorResponse::new(code, message)))
}

/// 저장소 에러 변환.
pub fn store_error(e: StoreError) -> ApiError {
    error!(error = %e, "선호 설정 저장소 에러");
    match e {
        StoreError::Unavailable(msg) => {
            api_error(StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE", msg)
        }
        StoreError::Database(msg) => {
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR", msg)
        }
        StoreError::InvalidRecord(e) => api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INVALID_RECORD",
            e.to_string(),
        ),
    }
}

/// 요청 검증 에러 변환.
pub fn domain_error(e: DomainError) -> ApiError {
    let code = match &e {
        DomainError::UnknownMarket(_) => "INVALID_MARKET",
        DomainError::UnknownStyle(_) => "INVALID_STYLE",
        DomainError::InvalidRecord(_) => "INVALID_INPUT",
        DomainError::MalformedSignal(_) => "INVALID_SIGNAL",
    };
    api_error(StatusCode::BAD_REQUEST, code, e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_status() {
        let (status, Json(body)) = store_error(StoreError::Unavailable("pool timed out".into()));
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.code, "STORE_UNAVAILABLE");

        let (status, _) = store_error(StoreError::Database("syntax error".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_domain_error_codes() {
        let (status, Json(body)) = domain_error(DomainError::UnknownStyle("yolo".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "INVALID_STYLE");
    }
}
