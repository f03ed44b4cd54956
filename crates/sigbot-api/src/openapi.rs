//! OpenAPI 문서화 설정.
//!
//! utoipa로 REST API의 OpenAPI 3.0 스펙을 생성합니다.
//! Swagger UI는 `/swagger-ui` 경로에서 사용 가능합니다.
//!
//! 새 엔드포인트를 추가할 때:
//!
//! 1. 응답/요청 타입에 `#[derive(ToSchema)]` 추가
//! 2. 핸들러에 `#[utoipa::path(...)]` 어노테이션 추가
//! 3. 이 파일의 `components(schemas(...))` 및 `paths(...)` 섹션에 추가

use axum::Router;
use sigbot_core::{MarketKind, Preference, TradingStyle};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::error::ApiErrorResponse;
use crate::routes::{
    health::HealthResponse,
    preferences::{
        CreatePreferenceRequest, CreatePreferenceResponse, DeletePreferenceResponse,
        ListPreferencesResponse,
    },
    webhook::SignalPayload,
};
use crate::services::DispatchReport;

/// API 문서.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Sigbot Signal Relay API",
        description = "Trading signal webhook and subscription management"
    ),
    tags(
        (name = "health", description = "서버 상태"),
        (name = "webhook", description = "신호 웹훅"),
        (name = "preferences", description = "구독 선호 설정")
    ),
    components(schemas(
        ApiErrorResponse,
        HealthResponse,
        SignalPayload,
        DispatchReport,
        CreatePreferenceRequest,
        CreatePreferenceResponse,
        ListPreferencesResponse,
        DeletePreferenceResponse,
        Preference,
        MarketKind,
        TradingStyle,
    )),
    paths(
        crate::routes::health::health_check,
        crate::routes::webhook::receive_signal,
        crate::routes::preferences::create_preference,
        crate::routes::preferences::list_preferences,
        crate::routes::preferences::delete_preference,
        crate::routes::preferences::delete_all_preferences,
        crate::routes::preferences::delete_preference_by_id,
    )
)]
pub struct ApiDoc;

/// Swagger UI 라우터 생성.
///
/// - `/swagger-ui` - Swagger UI 대화형 문서
/// - `/api-docs/openapi.json` - OpenAPI JSON 스펙
pub fn swagger_ui_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_valid() {
        let spec = ApiDoc::openapi();
        let json = serde_json::to_string_pretty(&spec).unwrap();

        assert!(json.contains("Sigbot Signal Relay API"));
        assert!(json.contains("/health"));
        assert!(json.contains("/webhook/signal"));
        assert!(json.contains("/api/v1/preferences/{user_id}/{instrument}"));
        assert!(json.contains("/api/v1/preferences/id/{id}"));
    }

    #[test]
    fn test_openapi_contains_schemas() {
        let json = serde_json::to_string(&ApiDoc::openapi()).unwrap();

        assert!(json.contains("DispatchReport"));
        assert!(json.contains("CreatePreferenceRequest"));
        assert!(json.contains("ApiErrorResponse"));
    }

    #[test]
    fn test_swagger_ui_router_creates() {
        let _router: Router<()> = swagger_ui_router();
    }
}
