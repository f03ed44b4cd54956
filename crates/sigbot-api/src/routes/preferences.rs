//! 구독 선호 설정 API 라우트.
//!
//! Telegram 명령과 같은 등록/해지 기능을 REST로 제공합니다.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sigbot_core::{MarketKind, NewPreference, Preference, TradingStyle};
use utoipa::ToSchema;

use crate::{
    error::{api_error, domain_error, store_error, ApiErrorResponse, ApiResult},
    AppState,
};

// ==================== Request/Response 타입 ====================

/// 구독 등록 요청.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePreferenceRequest {
    /// Telegram 사용자 ID
    pub user_id: i64,
    #[schema(example = "EURUSD")]
    pub instrument: String,
    /// 트레이딩 스타일 (`test`, `scalp`, `scalp30`, `intraday`, `swing`)
    #[schema(example = "intraday")]
    pub style: String,
    /// 시장. 없으면 종목으로 판별합니다.
    pub market: Option<String>,
    /// 스타일과 다르면 스타일의 타임프레임으로 보정됩니다.
    pub timeframe: Option<String>,
}

/// 구독 등록 응답.
#[derive(Debug, Serialize, ToSchema)]
pub struct CreatePreferenceResponse {
    pub saved: bool,
    pub user_id: i64,
    pub market: MarketKind,
    pub instrument: String,
    pub style: TradingStyle,
    #[schema(example = "1h")]
    pub timeframe: String,
}

/// 구독 목록 응답.
#[derive(Debug, Serialize, ToSchema)]
pub struct ListPreferencesResponse {
    pub user_id: i64,
    pub total: usize,
    pub preferences: Vec<Preference>,
}

/// 삭제 응답.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeletePreferenceResponse {
    /// 삭제된 행이 있었는지 여부
    pub deleted: bool,
}

// ==================== API 핸들러 ====================

/// 구독 등록.
#[utoipa::path(
    post,
    path = "/api/v1/preferences",
    tag = "preferences",
    request_body = CreatePreferenceRequest,
    responses(
        (status = 201, description = "구독 등록 성공", body = CreatePreferenceResponse),
        (status = 400, description = "잘못된 요청", body = ApiErrorResponse),
        (status = 503, description = "저장소 사용 불가", body = ApiErrorResponse)
    )
)]
pub async fn create_preference(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePreferenceRequest>,
) -> ApiResult<(StatusCode, Json<CreatePreferenceResponse>)> {
    if req.instrument.trim().is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "INVALID_INPUT",
            "instrument is required",
        ));
    }

    let style = req.style.parse::<TradingStyle>().map_err(domain_error)?;
    let mut preference = match req.market.as_deref().map(str::trim) {
        Some(market) if !market.is_empty() => {
            let market = market.parse::<MarketKind>().map_err(domain_error)?;
            NewPreference::new(req.user_id, market, &req.instrument, style)
        }
        _ => NewPreference::detected(req.user_id, &req.instrument, style),
    };
    if let Some(timeframe) = req.timeframe.as_deref() {
        preference = preference.with_timeframe(timeframe);
    }

    let response = CreatePreferenceResponse {
        saved: false,
        user_id: preference.user_id,
        market: preference.market,
        instrument: preference.instrument.clone(),
        style: preference.style,
        timeframe: preference.timeframe.to_string(),
    };

    let saved = state
        .repository
        .save_preference(preference)
        .await
        .map_err(store_error)?;

    Ok((
        StatusCode::CREATED,
        Json(CreatePreferenceResponse { saved, ..response }),
    ))
}

/// 사용자 구독 목록 조회.
#[utoipa::path(
    get,
    path = "/api/v1/preferences/{user_id}",
    tag = "preferences",
    params(("user_id" = i64, Path, description = "Telegram 사용자 ID")),
    responses(
        (status = 200, description = "구독 목록", body = ListPreferencesResponse),
        (status = 503, description = "저장소 사용 불가", body = ApiErrorResponse)
    )
)]
pub async fn list_preferences(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<ListPreferencesResponse>> {
    let preferences = state
        .repository
        .list_for_user(user_id)
        .await
        .map_err(store_error)?;

    Ok(Json(ListPreferencesResponse {
        user_id,
        total: preferences.len(),
        preferences,
    }))
}

/// 특정 종목 구독 해지.
#[utoipa::path(
    delete,
    path = "/api/v1/preferences/{user_id}/{instrument}",
    tag = "preferences",
    params(
        ("user_id" = i64, Path, description = "Telegram 사용자 ID"),
        ("instrument" = String, Path, description = "종목 (대소문자 무시)")
    ),
    responses(
        (status = 200, description = "삭제 결과", body = DeletePreferenceResponse),
        (status = 503, description = "저장소 사용 불가", body = ApiErrorResponse)
    )
)]
pub async fn delete_preference(
    State(state): State<Arc<AppState>>,
    Path((user_id, instrument)): Path<(i64, String)>,
) -> ApiResult<Json<DeletePreferenceResponse>> {
    let deleted = state
        .repository
        .delete_preference(user_id, &instrument)
        .await
        .map_err(store_error)?;

    Ok(Json(DeletePreferenceResponse { deleted }))
}

/// 사용자 구독 전체 해지.
#[utoipa::path(
    delete,
    path = "/api/v1/preferences/{user_id}",
    tag = "preferences",
    params(("user_id" = i64, Path, description = "Telegram 사용자 ID")),
    responses(
        (status = 200, description = "삭제 결과", body = DeletePreferenceResponse),
        (status = 503, description = "저장소 사용 불가", body = ApiErrorResponse)
    )
)]
pub async fn delete_all_preferences(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<DeletePreferenceResponse>> {
    let deleted = state
        .repository
        .delete_all_preferences(user_id)
        .await
        .map_err(store_error)?;

    Ok(Json(DeletePreferenceResponse { deleted }))
}

/// ID로 구독 해지.
#[utoipa::path(
    delete,
    path = "/api/v1/preferences/id/{id}",
    tag = "preferences",
    params(("id" = i64, Path, description = "선호 설정 ID")),
    responses(
        (status = 200, description = "삭제 결과", body = DeletePreferenceResponse),
        (status = 503, description = "저장소 사용 불가", body = ApiErrorResponse)
    )
)]
pub async fn delete_preference_by_id(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<DeletePreferenceResponse>> {
    let deleted = state
        .repository
        .delete_preference_by_id(id)
        .await
        .map_err(store_error)?;

    Ok(Json(DeletePreferenceResponse { deleted }))
}

/// 선호 설정 라우터.
pub fn preferences_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_preference))
        .route("/id/{id}", delete(delete_preference_by_id))
        .route(
            "/{user_id}",
            get(list_preferences).delete(delete_all_preferences),
        )
        .route("/{user_id}/{instrument}", delete(delete_preference))
}
