//! API 라우터 통합 테스트.
//!
//! 메모리 저장소와 기록용 전송기로 라우터 전체를 호출합니다.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use sigbot_api::{routes::create_api_router, AppState};
use sigbot_core::{
    InMemoryPreferenceRepository, NewPreference, PreferenceRepository, TradingStyle,
};
use sigbot_notification::{
    Notification, NotificationError, NotificationEvent, NotificationResult, NotificationSender,
};
use tower::ServiceExt;

// ============================================================================
// 테스트 헬퍼
// ============================================================================

/// 전송 내역을 기록하는 전송기
#[derive(Default)]
struct RecordingSender {
    sent: Mutex<Vec<(i64, Notification)>>,
    unreachable: HashSet<i64>,
}

impl RecordingSender {
    fn failing_for(user_ids: &[i64]) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            unreachable: user_ids.iter().copied().collect(),
        }
    }

    fn recipients(&self) -> Vec<i64> {
        self.sent.lock().unwrap().iter().map(|(id, _)| *id).collect()
    }
}

#[async_trait]
impl NotificationSender for RecordingSender {
    async fn send(&self, chat_id: i64, notification: &Notification) -> NotificationResult<()> {
        if self.unreachable.contains(&chat_id) {
            return Err(NotificationError::Unreachable(chat_id));
        }
        self.sent
            .lock()
            .unwrap()
            .push((chat_id, notification.clone()));
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "recording"
    }
}

async fn seeded_repository() -> Arc<InMemoryPreferenceRepository> {
    let repo = Arc::new(InMemoryPreferenceRepository::new());
    for pref in [
        NewPreference::detected(1, "EURUSD", TradingStyle::Intraday),
        NewPreference::detected(2, "EURUSD", TradingStyle::Intraday),
        NewPreference::detected(3, "EURUSD", TradingStyle::Swing),
        NewPreference::detected(4, "BTCUSD", TradingStyle::Intraday),
    ] {
        repo.save_preference(pref).await.unwrap();
    }
    repo
}

fn app(state: AppState) -> Router {
    create_api_router(Arc::new(state))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

// ============================================================================
// 웹훅
// ============================================================================

#[tokio::test]
async fn test_webhook_delivers_to_matching_subscribers() {
    let sender = Arc::new(RecordingSender::default());
    let state = AppState::new(seeded_repository().await).with_sender(sender.clone());

    let response = app(state)
        .oneshot(json_request(
            "POST",
            "/webhook/signal",
            json!({"instrument": "EURUSD", "interval": "60", "action": "buy"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let report = body_json(response).await;
    assert_eq!(report["instrument"], "EURUSD");
    assert_eq!(report["market"], "forex");
    assert_eq!(report["timeframe"], "1h");
    assert_eq!(report["matched"], 2);
    assert_eq!(report["delivered"], 2);
    assert_eq!(report["failed"], 0);

    assert_eq!(sender.recipients(), vec![1, 2]);
    let sent = sender.sent.lock().unwrap();
    match &sent[0].1.event {
        NotificationEvent::SignalAlert { action, style, .. } => {
            assert_eq!(action.as_deref(), Some("buy"));
            assert_eq!(style.as_deref(), Some("intraday"));
        }
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn test_webhook_counts_failed_deliveries() {
    let sender = Arc::new(RecordingSender::failing_for(&[1]));
    let state = AppState::new(seeded_repository().await).with_sender(sender.clone());

    let response = app(state)
        .oneshot(json_request(
            "POST",
            "/webhook/signal",
            json!({"symbol": "EURUSD", "timeframe": "1h"}),
        ))
        .await
        .unwrap();

    let report = body_json(response).await;
    assert_eq!(report["matched"], 2);
    assert_eq!(report["delivered"], 1);
    assert_eq!(report["failed"], 1);
    assert_eq!(sender.recipients(), vec![2]);
}

#[tokio::test]
async fn test_webhook_explicit_market_matches_exactly() {
    let sender = Arc::new(RecordingSender::default());
    let state = AppState::new(seeded_repository().await).with_sender(sender.clone());

    let response = app(state)
        .oneshot(json_request(
            "POST",
            "/webhook/signal",
            json!({"instrument": "EURUSD", "interval": "1h", "market": "stocks"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let report = body_json(response).await;
    assert_eq!(report["market"], "stocks");
    assert_eq!(report["matched"], 0);

    let response = app(AppState::new(seeded_repository().await).with_sender(sender.clone()))
        .oneshot(json_request(
            "POST",
            "/webhook/signal",
            json!({"instrument": "EURUSD", "interval": "1h", "market": "Forex"}),
        ))
        .await
        .unwrap();
    let report = body_json(response).await;
    assert_eq!(report["market"], "Forex");
    assert_eq!(report["matched"], 0);
    assert!(sender.recipients().is_empty());
}

#[tokio::test]
async fn test_webhook_without_sender_only_matches() {
    let state = AppState::new(seeded_repository().await);

    let response = app(state)
        .oneshot(json_request(
            "POST",
            "/webhook/signal",
            json!({"instrument": "BTCUSD", "interval": "60"}),
        ))
        .await
        .unwrap();

    let report = body_json(response).await;
    assert_eq!(report["market"], "crypto");
    assert_eq!(report["matched"], 1);
    assert_eq!(report["delivered"], 0);
}

#[tokio::test]
async fn test_webhook_rejects_non_object_body() {
    let response = app(AppState::in_memory())
        .oneshot(json_request("POST", "/webhook/signal", json!(["EURUSD", "1h"])))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = body_json(response).await;
    assert_eq!(error["code"], "INVALID_SIGNAL");
}

#[tokio::test]
async fn test_webhook_secret() {
    let state = AppState::in_memory().with_webhook_secret(Some("s3cret".to_string()));
    let router = app(state);
    let payload = json!({"instrument": "EURUSD", "interval": "1h"});

    let response = router
        .clone()
        .oneshot(json_request("POST", "/webhook/signal", payload.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let mut request = json_request("POST", "/webhook/signal", payload.clone());
    request
        .headers_mut()
        .insert("x-webhook-secret", "s3cre".parse().unwrap());
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let mut request = json_request("POST", "/webhook/signal", payload);
    request
        .headers_mut()
        .insert("x-webhook-secret", "s3cret".parse().unwrap());
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================================
// 선호 설정 API
// ============================================================================

#[tokio::test]
async fn test_preference_crud() {
    let repo = Arc::new(InMemoryPreferenceRepository::new());
    let router = app(AppState::new(repo.clone()));

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/preferences",
            json!({"user_id": 11, "instrument": "xauusd", "style": "swing", "timeframe": "1h"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["saved"], true);
    assert_eq!(created["instrument"], "XAUUSD");
    assert_eq!(created["market"], "commodities");
    // 스타일과 다른 타임프레임은 보정된다
    assert_eq!(created["timeframe"], "4h");

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/preferences/11")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let listed = body_json(response).await;
    assert_eq!(listed["total"], 1);
    let id = listed["preferences"][0]["id"].as_i64().unwrap();

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/v1/preferences/id/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(body_json(response).await["deleted"], true);
    assert!(repo.is_empty().await);
}

#[tokio::test]
async fn test_delete_by_instrument_and_all() {
    let repo = seeded_repository().await;
    let router = app(AppState::new(repo.clone()));

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/v1/preferences/1/eurusd")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(body_json(response).await["deleted"], true);

    let response = router
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/v1/preferences/1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(body_json(response).await["deleted"], false);
    assert_eq!(repo.len().await, 3);
}

#[tokio::test]
async fn test_create_preference_validation() {
    let router = app(AppState::in_memory());

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/preferences",
            json!({"user_id": 1, "instrument": "EURUSD", "style": "yolo"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_STYLE");

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/preferences",
            json!({"user_id": 1, "instrument": "  ", "style": "swing"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health() {
    let response = app(AppState::in_memory())
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let health = body_json(response).await;
    assert_eq!(health["status"], "ok");
    assert_eq!(health["store"], "memory");
    assert_eq!(health["notifications_enabled"], false);
}
