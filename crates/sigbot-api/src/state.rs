//! 애플리케이션 공유 상태.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sigbot_core::{InMemoryPreferenceRepository, PreferenceRepository};
use sigbot_notification::NotificationSender;

use crate::services::SignalDispatchService;

/// 핸들러 간 공유 상태.
pub struct AppState {
    /// 선호 설정 저장소
    pub repository: Arc<dyn PreferenceRepository>,
    /// 알림 전송기 (미설정 시 매칭만 수행)
    pub sender: Option<Arc<dyn NotificationSender>>,
    /// 웹훅 공유 비밀값
    pub webhook_secret: Option<String>,
    pub version: String,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(repository: Arc<dyn PreferenceRepository>) -> Self {
        Self {
            repository,
            sender: None,
            webhook_secret: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: Utc::now(),
        }
    }

    /// 메모리 저장소를 사용하는 상태.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryPreferenceRepository::new()))
    }

    pub fn with_sender(mut self, sender: Arc<dyn NotificationSender>) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn with_webhook_secret(mut self, secret: Option<String>) -> Self {
        self.webhook_secret = secret;
        self
    }

    /// 알림 전송 가능 여부.
    pub fn notifications_enabled(&self) -> bool {
        self.sender.as_ref().is_some_and(|s| s.is_enabled())
    }

    /// 신호 전달 서비스.
    pub fn dispatcher(&self) -> SignalDispatchService {
        SignalDispatchService::new(self.repository.clone(), self.sender.clone())
    }
}
