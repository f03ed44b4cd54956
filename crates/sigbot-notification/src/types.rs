//! 알림 공통 타입.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 알림 우선순위.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    /// 무음 전송
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

/// 알림 이벤트.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationEvent {
    /// 웹훅으로 들어온 트레이딩 신호
    SignalAlert {
        instrument: String,
        market: String,
        timeframe: String,
        /// 수신자의 트레이딩 스타일
        style: Option<String>,
        /// 매수/매도 등 (페이로드의 `action` 또는 `side`)
        action: Option<String>,
        price: Option<String>,
        /// 페이로드의 자유 텍스트
        message: Option<String>,
    },

    /// 시스템 오류
    SystemError { error_code: String, message: String },

    /// 사용자 정의 메시지
    Custom { title: String, message: String },
}

/// 알림.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub event: NotificationEvent,
    pub priority: NotificationPriority,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    /// 기본 우선순위로 알림을 생성합니다.
    pub fn new(event: NotificationEvent) -> Self {
        let priority = match &event {
            NotificationEvent::SignalAlert { .. } => NotificationPriority::High,
            NotificationEvent::SystemError { .. } => NotificationPriority::Critical,
            NotificationEvent::Custom { .. } => NotificationPriority::Normal,
        };

        Self {
            event,
            priority,
            timestamp: Utc::now(),
        }
    }

    /// 우선순위를 지정합니다.
    pub fn with_priority(mut self, priority: NotificationPriority) -> Self {
        self.priority = priority;
        self
    }
}

/// 알림 전송 에러.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotificationError {
    #[error("network error: {0}")]
    NetworkError(String),

    #[error("send failed: {0}")]
    SendFailed(String),

    /// 요청 한도 초과 (재시도까지 대기할 초)
    #[error("rate limited, retry after {0}s")]
    RateLimited(u64),

    /// 사용자가 봇을 차단했거나 채팅을 찾을 수 없음
    #[error("chat {0} is unreachable")]
    Unreachable(i64),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("sender is disabled")]
    Disabled,
}

impl NotificationError {
    /// 재시도하면 성공할 수 있는 에러인지 여부.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            NotificationError::NetworkError(_) | NotificationError::RateLimited(_)
        )
    }

    /// 재시도해도 소용없는 에러인지 여부.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            NotificationError::Unreachable(_) | NotificationError::InvalidConfig(_)
        )
    }

    /// 에러가 지정한 재시도 대기 시간 (밀리초).
    pub fn retry_delay_ms(&self) -> Option<u64> {
        match self {
            NotificationError::RateLimited(secs) => Some(secs * 1000),
            _ => None,
        }
    }
}

/// 알림 결과 타입.
pub type NotificationResult<T> = Result<T, NotificationError>;

/// 알림 전송기.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// 지정한 채팅으로 알림을 전송합니다.
    async fn send(&self, chat_id: i64, notification: &Notification) -> NotificationResult<()>;

    /// 전송 활성화 여부.
    fn is_enabled(&self) -> bool;

    /// 전송기 이름.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_priorities() {
        let alert = Notification::new(NotificationEvent::SignalAlert {
            instrument: "EURUSD".to_string(),
            market: "forex".to_string(),
            timeframe: "1h".to_string(),
            style: None,
            action: None,
            price: None,
            message: None,
        });
        assert_eq!(alert.priority, NotificationPriority::High);

        let custom = Notification::new(NotificationEvent::Custom {
            title: "t".to_string(),
            message: "m".to_string(),
        })
        .with_priority(NotificationPriority::Low);
        assert_eq!(custom.priority, NotificationPriority::Low);
    }

    #[test]
    fn test_error_classification() {
        assert!(NotificationError::NetworkError("timeout".to_string()).is_retryable());
        assert!(NotificationError::RateLimited(3).is_retryable());
        assert_eq!(NotificationError::RateLimited(3).retry_delay_ms(), Some(3000));
        assert!(NotificationError::Unreachable(1).is_fatal());
        assert!(!NotificationError::SendFailed("bad request".to_string()).is_retryable());
    }
}
