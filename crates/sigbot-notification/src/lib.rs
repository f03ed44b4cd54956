//! # Sigbot Notification
//!
//! 매칭된 구독자에게 신호 알림을 전송합니다.
//!
//! - [`types`] - 알림 이벤트, 에러, 전송기 트레이트
//! - [`telegram`] - Telegram Bot API 전송기
//! - [`retry`] - 일시적 실패 재시도

pub mod retry;
pub mod telegram;
pub mod types;

pub use retry::{with_retry, RetryConfig};
pub use telegram::{format_html, TelegramConfig, TelegramSender};
pub use types::{
    Notification, NotificationError, NotificationEvent, NotificationPriority, NotificationResult,
    NotificationSender,
};
