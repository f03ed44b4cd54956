//! Telegram 알림 서비스.
//!
//! Bot API로 구독자 채팅에 신호 알림을 전송합니다.
//! 사용자 ID가 곧 개인 채팅 ID입니다.

use std::time::Duration;

use async_trait::async_trait;
use sigbot_core::RateLimiter;
use teloxide::{
    prelude::*,
    types::{ChatId, ParseMode},
    utils::html,
    ApiError, RequestError,
};
use tracing::{debug, warn};

use crate::{
    retry::{with_retry, RetryConfig},
    types::{
        Notification, NotificationError, NotificationEvent, NotificationPriority,
        NotificationResult, NotificationSender,
    },
};

/// Bot API 권장 한도 (초당 메시지 수)
const DEFAULT_RATE_LIMIT_PER_SEC: usize = 25;

/// Telegram 알림 전송 설정.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// 봇 토큰
    pub bot_token: String,
    /// 전송 활성화 여부
    pub enabled: bool,
    /// 초당 최대 전송 수
    pub rate_limit_per_sec: usize,
}

impl TelegramConfig {
    /// 새 Telegram 설정을 생성합니다.
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            enabled: true,
            rate_limit_per_sec: DEFAULT_RATE_LIMIT_PER_SEC,
        }
    }

    /// 환경 변수에서 설정을 생성합니다. 토큰이 없으면 `None`.
    pub fn from_env() -> Option<Self> {
        let bot_token = std::env::var("TELEGRAM_BOT_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty())?;
        let enabled = std::env::var("TELEGRAM_ENABLED")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(true);
        let rate_limit_per_sec = std::env::var("TELEGRAM_RATE_LIMIT_PER_SEC")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_RATE_LIMIT_PER_SEC);

        Some(Self {
            bot_token,
            enabled,
            rate_limit_per_sec,
        })
    }
}

/// Telegram 알림 전송기.
pub struct TelegramSender {
    config: TelegramConfig,
    bot: Bot,
    limiter: RateLimiter,
    retry: RetryConfig,
}

impl TelegramSender {
    /// 새 Telegram 전송기를 생성합니다.
    pub fn new(config: TelegramConfig) -> Self {
        let bot = Bot::new(&config.bot_token);
        let limiter = RateLimiter::new(config.rate_limit_per_sec, Duration::from_secs(1));

        Self {
            config,
            bot,
            limiter,
            retry: RetryConfig::default(),
        }
    }

    /// 환경 변수에서 전송기를 생성합니다.
    pub fn from_env() -> Option<Self> {
        TelegramConfig::from_env().map(Self::new)
    }

    /// 재시도 설정을 교체합니다.
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// 명령 처리기와 공유하는 봇 핸들.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    /// HTML 메시지를 전송합니다.
    pub async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        silent: bool,
    ) -> NotificationResult<()> {
        with_retry(&self.retry, || async {
            self.limiter.acquire().await;
            self.bot
                .send_message(ChatId(chat_id), text)
                .parse_mode(ParseMode::Html)
                .disable_notification(silent)
                .await
                .map(|_| ())
                .map_err(|e| map_request_error(chat_id, e))
        })
        .await
    }
}

/// teloxide 요청 에러를 알림 에러로 변환합니다.
pub fn map_request_error(chat_id: i64, err: RequestError) -> NotificationError {
    match err {
        RequestError::RetryAfter(secs) => {
            NotificationError::RateLimited(u64::from(secs.seconds()))
        }
        RequestError::Network(e) => NotificationError::NetworkError(e.to_string()),
        RequestError::Api(
            ApiError::BotBlocked
            | ApiError::ChatNotFound
            | ApiError::UserDeactivated
            | ApiError::BotKicked,
        ) => NotificationError::Unreachable(chat_id),
        other => NotificationError::SendFailed(other.to_string()),
    }
}

/// 알림을 Telegram HTML 메시지로 포맷합니다.
pub fn format_html(notification: &Notification) -> String {
    match &notification.event {
        NotificationEvent::SignalAlert {
            instrument,
            market,
            timeframe,
            style,
            action,
            price,
            message,
        } => {
            let emoji = match action.as_deref().map(str::to_lowercase).as_deref() {
                Some("buy") | Some("long") => "🟢",
                Some("sell") | Some("short") => "🔴",
                _ => "📡",
            };

            let mut lines = vec![match action {
                Some(action) => format!(
                    "{} <b>{}</b> <code>{}</code>",
                    emoji,
                    html::escape(&action.to_uppercase()),
                    html::escape(instrument)
                ),
                None => format!(
                    "{} <b>Signal</b> <code>{}</code>",
                    emoji,
                    html::escape(instrument)
                ),
            }];

            lines.push(format!("Market: {}", html::escape(market)));
            match style {
                Some(style) => lines.push(format!(
                    "Timeframe: {} ({})",
                    html::escape(timeframe),
                    html::escape(style)
                )),
                None => lines.push(format!("Timeframe: {}", html::escape(timeframe))),
            }
            if let Some(price) = price {
                lines.push(format!("Price: {}", html::escape(price)));
            }
            if let Some(message) = message {
                lines.push(String::new());
                lines.push(html::escape(message));
            }

            lines.join("\n")
        }

        NotificationEvent::SystemError {
            error_code,
            message,
        } => format!(
            "🚨 <b>System error</b> <code>{}</code>\n{}",
            html::escape(error_code),
            html::escape(message)
        ),

        NotificationEvent::Custom { title, message } => {
            format!("<b>{}</b>\n{}", html::escape(title), html::escape(message))
        }
    }
}

#[async_trait]
impl NotificationSender for TelegramSender {
    async fn send(&self, chat_id: i64, notification: &Notification) -> NotificationResult<()> {
        if !self.is_enabled() {
            debug!(chat_id, "Telegram 알림이 비활성화되어 있습니다");
            return Err(NotificationError::Disabled);
        }

        let text = format_html(notification);
        let silent = notification.priority == NotificationPriority::Low;

        self.send_text(chat_id, &text, silent).await.inspect_err(|e| {
            warn!(chat_id, error = %e, "Telegram 전송 실패");
        })
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled && !self.config.bot_token.is_empty()
    }

    fn name(&self) -> &str {
        "telegram"
    }
}
