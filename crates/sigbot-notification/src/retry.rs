//! 전송 재시도 유틸리티.
//!
//! 네트워크 오류, 요청 한도 초과 등 일시적인 오류에 대해 자동 재시도를 수행합니다.
//!
//! ```rust,ignore
//! use sigbot_notification::retry::{with_retry, RetryConfig};
//!
//! let result = with_retry(&RetryConfig::default(), || async {
//!     sender.send_text(chat_id, &text).await
//! })
//! .await;
//! ```

use std::{future::Future, time::Duration};

use rand::Rng;
use tracing::{debug, warn};

use crate::NotificationError;

/// 재시도 설정.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// 최대 재시도 횟수 (초기 시도 제외).
    pub max_retries: u32,
    /// 기본 대기 시간 (에러에 지정된 대기 시간이 없을 때 사용).
    pub base_delay: Duration,
    /// 최대 대기 시간.
    pub max_delay: Duration,
    pub use_exponential_backoff: bool,
    pub backoff_multiplier: f64,
    /// 지터(±25%) 추가 여부.
    pub add_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            use_exponential_backoff: true,
            backoff_multiplier: 2.0,
            add_jitter: true,
        }
    }
}

impl RetryConfig {
    /// 재시도 없음 (단일 시도).
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// 대기 시간 계산.
    fn calculate_delay(&self, attempt: u32, error: &NotificationError) -> Duration {
        // 에러에 지정된 대기 시간이 있으면 그대로 따른다
        if let Some(ms) = error.retry_delay_ms() {
            return Duration::from_millis(ms).min(self.max_delay);
        }

        let delay = if self.use_exponential_backoff && attempt > 0 {
            let multiplier = self.backoff_multiplier.powi(attempt as i32);
            Duration::from_secs_f64(self.base_delay.as_secs_f64() * multiplier)
        } else {
            self.base_delay
        };
        let delay = delay.min(self.max_delay);

        if self.add_jitter {
            let jitter_range = delay.as_millis() as f64 * 0.25;
            let jitter = rand::thread_rng().gen_range(-1.0..=1.0) * jitter_range;
            Duration::from_millis((delay.as_millis() as f64 + jitter).max(0.0) as u64)
        } else {
            delay
        }
    }
}

/// 재시도가 포함된 비동기 작업 실행.
///
/// 치명적이거나 재시도 불가능한 에러는 즉시 반환하고,
/// 그 외에는 `max_retries`회까지 대기 후 다시 시도합니다.
pub async fn with_retry<T, F, Fut>(
    config: &RetryConfig,
    operation: F,
) -> Result<T, NotificationError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, NotificationError>>,
{
    let mut attempt = 0;
    let mut total_delay = Duration::ZERO;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!(
                        attempts = attempt + 1,
                        total_delay_ms = total_delay.as_millis(),
                        "재시도 후 전송 성공"
                    );
                }
                return Ok(result);
            }
            Err(e) => {
                if e.is_fatal() || !e.is_retryable() {
                    debug!(error = %e, "재시도 불가능한 에러, 즉시 실패 반환");
                    return Err(e);
                }

                if attempt >= config.max_retries {
                    warn!(
                        error = %e,
                        attempts = attempt + 1,
                        max_retries = config.max_retries,
                        "최대 재시도 횟수 초과"
                    );
                    return Err(e);
                }

                let delay = config.calculate_delay(attempt, &e);
                total_delay += delay;

                warn!(
                    error = %e,
                    attempt = attempt + 1,
                    max_retries = config.max_retries,
                    delay_ms = delay.as_millis(),
                    "재시도 대기 중"
                );

                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
