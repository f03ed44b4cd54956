//! 외부 호출 속도 제한.
//!
//! 외부 API를 호출하는 컴포넌트가 직접 소유하는 슬라이딩 윈도우 제한기입니다.
//! 시계는 주입받으므로 테스트에서 시간을 직접 움직일 수 있습니다.
//!
//! ```rust,ignore
//! let limiter = RateLimiter::new(25, Duration::from_secs(1));
//! limiter.acquire().await;
//! bot.send_message(chat_id, text).await?;
//! ```

use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard},
    time::Duration,
};

use tokio::time::Instant;

/// 현재 시각 공급자.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// tokio 런타임 시계. `tokio::time::pause()` 상태에서도 일관되게 동작합니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// 수동으로 전진시키는 시계 (테스트용).
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    /// 시계를 앞으로 움직입니다.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// 슬라이딩 윈도우 속도 제한기.
///
/// `window` 동안 최대 `max_calls`번 호출을 허용합니다.
#[derive(Debug)]
pub struct RateLimiter<C: Clock = SystemClock> {
    clock: C,
    max_calls: usize,
    window: Duration,
    calls: Mutex<VecDeque<Instant>>,
}

impl RateLimiter<SystemClock> {
    /// 시스템 시계를 사용하는 제한기 생성.
    pub fn new(max_calls: usize, window: Duration) -> Self {
        Self::with_clock(SystemClock, max_calls, window)
    }

    /// 초당 호출 수 기준 제한기 생성.
    pub fn per_second(max_calls: usize) -> Self {
        Self::new(max_calls, Duration::from_secs(1))
    }
}

impl<C: Clock> RateLimiter<C> {
    /// 주입된 시계로 제한기 생성. `max_calls`는 최소 1입니다.
    pub fn with_clock(clock: C, max_calls: usize, window: Duration) -> Self {
        Self {
            clock,
            max_calls: max_calls.max(1),
            window,
            calls: Mutex::new(VecDeque::new()),
        }
    }

    /// 윈도우당 허용 호출 수.
    pub fn max_calls(&self) -> usize {
        self.max_calls
    }

    /// 슬롯이 있으면 차지하고 `true`를 반환합니다.
    pub fn try_acquire(&self) -> bool {
        let now = self.clock.now();
        let mut calls = self.pruned_calls(now);

        if calls.len() < self.max_calls {
            calls.push_back(now);
            true
        } else {
            false
        }
    }

    /// 다음 슬롯이 열릴 때까지 남은 시간. 지금 호출 가능하면 `None`.
    pub fn wait_time(&self) -> Option<Duration> {
        let now = self.clock.now();
        let calls = self.pruned_calls(now);

        if calls.len() < self.max_calls {
            return None;
        }
        calls
            .front()
            .map(|oldest| (*oldest + self.window).saturating_duration_since(now))
    }

    /// 슬롯이 열릴 때까지 기다린 뒤 차지합니다.
    pub async fn acquire(&self) {
        loop {
            if self.try_acquire() {
                return;
            }
            let wait = self
                .wait_time()
                .unwrap_or(Duration::from_millis(1))
                .max(Duration::from_millis(1));
            tokio::time::sleep(wait).await;
        }
    }

    fn pruned_calls(&self, now: Instant) -> MutexGuard<'_, VecDeque<Instant>> {
        let mut calls = self.calls.lock().unwrap_or_else(|e| e.into_inner());
        while let Some(oldest) = calls.front() {
            if *oldest + self.window <= now {
                calls.pop_front();
            } else {
                break;
            }
        }
        calls
    }
}
