//! 신호 전달 서비스.
//!
//! 웹훅으로 들어온 신호마다 최신 스냅샷으로 구독자를 찾고,
//! 각 구독자의 개인 채팅으로 알림을 보냅니다.
//!
//! ```text
//! webhook ── InboundSignal ──> find_subscribers ──> Vec<Subscriber>
//!                                                       │
//!                                   NotificationSender <┘ (chat_id = user_id)
//! ```

use std::sync::Arc;

use serde::Serialize;
use sigbot_core::{find_subscribers, InboundSignal, PreferenceRepository, Subscriber};
use sigbot_notification::{Notification, NotificationEvent, NotificationSender};
use tracing::{debug, info, warn};
use utoipa::ToSchema;

/// 신호 처리 결과.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DispatchReport {
    /// 신호 종목
    pub instrument: String,
    /// 매칭에 사용한 시장 (명시 값 또는 종목으로 판별한 값)
    pub market: String,
    /// 정규화된 타임프레임
    pub timeframe: String,
    /// 매칭된 구독자 수
    pub matched: usize,
    /// 전송 성공 수
    pub delivered: usize,
    /// 전송 실패 수
    pub failed: usize,
}

/// 신호 전달 서비스.
#[derive(Clone)]
pub struct SignalDispatchService {
    repository: Arc<dyn PreferenceRepository>,
    sender: Option<Arc<dyn NotificationSender>>,
}

impl SignalDispatchService {
    pub fn new(
        repository: Arc<dyn PreferenceRepository>,
        sender: Option<Arc<dyn NotificationSender>>,
    ) -> Self {
        Self { repository, sender }
    }

    /// 신호 하나를 처리합니다.
    ///
    /// 호출마다 스냅샷을 새로 읽으며 호출 간 공유 상태가 없습니다.
    /// 개별 전송 실패는 집계만 하고 나머지 구독자 전송을 계속합니다.
    pub async fn handle(&self, signal: &InboundSignal) -> DispatchReport {
        let outcome = find_subscribers(self.repository.as_ref(), signal).await;
        let timeframe = signal.canonical_timeframe().to_string();

        let mut report = DispatchReport {
            instrument: signal.instrument.clone(),
            market: signal.market_key(),
            timeframe,
            matched: outcome.subscribers.len(),
            delivered: 0,
            failed: 0,
        };

        debug!(
            instrument = %report.instrument,
            scanned = outcome.stats.scanned,
            duplicates = outcome.stats.duplicates,
            matched = report.matched,
            "웹훅 신호 매칭 결과"
        );

        if outcome.subscribers.is_empty() {
            return report;
        }

        let sender = match &self.sender {
            Some(sender) if sender.is_enabled() => sender,
            _ => {
                warn!(
                    instrument = %report.instrument,
                    matched = report.matched,
                    "알림 전송기가 없어 매칭 결과를 전달하지 않습니다"
                );
                return report;
            }
        };

        for subscriber in &outcome.subscribers {
            let notification = build_notification(signal, subscriber);
            match sender.send(subscriber.user_id, &notification).await {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!(
                        user_id = subscriber.user_id,
                        sender = sender.name(),
                        error = %e,
                        "구독자 알림 전송 실패"
                    );
                    report.failed += 1;
                }
            }
        }

        info!(
            instrument = %report.instrument,
            timeframe = %report.timeframe,
            matched = report.matched,
            delivered = report.delivered,
            failed = report.failed,
            "신호 전달 완료"
        );

        report
    }
}

/// 구독자별 알림 생성.
pub fn build_notification(signal: &InboundSignal, subscriber: &Subscriber) -> Notification {
    Notification::new(NotificationEvent::SignalAlert {
        instrument: signal.instrument.clone(),
        market: subscriber.market.clone(),
        timeframe: subscriber.timeframe.to_string(),
        style: subscriber.style.map(|style| style.to_string()),
        action: signal
            .extra_str("action")
            .or_else(|| signal.extra_str("side")),
        price: signal.extra_str("price"),
        message: signal
            .extra_str("message")
            .or_else(|| signal.extra_str("text")),
    })
}
