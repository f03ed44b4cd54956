//! 서비스 모듈.
//!
//! 신호 전달과 Telegram 구독 관리 봇을 제공합니다.

pub mod signal_dispatch;
pub mod telegram_bot;

pub use signal_dispatch::{build_notification, DispatchReport, SignalDispatchService};
pub use telegram_bot::{parse_subscribe_args, Command, SubscribeArgs, SubscriptionBot};
