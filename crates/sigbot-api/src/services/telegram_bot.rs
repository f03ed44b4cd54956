//! Telegram 구독 관리 봇.
//!
//! 사용자가 채팅 명령으로 신호 구독을 등록/해지합니다.
//! 개인 채팅에서는 chat_id가 사용자 ID이므로 그대로 `user_id`로 저장합니다.

use std::{sync::Arc, time::Duration};

use sigbot_core::{
    detect_market, MarketKind, NewPreference, PreferenceRepository, TradingStyle,
};
use teloxide::{prelude::*, types::ParseMode, utils::command::BotCommands, utils::html};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// 종료 요청 재시도 간격
const SHUTDOWN_RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// 봇 명령.
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "start receiving signals")]
    Start,
    #[command(description = "show this help")]
    Help,
    #[command(description = "list trading styles and their timeframes")]
    Styles,
    #[command(description = "subscribe: /subscribe EURUSD intraday [market]")]
    Subscribe(String),
    #[command(description = "unsubscribe: /unsubscribe EURUSD")]
    Unsubscribe(String),
    #[command(description = "list your subscriptions")]
    List,
    #[command(description = "remove all subscriptions")]
    Clear,
}

/// `/subscribe` 인자.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeArgs {
    pub instrument: String,
    pub style: TradingStyle,
    /// 명시한 시장. 없으면 심볼로 판별합니다.
    pub market: Option<MarketKind>,
}

impl SubscribeArgs {
    /// 등록 요청으로 변환합니다.
    pub fn into_new_preference(self, user_id: i64) -> NewPreference {
        let market = self
            .market
            .unwrap_or_else(|| detect_market(&self.instrument));
        NewPreference::new(user_id, market, &self.instrument, self.style)
    }
}

/// `/subscribe` 인자를 파싱합니다.
///
/// 형식: `<INSTRUMENT> <style> [market]`. 실패 시 사용자에게 보낼 안내 문구를 반환합니다.
pub fn parse_subscribe_args(args: &str) -> Result<SubscribeArgs, String> {
    let parts: Vec<&str> = args.split_whitespace().collect();

    let (instrument, style, market) = match parts.as_slice() {
        [instrument, style] => (*instrument, *style, None),
        [instrument, style, market] => (*instrument, *style, Some(*market)),
        _ => return Err("Usage: /subscribe &lt;INSTRUMENT&gt; &lt;style&gt; [market]".to_string()),
    };

    let style = style.parse::<TradingStyle>().map_err(|_| {
        format!(
            "Unknown style <code>{}</code>. Try /styles",
            html::escape(style)
        )
    })?;

    let market = market
        .map(|m| {
            m.parse::<MarketKind>().map_err(|_| {
                format!(
                    "Unknown market <code>{}</code>. Use one of: {}",
                    html::escape(m),
                    MarketKind::ALL.map(|k| k.as_str()).join(", ")
                )
            })
        })
        .transpose()?;

    Ok(SubscribeArgs {
        instrument: instrument.trim().to_uppercase(),
        style,
        market,
    })
}

/// 명령 하나를 처리하고 HTML 응답 문구를 반환합니다.
pub async fn handle_command(
    repository: &dyn PreferenceRepository,
    user_id: i64,
    command: Command,
) -> String {
    match command {
        Command::Start => format!(
            "Welcome! Subscribe to an instrument with /subscribe EURUSD intraday.\n\n{}",
            html::escape(&Command::descriptions().to_string())
        ),
        Command::Help => html::escape(&Command::descriptions().to_string()),
        Command::Styles => TradingStyle::ALL
            .iter()
            .map(|style| format!("<b>{}</b>: {}", style, style.timeframe()))
            .collect::<Vec<_>>()
            .join("\n"),
        Command::Subscribe(args) => {
            let args = match parse_subscribe_args(&args) {
                Ok(args) => args,
                Err(reply) => return reply,
            };
            let preference = args.into_new_preference(user_id);
            let summary = format!(
                "<code>{}</code> ({}, {} on {})",
                html::escape(&preference.instrument),
                preference.market,
                preference.style,
                preference.timeframe
            );

            match repository.save_preference(preference).await {
                Ok(true) => format!("✅ Subscribed to {}", summary),
                Ok(false) => "Subscription was not saved, please try again.".to_string(),
                Err(e) => {
                    error!(user_id, error = %e, "구독 저장 실패");
                    "Could not save your subscription right now.".to_string()
                }
            }
        }
        Command::Unsubscribe(instrument) => {
            let instrument = instrument.trim();
            if instrument.is_empty() {
                return "Usage: /unsubscribe &lt;INSTRUMENT&gt;".to_string();
            }
            match repository.delete_preference(user_id, instrument).await {
                Ok(true) => format!("Unsubscribed from <code>{}</code>", html::escape(instrument)),
                Ok(false) => format!(
                    "You are not subscribed to <code>{}</code>",
                    html::escape(instrument)
                ),
                Err(e) => {
                    error!(user_id, error = %e, "구독 해지 실패");
                    "Could not remove your subscription right now.".to_string()
                }
            }
        }
        Command::List => match repository.list_for_user(user_id).await {
            Ok(preferences) if preferences.is_empty() => {
                "You have no subscriptions. Use /subscribe to add one.".to_string()
            }
            Ok(preferences) => preferences
                .iter()
                .map(|p| {
                    format!(
                        "• <code>{}</code> {} ({}, {})",
                        html::escape(&p.instrument),
                        p.market,
                        p.style,
                        p.timeframe
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"),
            Err(e) => {
                error!(user_id, error = %e, "구독 목록 조회 실패");
                "Could not load your subscriptions right now.".to_string()
            }
        },
        Command::Clear => match repository.delete_all_preferences(user_id).await {
            Ok(true) => "All subscriptions removed.".to_string(),
            Ok(false) => "You have no subscriptions.".to_string(),
            Err(e) => {
                error!(user_id, error = %e, "구독 전체 삭제 실패");
                "Could not remove your subscriptions right now.".to_string()
            }
        },
    }
}

async fn answer(
    bot: Bot,
    msg: Message,
    command: Command,
    repository: Arc<dyn PreferenceRepository>,
) -> ResponseResult<()> {
    let reply = handle_command(repository.as_ref(), msg.chat.id.0, command).await;
    bot.send_message(msg.chat.id, reply)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// 구독 관리 봇 실행기.
pub struct SubscriptionBot {
    bot: Bot,
    repository: Arc<dyn PreferenceRepository>,
}

impl SubscriptionBot {
    pub fn new(bot: Bot, repository: Arc<dyn PreferenceRepository>) -> Self {
        Self { bot, repository }
    }

    /// 종료 토큰이 취소될 때까지 명령을 처리합니다.
    pub async fn run(self, shutdown: CancellationToken) {
        info!("Telegram 명령 처리기 시작");

        if let Err(e) = self.bot.set_my_commands(Command::bot_commands()).await {
            warn!(error = %e, "봇 명령 목록 등록 실패");
        }

        let handler = Update::filter_message()
            .filter_command::<Command>()
            .endpoint(answer);

        let mut dispatcher = Dispatcher::builder(self.bot, handler)
            .dependencies(dptree::deps![self.repository])
            .build();
        let dispatcher_token = dispatcher.shutdown_token();

        if shutdown.is_cancelled() {
            info!("Telegram 명령 처리기 종료 (시작 전 취소)");
            return;
        }

        // dispatch 루프는 끝까지 돌리고, 종료 요청은 별도 태스크가 전달한다
        let watcher = spawn_shutdown_watcher(shutdown, move || match dispatcher_token.shutdown() {
            Ok(_) => true,
            Err(e) => {
                // 디스패처가 아직 실행 상태가 아니면 다시 시도한다
                warn!(error = ?e, "Telegram 디스패처 종료 요청 실패");
                false
            }
        });

        dispatcher.dispatch().await;
        watcher.abort();

        info!("Telegram 명령 처리기 종료");
    }
}

/// 종료 토큰이 취소되면 `stop`이 `true`를 반환할 때까지 호출하는 태스크를 띄웁니다.
fn spawn_shutdown_watcher<F>(shutdown: CancellationToken, mut stop: F) -> JoinHandle<()>
where
    F: FnMut() -> bool + Send + 'static,
{
    tokio::spawn(async move {
        shutdown.cancelled().await;
        while !stop() {
            tokio::time::sleep(SHUTDOWN_RETRY_INTERVAL).await;
        }
    })
}
