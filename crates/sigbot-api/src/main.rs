//! 신호 중계 API 서버.
//!
//! Axum 기반 웹훅/REST 서버와 Telegram 구독 관리 봇을 시작합니다.

use std::{future::IntoFuture, sync::Arc, time::Duration};

use axum::{http::StatusCode, Router};
use sigbot_api::{
    mask_database_url,
    openapi::swagger_ui_router,
    repository::PgPreferenceRepository,
    routes::create_api_router,
    services::SubscriptionBot,
    AppState, ServerConfig,
};
use sigbot_core::{InMemoryPreferenceRepository, PreferenceRepository};
use sigbot_notification::{NotificationSender, TelegramSender};
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info, warn};

/// 선호 설정 저장소 생성.
///
/// `DATABASE_URL`이 없으면 메모리 저장소를 사용합니다.
async fn create_repository(
    config: &ServerConfig,
) -> Result<Arc<dyn PreferenceRepository>, Box<dyn std::error::Error>> {
    let Some(database_url) = config.database_url.as_deref() else {
        warn!("DATABASE_URL not set, using in-memory preference store (data is not persisted)");
        return Ok(Arc::new(InMemoryPreferenceRepository::new()));
    };

    info!(url = %mask_database_url(database_url), "Connecting to PostgreSQL");
    let repository =
        PgPreferenceRepository::connect(database_url, config.database_max_connections)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to connect to database");
                e
            })?;

    if config.run_migrations {
        repository.migrate().await?;
    }

    Ok(Arc::new(repository))
}

/// CORS 레이어 생성.
fn cors_layer() -> CorsLayer {
    let allow_origin = match std::env::var("CORS_ORIGINS") {
        Ok(origins) if !origins.is_empty() => {
            let origins: Vec<_> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();

            if origins.is_empty() {
                warn!("CORS_ORIGINS is set but contains no valid origins, allowing any");
                AllowOrigin::any()
            } else {
                info!("CORS configured with {} allowed origins", origins.len());
                AllowOrigin::list(origins)
            }
        }
        _ => AllowOrigin::any(),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

/// 전체 라우터 생성.
fn create_router(state: Arc<AppState>) -> Router {
    create_api_router(state)
        .merge(swagger_ui_router())
        .layer(TraceLayer::new_for_http())
        // 전역 타임아웃 (30초) - 408 상태 코드 반환
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(cors_layer())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sigbot_api=info,sigbot_core=info,tower_http=info".into()),
        )
        .init();

    info!("Starting signal relay API server...");

    let config = ServerConfig::from_env();
    let addr = config.socket_addr().map_err(|e| {
        error!(
            host = %config.host,
            port = config.port,
            error = %e,
            "소켓 주소 설정이 유효하지 않습니다. API_HOST, API_PORT 환경변수를 확인하세요."
        );
        e
    })?;

    let repository = create_repository(&config).await?;

    let telegram = TelegramSender::from_env().map(Arc::new);
    if telegram.is_none() {
        warn!("TELEGRAM_BOT_TOKEN not set, matched signals will not be delivered");
    }

    let mut state = AppState::new(repository.clone())
        .with_webhook_secret(config.webhook_secret.clone());
    if let Some(sender) = &telegram {
        state = state.with_sender(sender.clone() as Arc<dyn NotificationSender>);
    }
    if state.webhook_secret.is_none() {
        warn!("WEBHOOK_SECRET not set, webhook accepts unauthenticated requests");
    }
    let state = Arc::new(state);

    info!(
        version = %state.version,
        store = state.repository.backend(),
        notifications = state.notifications_enabled(),
        "Application state initialized"
    );

    // 전역 종료 토큰 (백그라운드 태스크 종료 전파용)
    let shutdown_token = CancellationToken::new();

    let bot = telegram
        .as_ref()
        .filter(|sender| config.bot_commands && sender.is_enabled())
        .map(|sender| SubscriptionBot::new(sender.bot().clone(), repository.clone()));

    let app = create_router(state);

    info!(%addr, "API server listening");
    info!("Swagger UI available at http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_token.clone()))
        .into_future();

    // 봇은 서버와 같은 종료 토큰으로 함께 멈춘다
    let bot_token = shutdown_token.clone();
    let bot_task = async move {
        if let Some(bot) = bot {
            bot.run(bot_token).await;
        }
    };

    let (server_result, ()) = tokio::join!(
        async {
            let result = server.await;
            shutdown_token.cancel();
            result
        },
        bot_task
    );
    server_result?;

    info!("Server stopped gracefully");

    Ok(())
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM 시그널을 수신하면 종료 토큰을 취소합니다.
async fn shutdown_signal(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }

    shutdown_token.cancel();
    info!("Shutdown signal propagated to background tasks");
}
