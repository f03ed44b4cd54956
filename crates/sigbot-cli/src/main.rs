//! 신호 중계 봇 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 타임프레임 정규화 결과 확인
//! sigbot normalize 60 '"4H"' 1440
//!
//! # 심볼 시장 분류
//! sigbot detect EURUSD XAUUSD BTCUSDT
//!
//! # JSON 스냅샷으로 오프라인 매칭
//! sigbot match --signal '{"instrument":"EURUSD","interval":"60"}' --preferences prefs.json
//!
//! # 마이그레이션 적용 (DATABASE_URL 또는 --db-url)
//! sigbot migrate
//! ```

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::info;

mod commands;

use commands::{
    inspect::{detect_lines, normalize_lines},
    matching::{load_snapshot, run_match},
    migrate::apply_migrations,
};

#[derive(Parser)]
#[command(name = "sigbot")]
#[command(about = "Signal relay bot CLI - 타임프레임/시장 판별, 오프라인 매칭, 마이그레이션", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 타임프레임 표기를 정규화
    Normalize {
        /// 타임프레임 표기 (예: 60, "1h", 4H)
        #[arg(required = true)]
        timeframes: Vec<String>,
    },

    /// 심볼의 시장 분류
    Detect {
        /// 종목 심볼 (예: EURUSD, XAUUSD)
        #[arg(required = true)]
        symbols: Vec<String>,
    },

    /// JSON 스냅샷에 대해 신호 매칭 실행
    Match {
        /// 신호 JSON 객체
        #[arg(short, long)]
        signal: String,

        /// 선호 설정 배열 JSON 파일
        #[arg(short, long)]
        preferences: PathBuf,
    },

    /// user_preferences 마이그레이션 적용
    Migrate {
        /// 데이터베이스 URL (기본: DATABASE_URL 환경변수)
        #[arg(long)]
        db_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env 파일 로드 (없어도 에러 안남)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sigbot=info,sigbot_core=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Normalize { timeframes } => {
            for line in normalize_lines(&timeframes) {
                println!("{}", line);
            }
        }

        Commands::Detect { symbols } => {
            for line in detect_lines(&symbols) {
                println!("{}", line);
            }
        }

        Commands::Match {
            signal,
            preferences,
        } => {
            let snapshot = load_snapshot(&preferences)?;
            let result = run_match(&signal, &snapshot)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Commands::Migrate { db_url } => {
            let Some(db_url) = db_url.or_else(|| std::env::var("DATABASE_URL").ok()) else {
                bail!("DATABASE_URL is not set; pass --db-url");
            };
            apply_migrations(&db_url).await?;
            info!("마이그레이션 완료");
        }
    }

    Ok(())
}
