//! 인사이트 캐시 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 펀더멘털 지표 조회 (캐시 → 시장 데이터 Provider → 합성 fallback)
//! trader fundamentals AAPL
//!
//! # 리스크 매니저 관점의 분석
//! trader perspective risk_manager AAPL
//!
//! # 모든 에이전트의 분석
//! trader panel NVDA
//!
//! # 심볼 관련 캐시 무효화
//! trader invalidate --symbol AAPL
//! trader invalidate fundamentals perspectives
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::error;
use trader_core::{init_logging, AppConfig, LogConfig};

mod commands;

#[derive(Parser)]
#[command(name = "trader")]
#[command(about = "인사이트 캐시 CLI - 펀더멘털 지표 및 에이전트 분석 조회", long_about = None)]
#[command(version)]
struct Cli {
    /// 설정 파일 경로 (없으면 기본값과 환경 변수만 사용)
    #[arg(short, long, global = true, default_value = "config/default.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 펀더멘털 지표 조회
    Fundamentals {
        /// 종목 심볼 (예: AAPL)
        symbol: String,
    },

    /// 에이전트 한 명의 분석 조회
    Perspective {
        /// 에이전트 (value_investor, growth_investor, contrarian, macro_strategist, risk_manager)
        agent: String,

        /// 종목 심볼
        symbol: String,
    },

    /// 모든 에이전트의 분석 조회
    Panel {
        /// 종목 심볼
        symbol: String,
    },

    /// 태그 기반 캐시 무효화
    Invalidate {
        /// 무효화할 태그 (예: fundamentals, perspectives, agent:contrarian)
        tags: Vec<String>,

        /// 심볼 관련 항목 전체 무효화
        #[arg(short, long)]
        symbol: Option<String>,
    },

    /// 캐시 통계 출력
    Stats {
        /// 출력 후 통계 초기화
        #[arg(long, default_value = "false")]
        reset: bool,
    },

    /// 캐시 백엔드 상태 점검
    Health,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env는 선택 사항
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config)
        .with_context(|| format!("설정 로드 실패: {}", cli.config))?;

    init_logging(LogConfig::from(&config.logging))
        .map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {}", e))?;

    let service = commands::build_service(&config).await;

    let result = match &cli.command {
        Commands::Fundamentals { symbol } => commands::insight::fundamentals(&service, symbol).await,
        Commands::Perspective { agent, symbol } => {
            commands::insight::perspective(&service, agent, symbol).await
        }
        Commands::Panel { symbol } => commands::insight::panel(&service, symbol).await,
        Commands::Invalidate { tags, symbol } => {
            commands::cache::invalidate(&service, tags, symbol.as_deref()).await
        }
        Commands::Stats { reset } => commands::cache::stats(&service, *reset).await,
        Commands::Health => commands::cache::health(&service).await,
    };

    if let Err(e) = &result {
        error!(error = %e, "Command failed");
    }

    service.shutdown();
    result
}
