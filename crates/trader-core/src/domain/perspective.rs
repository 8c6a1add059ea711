//! 에이전트 분석(Perspective) 도메인.
//!
//! 하나의 심볼을 서로 다른 투자 성향의 에이전트가 분석한 결과를 표현합니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TraderError;

/// 에이전트의 기본 성향.
///
/// 합성(synthetic) 분석 점수에 고정 오프셋으로 반영됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Bullish,
    Neutral,
    Bearish,
}

impl Disposition {
    /// 점수 오프셋.
    pub fn score_offset(&self) -> i32 {
        match self {
            Disposition::Bullish => 2,
            Disposition::Neutral => 0,
            Disposition::Bearish => -2,
        }
    }
}

/// 분석 에이전트 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// 내재가치와 안전마진 중심
    ValueInvestor,
    /// 매출/이익 성장 중심
    GrowthInvestor,
    /// 시장 합의에 반하는 관점
    Contrarian,
    /// 거시 환경과 섹터 로테이션 관점
    MacroStrategist,
    /// 하방 위험과 레버리지 관점
    RiskManager,
}

impl AgentKind {
    /// 모든 에이전트 종류.
    pub fn all() -> [AgentKind; 5] {
        [
            AgentKind::ValueInvestor,
            AgentKind::GrowthInvestor,
            AgentKind::Contrarian,
            AgentKind::MacroStrategist,
            AgentKind::RiskManager,
        ]
    }

    /// 캐시 키, 태그, CLI 인자에 쓰이는 식별자.
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::ValueInvestor => "value_investor",
            AgentKind::GrowthInvestor => "growth_investor",
            AgentKind::Contrarian => "contrarian",
            AgentKind::MacroStrategist => "macro_strategist",
            AgentKind::RiskManager => "risk_manager",
        }
    }

    pub fn disposition(&self) -> Disposition {
        match self {
            AgentKind::GrowthInvestor => Disposition::Bullish,
            AgentKind::ValueInvestor | AgentKind::MacroStrategist => Disposition::Neutral,
            AgentKind::Contrarian | AgentKind::RiskManager => Disposition::Bearish,
        }
    }

    /// AI Provider 프롬프트에 쓰이는 페르소나 설명.
    pub fn persona(&self) -> &'static str {
        match self {
            AgentKind::ValueInvestor => {
                "a disciplined value investor who focuses on intrinsic value, \
                 margin of safety and durable profitability"
            }
            AgentKind::GrowthInvestor => {
                "a growth investor who prioritizes revenue acceleration, \
                 market expansion and reinvestment opportunities"
            }
            AgentKind::Contrarian => {
                "a contrarian investor who questions consensus narratives \
                 and looks for mispriced pessimism or euphoria"
            }
            AgentKind::MacroStrategist => {
                "a macro strategist who weighs interest rates, sector rotation \
                 and economic cycles against company fundamentals"
            }
            AgentKind::RiskManager => {
                "a risk manager who concentrates on leverage, downside scenarios \
                 and balance sheet resilience"
            }
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentKind {
    type Err = TraderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        AgentKind::all()
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| TraderError::InvalidInput(format!("Unknown agent kind: {}", s)))
    }
}

/// 투자 의견.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    /// 긍정
    Buy,
    /// 중립
    Hold,
    /// 부정
    Sell,
}

impl Recommendation {
    /// AI 응답의 느슨한 표현을 의견으로 해석합니다.
    ///
    /// "strong buy", "bullish", "positive" 등을 허용합니다.
    pub fn parse_lenient(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase();
        match normalized.as_str() {
            "buy" | "strong buy" | "strong_buy" | "bullish" | "positive" | "outperform" => {
                Some(Recommendation::Buy)
            }
            "hold" | "neutral" | "market perform" | "market_perform" => Some(Recommendation::Hold),
            "sell" | "strong sell" | "strong_sell" | "bearish" | "negative" | "underperform" => {
                Some(Recommendation::Sell)
            }
            _ => None,
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::Buy => write!(f, "buy"),
            Recommendation::Hold => write!(f, "hold"),
            Recommendation::Sell => write!(f, "sell"),
        }
    }
}

/// 에이전트 한 명의 분석 결과.
///
/// 실제 Provider가 생성했는지 합성되었는지는 응답에 드러나지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Perspective {
    pub agent: AgentKind,
    pub symbol: String,
    pub recommendation: Recommendation,
    /// 확신도 (0.0 ~ 1.0)
    pub confidence: f64,
    pub target_price: Option<Decimal>,
    pub summary: String,
    pub key_points: Vec<String>,
    pub generated_at: DateTime<Utc>,
}
