//! 지표 점수화.
//!
//! 지표마다 고정 구간으로 0/1/2점을 주고, 합계에 에이전트 성향 오프셋을
//! 더해 0~12 범위의 점수를 만듭니다.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use trader_core::{Disposition, FundamentalMetrics, Recommendation};

/// 최종 점수 상한.
pub const MAX_SCORE: i32 = 12;

/// 지표 없는 경우의 기본값 (각각 1점 구간).
const DEFAULT_PE: Decimal = dec!(20);
const DEFAULT_GROWTH: Decimal = dec!(0.10);
const DEFAULT_MARGIN: Decimal = dec!(0.15);
const DEFAULT_DEBT_TO_EQUITY: Decimal = dec!(0.75);
const DEFAULT_ROE: Decimal = dec!(0.125);

/// 점수 구간 극성.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Positive,
    Neutral,
    Negative,
}

impl Polarity {
    fn from_points(points: i32) -> Self {
        match points {
            2 => Polarity::Positive,
            1 => Polarity::Neutral,
            _ => Polarity::Negative,
        }
    }
}

/// 점수를 매긴 지표 하나.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricSignal {
    pub metric: Metric,
    pub value: Decimal,
    pub points: i32,
    /// 실제 값인지 (false면 기본값)
    pub observed: bool,
}

impl MetricSignal {
    pub fn polarity(&self) -> Polarity {
        Polarity::from_points(self.points)
    }
}

/// 점수화 대상 지표.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    PeRatio,
    RevenueGrowth,
    ProfitMargin,
    DebtToEquity,
    Roe,
}

/// 낮을수록 좋은 지표: `< strong` 2점, `< fair` 1점.
fn lower_is_better(value: Decimal, strong: Decimal, fair: Decimal) -> i32 {
    if value < strong {
        2
    } else if value < fair {
        1
    } else {
        0
    }
}

/// 높을수록 좋은 지표: `> strong` 2점, `> fair` 1점.
fn higher_is_better(value: Decimal, strong: Decimal, fair: Decimal) -> i32 {
    if value > strong {
        2
    } else if value > fair {
        1
    } else {
        0
    }
}

fn signal(
    metric: Metric,
    value: Option<Decimal>,
    default: Decimal,
    score: impl Fn(Decimal) -> i32,
) -> MetricSignal {
    let observed = value.is_some();
    let value = value.unwrap_or(default);
    MetricSignal {
        metric,
        value,
        points: score(value),
        observed,
    }
}

/// 다섯 지표의 점수.
pub fn metric_signals(metrics: &FundamentalMetrics) -> [MetricSignal; 5] {
    [
        signal(Metric::PeRatio, metrics.pe_ratio, DEFAULT_PE, |v| {
            lower_is_better(v, dec!(15), dec!(25))
        }),
        signal(Metric::RevenueGrowth, metrics.revenue_growth, DEFAULT_GROWTH, |v| {
            higher_is_better(v, dec!(0.15), dec!(0.05))
        }),
        signal(Metric::ProfitMargin, metrics.profit_margin, DEFAULT_MARGIN, |v| {
            higher_is_better(v, dec!(0.20), dec!(0.10))
        }),
        signal(
            Metric::DebtToEquity,
            metrics.debt_to_equity,
            DEFAULT_DEBT_TO_EQUITY,
            |v| lower_is_better(v, dec!(0.5), dec!(1.0)),
        ),
        signal(Metric::Roe, metrics.roe, DEFAULT_ROE, |v| {
            higher_is_better(v, dec!(0.15), dec!(0.10))
        }),
    ]
}

/// 성향 오프셋을 반영한 최종 점수 (0..=12).
pub fn final_score(metrics: &FundamentalMetrics, disposition: Disposition) -> i32 {
    let raw: i32 = metric_signals(metrics).iter().map(|s| s.points).sum();
    (raw + disposition.score_offset()).clamp(0, MAX_SCORE)
}

/// 점수 구간별 의견.
pub fn recommendation_for(score: i32) -> Recommendation {
    match score {
        s if s <= 4 => Recommendation::Sell,
        s if s <= 7 => Recommendation::Hold,
        _ => Recommendation::Buy,
    }
}

/// 중앙(6)에서 멀수록 높은 확신도.
pub fn confidence_for(score: i32) -> f64 {
    (0.5 + 0.05 * f64::from((score - 6).abs())).clamp(0.3, 0.9)
}

/// 목표가 배수 구간 (basis point, 10000 = 1.0배).
pub fn multiplier_range_bp(recommendation: Recommendation) -> (i64, i64) {
    match recommendation {
        Recommendation::Sell => (8_000, 9_500),
        Recommendation::Hold => (9_500, 10_500),
        Recommendation::Buy => (11_000, 13_000),
    }
}
