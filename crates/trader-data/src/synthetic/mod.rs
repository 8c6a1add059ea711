//! 합성(synthetic) fallback 생성기.
//!
//! 모든 실제 Provider가 실패했을 때 지표 기반 휴리스틱으로 그럴듯한 결과를
//! 만듭니다. 실패하지 않으며, 지표가 없으면 중간 구간 기본값을 사용합니다.
//! 목표가 배수와 보충 문구 선택만 난수를 사용합니다.

pub mod scoring;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::debug;
use trader_cache::fingerprint;
use trader_core::{normalize_symbol, AgentKind, FundamentalMetrics, Perspective, Recommendation};

use scoring::{
    confidence_for, final_score, metric_signals, multiplier_range_bp, recommendation_for, Metric,
    MetricSignal, Polarity, MAX_SCORE,
};

/// 최소 핵심 포인트 수.
pub const MIN_KEY_POINTS: usize = 4;

const POSITIVE_POOL: &[&str] = &[
    "Competitive position appears durable",
    "Fundamentals support further upside",
    "Earnings quality looks sustainable",
    "Risk/reward skews favorably at current levels",
    "Cash generation supports continued reinvestment",
];

const NEGATIVE_POOL: &[&str] = &[
    "Valuation leaves limited room for error",
    "Fundamentals point to downside risk",
    "Earnings momentum appears to be fading",
    "Balance sheet offers little cushion in a downturn",
    "Risk/reward skews unfavorably at current levels",
];

const NEUTRAL_POOL: &[&str] = &[
    "Fundamentals are broadly in line with peers",
    "Current price appears to reflect known information",
    "A clear catalyst is needed for a re-rating",
    "Upcoming earnings should set the direction",
    "Risk/reward looks balanced",
];

/// 합성 결과 생성기.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticGenerator;

impl SyntheticGenerator {
    pub fn new() -> Self {
        Self
    }

    /// 스레드 로컬 난수로 합성 분석을 생성합니다.
    pub fn perspective(&self, agent: AgentKind, metrics: &FundamentalMetrics) -> Perspective {
        self.generate_with_rng(agent, metrics, &mut rand::thread_rng())
    }

    /// 주어진 난수 생성기로 합성 분석을 생성합니다.
    pub fn generate_with_rng<R: Rng + ?Sized>(
        &self,
        agent: AgentKind,
        metrics: &FundamentalMetrics,
        rng: &mut R,
    ) -> Perspective {
        let score = final_score(metrics, agent.disposition());
        let recommendation = recommendation_for(score);

        let (low, high) = multiplier_range_bp(recommendation);
        let multiplier = Decimal::new(rng.gen_range(low..=high), 4);
        let target_price = metrics
            .price
            .filter(|p| *p > Decimal::ZERO)
            .and_then(|p| p.checked_mul(multiplier))
            .map(|p| p.round_dp(2));

        // 표기할 수 없는 값은 보충 문구로 대체
        let mut key_points: Vec<String> = metric_signals(metrics)
            .iter()
            .filter(|s| s.observed)
            .filter_map(describe_signal)
            .collect();

        let needed = MIN_KEY_POINTS.saturating_sub(key_points.len());
        key_points.extend(
            filler_pool(recommendation)
                .choose_multiple(rng, needed)
                .map(|s| s.to_string()),
        );

        debug!(agent = %agent, symbol = %metrics.symbol, score, recommendation = %recommendation, "Synthetic perspective generated");

        Perspective {
            agent,
            symbol: metrics.symbol.clone(),
            recommendation,
            confidence: confidence_for(score),
            target_price,
            summary: summary(agent, &metrics.symbol, recommendation, score),
            key_points,
            generated_at: Utc::now(),
        }
    }

    /// 심볼별로 결정적인 합성 펀더멘털.
    ///
    /// 같은 심볼은 항상 같은 지표를 받습니다 (`fetched_at` 제외).
    pub fn fundamentals(&self, symbol: &str) -> FundamentalMetrics {
        let symbol = normalize_symbol(symbol);
        let mut rng = StdRng::seed_from_u64(symbol_seed(&symbol));

        let price = Decimal::new(rng.gen_range(2_000i64..=50_000), 2);
        let shares = Decimal::from(rng.gen_range(100_000_000u64..=5_000_000_000));

        FundamentalMetrics {
            price: Some(price),
            market_cap: Some(price * shares),
            pe_ratio: Some(Decimal::new(rng.gen_range(80i64..=400), 1)),
            revenue_growth: Some(Decimal::new(rng.gen_range(-500i64..=3_000), 4)),
            profit_margin: Some(Decimal::new(rng.gen_range(200i64..=3_500), 4)),
            roe: Some(Decimal::new(rng.gen_range(300i64..=3_500), 4)),
            debt_to_equity: Some(Decimal::new(rng.gen_range(10i64..=250), 2)),
            fetched_at: Utc::now(),
            symbol,
        }
    }
}

fn symbol_seed(symbol: &str) -> u64 {
    let digest = fingerprint(&Value::String(symbol.to_string()));
    u64::from_str_radix(&digest[..16], 16).unwrap_or_default()
}

fn filler_pool(recommendation: Recommendation) -> &'static [&'static str] {
    match recommendation {
        Recommendation::Buy => POSITIVE_POOL,
        Recommendation::Hold => NEUTRAL_POOL,
        Recommendation::Sell => NEGATIVE_POOL,
    }
}

fn ratio(value: Decimal) -> String {
    value.round_dp(2).normalize().to_string()
}

fn percent(value: Decimal) -> Option<String> {
    value
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|v| v.round_dp(1).normalize().to_string())
}

/// 지표 하나를 문장으로. 퍼센트 환산이 넘치면 `None`.
fn describe_signal(signal: &MetricSignal) -> Option<String> {
    let value = signal.value;
    let text = match (signal.metric, signal.polarity()) {
        (Metric::PeRatio, Polarity::Positive) => {
            format!("Attractive valuation at {}x earnings", ratio(value))
        }
        (Metric::PeRatio, Polarity::Neutral) => {
            format!("Reasonable valuation at {}x earnings", ratio(value))
        }
        (Metric::PeRatio, Polarity::Negative) => format!(
            "Rich valuation at {}x earnings leaves little margin of safety",
            ratio(value)
        ),
        (Metric::RevenueGrowth, Polarity::Positive) => {
            format!("Strong revenue growth of {}% year over year", percent(value)?)
        }
        (Metric::RevenueGrowth, Polarity::Neutral) => {
            format!("Moderate revenue growth of {}%", percent(value)?)
        }
        (Metric::RevenueGrowth, Polarity::Negative) => {
            format!("Sluggish revenue growth of {}%", percent(value)?)
        }
        (Metric::ProfitMargin, Polarity::Positive) => {
            format!("High profit margin of {}% signals pricing power", percent(value)?)
        }
        (Metric::ProfitMargin, Polarity::Neutral) => {
            format!("Healthy profit margin of {}%", percent(value)?)
        }
        (Metric::ProfitMargin, Polarity::Negative) => {
            format!("Thin profit margin of {}% limits flexibility", percent(value)?)
        }
        (Metric::DebtToEquity, Polarity::Positive) => {
            format!("Conservative balance sheet with debt/equity of {}", ratio(value))
        }
        (Metric::DebtToEquity, Polarity::Neutral) => {
            format!("Manageable leverage at debt/equity of {}", ratio(value))
        }
        (Metric::DebtToEquity, Polarity::Negative) => {
            format!("Elevated leverage with debt/equity of {}", ratio(value))
        }
        (Metric::Roe, Polarity::Positive) => {
            format!("Excellent capital efficiency with ROE of {}%", percent(value)?)
        }
        (Metric::Roe, Polarity::Neutral) => format!("Solid return on equity of {}%", percent(value)?),
        (Metric::Roe, Polarity::Negative) => format!("Weak return on equity of {}%", percent(value)?),
    };
    Some(text)
}

fn agent_label(agent: AgentKind) -> &'static str {
    match agent {
        AgentKind::ValueInvestor => "Value investor",
        AgentKind::GrowthInvestor => "Growth investor",
        AgentKind::Contrarian => "Contrarian",
        AgentKind::MacroStrategist => "Macro strategist",
        AgentKind::RiskManager => "Risk manager",
    }
}

fn summary(agent: AgentKind, symbol: &str, recommendation: Recommendation, score: i32) -> String {
    let stance = match recommendation {
        Recommendation::Buy => "fundamentals support accumulating shares",
        Recommendation::Hold => "fundamentals justify holding but not adding",
        Recommendation::Sell => "fundamentals do not justify the current price",
    };
    format!(
        "{} view on {}: {} (score {}/{}).",
        agent_label(agent),
        symbol,
        stance,
        score,
        MAX_SCORE
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn seeded() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_strong_metrics_with_bullish_agent_buy() {
        let mut metrics = FundamentalMetrics::empty("GOOD");
        metrics.price = Some(dec!(100));
        metrics.pe_ratio = Some(dec!(12));
        metrics.revenue_growth = Some(dec!(0.22));
        metrics.profit_margin = Some(dec!(0.31));
        metrics.debt_to_equity = Some(dec!(0.2));
        metrics.roe = Some(dec!(0.27));

        let perspective = SyntheticGenerator::new().generate_with_rng(
            AgentKind::GrowthInvestor,
            &metrics,
            &mut seeded(),
        );
        assert_eq!(perspective.recommendation, Recommendation::Buy);
        let target = perspective.target_price.unwrap();
        assert!(target >= dec!(110) && target <= dec!(130));
        assert_eq!(perspective.key_points.len(), 5);
        assert!(perspective.key_points[0].contains("12x earnings"));
        assert!(perspective.key_points[1].contains("22%"));
        assert!(perspective.summary.starts_with("Growth investor view on GOOD"));
    }

    #[test]
    fn test_empty_metrics_are_padded_from_matching_pool() {
        let metrics = FundamentalMetrics::empty("NONE");
        let generator = SyntheticGenerator::new();

        let hold = generator.generate_with_rng(AgentKind::ValueInvestor, &metrics, &mut seeded());
        assert_eq!(hold.recommendation, Recommendation::Hold);
        assert_eq!(hold.key_points.len(), MIN_KEY_POINTS);
        assert!(hold.key_points.iter().all(|p| NEUTRAL_POOL.contains(&p.as_str())));
        assert_eq!(hold.target_price, None);

        let sell = generator.generate_with_rng(AgentKind::RiskManager, &metrics, &mut seeded());
        assert_eq!(sell.recommendation, Recommendation::Sell);
        assert!(sell.key_points.iter().all(|p| NEGATIVE_POOL.contains(&p.as_str())));
    }

    #[test]
    fn test_padding_has_no_duplicates() {
        let mut metrics = FundamentalMetrics::empty("ONE");
        metrics.pe_ratio = Some(dec!(40));
        let perspective =
            SyntheticGenerator::new().generate_with_rng(AgentKind::Contrarian, &metrics, &mut seeded());
        let mut points = perspective.key_points.clone();
        points.sort();
        points.dedup();
        assert_eq!(points.len(), perspective.key_points.len());
        assert_eq!(points.len(), MIN_KEY_POINTS);
    }

    #[test]
    fn test_same_seed_same_result() {
        let metrics = SyntheticGenerator::new().fundamentals("AAPL");
        let a = SyntheticGenerator::new().generate_with_rng(AgentKind::Contrarian, &metrics, &mut seeded());
        let b = SyntheticGenerator::new().generate_with_rng(AgentKind::Contrarian, &metrics, &mut seeded());
        assert_eq!(a.target_price, b.target_price);
        assert_eq!(a.key_points, b.key_points);
    }

    #[test]
    fn test_synthetic_fundamentals_are_deterministic_per_symbol() {
        let generator = SyntheticGenerator::new();
        let a = generator.fundamentals("aapl");
        let b = generator.fundamentals(" AAPL ");
        let c = generator.fundamentals("MSFT");

        assert_eq!(a.symbol, "AAPL");
        assert_eq!(a.price, b.price);
        assert_eq!(a.pe_ratio, b.pe_ratio);
        assert_eq!(a.roe, b.roe);
        assert_ne!((a.price, a.pe_ratio, a.roe), (c.price, c.pe_ratio, c.roe));
        assert!(a.has_any_ratio());
        assert!(a.price.unwrap() >= dec!(20) && a.price.unwrap() <= dec!(500));
    }

    #[test]
    fn test_extreme_values_do_not_overflow() {
        let generator = SyntheticGenerator::new();

        // Buy 구간이라 배수가 1.1 이상: 목표가가 표현 범위를 넘음
        let mut metrics = FundamentalMetrics::empty("HUGE");
        metrics.price = Some(Decimal::MAX);
        metrics.pe_ratio = Some(dec!(12));
        let perspective =
            generator.generate_with_rng(AgentKind::GrowthInvestor, &metrics, &mut seeded());
        assert_eq!(perspective.recommendation, Recommendation::Buy);
        assert_eq!(perspective.target_price, None);
        assert_eq!(perspective.key_points.len(), MIN_KEY_POINTS);

        let mut metrics = FundamentalMetrics::empty("HUGE");
        metrics.price = Some(dec!(10));
        metrics.pe_ratio = Some(dec!(12));
        metrics.revenue_growth = Some(Decimal::MAX);
        metrics.roe = Some(Decimal::MIN);
        let perspective =
            generator.generate_with_rng(AgentKind::GrowthInvestor, &metrics, &mut seeded());
        assert!(perspective.target_price.is_some());
        // 퍼센트로 표기할 수 없는 성장률/ROE 문장은 보충 문구로 대체
        assert!(perspective.key_points[0].contains("12x earnings"));
        assert!(!perspective.key_points.iter().any(|p| p.contains("revenue growth")));
        assert!(!perspective.key_points.iter().any(|p| p.contains("return on equity")));
        assert_eq!(perspective.key_points.len(), MIN_KEY_POINTS);
    }

    /// 현실적인 범위와 `Decimal` 전체 범위(경계값 포함)를 섞어 생성.
    fn arb_decimal(lo: i64, hi: i64, scale: u32) -> impl Strategy<Value = Option<Decimal>> {
        let full_range = (any::<u32>(), any::<u32>(), any::<u32>(), any::<bool>(), 0u32..=28)
            .prop_map(|(lo, mid, hi, negative, scale)| {
                Decimal::from_parts(lo, mid, hi, negative, scale)
            });
        proptest::option::of(prop_oneof![
            4 => (lo..=hi).prop_map(move |n| Decimal::new(n, scale)),
            2 => full_range,
            1 => Just(Decimal::MAX),
            1 => Just(Decimal::MIN),
        ])
    }

    fn arb_agent() -> impl Strategy<Value = AgentKind> {
        proptest::sample::select(AgentKind::all().to_vec())
    }

    proptest! {
        #[test]
        fn prop_generator_is_total(
            agent in arb_agent(),
            price in arb_decimal(-1_000_000, 10_000_000, 2),
            pe in arb_decimal(-10_000, 100_000, 2),
            growth in arb_decimal(-10_000, 10_000, 4),
            margin in arb_decimal(-10_000, 10_000, 4),
            de in arb_decimal(0, 10_000, 2),
            roe in arb_decimal(-10_000, 10_000, 4),
            seed in any::<u64>(),
        ) {
            let mut metrics = FundamentalMetrics::empty("PROP");
            metrics.price = price;
            metrics.pe_ratio = pe;
            metrics.revenue_growth = growth;
            metrics.profit_margin = margin;
            metrics.debt_to_equity = de;
            metrics.roe = roe;

            let perspective = SyntheticGenerator::new().generate_with_rng(
                agent,
                &metrics,
                &mut StdRng::seed_from_u64(seed),
            );

            let score = final_score(&metrics, agent.disposition());
            prop_assert!((0..=MAX_SCORE).contains(&score));
            prop_assert_eq!(perspective.recommendation, recommendation_for(score));
            prop_assert!((0.0..=1.0).contains(&perspective.confidence));
            prop_assert!(perspective.key_points.len() >= MIN_KEY_POINTS);
            prop_assert!(!perspective.summary.is_empty());
            if let Some(target) = perspective.target_price {
                prop_assert!(target > Decimal::ZERO);
            }
        }
    }
}
