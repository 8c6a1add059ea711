//! 펀더멘털 지표.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 심볼 정규화 (공백 제거, 대문자).
///
/// 캐시 키와 태그는 정규화된 심볼로 생성하므로 `aapl`과 ` AAPL `은
/// 같은 항목을 가리킵니다.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// 심볼 하나의 펀더멘털 지표.
///
/// 비율 값은 소수(0.12 = 12%)로 저장합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundamentalMetrics {
    pub symbol: String,

    // 시장 데이터
    pub price: Option<Decimal>,
    pub market_cap: Option<Decimal>,

    // 밸류에이션
    pub pe_ratio: Option<Decimal>,

    // 성장성
    pub revenue_growth: Option<Decimal>,

    // 수익성
    pub profit_margin: Option<Decimal>,
    pub roe: Option<Decimal>,

    // 안정성
    pub debt_to_equity: Option<Decimal>,

    pub fetched_at: DateTime<Utc>,
}

impl FundamentalMetrics {
    /// 모든 지표가 비어 있는 인스턴스를 생성합니다.
    pub fn empty(symbol: &str) -> Self {
        Self {
            symbol: normalize_symbol(symbol),
            price: None,
            market_cap: None,
            pe_ratio: None,
            revenue_growth: None,
            profit_margin: None,
            roe: None,
            debt_to_equity: None,
            fetched_at: Utc::now(),
        }
    }

    /// 점수 계산에 쓰이는 비율 지표가 하나라도 있는지 확인합니다.
    pub fn has_any_ratio(&self) -> bool {
        self.pe_ratio.is_some()
            || self.revenue_growth.is_some()
            || self.profit_margin.is_some()
            || self.roe.is_some()
            || self.debt_to_equity.is_some()
    }
}
