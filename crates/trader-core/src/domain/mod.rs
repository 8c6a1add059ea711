//! 분석 캐시에서 다루는 도메인 모델.

mod fundamentals;
mod perspective;

pub use fundamentals::*;
pub use perspective::*;
