//! # Trader Core
//!
//! 인사이트 캐시 시스템의 핵심 도메인 모델 및 공통 인프라를 제공합니다.
//!
//! - 펀더멘털 지표 및 에이전트 분석(Perspective) 도메인 타입
//! - 설정 관리
//! - 로깅 인프라
//! - 공통 에러 타입

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
