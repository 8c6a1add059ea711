//! Provider별 호출 속도 제한.
//!
//! 롤링 윈도우 안에서 고정 횟수까지만 호출을 허용합니다. 한도를 넘은
//! 호출자는 거부되지 않고 가장 오래된 호출이 윈도우를 벗어날 때까지
//! 대기합니다.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;
use trader_core::RateLimitConfig;

/// 롤링 윈도우 rate limiter.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    /// 윈도우 안에서 허용된 호출 시각 (오래된 순)
    calls: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// 새 rate limiter 생성. `max_requests`가 0이면 1로 취급합니다.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        let max_requests = max_requests.max(1) as usize;
        Self {
            max_requests,
            window,
            calls: Mutex::new(VecDeque::with_capacity(max_requests)),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, config.window())
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// 호출 슬롯을 확보합니다. 한도 초과 시 슬롯이 빌 때까지 대기합니다.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut calls = self.calls.lock().await;
                let now = Instant::now();
                while calls
                    .front()
                    .is_some_and(|at| now.duration_since(*at) >= self.window)
                {
                    calls.pop_front();
                }

                if calls.len() < self.max_requests {
                    calls.push_back(now);
                    return;
                }

                calls
                    .front()
                    .map(|oldest| (*oldest + self.window).saturating_duration_since(now))
                    .unwrap_or_default()
            };

            debug!(wait_ms = wait.as_millis() as u64, "Rate limit reached, waiting");
            tokio::time::sleep(wait).await;
        }
    }

    /// 대기 없이 지금 호출할 수 있는 남은 횟수.
    pub async fn available(&self) -> usize {
        let calls = self.calls.lock().await;
        let now = Instant::now();
        let live = calls
            .iter()
            .filter(|at| now.duration_since(**at) < self.window)
            .count();
        self.max_requests.saturating_sub(live)
    }
}
