//! Bounded retry for upstream calls
//!
//! One policy for every stage: retry transient failures a fixed number of
//! times with a pause in between, then hand the error back.

use std::future::Future;
use std::time::Duration;

use crate::error::AppResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    /// At most one retry after `backoff`
    pub fn single(backoff: Duration) -> Self {
        Self {
            max_retries: 1,
            backoff,
        }
    }

    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }

    /// Run `op`, retrying while the error is transient and attempts remain
    pub async fn run<T, F, Fut>(&self, service: &'static str, mut op: F) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        service,
                        attempt,
                        "Transient {} failure, retrying in {:?}: {}",
                        service,
                        self.backoff,
                        e
                    );
                    tokio::time::sleep(self.backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::single(Duration::from_millis(500))
    }
}
