//! Retry Policy
//!
//! Exponential backoff around a single remote call. Rate-limited failures
//! get a larger budget than transient server/network failures, and an
//! explicit resume delay from the server is honoured exactly.

use std::future::Future;
use std::time::Duration;

use dolphive::StoreError;

/// Retry tunables
#[derive(Debug, Clone)]
pub struct RetryOptions {
    /// Retries after the first attempt for server/network failures
    pub max_retries: u32,
    /// Retries after the first attempt for rate-limited failures
    pub rate_limit_max_retries: u32,
    pub base_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_retries: 3,
            rate_limit_max_retries: 5,
            base_delay: Duration::from_millis(1000),
            multiplier: 2.0,
        }
    }
}

impl RetryOptions {
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// `base_delay * multiplier^attempt`
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.powi(attempt as i32);
        self.base_delay.mul_f64(factor)
    }

    fn budget_for(&self, err: &StoreError) -> u32 {
        if err.is_rate_limited() {
            self.rate_limit_max_retries
        } else {
            self.max_retries
        }
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// exhausts its retry budget. The last error is returned unchanged.
pub async fn with_retry<T, F, Fut>(
    label: &str,
    options: &RetryOptions,
    mut operation: F,
) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let mut attempt: u32 = 0;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !err.is_retryable() || attempt >= options.budget_for(&err) {
            return Err(err);
        }

        let delay = err.retry_after().unwrap_or_else(|| options.backoff(attempt));
        tracing::warn!(
            operation = label,
            attempt = attempt + 1,
            delay_ms = delay.as_millis() as u64,
            "Retrying after error: {}",
            err
        );

        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
