//! Exponential backoff for transient Typefully API failures.

use crate::utils::error::{Result, TypefullyError};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Fraction of the delay added or removed at random (0.0 to 1.0).
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 500,
            max_delay_ms: 8000,
            jitter: 0.2,
        }
    }
}

impl RetryConfig {
    pub(crate) fn calculate_delay(&self, attempt: u32, error: &TypefullyError) -> Duration {
        if let TypefullyError::RateLimitedError {
            retry_after: Some(secs),
        } = error
        {
            let ms = secs.saturating_mul(1000).min(self.max_delay_ms);
            return Duration::from_millis(ms);
        }

        let exponential_ms = self
            .base_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt));
        let capped_ms = exponential_ms.min(self.max_delay_ms);

        let jitter_range = (capped_ms as f64 * self.jitter.clamp(0.0, 1.0)) as i64;
        let jitter_ms = if jitter_range > 0 {
            rand::rng().random_range(-jitter_range..=jitter_range)
        } else {
            0
        };

        Duration::from_millis((capped_ms as i64 + jitter_ms).max(0) as u64)
    }
}

/// Runs `operation` until it succeeds, fails with a non-retryable error, or
/// the retry budget is spent.
pub async fn with_retry<F, Fut, T>(
    operation: F,
    config: &RetryConfig,
    operation_name: &str,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    with_retry_when(operation, config, operation_name, TypefullyError::is_retryable).await
}

/// Like [`with_retry`], with `should_retry` deciding which errors are worth another attempt.
pub async fn with_retry_when<F, Fut, T>(
    mut operation: F,
    config: &RetryConfig,
    operation_name: &str,
    should_retry: fn(&TypefullyError) -> bool,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::info!("{} succeeded after {} attempts", operation_name, attempt + 1);
                }
                return Ok(result);
            }
            Err(error) => {
                if !should_retry(&error) {
                    tracing::debug!("{} failed with non-retryable error: {}", operation_name, error);
                    return Err(error);
                }

                if attempt >= config.max_retries {
                    if config.max_retries > 0 {
                        tracing::warn!(
                            "{} exhausted all {} retries",
                            operation_name,
                            config.max_retries
                        );
                    }
                    return Err(error);
                }

                let delay = config.calculate_delay(attempt, &error);
                tracing::warn!(
                    "{} failed (attempt {}/{}): {}. Retrying in {:.1}s",
                    operation_name,
                    attempt + 1,
                    config.max_retries + 1,
                    error,
                    delay.as_secs_f64()
                );

                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
