//! Exponential backoff for agent calls

use crate::utils::toml_config::RetryConfig;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Delay before the retry that follows attempt number `attempt` (1-based)
pub fn backoff_delay(config: &RetryConfig, attempt: u32) -> Duration {
    let exp = config.multiplier.max(1.0).powi(attempt.saturating_sub(1) as i32);
    let base_ms = (config.initial_delay_ms as f64 * exp).min(config.max_delay_ms as f64) as u64;

    let jitter_ms = if config.jitter && base_ms >= 4 {
        // up to 25% on top
        rand::rng().random_range(0..=base_ms / 4)
    } else {
        0
    };

    Duration::from_millis(base_ms + jitter_ms)
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// runs out of attempts. Returns the last error and the number of attempts made.
pub async fn retry_with_backoff<T, E, F, Fut, R>(
    config: &RetryConfig,
    mut operation: F,
    is_retryable: R,
) -> Result<(T, u32), (E, u32)>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::debug!(attempt, "Succeeded after retry");
                }
                return Ok((value, attempt));
            }
            Err(e) if attempt < max_attempts && is_retryable(&e) => {
                let delay = backoff_delay(config, attempt);
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err((e, attempt)),
        }
    }
}
