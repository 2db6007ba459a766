use std::future::Future;
use std::time::Duration;

use crate::error::BotResult;

pub const DEFAULT_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Runs `op` up to `attempts` times, sleeping `base_delay * n` after the n-th failure.
/// Only retryable errors are retried; the last error is returned.
pub async fn retry_with_backoff<T, F, Fut>(
    label: &str,
    attempts: u32,
    base_delay: Duration,
    mut op: F,
) -> BotResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = BotResult<T>>,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < attempts => {
                let delay = base_delay * attempt;
                tracing::debug!(
                    "{} failed (attempt {}/{}): {}. Retrying in {}ms",
                    label,
                    attempt,
                    attempts,
                    e,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
