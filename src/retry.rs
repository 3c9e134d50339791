//! Retry-with-backoff, adapted from the teacher's `retry` module down to the
//! one policy this crate actually needs: a storage conflict gets exactly one
//! retry, then the caller sees the error.

use std::time::Duration;

use crate::error::StorageError;

#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    /// One initial attempt plus exactly one retry, per the specification's
    /// room-lock conflict policy. A short fixed delay, not exponential —
    /// there is nothing to back off from with a single retry.
    pub fn storage() -> Self {
        Self {
            max_attempts: 2,
            initial_delay: Duration::from_millis(5),
            backoff_multiplier: 1.0,
        }
    }

    /// No delay at all, for headless tests.
    pub fn immediate() -> Self {
        Self {
            max_attempts: 2,
            initial_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
        }
    }
}

/// Run `op` up to `config.max_attempts` times, retrying only on
/// `StorageError::Conflict`. Any other error, or exhausting attempts,
/// propagates immediately.
pub async fn with_retry<F, Fut, T>(config: RetryConfig, mut op: F) -> Result<T, StorageError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, StorageError>>,
{
    let mut delay = config.initial_delay;
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(StorageError::Conflict) if attempt < config.max_attempts => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                delay = delay.mul_f64(config.backoff_multiplier);
            }
            Err(err) => return Err(err),
        }
    }
}
