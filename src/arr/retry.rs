use std::future::Future;
use std::time::Duration;

use super::ArrError;
use crate::config::RetryConfig;

/// Fixed-delay retry for transient catalog errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub attempts: u32,
    /// Pause between attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            attempts: config.attempts,
            delay: Duration::from_millis(config.delay_ms),
        }
    }
}

/// Run `op` until it succeeds, fails hard, or the attempts run out. The
/// delay is only slept between attempts.
pub async fn retry_transient<T, F, Fut>(
    policy: &RetryPolicy,
    what: &str,
    mut op: F,
) -> Result<T, ArrError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ArrError>>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() => {
                if attempt >= attempts {
                    tracing::error!("{}: exceeded {} attempts", what, attempts);
                    return Err(ArrError::Exhausted {
                        what: what.to_string(),
                        attempts,
                        last: Box::new(e),
                    });
                }
                tracing::warn!(
                    "{} (attempt {}/{}): {}; retrying in {:?}",
                    what,
                    attempt,
                    attempts,
                    e,
                    policy.delay
                );
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
