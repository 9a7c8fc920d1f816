//! Bounded retry with exponential backoff and jitter.
//!
//! Only transient failures (`Connection`, `Timeout`) are retried. Everything
//! else is returned on the first attempt, and once retries are exhausted the
//! last error is returned as-is so its cause stays attached.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first try
    pub max_retries: u32,
    /// Initial backoff duration
    pub initial_backoff: Duration,
    /// Maximum backoff duration
    pub max_backoff: Duration,
    /// Backoff multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Add random jitter to backoff (±30%)
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(5),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Single attempt, no retries.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Multiplier actually applied; NaN, infinite or shrinking values keep
    /// the backoff constant.
    pub fn growth(&self) -> f64 {
        if self.backoff_multiplier.is_finite() && self.backoff_multiplier >= 1.0 {
            self.backoff_multiplier
        } else {
            1.0
        }
    }

    fn next_backoff(&self, current: Duration) -> Duration {
        Duration::try_from_secs_f64(current.as_secs_f64() * self.growth())
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}

/// Run `f` until it succeeds, fails permanently, or retries run out.
///
/// `operation` labels the retry log lines.
pub async fn with_retry<F, Fut, T>(config: &RetryConfig, operation: &str, mut f: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    let mut backoff = config.initial_backoff;

    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_transient() => return Err(err),
            Err(err) => {
                attempt += 1;

                if attempt > config.max_retries {
                    warn!(
                        operation,
                        max_retries = config.max_retries,
                        error = %err,
                        "Retries exhausted"
                    );
                    return Err(err);
                }

                let delay = jittered(backoff, config.jitter);

                warn!(
                    operation,
                    attempt,
                    max_retries = config.max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "Transient failure, retrying"
                );

                tokio::time::sleep(delay).await;

                backoff = config.next_backoff(backoff);
            }
        }
    }
}

fn jittered(base: Duration, jitter: bool) -> Duration {
    if jitter {
        let factor = 1.0 + rand::thread_rng().gen_range(-0.3_f64..0.3);
        base.mul_f64(factor)
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ClientError, ErrorKind};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio_test::assert_err;

    fn fast(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            initial_backoff: Duration::from_millis(5),
            jitter: false,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let counter = Arc::new(AtomicU32::new(0));
        let calls = counter.clone();

        let result = with_retry(&fast(3), "GET", move || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, ClientError>(42) }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let counter = Arc::new(AtomicU32::new(0));
        let calls = counter.clone();

        let result = with_retry(&fast(3), "GET", move || {
            let count = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if count < 2 {
                    Err(ClientError::connection("reset by peer"))
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_last_error_surfaces_after_exhaustion() {
        let counter = Arc::new(AtomicU32::new(0));
        let calls = counter.clone();

        let result: Result<()> = with_retry(&fast(2), "SET", move || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(ClientError::Timeout {
                    message: "SET after 10ms".into(),
                })
            }
        })
        .await;

        assert_eq!(result.unwrap_err().kind(), ErrorKind::Timeout);
        assert_eq!(counter.load(Ordering::SeqCst), 3); // Initial + 2 retries
    }

    #[tokio::test]
    async fn test_permanent_errors_are_not_retried() {
        let counter = Arc::new(AtomicU32::new(0));
        let calls = counter.clone();

        let result: Result<()> = with_retry(&fast(5), "INCRBY", move || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ClientError::TypeMismatch("not an integer".into())) }
        })
        .await;

        assert_eq!(result.unwrap_err().kind(), ErrorKind::TypeMismatch);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exponential_backoff() {
        let config = RetryConfig {
            max_retries: 3,
            initial_backoff: Duration::from_millis(10),
            backoff_multiplier: 2.0,
            jitter: false,
            ..Default::default()
        };

        let start = std::time::Instant::now();
        let _ = with_retry(&config, "PING", || async {
            Err::<(), _>(ClientError::connection("down"))
        })
        .await;

        // 10ms + 20ms + 40ms
        assert!(start.elapsed() >= Duration::from_millis(70));
    }

    #[test]
    fn test_growth_clamps_bad_multipliers() {
        for multiplier in [f64::NAN, -2.0, 0.5, f64::INFINITY] {
            let config = RetryConfig {
                backoff_multiplier: multiplier,
                ..Default::default()
            };
            assert!((config.growth() - 1.0).abs() < f64::EPSILON);
        }

        let config = RetryConfig {
            backoff_multiplier: 1e300,
            ..Default::default()
        };
        assert_eq!(config.next_backoff(Duration::from_secs(1)), config.max_backoff);
    }

    #[tokio::test]
    async fn test_bad_multiplier_does_not_panic() {
        let counter = Arc::new(AtomicU32::new(0));

        for multiplier in [f64::NAN, -2.0] {
            let config = RetryConfig {
                backoff_multiplier: multiplier,
                ..fast(2)
            };
            let calls = counter.clone();

            let result: Result<()> = with_retry(&config, "GET", move || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ClientError::connection("down")) }
            })
            .await;

            let err = assert_err!(result);
            assert_eq!(err.kind(), ErrorKind::Connection);
        }

        assert_eq!(counter.load(Ordering::SeqCst), 6);
    }
}
