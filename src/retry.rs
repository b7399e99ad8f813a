use crate::error::CrawlError;
use std::future::Future;
use std::time::Duration;

/// Fixed-delay retry wrapper for flaky operations.
///
/// Every hardened operation in the crawl (session open, element wait) is
/// wrapped independently with its own parameters. The delay is deliberately
/// fixed rather than exponential to keep the load pattern on the target
/// site predictable.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Pause between consecutive attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Runs `op` until it succeeds, fails with a non-retried error kind, or
    /// exhausts `max_attempts`.
    ///
    /// Errors for which `retryable` returns false propagate immediately.
    /// On exhaustion the final error is wrapped in
    /// [`CrawlError::RetriesExhausted`] tagged with `operation` and the
    /// attempt count.
    pub async fn run<T, F, Fut>(
        &self,
        operation: &str,
        retryable: impl Fn(&CrawlError) -> bool,
        mut op: F,
    ) -> Result<T, CrawlError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CrawlError>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if !retryable(&e) => {
                    ::log::warn!(
                        "Attempt {} failed for '{}' with non-retried error: {}",
                        attempt,
                        operation,
                        e
                    );
                    return Err(e);
                }
                Err(e) => {
                    ::log::warn!(
                        "Attempt {}/{} failed for '{}': {}",
                        attempt,
                        self.max_attempts,
                        operation,
                        e
                    );
                    if attempt < self.max_attempts {
                        ::log::info!(
                            "Retrying '{}' after {:?}...",
                            operation,
                            self.delay
                        );
                        tokio::time::sleep(self.delay).await;
                    } else {
                        ::log::error!(
                            "'{}' failed after {} attempts",
                            operation,
                            self.max_attempts
                        );
                        return Err(CrawlError::RetriesExhausted {
                            operation: operation.to_string(),
                            attempts: self.max_attempts,
                            source: Box::new(e),
                        });
                    }
                }
            }
        }
    }
}
