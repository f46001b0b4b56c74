use extract::{parse_wait_time, LlmError, LlmResult};
use std::future::Future;
use tokio::time::sleep;
use tracing::{info, warn};

/// Retries an operation only while the model provider reports a rate
/// limit, sleeping for the wait the provider suggests.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitRetry {
    max_waits: usize,
}

/// Result of a retried operation plus how many rate-limit waits it took
#[derive(Debug)]
pub struct RetryOutcome<T> {
    pub result: LlmResult<T>,
    pub waits: usize,
}

impl RateLimitRetry {
    pub fn new(max_waits: usize) -> Self {
        Self { max_waits }
    }

    /// Run `f` until it succeeds, fails with a non rate-limit error, or the
    /// wait budget is spent. The last error is returned in the latter cases.
    pub async fn run<F, Fut, T>(&self, operation_name: &str, mut f: F) -> RetryOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = LlmResult<T>>,
    {
        let mut waits = 0;

        loop {
            match f().await {
                Ok(value) => {
                    if waits > 0 {
                        info!(
                            operation = operation_name,
                            waits,
                            "Operation succeeded after rate-limit waits"
                        );
                    }
                    return RetryOutcome { result: Ok(value), waits };
                }
                Err(LlmError::RateLimited(message)) => {
                    if waits >= self.max_waits {
                        warn!(
                            operation = operation_name,
                            waits,
                            "Rate limit persisted past the wait budget"
                        );
                        return RetryOutcome {
                            result: Err(LlmError::RateLimited(message)),
                            waits,
                        };
                    }

                    let wait = parse_wait_time(&message);
                    waits += 1;
                    warn!(
                        operation = operation_name,
                        wait_secs = wait.as_secs(),
                        waits,
                        max_waits = self.max_waits,
                        "Rate limited, waiting before retry"
                    );
                    sleep(wait).await;
                }
                Err(e) => return RetryOutcome { result: Err(e), waits },
            }
        }
    }
}

impl Default for RateLimitRetry {
    fn default() -> Self {
        Self::new(20)
    }
}
