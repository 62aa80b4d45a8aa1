use crate::constants::{AZURE_STORAGE_RETRY_COUNT, AZURE_STORAGE_RETRY_TIMEOUT};
use backon::{BackoffBuilder, ExponentialBuilder};
use log::warn;
use sasvend_core::{Context, Error, Result};
use std::future::Future;
use std::time::Duration;

/// Attempts made for one control plane call unless configured otherwise.
pub const DEFAULT_MAX_ATTEMPTS: usize = 10;
/// Time a single attempt may take unless configured otherwise.
pub const DEFAULT_PER_TRY_TIMEOUT: Duration = Duration::from_secs(60);

/// Transport retry policy of a service client.
///
/// Attempts are spaced by exponential backoff with jitter. Only errors marked
/// retryable are tried again; everything else surfaces on the first failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: usize,
    per_try_timeout: Duration,
    min_delay: Duration,
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            per_try_timeout: DEFAULT_PER_TRY_TIMEOUT,
            min_delay: Duration::from_millis(800),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load limits from env, falling back to defaults for unset or invalid values.
    ///
    /// - `AZURE_STORAGE_RETRY_COUNT`: max attempts
    /// - `AZURE_STORAGE_RETRY_TIMEOUT`: per attempt timeout in seconds
    pub fn from_env(ctx: &Context) -> Self {
        Self::default().load_env(ctx)
    }

    /// Override the limits whose env values are set and valid, keeping the
    /// rest of this policy.
    pub fn load_env(mut self, ctx: &Context) -> Self {
        if let Some(v) = ctx.env_var(AZURE_STORAGE_RETRY_COUNT) {
            match v.trim().parse::<usize>() {
                Ok(n) if n > 0 => self.max_attempts = n,
                _ => warn!("ignoring invalid {AZURE_STORAGE_RETRY_COUNT}: {v}"),
            }
        }

        if let Some(v) = ctx.env_var(AZURE_STORAGE_RETRY_TIMEOUT) {
            match v.trim().parse::<u64>() {
                Ok(n) if n > 0 => self.per_try_timeout = Duration::from_secs(n),
                _ => warn!("ignoring invalid {AZURE_STORAGE_RETRY_TIMEOUT}: {v}"),
            }
        }

        self
    }

    /// Set max attempts, at least one.
    pub fn with_max_attempts(mut self, n: usize) -> Self {
        self.max_attempts = n.max(1);
        self
    }

    /// Set the per attempt timeout.
    pub fn with_per_try_timeout(mut self, timeout: Duration) -> Self {
        self.per_try_timeout = timeout;
        self
    }

    /// Set the backoff bounds.
    pub fn with_delay(mut self, min: Duration, max: Duration) -> Self {
        self.min_delay = min;
        self.max_delay = max.max(min);
        self
    }

    /// Max attempts for one call.
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Time a single attempt may take.
    pub fn per_try_timeout(&self) -> Duration {
        self.per_try_timeout
    }

    /// Run `f` until it succeeds, fails with a non-retryable error, or the
    /// attempts are used up.
    pub async fn run<T, F, Fut>(&self, op: &str, mut f: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut backoff = ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_attempts.saturating_sub(1))
            .with_jitter()
            .build();

        let mut attempt = 1;
        loop {
            let res = match tokio::time::timeout(self.per_try_timeout, f()).await {
                Ok(res) => res,
                Err(_) => Err(Error::service_unavailable("attempt timed out")
                    .with_context(format!("timeout: {:?}", self.per_try_timeout))),
            };

            let err = match res {
                Ok(v) => return Ok(v),
                Err(err) if err.is_retryable() => err,
                Err(err) => return Err(err),
            };

            match backoff.next() {
                Some(delay) => {
                    warn!("{op} attempt {attempt} failed, retrying in {delay:?}: {err}");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                None => {
                    return Err(err
                        .with_context(format!("operation: {op}"))
                        .with_context(format!("attempts: {attempt}")))
                }
            }
        }
    }
}
