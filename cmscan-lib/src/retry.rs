use std::time::Duration;

use log::warn;
use tokio::time::sleep;

use crate::{ErrorKind, Host, Lookup, Outcome, ScanConfig, ServiceStatus};

/// Wraps a [`Lookup`] and retries hosts the service rate limits.
///
/// The wait time announced by the service (`retry_in_seconds`) is
/// authoritative. Transport and protocol errors are not known to be
/// transient and are never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of lookups per host while rate limited
    max_attempts: u32,
    /// Wait time if the service does not announce one
    retry_wait_time: Duration,
}

impl RetryPolicy {
    /// Create a new policy; at least one attempt is always made
    #[must_use]
    pub fn new(max_attempts: u32, retry_wait_time: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            retry_wait_time,
        }
    }

    /// Scan `host` until the service gives a terminal answer.
    ///
    /// The returned list is never empty: one [`Outcome::Match`] per detected
    /// technology in service order, or a single [`Outcome::NoMatch`] or
    /// [`Outcome::Failure`].
    pub async fn invoke<L>(&self, lookup: &L, host: &Host) -> Vec<Outcome>
    where
        L: Lookup + ?Sized,
    {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let response = match lookup.lookup(host).await {
                Ok(response) => response,
                Err(e) => return vec![e.into()],
            };

            match response.status() {
                ServiceStatus::Ok(technologies) if technologies.is_empty() => {
                    return vec![Outcome::NoMatch];
                }
                ServiceStatus::Ok(technologies) => {
                    return technologies
                        .into_iter()
                        .map(|technology| Outcome::Match(technology.into()))
                        .collect();
                }
                ServiceStatus::Error { code, message } => {
                    return vec![ErrorKind::Service { code, message }.into()];
                }
                ServiceStatus::RateLimited(retry_after) => {
                    if attempts >= self.max_attempts {
                        return vec![ErrorKind::RetriesExhausted {
                            attempts,
                            retry_after,
                        }
                        .into()];
                    }
                    let wait = retry_after.unwrap_or(self.retry_wait_time);
                    warn!(
                        "{host} is rate limited, retrying in {:.1}s (attempt {attempts}/{})",
                        wait.as_secs_f64(),
                        self.max_attempts
                    );
                    sleep(wait).await;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            crate::DEFAULT_MAX_ATTEMPTS,
            Duration::from_secs(crate::DEFAULT_RETRY_WAIT_TIME_SECS),
        )
    }
}

impl From<&ScanConfig> for RetryPolicy {
    fn from(config: &ScanConfig) -> Self {
        Self::new(config.max_attempts, config.retry_wait_time)
    }
}
