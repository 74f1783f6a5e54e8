//! Bootstrap utilities.
//!
//! Shared initialization code for processes embedding the event store.

use std::future::Future;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LOG_ENV_VAR;

/// Initialize tracing with the EVENT_STORE_LOG environment variable.
///
/// Defaults to "info" level if EVENT_STORE_LOG is not set. Does nothing if
/// a global subscriber is already installed.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Delay schedule between connection attempts: doubling from 100ms, capped at 5s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectBackoff {
    attempts: u32,
}

impl ConnectBackoff {
    const FIRST_DELAY: Duration = Duration::from_millis(100);
    const DELAY_CAP: Duration = Duration::from_secs(5);

    /// `attempts` of `0` still makes one attempt.
    pub fn new(attempts: u32) -> Self {
        Self {
            attempts: attempts.max(1),
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Wait before attempt `failed + 1`, or `None` once every attempt is spent.
    pub fn delay_after(&self, failed: u32) -> Option<Duration> {
        if failed == 0 || failed >= self.attempts {
            return None;
        }
        let doublings = (failed - 1).min(16);
        Some((Self::FIRST_DELAY * 2u32.pow(doublings)).min(Self::DELAY_CAP))
    }
}

/// Open a store connection, retrying per [`ConnectBackoff`].
///
/// Returns the last driver error once the attempts are exhausted.
pub async fn connect_with_retry<T, E, F, Fut>(
    backend: &str,
    attempts: u32,
    connect: F,
) -> Result<T, E>
where
    E: std::fmt::Display,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let backoff = ConnectBackoff::new(attempts);
    let mut failed = 0;

    loop {
        let err = match connect().await {
            Ok(conn) => {
                info!(backend, attempt = failed + 1, "Store connection open");
                return Ok(conn);
            }
            Err(err) => err,
        };
        failed += 1;

        match backoff.delay_after(failed) {
            Some(delay) => {
                warn!(
                    backend,
                    attempt = failed,
                    max_attempts = backoff.attempts(),
                    retry_in_ms = delay.as_millis() as u64,
                    error = %err,
                    "Store connection refused"
                );
                tokio::time::sleep(delay).await;
            }
            None => {
                error!(backend, attempts = failed, error = %err, "Giving up on store connection");
                return Err(err);
            }
        }
    }
}
