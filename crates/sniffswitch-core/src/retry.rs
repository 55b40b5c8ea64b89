//! Retry strategies and the reconnect loop.

use std::fmt::Display;
use std::time::Duration;

use tracing::{info, warn};

use crate::shutdown::ShutdownSignal;

/// Delay before each OBS reconnect attempt
pub const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Decides how long to wait before the next attempt.
///
/// `attempt` is 1 for the first retry. `None` means give up.
pub trait RetryStrategy {
    fn next_delay(&self, attempt: u32) -> Option<Duration>;
}

/// Same delay every time, no attempt limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for FixedDelay {
    fn default() -> Self {
        Self::new(CONNECT_RETRY_DELAY)
    }
}

impl RetryStrategy for FixedDelay {
    fn next_delay(&self, _attempt: u32) -> Option<Duration> {
        Some(self.delay)
    }
}

/// Keep calling `connect` until it succeeds.
///
/// Each failure is logged as a warning and followed by the strategy's delay.
/// Returns `None` if shutdown is requested or the strategy gives up.
pub fn connect_with_retry<T, E, F, S>(
    mut connect: F,
    strategy: &S,
    shutdown: &ShutdownSignal,
) -> Option<T>
where
    F: FnMut() -> Result<T, E>,
    E: Display,
    S: RetryStrategy + ?Sized,
{
    let mut attempt = 0u32;
    loop {
        if shutdown.is_shutdown() {
            return None;
        }

        match connect() {
            Ok(conn) => {
                if attempt > 0 {
                    info!("Connected after {} failed attempt(s)", attempt);
                }
                return Some(conn);
            }
            Err(e) => {
                attempt = attempt.saturating_add(1);
                let Some(delay) = strategy.next_delay(attempt) else {
                    warn!("{}. Giving up after {} attempt(s)", e, attempt);
                    return None;
                };
                warn!("{}. Retrying in {} seconds...", e, delay.as_secs());
                if shutdown.wait(delay) {
                    return None;
                }
            }
        }
    }
}
