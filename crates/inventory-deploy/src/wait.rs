//! Bounded polling for resources in transitional states.
//!
//! Every wait in the deployer goes through [`wait_until`]: a fixed interval,
//! a hard attempt budget, and no open-ended blocking. Exhausting the budget
//! is not an error; callers proceed with the best-known state.

use anyhow::Result;
use backon::{BackoffBuilder, ConstantBuilder};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Fixed-interval polling bounds.
#[derive(Debug, Clone, Copy)]
pub struct WaitConfig {
    /// Delay between checks
    pub interval: Duration,
    /// Maximum number of checks before giving up
    pub max_attempts: u32,
}

impl WaitConfig {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }
}

impl Default for WaitConfig {
    /// One minute of patience: twelve checks, five seconds apart.
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 12,
        }
    }
}

/// Poll `check` until it reports ready or the attempt budget runs out.
///
/// Returns `Ok(true)` once the check passes and `Ok(false)` when the budget
/// is spent without it passing. Errors from the check itself are propagated;
/// checks are expected to swallow the provider states they consider normal
/// (like "still creating") and only fail on the genuinely unexpected.
pub async fn wait_until<F, Fut>(config: WaitConfig, check: F, resource_name: &str) -> Result<bool>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let mut delays = ConstantBuilder::default()
        .with_delay(config.interval)
        .with_max_times(config.max_attempts as usize)
        .build();

    for attempt in 1..=config.max_attempts {
        if check().await? {
            debug!(resource = %resource_name, attempt, "Resource ready");
            return Ok(true);
        }
        if attempt < config.max_attempts {
            let delay = delays.next().unwrap_or(config.interval);
            debug!(
                resource = %resource_name,
                attempt,
                delay_ms = delay.as_millis(),
                "Resource not ready, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    warn!(
        resource = %resource_name,
        attempts = config.max_attempts,
        "Gave up waiting; proceeding with last known state"
    );
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(max_attempts: u32) -> WaitConfig {
        WaitConfig::new(Duration::from_millis(1), max_attempts)
    }

    #[tokio::test]
    async fn returns_true_once_check_passes() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let ready = wait_until(
            fast(5),
            || async move { Ok(calls.fetch_add(1, Ordering::SeqCst) >= 2) },
            "thing",
        )
        .await
        .unwrap();
        assert!(ready);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausting_the_budget_returns_false() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let ready = wait_until(
            fast(4),
            || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(false)
            },
            "thing",
        )
        .await
        .unwrap();
        assert!(!ready);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn check_errors_propagate() {
        let result = wait_until(
            fast(3),
            || async { anyhow::bail!("provider exploded") },
            "thing",
        )
        .await;
        assert!(result.is_err());
    }
}
