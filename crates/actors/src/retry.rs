//! Poll-with-backoff loop shared by producers and consumers.

use std::time::Duration;

use marketsim_core::MarketResult;

use crate::handle::{StatsCell, StopSignal};

/// How long to wait after a refusal, and how many refusals to tolerate.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub wait: Duration,
    /// `None` retries forever.
    pub max_retries: Option<u32>,
}

impl RetryPolicy {
    pub fn forever(wait: Duration) -> Self {
        Self {
            wait,
            max_retries: None,
        }
    }

    pub fn bounded(wait: Duration, max_retries: u32) -> Self {
        Self {
            wait,
            max_retries: Some(max_retries),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RetryOutcome {
    /// The operation returned `true`.
    Completed,
    /// A stop was requested while waiting to retry.
    Stopped,
    /// The retry budget ran out.
    Exhausted { attempts: u32 },
}

/// Call `op` until it returns `true`, sleeping `policy.wait` after every
/// `false`.
///
/// The sleep happens between calls, so no marketplace lock is held while
/// waiting. Errors from `op` are returned immediately.
pub fn retry_until<F>(
    policy: &RetryPolicy,
    stop: &StopSignal,
    stats: &StatsCell,
    mut op: F,
) -> MarketResult<RetryOutcome>
where
    F: FnMut() -> MarketResult<bool>,
{
    let mut attempts: u32 = 0;
    loop {
        attempts = attempts.saturating_add(1);
        let accepted = op()?;
        stats.record_attempt(accepted);
        if accepted {
            return Ok(RetryOutcome::Completed);
        }

        if let Some(max) = policy.max_retries {
            if attempts > max {
                return Ok(RetryOutcome::Exhausted { attempts });
            }
        }

        if stop.sleep(policy.wait) {
            return Ok(RetryOutcome::Stopped);
        }
    }
}
