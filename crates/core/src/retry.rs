//! Bounded retry with linear backoff, and the post-navigation stability wait.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::page::PageLike;

/// Network-quiet budget for [`wait_for_stable`].
pub const STABLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Fixed settle delay after the network-quiet wait.
pub const SETTLE_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
	/// Total attempts, including the first.
	pub max_retries: u32,
	/// Backoff unit; attempt `n` is followed by a pause of `delay * n`.
	pub delay: Duration,
}

impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_retries: 3,
			delay: Duration::from_millis(1000),
		}
	}
}

impl RetryPolicy {
	pub fn new(max_retries: u32, delay: Duration) -> Self {
		Self { max_retries, delay }
	}
}

/// Runs `op` until it succeeds or `policy.max_retries` attempts have failed.
///
/// `op` receives the 1-based attempt number. The error of the last attempt is
/// returned unchanged. No pause follows the final attempt. A policy of zero
/// attempts still runs `op` once.
pub async fn with_retry<T, E, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, E>
where
	F: FnMut(u32) -> Fut,
	Fut: Future<Output = Result<T, E>>,
	E: std::fmt::Display,
{
	let attempts = policy.max_retries.max(1);
	let mut attempt = 1;
	loop {
		match op(attempt).await {
			Ok(value) => return Ok(value),
			Err(e) if attempt >= attempts => return Err(e),
			Err(e) => {
				let pause = policy.delay * attempt;
				debug!(attempt, max = attempts, pause_ms = pause.as_millis() as u64, error = %e, "attempt failed; retrying");
				tokio::time::sleep(pause).await;
				attempt += 1;
			}
		}
	}
}

/// Best-effort network quiescence followed by [`SETTLE_DELAY`].
pub async fn wait_for_stable(page: &dyn PageLike) {
	wait_for_stable_within(page, STABLE_TIMEOUT).await;
}

pub async fn wait_for_stable_within(page: &dyn PageLike, timeout: Duration) {
	if let Err(e) = page.wait_for_network_idle(timeout).await {
		debug!(error = %e, "network did not settle; continuing");
	}
	page.sleep(SETTLE_DELAY).await;
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicU32, Ordering};

	use tokio::time::Instant;

	use super::*;
	use crate::testing::{MockAction, MockPage};

	#[derive(Debug, PartialEq)]
	struct Failure(u32);

	impl std::fmt::Display for Failure {
		fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
			write!(f, "failure #{}", self.0)
		}
	}

	#[tokio::test(start_paused = true)]
	async fn returns_last_error_after_exhausting_attempts() {
		let calls = AtomicU32::new(0);
		let result: Result<(), Failure> = with_retry(RetryPolicy::default(), |attempt| {
			calls.fetch_add(1, Ordering::SeqCst);
			async move { Err(Failure(attempt)) }
		})
		.await;

		assert_eq!(result, Err(Failure(3)));
		assert_eq!(calls.load(Ordering::SeqCst), 3);
	}

	#[tokio::test(start_paused = true)]
	async fn backoff_is_linear_without_trailing_pause() {
		let started = Instant::now();
		let policy = RetryPolicy::new(3, Duration::from_millis(100));
		let _: Result<(), Failure> = with_retry(policy, |attempt| async move { Err(Failure(attempt)) }).await;

		// 100ms after attempt 1, 200ms after attempt 2, nothing after attempt 3.
		assert_eq!(started.elapsed(), Duration::from_millis(300));
	}

	#[tokio::test(start_paused = true)]
	async fn stops_at_first_success() {
		let calls = AtomicU32::new(0);
		let result: Result<u32, Failure> = with_retry(RetryPolicy::new(5, Duration::from_millis(10)), |attempt| {
			calls.fetch_add(1, Ordering::SeqCst);
			async move { if attempt == 2 { Ok(attempt) } else { Err(Failure(attempt)) } }
		})
		.await;

		assert_eq!(result, Ok(2));
		assert_eq!(calls.load(Ordering::SeqCst), 2);
	}

	#[tokio::test(start_paused = true)]
	async fn zero_attempt_policy_runs_once() {
		let calls = AtomicU32::new(0);
		let _: Result<(), Failure> = with_retry(RetryPolicy::new(0, Duration::from_millis(10)), |attempt| {
			calls.fetch_add(1, Ordering::SeqCst);
			async move { Err(Failure(attempt)) }
		})
		.await;
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn stability_wait_ignores_idle_timeout() {
		let page = MockPage::new();
		page.set_network_idle_fails(true);

		wait_for_stable(&page).await;

		assert_eq!(
			page.actions(),
			vec![MockAction::WaitForNetworkIdle(STABLE_TIMEOUT), MockAction::Sleep(SETTLE_DELAY)]
		);
	}
}
