// SPDX-FileCopyrightText: 2026 Vidsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retry/backoff wrapper around every upstream RPC.
//!
//! Flood-wait errors carry an authoritative wait hint and are honored
//! verbatim; bare 420s and network failures get exponential backoff. Any
//! wrapped RPC runs at most `1 + MAX_RETRIES` times. The driver also
//! provides the cooperative pacing pauses that keep API pressure bounded
//! between batches; those are intrinsic to the algorithm, not
//! error-reactive.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use vidsift_core::{RpcError, VidsiftError};

/// Retries after the initial attempt.
pub const MAX_RETRIES: u32 = 3;

/// Base of the exponential backoff for transient errors: 5 s, 10 s, 20 s.
const TRANSIENT_BASE_SECS: u64 = 5;

/// Pause between history pages while scanning a source.
pub const SCAN_BATCH_PAUSE: Duration = Duration::from_millis(500);

/// Pause between destination history pages during cleanup.
pub const CLEANUP_BATCH_PAUSE: Duration = Duration::from_millis(500);

/// Pause between topic-replies pages while filling the topic cache.
pub const REPLIES_PAGE_PAUSE: Duration = Duration::from_millis(500);

/// Pause between batched delete calls.
pub const DELETE_BATCH_PAUSE: Duration = Duration::from_millis(200);

/// Pause between independent delete operations.
pub const INTER_DELETE_PAUSE: Duration = Duration::from_millis(500);

/// Rate-limit-aware RPC wrapper, cheap to clone per call site.
#[derive(Clone)]
pub struct RateLimitDriver {
    cancel: CancellationToken,
}

impl RateLimitDriver {
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    /// Run `op`, retrying on flood-wait (sleeping the hinted seconds) and
    /// on transient errors (exponential 5/10/20 s), up to [`MAX_RETRIES`]
    /// retries. Any other error, or budget exhaustion, surfaces.
    pub async fn call<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, VidsiftError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RpcError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt >= MAX_RETRIES => {
                    warn!(rpc = label, attempts = attempt + 1, error = %err, "retry budget exhausted");
                    return Err(err.into());
                }
                Err(err) if err.is_flood_wait() => {
                    let seconds = err.seconds.unwrap_or(0);
                    warn!(rpc = label, seconds, attempt, "flood-wait, honoring hint");
                    self.pause(Duration::from_millis(seconds * 1000)).await;
                }
                Err(err) if err.is_transient() => {
                    let backoff = Duration::from_secs(TRANSIENT_BASE_SECS << attempt);
                    warn!(rpc = label, backoff_secs = backoff.as_secs(), error = %err, "transient error, backing off");
                    self.pause(backoff).await;
                }
                Err(err) => return Err(err.into()),
            }
            attempt += 1;
        }
    }

    /// Sleep for `duration`, returning early on cancellation.
    pub async fn pause(&self, duration: Duration) {
        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = self.cancel.cancelled() => {}
        }
    }

    /// Whether the run has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn driver() -> RateLimitDriver {
        RateLimitDriver::new(CancellationToken::new())
    }

    #[tokio::test]
    async fn success_needs_one_call() {
        let calls = AtomicU32::new(0);
        let result = driver()
            .call("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, RpcError>(42) }
            })
            .await
            .unwrap();
        assert_eq!(result, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn flood_wait_sleeps_hinted_seconds_then_retries() {
        let calls = AtomicU32::new(0);
        let started = Instant::now();
        let result = driver()
            .call("test", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(RpcError::flood_wait(2))
                    } else {
                        Ok(7)
                    }
                }
            })
            .await
            .unwrap();
        assert_eq!(result, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(started.elapsed() >= Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_backoff_is_exponential() {
        let calls = AtomicU32::new(0);
        let started = Instant::now();
        let err = driver()
            .call("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(RpcError::network("reset")) }
            })
            .await
            .unwrap_err();
        // Initial + 3 retries, never more.
        assert_eq!(calls.load(Ordering::SeqCst), 1 + MAX_RETRIES);
        // 5 + 10 + 20 seconds of backoff before giving up.
        assert!(started.elapsed() >= Duration::from_secs(35));
        assert!(matches!(err, VidsiftError::Rpc(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn flood_wait_budget_is_three_retries() {
        let calls = AtomicU32::new(0);
        let err = driver()
            .call("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(RpcError::flood_wait(1)) }
            })
            .await
            .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 1 + MAX_RETRIES);
        assert!(matches!(err, VidsiftError::Rpc(ref e) if e.is_flood_wait()));
    }

    #[tokio::test]
    async fn fatal_error_surfaces_immediately() {
        let calls = AtomicU32::new(0);
        let err = driver()
            .call("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(RpcError::other("CHAT_WRITE_FORBIDDEN", Some(403))) }
            })
            .await
            .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(err, VidsiftError::Rpc(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn pause_returns_early_on_cancellation() {
        let cancel = CancellationToken::new();
        let driver = RateLimitDriver::new(cancel.clone());
        cancel.cancel();
        let started = Instant::now();
        driver.pause(Duration::from_secs(3600)).await;
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(driver.is_cancelled());
    }
}
