//! Periodic background refresh of the trend list.
//!
//! Each tick spawns a refresh task. A [`RefreshGuard`] makes sure at most one
//! is in flight: a tick that fires while the previous fetch is still running
//! is skipped rather than queued.

use crate::api::ChatCompletion;
use crate::sources::{FetchOutcome, JsonFetch, SourceChain};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, instrument};

/// In-flight flag for refreshes.
#[derive(Debug, Clone, Default)]
pub struct RefreshGuard {
    running: Arc<AtomicBool>,
}

/// Held for the duration of one refresh; releases the guard on drop.
#[derive(Debug)]
pub struct RefreshPermit {
    running: Arc<AtomicBool>,
}

impl RefreshGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the guard, or `None` if a refresh is already running.
    pub fn try_acquire(&self) -> Option<RefreshPermit> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RefreshPermit {
                running: Arc::clone(&self.running),
            })
    }
}

impl Drop for RefreshPermit {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

/// Refresh every `every`, handing each completed fetch to `on_refresh`.
///
/// Runs until `ticks` ticks have fired, or forever when `ticks` is `None`.
/// The first tick fires immediately.
#[instrument(level = "info", skip_all, fields(every_secs = every.as_secs()))]
pub async fn watch<F, C, H>(
    chain: Arc<SourceChain<F, C>>,
    every: Duration,
    ticks: Option<u64>,
    on_refresh: H,
) where
    F: JsonFetch + Send + Sync + 'static,
    C: ChatCompletion + Send + Sync + 'static,
    H: Fn(FetchOutcome) + Send + Sync + 'static,
{
    let guard = RefreshGuard::new();
    let on_refresh = Arc::new(on_refresh);
    let mut timer = interval(every);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut fired = 0u64;
    let mut tasks = tokio::task::JoinSet::new();

    while ticks.is_none_or(|limit| fired < limit) {
        timer.tick().await;
        fired += 1;
        let Some(permit) = guard.try_acquire() else {
            info!(tick = fired, "Refresh still in flight; skipping tick");
            continue;
        };
        let chain = Arc::clone(&chain);
        let on_refresh = Arc::clone(&on_refresh);
        tasks.spawn(async move {
            let _permit = permit;
            let outcome = chain.fetch_trends().await;
            debug!(source = %outcome.source, count = outcome.items.len(), "Refresh finished");
            on_refresh(outcome);
        });
        // reap finished tasks so the set does not grow without bound
        while tasks.try_join_next().is_some() {}
    }
    while tasks.join_next().await.is_some() {}
}
