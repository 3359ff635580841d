//! Long-poll loop.
//!
//! # States
//! - Active(generation): polling on behalf of one cache generation
//! - Stale: a newer generation exists; exit without further action
//! - Terminated: the cache is empty or the manager is gone
//!
//! # State Transitions
//! ```text
//! Active(g) → Stale:       manager version != g (checked first, every iteration)
//! Active(g) → Terminated:  cache empty, or every ConfigManager handle dropped
//! Active(g) → Active(g):   poll succeeded, or failed and slept the fixed delay
//! ```
//!
//! # Design Decisions
//! - Explicit loop, no self-rescheduling
//! - Cadence comes from the server's long-poll hold; only failures sleep
//! - Failure delay is constant: no growth, no jitter

use std::sync::Weak;

use crate::manager::cache::cache_key;
use crate::manager::ManagerInner;
use crate::observability::metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Active(u64),
    Stale,
    Terminated,
}

/// Drive one generation's loop until it goes stale or terminates.
pub(crate) async fn run(manager: Weak<ManagerInner>, generation: u64) {
    tracing::info!(generation, "Long poll loop started");

    let mut state = PollState::Active(generation);
    while let PollState::Active(current) = state {
        state = match manager.upgrade() {
            Some(manager) => step(&manager, current).await,
            None => PollState::Terminated,
        };
    }

    match state {
        PollState::Stale => {
            tracing::debug!(generation, "Long poll loop superseded by newer generation")
        }
        _ => tracing::info!(generation, "Long poll loop terminated"),
    }
}

/// One iteration of the loop.
pub(crate) async fn step(manager: &ManagerInner, generation: u64) -> PollState {
    if manager.version.current() != generation {
        return PollState::Stale;
    }
    if manager.cache.is_empty() {
        return PollState::Terminated;
    }

    let targets = manager.cache.snapshot();
    let in_cache = |namespace: &str| manager.cache.get(&cache_key(&manager.cluster, namespace));

    match manager.sync(&targets, in_cache).await {
        Ok(_) => metrics::record_poll("ok"),
        Err(e) => {
            metrics::record_poll("failed");
            tracing::warn!(
                generation,
                error = %e,
                retry_in_secs = manager.retry_delay.as_secs_f64(),
                "Load notifications failed, will retry"
            );
            tokio::time::sleep(manager.retry_delay).await;
        }
    }

    if manager.cache.is_empty() {
        PollState::Terminated
    } else {
        PollState::Active(generation)
    }
}
