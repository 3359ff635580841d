//! Poll-loop generation counter.

use std::sync::atomic::{AtomicU64, Ordering};

/// Successor of `current`, wrapping from `u64::MAX` to 1. Never 0.
pub fn next_version(current: u64) -> u64 {
    current % u64::MAX + 1
}

/// Manager-scoped generation stamp. Starts at 0, before any loop exists.
#[derive(Debug, Default)]
pub struct VersionStamp(AtomicU64);

impl VersionStamp {
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    /// Move to the next generation and return it.
    pub fn advance(&self) -> u64 {
        match self
            .0
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| Some(next_version(v)))
        {
            Ok(previous) | Err(previous) => next_version(previous),
        }
    }

    #[cfg(test)]
    pub(crate) fn force(&self, value: u64) {
        self.0.store(value, Ordering::SeqCst);
    }
}
