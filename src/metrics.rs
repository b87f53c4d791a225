//! Process-wide operation counters.
//!
//! Sessions are independent, but a load driver wants aggregate counts across all of them.
//! Instead of global mutable state, a single [`ClientMetrics`] handle is shared (via
//! [`Arc`][std::sync::Arc]) between sessions and updated with atomic increments only.

use std::sync::atomic::{AtomicU64, Ordering};

/// Aggregate counters for a set of client sessions.
///
/// All updates are lock-free atomic increments, safe to call from any number of concurrent
/// tasks.
#[derive(Debug, Default)]
pub struct ClientMetrics {
    puts: AtomicU64,
    gets: AtomicU64,
    failovers: AtomicU64,
}

impl ClientMetrics {
    /// Counts one issued put operation.
    pub fn record_put(&self) {
        self.puts.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts one issued get operation.
    pub fn record_get(&self) {
        self.gets.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts one application-level failure that caused a selector failover.
    pub fn record_failover(&self) {
        self.failovers.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of issued put operations.
    pub fn puts(&self) -> u64 {
        self.puts.load(Ordering::Relaxed)
    }

    /// Number of issued get operations.
    pub fn gets(&self) -> u64 {
        self.gets.load(Ordering::Relaxed)
    }

    /// Number of recorded failovers.
    pub fn failovers(&self) -> u64 {
        self.failovers.load(Ordering::Relaxed)
    }

    /// Total number of issued operations.
    pub fn ops(&self) -> u64 {
        self.puts() + self.gets()
    }
}
