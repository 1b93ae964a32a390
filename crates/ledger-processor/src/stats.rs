//! Per-outcome counters the processor exposes for monitoring.

use std::sync::atomic::{AtomicU64, Ordering};

use ledger_core::errors::ProcessResult;

#[derive(Default)]
pub struct Stats {
    progress: AtomicU64,
    old: AtomicU64,
    gap: AtomicU64,
    fork: AtomicU64,
    rejected: AtomicU64,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct StatsSnapshot {
    pub progress: u64,
    pub old: u64,
    pub gap: u64,
    pub fork: u64,
    pub rejected: u64,
}

impl Stats {
    pub fn record(&self, result: ProcessResult) {
        let counter = if result.is_progress() {
            &self.progress
        } else if result == ProcessResult::Old {
            &self.old
        } else if result.is_gap() {
            &self.gap
        } else if result == ProcessResult::Fork {
            &self.fork
        } else {
            &self.rejected
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            progress: self.progress.load(Ordering::Relaxed),
            old: self.old.load(Ordering::Relaxed),
            gap: self.gap.load(Ordering::Relaxed),
            fork: self.fork.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }
}
