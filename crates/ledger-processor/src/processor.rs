//! Serial block-processor worker, using a single-receiver-thread pattern.
//! An async worker would run its loop over tokio's `mpsc` because it'd be
//! inside a runtime driving other I/O; this processor has no such I/O to
//! interleave, so it drives the same single-consumer design with plain
//! `crossbeam_channel` and a dedicated OS thread instead of a task.
//!
//! `Ledger::process` already performs signature and work-threshold
//! verification inline, so this worker does not
//! duplicate a "batch-verify, then classify" split into two stages: calling
//! `process` once per block accomplishes both, and the only real work left
//! here is strict FIFO serialization, outcome stats, and fork routing.

use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{bounded, Receiver, Sender};
use ledger_core::errors::{LedgerResult, ProcessResult};
use ledger_core::ledger::Ledger;
use ledger_db::Database;
use ledger_state::block::Block;
use tracing::{trace, warn};

use crate::stats::{Stats, StatsSnapshot};

/// Notified when `process` classifies a block as a fork, so C7 can create
/// or attach to the election for that root.
pub trait ForkHandler: Send + Sync {
    fn on_fork(&self, block: Block);
}

enum Job {
    Submit { block: Block, reply: Sender<LedgerResult<ProcessResult>> },
    Flush { ack: Sender<()> },
}

/// A single serial worker over a bounded channel. Dropping the processor stops accepting new work
/// and joins the worker thread once everything already queued has drained.
pub struct BlockProcessor {
    sender: Sender<Job>,
    worker: Option<JoinHandle<()>>,
    stats: Arc<Stats>,
}

impl BlockProcessor {
    pub fn new<D>(ledger: Arc<Ledger<D>>, fork_handler: Option<Arc<dyn ForkHandler>>) -> Self
    where
        D: Database + 'static,
    {
        Self::with_capacity(ledger, fork_handler, 4096)
    }

    pub fn with_capacity<D>(ledger: Arc<Ledger<D>>, fork_handler: Option<Arc<dyn ForkHandler>>, capacity: usize) -> Self
    where
        D: Database + 'static,
    {
        let (sender, receiver) = bounded::<Job>(capacity);
        let stats = Arc::new(Stats::default());
        let worker_stats = stats.clone();
        let worker = std::thread::Builder::new()
            .name("ledger-block-processor".into())
            .spawn(move || run(receiver, ledger, fork_handler, worker_stats))
            .expect("failed to spawn block processor thread");
        Self { sender, worker: Some(worker), stats }
    }

    /// Queues `block` for processing and returns a handle to its outcome.
    /// Blocks are applied strictly in submission order.
    pub fn submit(&self, block: Block) -> Receiver<LedgerResult<ProcessResult>> {
        let (reply, recv) = bounded(1);
        if self.sender.send(Job::Submit { block, reply }).is_err() {
            // Worker thread has already shut down; the caller's receiver
            // simply never resolves, matching a submission that arrives
            // after shutdown has begun.
        }
        recv
    }

    /// Blocks until every block submitted before this call has been
    /// processed.
    pub fn flush(&self) {
        let (ack, recv) = bounded(1);
        if self.sender.send(Job::Flush { ack }).is_ok() {
            let _ = recv.recv();
        }
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

impl Drop for BlockProcessor {
    fn drop(&mut self) {
        // Dropping `sender` closes the channel; the worker's `recv()` loop
        // exits once it drains whatever was already queued.
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn run<D: Database>(
    receiver: Receiver<Job>,
    ledger: Arc<Ledger<D>>,
    fork_handler: Option<Arc<dyn ForkHandler>>,
    stats: Arc<Stats>,
) {
    while let Ok(job) = receiver.recv() {
        match job {
            Job::Submit { block, reply } => {
                let outcome = ledger.process(block.clone());
                if let Ok(result) = outcome {
                    stats.record(result);
                    route(result, &block, fork_handler.as_deref());
                }
                let _ = reply.send(outcome);
            }
            Job::Flush { ack } => {
                let _ = ack.send(());
            }
        }
    }
}

fn route(result: ProcessResult, block: &Block, fork_handler: Option<&dyn ForkHandler>) {
    match result {
        ProcessResult::Progress | ProcessResult::Old => {
            trace!(code = result.as_str(), hash = ?block.hash(), "processed");
        }
        ProcessResult::GapPrevious | ProcessResult::GapSource | ProcessResult::GapEpochOpenPending => {
            // Already parked in the unchecked pool by `Ledger::process`
            // itself; nothing further to route here.
            trace!(code = result.as_str(), hash = ?block.hash(), "parked pending dependency");
        }
        ProcessResult::Fork => {
            if let Some(handler) = fork_handler {
                handler.on_fork(block.clone());
            } else {
                warn!(hash = ?block.hash(), "fork observed with no election handler registered");
            }
        }
        other => {
            warn!(code = other.as_str(), hash = ?block.hash(), "block dropped");
        }
    }
}
