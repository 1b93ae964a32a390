//! Vote processor: verifies vote signatures and routes
//! each hash to the owning election. Mirrors `ledger-processor::processor`'s
//! serial-worker shape (single `crossbeam_channel` consumer thread, a
//! synchronous flush, a blocking test entry point) so votes get the same
//! single-serial-worker discipline blocks already have.

use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{bounded, Receiver, Sender};
use ledger_core::context::KeySigner;
use ledger_state::vote::Vote;
use tracing::{trace, warn};

use crate::clock::MonotonicClock;
use crate::errors::VoteCode;
use crate::manager::ElectionManager;

enum Job {
    Submit { vote: Vote, reply: Sender<Vec<VoteCode>> },
    Flush { ack: Sender<()> },
}

/// A single serial worker over incoming votes.
pub struct VoteProcessor {
    sender: Sender<Job>,
    worker: Option<JoinHandle<()>>,
}

impl VoteProcessor {
    pub fn new(elections: Arc<ElectionManager>, signer: Arc<dyn KeySigner>, clock: Arc<dyn MonotonicClock>) -> Self {
        Self::with_capacity(elections, signer, clock, 4096)
    }

    pub fn with_capacity(
        elections: Arc<ElectionManager>,
        signer: Arc<dyn KeySigner>,
        clock: Arc<dyn MonotonicClock>,
        capacity: usize,
    ) -> Self {
        let (sender, receiver) = bounded::<Job>(capacity);
        let worker = std::thread::Builder::new()
            .name("ledger-vote-processor".into())
            .spawn(move || run(receiver, elections, signer, clock))
            .expect("failed to spawn vote processor thread");
        Self { sender, worker: Some(worker) }
    }

    /// Queues `vote` for verification and routing; returns a handle to the
    /// per-hash outcome codes, in the same order as `vote.hashes`.
    pub fn submit(&self, vote: Vote) -> Receiver<Vec<VoteCode>> {
        let (reply, recv) = bounded(1);
        if self.sender.send(Job::Submit { vote, reply }).is_err() {
            // Worker already shut down; caller's receiver simply never
            // resolves, matching a submission after shutdown began.
        }
        recv
    }

    pub fn flush(&self) {
        let (ack, recv) = bounded(1);
        if self.sender.send(Job::Flush { ack }).is_ok() {
            let _ = recv.recv();
        }
    }
}

impl Drop for VoteProcessor {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn run(receiver: Receiver<Job>, elections: Arc<ElectionManager>, signer: Arc<dyn KeySigner>, clock: Arc<dyn MonotonicClock>) {
    while let Ok(job) = receiver.recv() {
        match job {
            Job::Submit { vote, reply } => {
                let codes = process_one(&vote, &elections, signer.as_ref(), clock.as_ref());
                let _ = reply.send(codes);
            }
            Job::Flush { ack } => {
                let _ = ack.send(());
            }
        }
    }
}

fn process_one(vote: &Vote, elections: &ElectionManager, signer: &dyn KeySigner, clock: &dyn MonotonicClock) -> Vec<VoteCode> {
    if !signer.verify_account(&vote.voter, &vote.signing_payload(), &vote.signature) {
        warn!(voter = %vote.voter, "vote signature did not verify");
        return vec![VoteCode::Invalid; vote.hashes.len()];
    }
    let now_ms = clock.now_ms();
    let codes = elections.vote_all(vote, now_ms);
    trace!(voter = %vote.voter, sequence = vote.sequence, ?codes, "vote routed");
    codes
}

/// Performs signature verification and routing synchronously on the
/// calling thread, for tests and bootstrap code that need the outcome
/// immediately.
pub fn blocking_vote(
    vote: &Vote,
    elections: &ElectionManager,
    signer: &dyn KeySigner,
    clock: &dyn MonotonicClock,
) -> Vec<VoteCode> {
    process_one(vote, elections, signer, clock)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ledger_primitives::prelude::*;
    use ledger_state::block::{ChangeBlock, ChangePayload};
    use ledger_test_utils::DeterministicSigner;

    use super::*;
    use crate::clock::ManualClock;
    use crate::root::qualified_root_for;

    fn acct(b: u8) -> AccountId {
        AccountId::from(Buf32::from([b; 32]))
    }

    fn candidate(rep: u8) -> ledger_state::block::Block {
        ledger_state::block::Block::Change(ChangeBlock {
            payload: ChangePayload { previous: BlockHash::zero(), representative: acct(rep) },
            signature: Signature(Buf64::zero()),
            work: Work(0),
        })
    }

    #[test]
    fn invalid_signature_is_rejected_without_touching_the_election() {
        let signer = DeterministicSigner::new();
        let elections = ElectionManager::with_defaults();
        let clock = ManualClock::new(0);

        let block = candidate(1);
        let qr = qualified_root_for(acct(9), None);
        elections.insert(qr, block.clone(), 0);

        let forged = Vote::new(acct(1), 1, vec![block.hash()], Signature(Buf64::zero())).unwrap();
        let codes = blocking_vote(&forged, &elections, &signer, &clock);
        assert_eq!(codes, vec![VoteCode::Invalid]);
    }

    #[test]
    fn valid_vote_for_a_known_hash_is_routed_and_counted() {
        let signer = DeterministicSigner::new();
        let elections = ElectionManager::with_defaults();
        let clock = ManualClock::new(0);

        let block = candidate(1);
        let hash = block.hash();
        let qr = qualified_root_for(acct(9), None);
        elections.insert(qr, block, 0);

        let voter = acct(42);
        let signature = signer.sign_account(&voter, &Vote::new(voter, 1, vec![hash], Signature(Buf64::zero())).unwrap().signing_payload());
        let vote = Vote::new(voter, 1, vec![hash], signature).unwrap();

        let codes = blocking_vote(&vote, &elections, &signer, &clock);
        assert_eq!(codes, vec![VoteCode::Vote]);
    }

    #[test]
    fn vote_for_unknown_hash_is_buffered_and_replayed_on_insert() {
        let signer = DeterministicSigner::new();
        let elections = ElectionManager::with_defaults();
        let clock = ManualClock::new(0);

        let block = candidate(1);
        let hash = block.hash();
        let voter = acct(42);
        let signature = signer.sign_account(&voter, &Vote::new(voter, 1, vec![hash], Signature(Buf64::zero())).unwrap().signing_payload());
        let vote = Vote::new(voter, 1, vec![hash], signature).unwrap();

        // No election knows this hash yet: the vote is buffered, not lost.
        let codes = blocking_vote(&vote, &elections, &signer, &clock);
        assert_eq!(codes, vec![VoteCode::Indeterminate]);

        let qr = qualified_root_for(acct(9), None);
        elections.insert(qr, block, 0);
        assert_eq!(elections.status(&qr), Some(crate::errors::ElectionStatus::Active));
    }
}
