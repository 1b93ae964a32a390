//! Per-root vote tally over competing blocks. One
//! `Election` exists per `qualified_root`; `ElectionManager` (in
//! [`crate::manager`]) owns the arena of them.

use std::collections::HashMap;

use ledger_core::context::ConfirmationEvent;
use ledger_core::errors::LedgerError;
use ledger_core::ledger::Ledger;
use ledger_db::Database;
use ledger_primitives::prelude::*;
use ledger_state::block::Block;

use crate::errors::{ConsensusError, ConsensusResult, ElectionStatus, VoteCode};
use crate::weight::WeightSource;

#[derive(Copy, Clone, Debug)]
struct RecordedVote {
    hash: BlockHash,
    sequence: u64,
    timestamp_ms: u64,
}

/// Transient tally structure for resolving forks at one qualified root
///.
pub struct Election {
    qualified_root: QualifiedRoot,
    blocks: HashMap<BlockHash, Block>,
    votes: HashMap<AccountId, RecordedVote>,
    winner: Option<BlockHash>,
    confirmed: bool,
    /// Priority weighting an external scheduler (out of scope here) may use
    /// to prioritize active elections. Carried verbatim, defaults to 1.0,
    /// never read by this crate.
    multiplier: f64,
    created_at_ms: u64,
}

impl Election {
    pub fn new(qualified_root: QualifiedRoot, first_block: Block, created_at_ms: u64) -> Self {
        let mut blocks = HashMap::new();
        blocks.insert(first_block.hash(), first_block);
        Self {
            qualified_root,
            blocks,
            votes: HashMap::new(),
            winner: None,
            confirmed: false,
            multiplier: 1.0,
            created_at_ms,
        }
    }

    pub fn qualified_root(&self) -> QualifiedRoot {
        self.qualified_root
    }

    pub fn status(&self) -> ElectionStatus {
        if self.confirmed {
            ElectionStatus::Confirmed
        } else {
            ElectionStatus::Active
        }
    }

    pub fn winner(&self) -> Option<BlockHash> {
        self.winner
    }

    pub fn created_at_ms(&self) -> u64 {
        self.created_at_ms
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn set_multiplier(&mut self, multiplier: f64) {
        self.multiplier = multiplier;
    }

    pub fn has_candidate(&self, hash: &BlockHash) -> bool {
        self.blocks.contains_key(hash)
    }

    pub fn candidate_hashes(&self) -> Vec<BlockHash> {
        self.blocks.keys().copied().collect()
    }

    /// Adds `block` as a fresh candidate on this root. Returns `false` if
    /// its hash is already a known candidate.
    pub fn insert(&mut self, block: Block) -> bool {
        let hash = block.hash();
        if self.blocks.contains_key(&hash) {
            return false;
        }
        self.blocks.insert(hash, block);
        true
    }

    /// Classifies and, if accepted, records one voter's position on `hash`
    ///. The caller (the vote processor, C8) is responsible
    /// for having already verified the vote's signature -- that rejection
    /// path ([`VoteCode::Invalid`]) never reaches this far.
    pub fn vote(&mut self, voter: AccountId, hash: BlockHash, sequence: u64, now_ms: u64, cooldown_ms: u64) -> VoteCode {
        match self.votes.get(&voter).copied() {
            None => {
                self.votes.insert(voter, RecordedVote { hash, sequence, timestamp_ms: now_ms });
                VoteCode::Vote
            }
            Some(prev) => {
                if sequence <= prev.sequence {
                    VoteCode::Replay
                } else if now_ms.saturating_sub(prev.timestamp_ms) < cooldown_ms {
                    VoteCode::Indeterminate
                } else {
                    self.votes.insert(voter, RecordedVote { hash, sequence, timestamp_ms: now_ms });
                    VoteCode::Vote
                }
            }
        }
    }

    /// Sums the voting weight of current voters per candidate hash,
    /// including candidates with zero votes, sorted by weight descending
    /// with ties broken by hash ascending.
    pub fn tally(&self, weights: &dyn WeightSource) -> Vec<(BlockHash, Amount)> {
        let mut totals: HashMap<BlockHash, Amount> = self.blocks.keys().map(|h| (*h, 0)).collect();
        for (voter, recorded) in self.votes.iter() {
            if let Some(entry) = totals.get_mut(&recorded.hash) {
                *entry += weights.weight(voter);
            }
        }
        let mut ranked: Vec<(BlockHash, Amount)> = totals.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }

    /// Promotes the highest-weight candidate to winner, rolling back
    /// whichever competing candidate is currently stored if it isn't the
    /// winner, then commits the winner's confirmation height.
    pub fn confirm_once<D: Database>(&mut self, ledger: &Ledger<D>) -> ConsensusResult<Option<ConfirmationEvent>> {
        if self.confirmed {
            return Err(ConsensusError::AlreadyConfirmed);
        }
        let tally = self.tally(ledger);
        let Some((winner_hash, _)) = tally.first().copied() else {
            return Ok(None);
        };
        let winner_block = self.blocks.get(&winner_hash).cloned().ok_or(ConsensusError::WinnerNotACandidate)?;

        if !ledger.db().blocks().block_exists(&winner_hash).map_err(LedgerError::from)? {
            for hash in self.blocks.keys() {
                if *hash != winner_hash && ledger.db().blocks().block_exists(hash).map_err(LedgerError::from)? {
                    ledger.rollback(*hash)?;
                    break;
                }
            }
            let result = ledger.process(winner_block)?;
            if !result.is_progress() {
                return Err(ConsensusError::WinnerNotACandidate);
            }
        }

        let event = ledger.confirm(winner_hash)?;
        self.confirmed = true;
        self.winner = Some(winner_hash);
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_state::block::{ChangeBlock, ChangePayload};

    fn acct(b: u8) -> AccountId {
        AccountId::from(Buf32::from([b; 32]))
    }

    fn candidate(rep: u8) -> Block {
        Block::Change(ChangeBlock {
            payload: ChangePayload { previous: BlockHash::zero(), representative: acct(rep) },
            signature: Signature(Buf64::zero()),
            work: Work(0),
        })
    }

    struct StubWeights(HashMap<AccountId, Amount>);
    impl WeightSource for StubWeights {
        fn weight(&self, representative: &AccountId) -> Amount {
            *self.0.get(representative).unwrap_or(&0)
        }
    }

    fn qroot() -> QualifiedRoot {
        QualifiedRoot::new(Buf32::from([1u8; 32]), BlockHash::zero())
    }

    #[test]
    fn first_vote_from_a_voter_is_accepted() {
        let b = candidate(1);
        let hash = b.hash();
        let mut election = Election::new(qroot(), b, 0);
        assert_eq!(election.vote(acct(9), hash, 1, 0, 15_000), VoteCode::Vote);
    }

    #[test]
    fn lower_or_equal_sequence_is_replay() {
        let b = candidate(1);
        let hash = b.hash();
        let mut election = Election::new(qroot(), b, 0);
        election.vote(acct(9), hash, 5, 0, 15_000);
        assert_eq!(election.vote(acct(9), hash, 5, 1, 15_000), VoteCode::Replay);
        assert_eq!(election.vote(acct(9), hash, 3, 2, 15_000), VoteCode::Replay);
    }

    #[test]
    fn higher_sequence_within_cooldown_is_indeterminate_then_accepted_after() {
        let b1 = candidate(1);
        let h1 = b1.hash();
        let mut election = Election::new(qroot(), b1, 0);
        let b2 = candidate(2);
        let h2 = b2.hash();
        election.insert(b2);

        election.vote(acct(9), h1, 1, 0, 15_000);
        assert_eq!(election.vote(acct(9), h2, 2, 5_000, 15_000), VoteCode::Indeterminate);
        assert_eq!(election.vote(acct(9), h2, 2, 16_000, 15_000), VoteCode::Vote);
        // Resending the original, now-stale vote afterward is a replay.
        assert_eq!(election.vote(acct(9), h1, 1, 17_000, 15_000), VoteCode::Replay);
    }

    #[test]
    fn tally_sums_weight_and_breaks_ties_by_hash() {
        let b1 = candidate(1);
        let h1 = b1.hash();
        let mut election = Election::new(qroot(), b1, 0);
        let b2 = candidate(2);
        let h2 = b2.hash();
        election.insert(b2);

        election.vote(acct(9), h1, 1, 0, 15_000);
        election.vote(acct(10), h2, 1, 0, 15_000);

        let mut weights = HashMap::new();
        weights.insert(acct(9), 100u128);
        weights.insert(acct(10), 100u128);
        let ranked = election.tally(&StubWeights(weights));
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].1, 100);
        assert!(ranked[0].0 < ranked[1].0);
    }

    #[test]
    fn confirm_once_commits_the_heaviest_candidate_even_if_unstored() {
        use ledger_test_utils::fixtures::{account, TestLedger};

        let fx = TestLedger::new(account(1), 1_000);
        let head = fx.genesis_head();
        let k1 = account(2);
        let k2 = account(3);
        let send_a = fx.build_send(fx.genesis, head, 1_000, k1, 400);
        let send_b = fx.build_send(fx.genesis, head, 1_000, k2, 0);
        let qr = crate::root::qualified_root_for(fx.genesis, Some(head));

        assert_eq!(fx.ledger.process(send_a.clone()).unwrap(), ledger_core::errors::ProcessResult::Progress);
        assert_eq!(fx.ledger.process(send_b.clone()).unwrap(), ledger_core::errors::ProcessResult::Fork);

        let mut election = Election::new(qr, send_a.clone(), 0);
        election.insert(send_b.clone());
        // Weight everything on send_b's side so it outvotes the already-
        // applied send_a.
        election.vote(fx.genesis, send_b.hash(), 1, 0, 15_000);

        let event = election.confirm_once(&fx.ledger).unwrap();
        assert!(event.is_some());
        assert_eq!(election.winner(), Some(send_b.hash()));
        assert_eq!(fx.ledger.account_balance(&fx.genesis).unwrap(), Some(1_000));
    }
}
