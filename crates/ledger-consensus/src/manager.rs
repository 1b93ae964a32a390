//! `ElectionManager`: the arena of active [`Election`]s
//! keyed by qualified root, plus the `block_hash -> qualified_root` index
//! the vote processor needs to route an incoming vote, and a short
//! buffer for votes that arrive before the block they name.
//!
//! Keeps an arena-plus-index shape over in-flight blocks guarded by a
//! single lock rather than `dashmap`.

use std::collections::HashMap;

use ledger_core::context::ConfirmationEvent;
use ledger_core::ledger::Ledger;
use ledger_db::Database;
use ledger_primitives::prelude::*;
use ledger_state::block::Block;
use ledger_state::vote::Vote;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::election::Election;
use crate::errors::{ConsensusResult, ElectionStatus, VoteCode};

/// A vote naming a hash with no matching election yet, held until the
/// block arrives or the buffer entry goes stale.
struct BufferedVote {
    voter: AccountId,
    sequence: u64,
    buffered_at_ms: u64,
}

struct Inner {
    elections: HashMap<QualifiedRoot, Election>,
    index: HashMap<BlockHash, QualifiedRoot>,
    buffered_votes: HashMap<BlockHash, Vec<BufferedVote>>,
}

/// Owns every currently-active election plus the hash index used to route
/// votes and fork notifications into the right one.
pub struct ElectionManager {
    inner: Mutex<Inner>,
    cooldown_ms: u64,
    /// How long a buffered vote is kept waiting for its block.
    vote_buffer_ms: u64,
    /// How long an unconfirmed election survives with no new activity
    ///.
    election_timeout_ms: u64,
}

impl ElectionManager {
    pub fn new(cooldown_ms: u64, vote_buffer_ms: u64, election_timeout_ms: u64) -> Self {
        Self {
            inner: Mutex::new(Inner { elections: HashMap::new(), index: HashMap::new(), buffered_votes: HashMap::new() }),
            cooldown_ms,
            vote_buffer_ms,
            election_timeout_ms,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(VOTE_COOLDOWN_MS, VOTE_COOLDOWN_MS, 5 * 60_000)
    }

    pub fn active_roots(&self) -> Vec<QualifiedRoot> {
        self.inner.lock().elections.keys().copied().collect()
    }

    pub fn status(&self, root: &QualifiedRoot) -> Option<ElectionStatus> {
        self.inner.lock().elections.get(root).map(Election::status)
    }

    /// Creates an election for `qualified_root` if none exists yet, or adds
    /// `block` as a new candidate to the existing one. Replays any votes that were buffered for this block's
    /// hash. Returns `true` if this call created a brand new election.
    pub fn insert(&self, qualified_root: QualifiedRoot, block: Block, now_ms: u64) -> bool {
        let hash = block.hash();
        let mut inner = self.inner.lock();
        let created = match inner.elections.get_mut(&qualified_root) {
            Some(election) => {
                election.insert(block);
                false
            }
            None => {
                inner.elections.insert(qualified_root, Election::new(qualified_root, block, now_ms));
                true
            }
        };
        inner.index.insert(hash, qualified_root);

        if let Some(pending) = inner.buffered_votes.remove(&hash) {
            let election = inner.elections.get_mut(&qualified_root).expect("just inserted or found above");
            for buffered in pending {
                let code = election.vote(buffered.voter, hash, buffered.sequence, buffered.buffered_at_ms, self.cooldown_ms);
                trace!(?hash, code = code.as_str(), "replayed buffered vote");
            }
        }
        created
    }

    /// Routes one `(voter, hash, sequence)` vote to the election that owns
    /// `hash`, buffering it if the hash isn't known yet. The caller (C8) must have already verified the vote's
    /// signature.
    pub fn vote(&self, voter: AccountId, hash: BlockHash, sequence: u64, now_ms: u64) -> VoteCode {
        let mut inner = self.inner.lock();
        let Some(root) = inner.index.get(&hash).copied() else {
            inner.buffered_votes.entry(hash).or_default().push(BufferedVote { voter, sequence, buffered_at_ms: now_ms });
            debug!(?hash, "buffered vote for unknown block");
            return VoteCode::Indeterminate;
        };
        let election = inner.elections.get_mut(&root).expect("index and elections stay in sync");
        election.vote(voter, hash, sequence, now_ms, self.cooldown_ms)
    }

    /// Processes an incoming `Vote`, which may name several hashes at once
    ///, returning one code per hash in order.
    pub fn vote_all(&self, vote: &Vote, now_ms: u64) -> Vec<VoteCode> {
        vote.hashes.iter().map(|hash| self.vote(vote.voter, *hash, vote.sequence, now_ms)).collect()
    }

    /// Tallies and, if decisive, confirms the election at `root`, removing
    /// it from the arena on success.
    pub fn try_confirm<D: Database>(&self, root: &QualifiedRoot, ledger: &Ledger<D>) -> ConsensusResult<Option<ConfirmationEvent>> {
        let mut inner = self.inner.lock();
        let Some(election) = inner.elections.get_mut(root) else {
            return Ok(None);
        };
        let event = election.confirm_once(ledger)?;
        if event.is_some() {
            let confirmed = inner.elections.remove(root).expect("just confirmed above");
            for hash in confirmed.candidate_hashes() {
                inner.index.remove(&hash);
            }
        }
        Ok(event)
    }

    /// Drops elections that haven't confirmed within `election_timeout_ms`
    /// of their creation. Their
    /// candidates are left exactly as stored/unstored; the next arrival of
    /// a conflicting block simply opens a fresh election.
    pub fn expire_stale(&self, now_ms: u64) -> Vec<QualifiedRoot> {
        let mut inner = self.inner.lock();
        let expired: Vec<QualifiedRoot> = inner
            .elections
            .iter()
            .filter(|(_, election)| {
                election.status() == ElectionStatus::Active && now_ms.saturating_sub(election.created_at_ms()) >= self.election_timeout_ms
            })
            .map(|(root, _)| *root)
            .collect();

        for root in &expired {
            if let Some(election) = inner.elections.remove(root) {
                for hash in election.candidate_hashes() {
                    inner.index.remove(&hash);
                }
            }
        }
        inner.buffered_votes.retain(|_, votes| {
            votes.retain(|v| now_ms.saturating_sub(v.buffered_at_ms) < self.vote_buffer_ms);
            !votes.is_empty()
        });
        expired
    }
}

#[cfg(test)]
mod tests {
    use ledger_state::block::{ChangeBlock, ChangePayload};

    use super::*;
    use crate::root::qualified_root_for;

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

    #[test]
    fn insert_creates_then_attaches_to_the_same_root() {
        let manager = ElectionManager::with_defaults();
        let qr = qualified_root_for(acct(9), None);
        let b1 = candidate(1);
        let b2 = candidate(2);

        assert!(manager.insert(qr, b1, 0));
        assert!(!manager.insert(qr, b2, 0));
        assert_eq!(manager.active_roots(), vec![qr]);
    }

    #[test]
    fn vote_routes_by_hash_to_the_owning_election() {
        let manager = ElectionManager::with_defaults();
        let qr = qualified_root_for(acct(9), None);
        let block = candidate(1);
        let hash = block.hash();
        manager.insert(qr, block, 0);

        assert_eq!(manager.vote(acct(42), hash, 1, 0), VoteCode::Vote);
        assert_eq!(manager.vote(acct(42), hash, 1, 1), VoteCode::Replay);
    }

    #[test]
    fn vote_for_unindexed_hash_is_buffered_not_lost() {
        let manager = ElectionManager::with_defaults();
        let block = candidate(1);
        let hash = block.hash();

        assert_eq!(manager.vote(acct(42), hash, 1, 0), VoteCode::Indeterminate);

        let qr = qualified_root_for(acct(9), None);
        manager.insert(qr, block, 0);
        // The buffered vote was replayed on insert, so a fresh vote at the
        // same sequence is now a replay rather than a first-time accept.
        assert_eq!(manager.vote(acct(42), hash, 1, 0), VoteCode::Replay);
    }

    #[test]
    fn expire_stale_drops_elections_past_the_timeout_and_their_index_entries() {
        let manager = ElectionManager::new(15_000, 15_000, 1_000);
        let qr = qualified_root_for(acct(9), None);
        let block = candidate(1);
        let hash = block.hash();
        manager.insert(qr, block, 0);

        assert!(manager.expire_stale(500).is_empty());
        let expired = manager.expire_stale(2_000);
        assert_eq!(expired, vec![qr]);
        assert!(manager.active_roots().is_empty());

        // The index no longer routes to the expired election: the vote is
        // re-buffered as if the block were never seen.
        assert_eq!(manager.vote(acct(42), hash, 1, 2_000), VoteCode::Indeterminate);
    }
}
