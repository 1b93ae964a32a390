//! Vote data. A vote is a signed, sequence-numbered tally
//! entry over one or more competing block hashes sharing roots.

use borsh::{BorshDeserialize, BorshSerialize};
use ledger_primitives::prelude::*;

use crate::errors::StateError;

/// A representative's signed vote over up to
/// [`ledger_primitives::constants::MAX_VOTE_HASHES`] block hashes.
///
/// `sequence` is monotonic per voter: a higher sequence supersedes a lower
/// one for the same root.
#[derive(Clone, Eq, PartialEq, Debug, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct Vote {
    pub voter: AccountId,
    pub sequence: u64,
    pub hashes: Vec<BlockHash>,
    pub signature: Signature,
}

impl Vote {
    pub fn new(voter: AccountId, sequence: u64, hashes: Vec<BlockHash>, signature: Signature) -> Result<Self, StateError> {
        if hashes.is_empty() {
            return Err(StateError::EmptyVote);
        }
        if hashes.len() > ledger_primitives::constants::MAX_VOTE_HASHES {
            return Err(StateError::TooManyVoteHashes(hashes.len()));
        }
        Ok(Self {
            voter,
            sequence,
            hashes,
            signature,
        })
    }

    /// The bytes this vote's signature is computed over: voter-independent,
    /// so the signer and verifier agree without needing a store lookup.
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(8 + self.hashes.len() * 32);
        buf.extend_from_slice(&self.sequence.to_le_bytes());
        for h in &self.hashes {
            buf.extend_from_slice(h.0.as_bytes());
        }
        buf
    }
}
