//! Outcome codes for votes and elections. Mirrors
//! `ledger_core::errors::ProcessResult`'s split: these are plain
//! classification codes, not faults -- a replayed or cooldown-rejected
//! vote is a completely ordinary `Ok(VoteCode::Replay)`, never an `Err`.

use ledger_core::errors::LedgerError;
use thiserror::Error;

/// Classification of one vote against one candidate hash.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum VoteCode {
    /// Signature did not verify against the declared voter; never recorded.
    Invalid,
    /// Accepted and recorded as this voter's current position.
    Vote,
    /// Same or lower sequence than a vote already recorded for this voter.
    Replay,
    /// Higher sequence than recorded, but for a different hash arriving
    /// before the cooldown elapsed -- rejected, but distinct from replay.
    Indeterminate,
}

impl VoteCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteCode::Invalid => "invalid",
            VoteCode::Vote => "vote",
            VoteCode::Replay => "replay",
            VoteCode::Indeterminate => "indeterminate",
        }
    }
}

/// Lifecycle state of one election.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ElectionStatus {
    Active,
    Confirmed,
    Expired,
}

#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("confirmed winner is not among this election's candidates")]
    WinnerNotACandidate,

    #[error("election already confirmed")]
    AlreadyConfirmed,
}

pub type ConsensusResult<T> = Result<T, ConsensusError>;
