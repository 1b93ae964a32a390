use thiserror::Error;

/// Validation errors for malformed values that don't need a store lookup to
/// reject.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Error)]
pub enum StateError {
    #[error("vote carries no hashes")]
    EmptyVote,

    #[error("vote carries {0} hashes, exceeding the per-vote cap")]
    TooManyVoteHashes(usize),
}
