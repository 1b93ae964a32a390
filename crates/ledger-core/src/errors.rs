//! Outcome and error types for the ledger state machine.
//!
//! `ProcessResult` is a plain rejection code, never an error: a rejected
//! block is still a completely ordinary `Ok(ProcessOutcome)`. `LedgerError`
//! is reserved for infrastructure faults (store I/O, poisoned invariants)
//! that have nothing to do with whether the block itself was valid -- the
//! same split drawn between a protocol-rejection code and `DbError` (real
//! faults).

use ledger_db::DbError;
use thiserror::Error;

/// Classification returned by [`crate::Ledger::process`].
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ProcessResult {
    /// Block accepted and applied.
    Progress,
    /// Block already stored; this call was a no-op.
    Old,
    /// Signature did not verify under the declared account (or epoch signer).
    BadSignature,
    /// Declared balance increased on a block classified as a send.
    NegativeSpend,
    /// Previous block already has a different successor.
    Fork,
    /// No pending entry matches this receive/open.
    Unreceivable,
    /// The block's previous hash is not yet known.
    GapPrevious,
    /// The block's source/send hash is not yet known.
    GapSource,
    /// An epoch-open references pending value that isn't there yet.
    GapEpochOpenPending,
    /// Attempt to open the all-zero burn account.
    OpenedBurnAccount,
    /// Declared balance does not match the amount derivable from context.
    BalanceMismatch,
    /// Illegal representative change on an epoch-upgrade block.
    RepresentativeMismatch,
    /// Legacy block after a state block, or an epoch upgrade that skipped
    /// or decreased an epoch number.
    BlockPosition,
    /// Work nonce does not meet the threshold for this block's details.
    InsufficientWork,
}

impl ProcessResult {
    /// Short identifier surfaced to submitters.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessResult::Progress => "progress",
            ProcessResult::Old => "old",
            ProcessResult::BadSignature => "bad_signature",
            ProcessResult::NegativeSpend => "negative_spend",
            ProcessResult::Fork => "fork",
            ProcessResult::Unreceivable => "unreceivable",
            ProcessResult::GapPrevious => "gap_previous",
            ProcessResult::GapSource => "gap_source",
            ProcessResult::GapEpochOpenPending => "gap_epoch_open_pending",
            ProcessResult::OpenedBurnAccount => "opened_burn_account",
            ProcessResult::BalanceMismatch => "balance_mismatch",
            ProcessResult::RepresentativeMismatch => "representative_mismatch",
            ProcessResult::BlockPosition => "block_position",
            ProcessResult::InsufficientWork => "insufficient_work",
        }
    }

    pub fn is_progress(&self) -> bool {
        matches!(self, ProcessResult::Progress)
    }

    /// Dependency-missing results route to the unchecked pool.
    pub fn is_gap(&self) -> bool {
        matches!(
            self,
            ProcessResult::GapPrevious | ProcessResult::GapSource | ProcessResult::GapEpochOpenPending
        )
    }
}

/// Outcome of a call to [`crate::Ledger::rollback`]. Not every rejection
/// here is an error either -- `AlreadyConfirmed` is an ordinary refusal a
/// caller is expected to handle.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum RollbackResult {
    /// `n` blocks were rolled back (may exceed 1 if a dependent receive on
    /// another chain had to be cascaded first).
    RolledBack { blocks: u64 },
    /// The target hash is unknown.
    NotFound,
    /// The target hash is at or below the account's confirmation height.
    AlreadyConfirmed,
}

/// Infrastructure faults: store I/O, codec errors, or an invariant the
/// ledger assumes never breaks (e.g. a sideband missing for a block that
/// exists). Never constructed for a plain rejection -- see module docs.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("store error: {0}")]
    Store(#[from] DbError),

    #[error("data invariant violated: {0}")]
    Invariant(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
