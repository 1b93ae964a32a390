//! External collaborator contracts the ledger calls through but never
//! implements itself: signature verification, work
//! thresholds, and the clock. Taken as pluggable traits rather than
//! hard-coded concrete types, the same way the state-transition layer
//! takes its execution context.

use ledger_primitives::prelude::*;
use ledger_state::prelude::*;

/// Verifies signatures on behalf of an account, and on behalf of the
/// protocol's epoch signer for epoch-upgrade blocks.
pub trait KeySigner: Send + Sync {
    /// Verifies `signature` over `message` as signed by `account`.
    fn verify_account(&self, account: &AccountId, message: &[u8], signature: &Signature) -> bool;

    /// Verifies `signature` over `message` as signed by the configured
    /// epoch signer for `epoch`. Returns `false` for an unrecognized epoch.
    fn verify_epoch_signer(&self, epoch: u32, message: &[u8], signature: &Signature) -> bool;
}

/// Monotonic and wall clocks the ledger needs: monotonic
/// time for election cooldowns, wall-clock time for the sideband
/// timestamp.
pub trait Clock: Send + Sync {
    fn unix_time(&self) -> u64;
}

/// Protocol-wide parameters the ledger is built against.
#[derive(Clone, Debug)]
pub struct LedgerParams {
    /// Total supply held by the genesis account at cold start.
    pub genesis_supply: Amount,
    pub genesis_account: AccountId,
    pub genesis_representative: AccountId,
    /// Stored block count below which `weight()` returns the bootstrap
    /// seed instead of the live aggregate.
    pub bootstrap_weight_max_blocks: u64,
}

impl Default for LedgerParams {
    fn default() -> Self {
        Self {
            genesis_supply: u128::MAX,
            genesis_account: AccountId::zero(),
            genesis_representative: AccountId::zero(),
            bootstrap_weight_max_blocks: ledger_primitives::constants::DEFAULT_BOOTSTRAP_WEIGHT_MAX_BLOCKS,
        }
    }
}

/// The transition a confirmation notifies observers with: the account whose
/// confirmation height advanced, its new height, and the block now at that
/// height.
#[derive(Clone, Debug)]
pub struct ConfirmationEvent {
    pub account: AccountId,
    pub new_height: u64,
    pub winner: BlockHash,
}

/// Fired once a block has been durably committed. Observers
/// run after the write transaction commits, never inside it.
#[derive(Clone, Debug)]
pub struct BlockObservedEvent {
    pub hash: BlockHash,
    pub account: AccountId,
    pub result: &'static str,
}

pub trait BlockObserver: Send + Sync {
    fn on_block_observed(&self, event: &BlockObservedEvent);
}

pub trait ConfirmationObserver: Send + Sync {
    fn on_confirmation(&self, event: &ConfirmationEvent);
}
