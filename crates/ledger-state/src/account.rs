//! Per-account chain record and the pending (receivable)
//! entries credited to, but not yet claimed by, an account.

use borsh::{BorshDeserialize, BorshSerialize};
use ledger_primitives::prelude::*;

/// The head, balance, and bookkeeping for one account's chain.
///
/// Invariant: `head` is the tip of the chain; `block_count` equals the
/// number of applied blocks on it; `epoch` is the highest epoch reached.
#[derive(Clone, Eq, PartialEq, Debug, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct AccountInfo {
    pub head: BlockHash,
    pub representative: AccountId,
    pub open_block: BlockHash,
    pub balance: Amount,
    pub modified_time: u64,
    pub block_count: u64,
    pub epoch: u32,
}

impl AccountInfo {
    pub fn new_opened(
        open_block: BlockHash,
        representative: AccountId,
        balance: Amount,
        modified_time: u64,
        epoch: u32,
    ) -> Self {
        Self {
            head: open_block,
            representative,
            open_block,
            balance,
            modified_time,
            block_count: 1,
            epoch,
        }
    }
}

/// Key under which a pending (receivable) entry is stored: the recipient
/// account and the hash of the send block that credited it.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct PendingKey {
    pub destination: AccountId,
    pub send_hash: BlockHash,
}

impl PendingKey {
    pub fn new(destination: AccountId, send_hash: BlockHash) -> Self {
        Self { destination, send_hash }
    }
}

/// Value sent by `source` and not yet received, keyed by [`PendingKey`].
/// `epoch` is the sender's epoch at send time: a receiver at
/// a lower epoch is auto-upgraded to it on receipt.
#[derive(Copy, Clone, Eq, PartialEq, Debug, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct PendingEntry {
    pub source: AccountId,
    pub amount: Amount,
    pub epoch: u32,
}

/// Per-account confirmation-height record. A block is
/// confirmed iff its sideband height is `<= height`.
#[derive(Copy, Clone, Eq, PartialEq, Debug, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct ConfirmationHeightInfo {
    pub height: u64,
    pub frontier: BlockHash,
}

impl ConfirmationHeightInfo {
    pub fn genesis(frontier: BlockHash) -> Self {
        Self { height: 1, frontier }
    }
}
