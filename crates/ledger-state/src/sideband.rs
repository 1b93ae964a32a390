//! Derived per-block metadata computed at process-time and stored
//! alongside the block so queries never need to re-derive it.

use borsh::{BorshDeserialize, BorshSerialize};
use ledger_primitives::prelude::*;

/// The details tag computed once at process-time.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct BlockDetails {
    pub epoch: u32,
    pub is_send: bool,
    pub is_receive: bool,
    pub is_epoch: bool,
}

/// Metadata derived for every stored block.
#[derive(Clone, Eq, PartialEq, Debug, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct Sideband {
    pub account: AccountId,
    pub height: u64,
    pub timestamp: u64,
    pub successor: Option<BlockHash>,
    pub balance: Amount,
    pub details: BlockDetails,
}

impl Sideband {
    pub fn is_send(&self) -> bool {
        self.details.is_send
    }

    pub fn is_receive(&self) -> bool {
        self.details.is_receive
    }

    pub fn is_epoch(&self) -> bool {
        self.details.is_epoch
    }
}
