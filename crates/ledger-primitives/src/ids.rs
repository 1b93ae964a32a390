//! Account, block-hash and root identifiers.
//!
//! An account's public key doubles as its identifier, its chain root, and
//! (when designated) a representative identifier -- they're all 256-bit
//! values and the protocol overloads a single type across those roles, the
//! same way the source reuses a raw key as a link/destination field.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::buf::Buf32;

/// A 256-bit account public key. Doubles as a representative identifier.
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct AccountId(pub Buf32);

impl AccountId {
    pub const fn zero() -> Self {
        Self(Buf32::zero())
    }

    /// The burn account: the all-zero account, which may never be opened.
    pub const fn burn() -> Self {
        Self::zero()
    }

    pub fn is_burn(&self) -> bool {
        self.0.is_zero()
    }
}

impl From<Buf32> for AccountId {
    fn from(b: Buf32) -> Self {
        Self(b)
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A 256-bit block hash, computed over a block's canonical fields.
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct BlockHash(pub Buf32);

impl BlockHash {
    pub const fn zero() -> Self {
        Self(Buf32::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl From<Buf32> for BlockHash {
    fn from(b: Buf32) -> Self {
        Self(b)
    }
}

impl std::fmt::Display for BlockHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The root of a chain position: the previous block hash if the chain is
/// opened, or the account itself if this would be the first block.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum Root {
    Account(AccountId),
    Block(BlockHash),
}

impl Root {
    /// The raw 32 bytes underlying this root, used as a map key.
    pub fn as_buf(&self) -> Buf32 {
        match self {
            Root::Account(a) => a.0,
            Root::Block(h) => h.0,
        }
    }
}

/// Unique per chain position: (root, previous). Forks that extend the same
/// predecessor share a qualified root, which is what elections key on.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct QualifiedRoot {
    pub root: Buf32,
    pub previous: BlockHash,
}

impl QualifiedRoot {
    pub fn new(root: Buf32, previous: BlockHash) -> Self {
        Self { root, previous }
    }
}

/// Monetary amount. 128 bits comfortably holds the entire genesis supply.
pub type Amount = u128;

/// Ed25519/blake2b-style signature placeholder, verified against an
/// [`AccountId`] or the configured epoch signer.
#[derive(Copy, Clone, Eq, PartialEq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct Signature(pub crate::buf::Buf64);

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signature({})", self.0)
    }
}

/// Proof-of-work nonce. The threshold check itself is delegated to a
/// [`crate::work::WorkValidator`]; this crate only carries the value.
#[derive(Copy, Clone, Eq, PartialEq, Debug, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct Work(pub u64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burn_account_is_zero() {
        assert!(AccountId::burn().is_burn());
        assert!(!AccountId::from(Buf32::from([1u8; 32])).is_burn());
    }
}
