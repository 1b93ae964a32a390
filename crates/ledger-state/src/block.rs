//! The five legacy block kinds and the unified state block.
//!
//! Every kind carries a signature and a work nonce on top of its
//! kind-specific payload. The canonical hash is computed over the payload
//! alone -- signature and work target that hash, so they cannot be part of
//! it, the same convention the original chain uses.

use borsh::{BorshDeserialize, BorshSerialize};
use ledger_primitives::prelude::*;

macro_rules! block_kind {
    ($name:ident, $payload:ident { $($field:ident : $ty:ty),+ $(,)? }) => {
        #[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
        #[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
        pub struct $payload {
            $(pub $field: $ty),+
        }

        #[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
        #[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
        pub struct $name {
            pub payload: $payload,
            pub signature: Signature,
            pub work: Work,
        }

        impl $name {
            /// Canonical hash, computed over the payload only.
            pub fn hash(&self) -> BlockHash {
                BlockHash::from(ledger_primitives::hash::compute_borsh_hash(&self.payload))
            }
        }
    };
}

block_kind!(SendBlock, SendPayload {
    previous: BlockHash,
    destination: AccountId,
    balance: Amount,
});

block_kind!(ReceiveBlock, ReceivePayload {
    previous: BlockHash,
    source: BlockHash,
});

block_kind!(OpenBlock, OpenPayload {
    source: BlockHash,
    representative: AccountId,
    account: AccountId,
});

block_kind!(ChangeBlock, ChangePayload {
    previous: BlockHash,
    representative: AccountId,
});

block_kind!(StateBlock, StatePayload {
    account: AccountId,
    previous: BlockHash,
    representative: AccountId,
    balance: Amount,
    link: Buf32,
});

/// A stored block: one of the five legacy kinds, or the unified state kind.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub enum Block {
    Send(SendBlock),
    Receive(ReceiveBlock),
    Open(OpenBlock),
    Change(ChangeBlock),
    State(StateBlock),
}

impl Block {
    pub fn hash(&self) -> BlockHash {
        match self {
            Block::Send(b) => b.hash(),
            Block::Receive(b) => b.hash(),
            Block::Open(b) => b.hash(),
            Block::Change(b) => b.hash(),
            Block::State(b) => b.hash(),
        }
    }

    pub fn signature(&self) -> &Signature {
        match self {
            Block::Send(b) => &b.signature,
            Block::Receive(b) => &b.signature,
            Block::Open(b) => &b.signature,
            Block::Change(b) => &b.signature,
            Block::State(b) => &b.signature,
        }
    }

    pub fn work(&self) -> Work {
        match self {
            Block::Send(b) => b.work,
            Block::Receive(b) => b.work,
            Block::Open(b) => b.work,
            Block::Change(b) => b.work,
            Block::State(b) => b.work,
        }
    }

    /// The previous-block hash this block sits on, if it declares one.
    /// `Open` blocks and state-opens have none (the account is the root
    /// instead, see [`Block::root_if_unopened`]).
    pub fn previous(&self) -> Option<BlockHash> {
        match self {
            Block::Send(b) => Some(b.payload.previous),
            Block::Receive(b) => Some(b.payload.previous),
            Block::Open(_) => None,
            Block::Change(b) => Some(b.payload.previous),
            Block::State(b) => {
                if b.payload.previous.is_zero() {
                    None
                } else {
                    Some(b.payload.previous)
                }
            }
        }
    }

    /// The hash of the source/send block this block claims to receive from,
    /// for receive/open/state-receive kinds.
    pub fn source(&self) -> Option<BlockHash> {
        match self {
            Block::Receive(b) => Some(b.payload.source),
            Block::Open(b) => Some(b.payload.source),
            Block::State(b) => Some(BlockHash::from(b.payload.link)),
            _ => None,
        }
    }

    /// Whether this is a unified state block.
    pub fn is_state(&self) -> bool {
        matches!(self, Block::State(_))
    }

    /// The account this block was opened on, if it is an `Open`/state-open
    /// block and therefore carries it explicitly. Legacy send/receive/change
    /// blocks do not carry the account -- it's implied by which chain the
    /// caller is appending to.
    pub fn declared_account(&self) -> Option<AccountId> {
        match self {
            Block::Open(b) => Some(b.payload.account),
            Block::State(b) => Some(b.payload.account),
            _ => None,
        }
    }

    pub fn declared_balance(&self) -> Option<Amount> {
        match self {
            Block::Send(b) => Some(b.payload.balance),
            Block::State(b) => Some(b.payload.balance),
            _ => None,
        }
    }

    pub fn declared_representative(&self) -> Option<AccountId> {
        match self {
            Block::Open(b) => Some(b.payload.representative),
            Block::Change(b) => Some(b.payload.representative),
            Block::State(b) => Some(b.payload.representative),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acct(b: u8) -> AccountId {
        AccountId::from(Buf32::from([b; 32]))
    }

    #[test]
    fn hash_excludes_signature_and_work() {
        let payload = SendPayload {
            previous: BlockHash::zero(),
            destination: acct(1),
            balance: 100,
        };
        let b1 = SendBlock {
            payload: payload.clone(),
            signature: Signature(Buf64::zero()),
            work: Work(1),
        };
        let b2 = SendBlock {
            payload,
            signature: Signature(Buf64::from([9u8; 64])),
            work: Work(2),
        };
        assert_eq!(b1.hash(), b2.hash());
    }

    #[test]
    fn serialize_round_trip_preserves_hash() {
        let block = Block::Open(OpenBlock {
            payload: OpenPayload {
                source: BlockHash::from(Buf32::from([3u8; 32])),
                representative: acct(2),
                account: acct(3),
            },
            signature: Signature(Buf64::zero()),
            work: Work(42),
        });
        let enc = borsh::to_vec(&block).unwrap();
        let dec: Block = borsh::BorshDeserialize::try_from_slice(&enc).unwrap();
        assert_eq!(block, dec);
        assert_eq!(block.hash(), dec.hash());
    }
}
