//! Backend-agnostic store interfaces. Each table gets a narrow
//! `*Store`/`*Provider` pair, splitting write and read access so callers
//! can be generic over "just needs to read" vs. "needs to write" without
//! pulling in the whole database.

use borsh::{BorshDeserialize, BorshSerialize};
use ledger_primitives::prelude::*;
use ledger_state::prelude::*;

use crate::errors::DbResult;

/// Why a block sitting in the unchecked pool hasn't been resubmitted yet
///.
#[derive(Copy, Clone, Eq, PartialEq, Debug, BorshSerialize, BorshDeserialize)]
pub enum UncheckedTag {
    Unknown,
    Valid,
    ValidEpoch,
    Invalid,
}

#[derive(Clone, Debug, BorshSerialize, BorshDeserialize)]
pub struct UncheckedEntry {
    pub block: Block,
    pub tag: UncheckedTag,
    pub inserted_at: u64,
}

#[derive(Clone, Debug, BorshSerialize, BorshDeserialize)]
pub struct PeerInfo {
    pub address: String,
    pub last_seen: u64,
}

#[derive(Copy, Clone, Debug, BorshSerialize, BorshDeserialize)]
pub struct OnlineWeightSample {
    pub timestamp: u64,
    pub online_weight: Amount,
}

pub trait AccountProvider: Send + Sync {
    fn get_account(&self, account: &AccountId) -> DbResult<Option<AccountInfo>>;
    fn account_count(&self) -> DbResult<u64>;
    /// Every stored account, for cold-start cache rebuilds. Not on any hot path -- callers needing a single account
    /// use `get_account`.
    fn all_accounts(&self) -> DbResult<Vec<(AccountId, AccountInfo)>>;
}

pub trait AccountStore: Send + Sync {
    fn put_account(&self, account: &AccountId, info: &AccountInfo) -> DbResult<()>;
    fn delete_account(&self, account: &AccountId) -> DbResult<()>;
}

pub trait BlockProvider: Send + Sync {
    fn get_block(&self, hash: &BlockHash) -> DbResult<Option<Block>>;
    fn get_sideband(&self, hash: &BlockHash) -> DbResult<Option<Sideband>>;
    fn block_exists(&self, hash: &BlockHash) -> DbResult<bool> {
        Ok(self.get_block(hash)?.is_some())
    }
    fn block_count(&self) -> DbResult<u64>;
}

pub trait BlockStore: Send + Sync {
    fn put_block(&self, hash: &BlockHash, block: &Block, sideband: &Sideband) -> DbResult<()>;
    fn delete_block(&self, hash: &BlockHash) -> DbResult<()>;
    /// Updates only the successor pointer of an already-stored block's
    /// sideband, used when the next block on the chain is appended.
    fn set_successor(&self, hash: &BlockHash, successor: Option<BlockHash>) -> DbResult<()>;
}

pub trait PendingProvider: Send + Sync {
    fn get_pending(&self, key: &PendingKey) -> DbResult<Option<PendingEntry>>;
    /// All pending entries credited to `destination`, for `account_pending`.
    fn pending_for_account(&self, destination: &AccountId) -> DbResult<Vec<(PendingKey, PendingEntry)>>;
    /// The block that consumed the pending entry for `send_hash`, if any.
    /// Populated alongside pending deletion so a rollback of the original
    /// send can find and recursively roll back its receipt on another
    /// chain first.
    fn get_receiver(&self, send_hash: &BlockHash) -> DbResult<Option<BlockHash>>;
}

pub trait PendingStore: Send + Sync {
    fn put_pending(&self, key: &PendingKey, entry: &PendingEntry) -> DbResult<()>;
    fn delete_pending(&self, key: &PendingKey) -> DbResult<()>;
    fn put_receiver(&self, send_hash: &BlockHash, receiver: &BlockHash) -> DbResult<()>;
    fn delete_receiver(&self, send_hash: &BlockHash) -> DbResult<()>;
}

/// Legacy hash -> account index, retained so legacy-block chains (which
/// don't embed the account in the block itself) can still be resolved to
/// the account whose chain they're on.
pub trait FrontierProvider: Send + Sync {
    fn get_frontier_account(&self, legacy_hash: &BlockHash) -> DbResult<Option<AccountId>>;
}

pub trait FrontierStore: Send + Sync {
    fn put_frontier(&self, legacy_hash: &BlockHash, account: &AccountId) -> DbResult<()>;
    fn delete_frontier(&self, legacy_hash: &BlockHash) -> DbResult<()>;
}

pub trait ConfirmationHeightProvider: Send + Sync {
    fn get_confirmation_height(&self, account: &AccountId) -> DbResult<Option<ConfirmationHeightInfo>>;
    /// Every stored confirmation-height record, for cold-start cache
    /// rebuilds of the cemented-block counter.
    fn all_confirmation_heights(&self) -> DbResult<Vec<(AccountId, ConfirmationHeightInfo)>>;
}

pub trait ConfirmationHeightStore: Send + Sync {
    fn put_confirmation_height(&self, account: &AccountId, info: &ConfirmationHeightInfo) -> DbResult<()>;
    /// Clears the confirmation-height record for one account. Used by tests
    /// and recovery tooling only.
    fn clear_confirmation_height(&self, account: &AccountId) -> DbResult<()>;
}

pub trait PeerProvider: Send + Sync {
    fn list_peers(&self) -> DbResult<Vec<PeerInfo>>;
}

pub trait PeerStore: Send + Sync {
    fn put_peer(&self, info: &PeerInfo) -> DbResult<()>;
    fn delete_peer(&self, address: &str) -> DbResult<()>;
}

pub trait OnlineWeightProvider: Send + Sync {
    fn online_weight_samples(&self) -> DbResult<Vec<OnlineWeightSample>>;
}

pub trait OnlineWeightStore: Send + Sync {
    fn put_online_weight_sample(&self, sample: OnlineWeightSample) -> DbResult<()>;
}

pub trait UncheckedProvider: Send + Sync {
    fn get_unchecked(&self, dependency: &BlockHash) -> DbResult<Vec<UncheckedEntry>>;
    fn unchecked_count(&self) -> DbResult<usize>;
}

pub trait UncheckedStore: Send + Sync {
    fn put_unchecked(&self, dependency: &BlockHash, entry: UncheckedEntry) -> DbResult<()>;
    fn take_unchecked(&self, dependency: &BlockHash) -> DbResult<Vec<UncheckedEntry>>;
    /// Evicts the single oldest entry, used when the pool is over capacity.
    fn evict_oldest_unchecked(&self) -> DbResult<Option<BlockHash>>;
}

pub trait MetaProvider: Send + Sync {
    fn schema_version(&self) -> DbResult<Option<u32>>;
}

pub trait MetaStore: Send + Sync {
    fn set_schema_version(&self, version: u32) -> DbResult<()>;
}

/// Aggregates every table behind one handle, bundling its per-table
/// stores behind associated types so worker code can be generic over the
/// concrete backend.
pub trait Database: Send + Sync {
    type Accounts: AccountStore + AccountProvider;
    type Blocks: BlockStore + BlockProvider;
    type Pending: PendingStore + PendingProvider;
    type Frontiers: FrontierStore + FrontierProvider;
    type ConfirmationHeights: ConfirmationHeightStore + ConfirmationHeightProvider;
    type Peers: PeerStore + PeerProvider;
    type OnlineWeight: OnlineWeightStore + OnlineWeightProvider;
    type Unchecked: UncheckedStore + UncheckedProvider;
    type Meta: MetaStore + MetaProvider;

    fn accounts(&self) -> &Self::Accounts;
    fn blocks(&self) -> &Self::Blocks;
    fn pending(&self) -> &Self::Pending;
    fn frontiers(&self) -> &Self::Frontiers;
    fn confirmation_heights(&self) -> &Self::ConfirmationHeights;
    fn peers(&self) -> &Self::Peers;
    fn online_weight(&self) -> &Self::OnlineWeight;
    fn unchecked(&self) -> &Self::Unchecked;
    fn meta(&self) -> &Self::Meta;
}
