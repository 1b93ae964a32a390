//! In-memory backend used by unit tests and, transiently, by bootstrap
//! tooling: a thin aggregate over `Arc`-wrapped per-table stores that are
//! also their own providers.

use std::collections::HashMap;
use std::sync::Arc;

use ledger_primitives::prelude::*;
use ledger_state::prelude::*;
use parking_lot::RwLock;

use crate::errors::{DbError, DbResult};
use crate::traits::*;

#[derive(Default)]
pub struct MemoryAccounts(RwLock<HashMap<AccountId, AccountInfo>>);

impl AccountProvider for MemoryAccounts {
    fn get_account(&self, account: &AccountId) -> DbResult<Option<AccountInfo>> {
        Ok(self.0.read().get(account).cloned())
    }

    fn account_count(&self) -> DbResult<u64> {
        Ok(self.0.read().len() as u64)
    }

    fn all_accounts(&self) -> DbResult<Vec<(AccountId, AccountInfo)>> {
        Ok(self.0.read().iter().map(|(k, v)| (*k, v.clone())).collect())
    }
}

impl AccountStore for MemoryAccounts {
    fn put_account(&self, account: &AccountId, info: &AccountInfo) -> DbResult<()> {
        self.0.write().insert(*account, info.clone());
        Ok(())
    }

    fn delete_account(&self, account: &AccountId) -> DbResult<()> {
        self.0.write().remove(account);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryBlocks(RwLock<HashMap<BlockHash, (Block, Sideband)>>);

impl BlockProvider for MemoryBlocks {
    fn get_block(&self, hash: &BlockHash) -> DbResult<Option<Block>> {
        Ok(self.0.read().get(hash).map(|(b, _)| b.clone()))
    }

    fn get_sideband(&self, hash: &BlockHash) -> DbResult<Option<Sideband>> {
        Ok(self.0.read().get(hash).map(|(_, s)| s.clone()))
    }

    fn block_count(&self) -> DbResult<u64> {
        Ok(self.0.read().len() as u64)
    }
}

impl BlockStore for MemoryBlocks {
    fn put_block(&self, hash: &BlockHash, block: &Block, sideband: &Sideband) -> DbResult<()> {
        if self.0.read().contains_key(hash) {
            return Err(DbError::DuplicateKey);
        }
        self.0.write().insert(*hash, (block.clone(), sideband.clone()));
        Ok(())
    }

    fn delete_block(&self, hash: &BlockHash) -> DbResult<()> {
        self.0.write().remove(hash);
        Ok(())
    }

    fn set_successor(&self, hash: &BlockHash, successor: Option<BlockHash>) -> DbResult<()> {
        if let Some((_, sideband)) = self.0.write().get_mut(hash) {
            sideband.successor = successor;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryPending {
    entries: RwLock<HashMap<PendingKey, PendingEntry>>,
    receivers: RwLock<HashMap<BlockHash, BlockHash>>,
}

impl PendingProvider for MemoryPending {
    fn get_pending(&self, key: &PendingKey) -> DbResult<Option<PendingEntry>> {
        Ok(self.entries.read().get(key).copied())
    }

    fn pending_for_account(&self, destination: &AccountId) -> DbResult<Vec<(PendingKey, PendingEntry)>> {
        Ok(self
            .entries
            .read()
            .iter()
            .filter(|(k, _)| &k.destination == destination)
            .map(|(k, v)| (*k, *v))
            .collect())
    }

    fn get_receiver(&self, send_hash: &BlockHash) -> DbResult<Option<BlockHash>> {
        Ok(self.receivers.read().get(send_hash).copied())
    }
}

impl PendingStore for MemoryPending {
    fn put_pending(&self, key: &PendingKey, entry: &PendingEntry) -> DbResult<()> {
        self.entries.write().insert(*key, *entry);
        Ok(())
    }

    fn delete_pending(&self, key: &PendingKey) -> DbResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn put_receiver(&self, send_hash: &BlockHash, receiver: &BlockHash) -> DbResult<()> {
        self.receivers.write().insert(*send_hash, *receiver);
        Ok(())
    }

    fn delete_receiver(&self, send_hash: &BlockHash) -> DbResult<()> {
        self.receivers.write().remove(send_hash);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryFrontiers(RwLock<HashMap<BlockHash, AccountId>>);

impl FrontierProvider for MemoryFrontiers {
    fn get_frontier_account(&self, legacy_hash: &BlockHash) -> DbResult<Option<AccountId>> {
        Ok(self.0.read().get(legacy_hash).copied())
    }
}

impl FrontierStore for MemoryFrontiers {
    fn put_frontier(&self, legacy_hash: &BlockHash, account: &AccountId) -> DbResult<()> {
        self.0.write().insert(*legacy_hash, *account);
        Ok(())
    }

    fn delete_frontier(&self, legacy_hash: &BlockHash) -> DbResult<()> {
        self.0.write().remove(legacy_hash);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryConfirmationHeights(RwLock<HashMap<AccountId, ConfirmationHeightInfo>>);

impl ConfirmationHeightProvider for MemoryConfirmationHeights {
    fn get_confirmation_height(&self, account: &AccountId) -> DbResult<Option<ConfirmationHeightInfo>> {
        Ok(self.0.read().get(account).copied())
    }

    fn all_confirmation_heights(&self) -> DbResult<Vec<(AccountId, ConfirmationHeightInfo)>> {
        Ok(self.0.read().iter().map(|(k, v)| (*k, *v)).collect())
    }
}

impl ConfirmationHeightStore for MemoryConfirmationHeights {
    fn put_confirmation_height(&self, account: &AccountId, info: &ConfirmationHeightInfo) -> DbResult<()> {
        self.0.write().insert(*account, *info);
        Ok(())
    }

    fn clear_confirmation_height(&self, account: &AccountId) -> DbResult<()> {
        self.0.write().remove(account);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryPeers(RwLock<HashMap<String, PeerInfo>>);

impl PeerProvider for MemoryPeers {
    fn list_peers(&self) -> DbResult<Vec<PeerInfo>> {
        Ok(self.0.read().values().cloned().collect())
    }
}

impl PeerStore for MemoryPeers {
    fn put_peer(&self, info: &PeerInfo) -> DbResult<()> {
        self.0.write().insert(info.address.clone(), info.clone());
        Ok(())
    }

    fn delete_peer(&self, address: &str) -> DbResult<()> {
        self.0.write().remove(address);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryOnlineWeight(RwLock<Vec<OnlineWeightSample>>);

impl OnlineWeightProvider for MemoryOnlineWeight {
    fn online_weight_samples(&self) -> DbResult<Vec<OnlineWeightSample>> {
        Ok(self.0.read().clone())
    }
}

impl OnlineWeightStore for MemoryOnlineWeight {
    fn put_online_weight_sample(&self, sample: OnlineWeightSample) -> DbResult<()> {
        self.0.write().push(sample);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryUnchecked(RwLock<HashMap<BlockHash, Vec<UncheckedEntry>>>);

impl UncheckedProvider for MemoryUnchecked {
    fn get_unchecked(&self, dependency: &BlockHash) -> DbResult<Vec<UncheckedEntry>> {
        Ok(self.0.read().get(dependency).cloned().unwrap_or_default())
    }

    fn unchecked_count(&self) -> DbResult<usize> {
        Ok(self.0.read().values().map(|v| v.len()).sum())
    }
}

impl UncheckedStore for MemoryUnchecked {
    fn put_unchecked(&self, dependency: &BlockHash, entry: UncheckedEntry) -> DbResult<()> {
        self.0.write().entry(*dependency).or_default().push(entry);
        Ok(())
    }

    fn take_unchecked(&self, dependency: &BlockHash) -> DbResult<Vec<UncheckedEntry>> {
        Ok(self.0.write().remove(dependency).unwrap_or_default())
    }

    fn evict_oldest_unchecked(&self) -> DbResult<Option<BlockHash>> {
        let mut guard = self.0.write();
        let oldest = guard
            .iter()
            .flat_map(|(dep, entries)| entries.iter().map(move |e| (*dep, e.inserted_at)))
            .min_by_key(|(_, ts)| *ts)
            .map(|(dep, _)| dep);

        if let Some(dep) = oldest {
            if let Some(entries) = guard.get_mut(&dep) {
                if !entries.is_empty() {
                    entries.remove(0);
                }
                if entries.is_empty() {
                    guard.remove(&dep);
                }
            }
        }
        Ok(oldest)
    }
}

#[derive(Default)]
pub struct MemoryMeta(RwLock<Option<u32>>);

impl MetaProvider for MemoryMeta {
    fn schema_version(&self) -> DbResult<Option<u32>> {
        Ok(*self.0.read())
    }
}

impl MetaStore for MemoryMeta {
    fn set_schema_version(&self, version: u32) -> DbResult<()> {
        *self.0.write() = Some(version);
        Ok(())
    }
}

/// Whole-store aggregate used by tests.
#[derive(Default)]
pub struct MemoryDatabase {
    accounts: Arc<MemoryAccounts>,
    blocks: Arc<MemoryBlocks>,
    pending: Arc<MemoryPending>,
    frontiers: Arc<MemoryFrontiers>,
    confirmation_heights: Arc<MemoryConfirmationHeights>,
    peers: Arc<MemoryPeers>,
    online_weight: Arc<MemoryOnlineWeight>,
    unchecked: Arc<MemoryUnchecked>,
    meta: Arc<MemoryMeta>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Database for MemoryDatabase {
    type Accounts = MemoryAccounts;
    type Blocks = MemoryBlocks;
    type Pending = MemoryPending;
    type Frontiers = MemoryFrontiers;
    type ConfirmationHeights = MemoryConfirmationHeights;
    type Peers = MemoryPeers;
    type OnlineWeight = MemoryOnlineWeight;
    type Unchecked = MemoryUnchecked;
    type Meta = MemoryMeta;

    fn accounts(&self) -> &Self::Accounts {
        &self.accounts
    }

    fn blocks(&self) -> &Self::Blocks {
        &self.blocks
    }

    fn pending(&self) -> &Self::Pending {
        &self.pending
    }

    fn frontiers(&self) -> &Self::Frontiers {
        &self.frontiers
    }

    fn confirmation_heights(&self) -> &Self::ConfirmationHeights {
        &self.confirmation_heights
    }

    fn peers(&self) -> &Self::Peers {
        &self.peers
    }

    fn online_weight(&self) -> &Self::OnlineWeight {
        &self.online_weight
    }

    fn unchecked(&self) -> &Self::Unchecked {
        &self.unchecked
    }

    fn meta(&self) -> &Self::Meta {
        &self.meta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acct(b: u8) -> AccountId {
        AccountId::from(Buf32::from([b; 32]))
    }

    #[test]
    fn duplicate_block_insert_rejected() {
        let db = MemoryDatabase::new();
        let hash = BlockHash::from(Buf32::from([1u8; 32]));
        let block = Block::Open(OpenBlock {
            payload: OpenPayload {
                source: BlockHash::zero(),
                representative: acct(1),
                account: acct(1),
            },
            signature: Signature(ledger_primitives::buf::Buf64::zero()),
            work: Work(0),
        });
        let sideband = Sideband {
            account: acct(1),
            height: 1,
            timestamp: 0,
            successor: None,
            balance: 0,
            details: BlockDetails::default(),
        };
        db.blocks().put_block(&hash, &block, &sideband).unwrap();
        assert!(matches!(
            db.blocks().put_block(&hash, &block, &sideband),
            Err(DbError::DuplicateKey)
        ));
    }

    #[test]
    fn unchecked_eviction_picks_oldest() {
        let db = MemoryDatabase::new();
        let dep1 = BlockHash::from(Buf32::from([1u8; 32]));
        let dep2 = BlockHash::from(Buf32::from([2u8; 32]));
        let block = Block::Change(ledger_state::prelude::ChangeBlock {
            payload: ledger_state::prelude::ChangePayload {
                previous: BlockHash::zero(),
                representative: acct(9),
            },
            signature: Signature(ledger_primitives::buf::Buf64::zero()),
            work: Work(0),
        });
        db.unchecked()
            .put_unchecked(
                &dep1,
                UncheckedEntry { block: block.clone(), tag: UncheckedTag::Unknown, inserted_at: 5 },
            )
            .unwrap();
        db.unchecked()
            .put_unchecked(&dep2, UncheckedEntry { block, tag: UncheckedTag::Unknown, inserted_at: 1 })
            .unwrap();

        let evicted = db.unchecked().evict_oldest_unchecked().unwrap();
        assert_eq!(evicted, Some(dep2));
        assert_eq!(db.unchecked().unchecked_count().unwrap(), 1);
    }
}
