//! `rockbound`/`rocksdb`-backed implementation of the `ledger-db` traits:
//! one `DB` handle, one `Schema` per table, `SchemaBatch` for multi-put
//! atomicity.

pub mod errors;
pub mod macros;
pub mod schemas;

use std::path::Path;
use std::sync::Arc;

use ledger_db::{
    AccountProvider, AccountStore, ConfirmationHeightProvider, ConfirmationHeightStore, DbResult, FrontierProvider,
    FrontierStore, MetaProvider, MetaStore, OnlineWeightProvider, OnlineWeightSample, OnlineWeightStore, PeerInfo,
    PeerProvider, PeerStore, PendingProvider, PendingStore, UncheckedEntry, UncheckedProvider, UncheckedStore,
};
use ledger_db::{BlockProvider, BlockStore, Database};
use ledger_primitives::prelude::*;
use ledger_state::prelude::*;
use rockbound::{SchemaBatch, DB};
use rocksdb::Options;

use crate::errors::backend_error;
use crate::schemas::{
    AccountSchema, BlockSchema, ConfirmationHeightSchema, FrontierSchema, MetaSchema, OnlineWeightSchema, PeerSchema,
    PendingReceiverSchema, PendingSchema, SidebandSchema, UncheckedSchema, COLUMN_FAMILIES, ONLINE_WEIGHT_NEXT_KEY,
};

const DB_NAME: &str = "ledger_db";

fn db_opts() -> Options {
    let mut opts = Options::default();
    opts.create_if_missing(true);
    opts.create_missing_column_families(true);
    opts
}

/// One open `rocksdb`/`rockbound` handle shared (via `Arc`) across every
/// table view. Opening is the only fallible, path-dependent step; once
/// open, every table is just a differently-typed view over the same `DB`.
pub struct RocksDatabase {
    db: Arc<DB>,
}

impl RocksDatabase {
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let column_families = COLUMN_FAMILIES.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let db = DB::open(path.as_ref(), DB_NAME, column_families, &db_opts())?;
        Ok(Self { db: Arc::new(db) })
    }
}

impl Database for RocksDatabase {
    type Accounts = Self;
    type Blocks = Self;
    type Pending = Self;
    type Frontiers = Self;
    type ConfirmationHeights = Self;
    type Peers = Self;
    type OnlineWeight = Self;
    type Unchecked = Self;
    type Meta = Self;

    fn accounts(&self) -> &Self::Accounts {
        self
    }
    fn blocks(&self) -> &Self::Blocks {
        self
    }
    fn pending(&self) -> &Self::Pending {
        self
    }
    fn frontiers(&self) -> &Self::Frontiers {
        self
    }
    fn confirmation_heights(&self) -> &Self::ConfirmationHeights {
        self
    }
    fn peers(&self) -> &Self::Peers {
        self
    }
    fn online_weight(&self) -> &Self::OnlineWeight {
        self
    }
    fn unchecked(&self) -> &Self::Unchecked {
        self
    }
    fn meta(&self) -> &Self::Meta {
        self
    }
}

impl AccountProvider for RocksDatabase {
    fn get_account(&self, account: &AccountId) -> DbResult<Option<AccountInfo>> {
        self.db.get::<AccountSchema>(account).map_err(backend_error)
    }

    fn account_count(&self) -> DbResult<u64> {
        Ok(self.db.iter::<AccountSchema>().map_err(backend_error)?.count() as u64)
    }

    fn all_accounts(&self) -> DbResult<Vec<(AccountId, AccountInfo)>> {
        let rows = self.db.iter::<AccountSchema>().map_err(backend_error)?;
        rows.map(|r| r.map(|kv| kv.into_tuple()).map_err(backend_error)).collect()
    }
}

impl AccountStore for RocksDatabase {
    fn put_account(&self, account: &AccountId, info: &AccountInfo) -> DbResult<()> {
        self.db.put::<AccountSchema>(account, info).map_err(backend_error)
    }

    fn delete_account(&self, account: &AccountId) -> DbResult<()> {
        self.db.delete::<AccountSchema>(account).map_err(backend_error)
    }
}

impl BlockProvider for RocksDatabase {
    fn get_block(&self, hash: &BlockHash) -> DbResult<Option<Block>> {
        self.db.get::<BlockSchema>(hash).map_err(backend_error)
    }

    fn get_sideband(&self, hash: &BlockHash) -> DbResult<Option<Sideband>> {
        self.db.get::<SidebandSchema>(hash).map_err(backend_error)
    }

    fn block_count(&self) -> DbResult<u64> {
        Ok(self.db.iter::<BlockSchema>().map_err(backend_error)?.count() as u64)
    }
}

impl BlockStore for RocksDatabase {
    fn put_block(&self, hash: &BlockHash, block: &Block, sideband: &Sideband) -> DbResult<()> {
        if self.db.get::<BlockSchema>(hash).map_err(backend_error)?.is_some() {
            return Err(ledger_db::DbError::DuplicateKey);
        }
        let mut batch = SchemaBatch::new();
        batch.put::<BlockSchema>(hash, block).map_err(backend_error)?;
        batch.put::<SidebandSchema>(hash, sideband).map_err(backend_error)?;
        self.db.write_schemas(batch).map_err(backend_error)
    }

    fn delete_block(&self, hash: &BlockHash) -> DbResult<()> {
        let mut batch = SchemaBatch::new();
        batch.delete::<BlockSchema>(hash).map_err(backend_error)?;
        batch.delete::<SidebandSchema>(hash).map_err(backend_error)?;
        self.db.write_schemas(batch).map_err(backend_error)
    }

    fn set_successor(&self, hash: &BlockHash, successor: Option<BlockHash>) -> DbResult<()> {
        if let Some(mut sideband) = self.db.get::<SidebandSchema>(hash).map_err(backend_error)? {
            sideband.successor = successor;
            self.db.put::<SidebandSchema>(hash, &sideband).map_err(backend_error)?;
        }
        Ok(())
    }
}

impl PendingProvider for RocksDatabase {
    fn get_pending(&self, key: &PendingKey) -> DbResult<Option<PendingEntry>> {
        self.db.get::<PendingSchema>(key).map_err(backend_error)
    }

    fn pending_for_account(&self, destination: &AccountId) -> DbResult<Vec<(PendingKey, PendingEntry)>> {
        // `PendingSchema`'s key is `(destination, send_hash)`, borsh-encoded
        // in field order, so entries for one destination form a contiguous
        // run; a full scan with a filter keeps this backend's API surface
        // to exactly what `rockbound::DB::iter` already provides.
        let rows = self.db.iter::<PendingSchema>().map_err(backend_error)?;
        let mut out = Vec::new();
        for row in rows {
            let (key, value) = row.map_err(backend_error)?.into_tuple();
            if &key.destination == destination {
                out.push((key, value));
            }
        }
        Ok(out)
    }

    fn get_receiver(&self, send_hash: &BlockHash) -> DbResult<Option<BlockHash>> {
        self.db.get::<PendingReceiverSchema>(send_hash).map_err(backend_error)
    }
}

impl PendingStore for RocksDatabase {
    fn put_pending(&self, key: &PendingKey, entry: &PendingEntry) -> DbResult<()> {
        self.db.put::<PendingSchema>(key, entry).map_err(backend_error)
    }

    fn delete_pending(&self, key: &PendingKey) -> DbResult<()> {
        self.db.delete::<PendingSchema>(key).map_err(backend_error)
    }

    fn put_receiver(&self, send_hash: &BlockHash, receiver: &BlockHash) -> DbResult<()> {
        self.db.put::<PendingReceiverSchema>(send_hash, receiver).map_err(backend_error)
    }

    fn delete_receiver(&self, send_hash: &BlockHash) -> DbResult<()> {
        self.db.delete::<PendingReceiverSchema>(send_hash).map_err(backend_error)
    }
}

impl FrontierProvider for RocksDatabase {
    fn get_frontier_account(&self, legacy_hash: &BlockHash) -> DbResult<Option<AccountId>> {
        self.db.get::<FrontierSchema>(legacy_hash).map_err(backend_error)
    }
}

impl FrontierStore for RocksDatabase {
    fn put_frontier(&self, legacy_hash: &BlockHash, account: &AccountId) -> DbResult<()> {
        self.db.put::<FrontierSchema>(legacy_hash, account).map_err(backend_error)
    }

    fn delete_frontier(&self, legacy_hash: &BlockHash) -> DbResult<()> {
        self.db.delete::<FrontierSchema>(legacy_hash).map_err(backend_error)
    }
}

impl ConfirmationHeightProvider for RocksDatabase {
    fn get_confirmation_height(&self, account: &AccountId) -> DbResult<Option<ConfirmationHeightInfo>> {
        self.db.get::<ConfirmationHeightSchema>(account).map_err(backend_error)
    }

    fn all_confirmation_heights(&self) -> DbResult<Vec<(AccountId, ConfirmationHeightInfo)>> {
        let rows = self.db.iter::<ConfirmationHeightSchema>().map_err(backend_error)?;
        rows.map(|r| r.map(|kv| kv.into_tuple()).map_err(backend_error)).collect()
    }
}

impl ConfirmationHeightStore for RocksDatabase {
    fn put_confirmation_height(&self, account: &AccountId, info: &ConfirmationHeightInfo) -> DbResult<()> {
        self.db.put::<ConfirmationHeightSchema>(account, info).map_err(backend_error)
    }

    fn clear_confirmation_height(&self, account: &AccountId) -> DbResult<()> {
        self.db.delete::<ConfirmationHeightSchema>(account).map_err(backend_error)
    }
}

impl PeerProvider for RocksDatabase {
    fn list_peers(&self) -> DbResult<Vec<PeerInfo>> {
        let rows = self.db.iter::<PeerSchema>().map_err(backend_error)?;
        rows.map(|r| r.map(|kv| kv.into_tuple().1).map_err(backend_error)).collect()
    }
}

impl PeerStore for RocksDatabase {
    fn put_peer(&self, info: &PeerInfo) -> DbResult<()> {
        self.db.put::<PeerSchema>(&info.address, info).map_err(backend_error)
    }

    fn delete_peer(&self, address: &str) -> DbResult<()> {
        self.db.delete::<PeerSchema>(&address.to_string()).map_err(backend_error)
    }
}

impl OnlineWeightProvider for RocksDatabase {
    fn online_weight_samples(&self) -> DbResult<Vec<OnlineWeightSample>> {
        let rows = self.db.iter::<OnlineWeightSchema>().map_err(backend_error)?;
        rows.map(|r| r.map(|kv| kv.into_tuple().1).map_err(backend_error)).collect()
    }
}

impl OnlineWeightStore for RocksDatabase {
    fn put_online_weight_sample(&self, sample: OnlineWeightSample) -> DbResult<()> {
        let next = self
            .db
            .get::<crate::schemas::CounterSchema>(&ONLINE_WEIGHT_NEXT_KEY.to_string())
            .map_err(backend_error)?
            .unwrap_or(0);
        let mut batch = SchemaBatch::new();
        batch.put::<OnlineWeightSchema>(&next, &sample).map_err(backend_error)?;
        batch
            .put::<crate::schemas::CounterSchema>(&ONLINE_WEIGHT_NEXT_KEY.to_string(), &(next + 1))
            .map_err(backend_error)?;
        self.db.write_schemas(batch).map_err(backend_error)
    }
}

impl UncheckedProvider for RocksDatabase {
    fn get_unchecked(&self, dependency: &BlockHash) -> DbResult<Vec<UncheckedEntry>> {
        Ok(self.db.get::<UncheckedSchema>(dependency).map_err(backend_error)?.unwrap_or_default())
    }

    fn unchecked_count(&self) -> DbResult<usize> {
        let rows = self.db.iter::<UncheckedSchema>().map_err(backend_error)?;
        let mut total = 0usize;
        for row in rows {
            let (_, entries) = row.map_err(backend_error)?.into_tuple();
            total += entries.len();
        }
        Ok(total)
    }
}

impl UncheckedStore for RocksDatabase {
    fn put_unchecked(&self, dependency: &BlockHash, entry: UncheckedEntry) -> DbResult<()> {
        let mut entries = self.db.get::<UncheckedSchema>(dependency).map_err(backend_error)?.unwrap_or_default();
        entries.push(entry);
        self.db.put::<UncheckedSchema>(dependency, &entries).map_err(backend_error)
    }

    fn take_unchecked(&self, dependency: &BlockHash) -> DbResult<Vec<UncheckedEntry>> {
        let entries = self.db.get::<UncheckedSchema>(dependency).map_err(backend_error)?.unwrap_or_default();
        self.db.delete::<UncheckedSchema>(dependency).map_err(backend_error)?;
        Ok(entries)
    }

    fn evict_oldest_unchecked(&self) -> DbResult<Option<BlockHash>> {
        let rows = self.db.iter::<UncheckedSchema>().map_err(backend_error)?;
        let mut oldest: Option<(BlockHash, u64)> = None;
        for row in rows {
            let (dep, entries) = row.map_err(backend_error)?.into_tuple();
            if let Some(first) = entries.first() {
                if oldest.map(|(_, ts)| first.inserted_at < ts).unwrap_or(true) {
                    oldest = Some((dep, first.inserted_at));
                }
            }
        }
        if let Some((dep, _)) = oldest {
            let mut entries = self.db.get::<UncheckedSchema>(&dep).map_err(backend_error)?.unwrap_or_default();
            if !entries.is_empty() {
                entries.remove(0);
            }
            if entries.is_empty() {
                self.db.delete::<UncheckedSchema>(&dep).map_err(backend_error)?;
            } else {
                self.db.put::<UncheckedSchema>(&dep, &entries).map_err(backend_error)?;
            }
        }
        Ok(oldest.map(|(dep, _)| dep))
    }
}

impl MetaProvider for RocksDatabase {
    fn schema_version(&self) -> DbResult<Option<u32>> {
        self.db.get::<MetaSchema>(&schemas::SCHEMA_VERSION_KEY.to_string()).map_err(backend_error)
    }
}

impl MetaStore for RocksDatabase {
    fn set_schema_version(&self, version: u32) -> DbResult<()> {
        self.db.put::<MetaSchema>(&schemas::SCHEMA_VERSION_KEY.to_string(), &version).map_err(backend_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_tmp() -> (TempDir, RocksDatabase) {
        let dir = TempDir::new().expect("tempdir");
        let db = RocksDatabase::open(dir.path()).expect("open rocksdb");
        (dir, db)
    }

    fn acct(b: u8) -> AccountId {
        AccountId::from(Buf32::from([b; 32]))
    }

    #[test]
    fn account_round_trips_through_rocksdb() {
        let (_dir, db) = open_tmp();
        let a = acct(7);
        let info = AccountInfo::new_opened(BlockHash::from(Buf32::from([1u8; 32])), a, 50, 1, 0);
        db.accounts().put_account(&a, &info).unwrap();
        assert_eq!(db.accounts().get_account(&a).unwrap(), Some(info));
        assert_eq!(db.accounts().account_count().unwrap(), 1);
    }

    #[test]
    fn duplicate_block_insert_rejected() {
        let (_dir, db) = open_tmp();
        let hash = BlockHash::from(Buf32::from([2u8; 32]));
        let block = Block::Change(ChangeBlock {
            payload: ChangePayload { previous: BlockHash::zero(), representative: acct(1) },
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
        assert!(matches!(db.blocks().put_block(&hash, &block, &sideband), Err(ledger_db::DbError::DuplicateKey)));
    }

    #[test]
    fn schema_version_persists_after_reopen() {
        let dir = TempDir::new().expect("tempdir");
        {
            let db = RocksDatabase::open(dir.path()).unwrap();
            db.meta().set_schema_version(3).unwrap();
        }
        let db = RocksDatabase::open(dir.path()).unwrap();
        assert_eq!(db.meta().schema_version().unwrap(), Some(3));
    }

    #[test]
    fn pending_for_account_filters_by_destination() {
        let (_dir, db) = open_tmp();
        let dest = acct(3);
        let other = acct(4);
        let key1 = PendingKey::new(dest, BlockHash::from(Buf32::from([5u8; 32])));
        let key2 = PendingKey::new(other, BlockHash::from(Buf32::from([6u8; 32])));
        let entry = PendingEntry { source: acct(9), amount: 10, epoch: 0 };
        db.pending().put_pending(&key1, &entry).unwrap();
        db.pending().put_pending(&key2, &entry).unwrap();

        let rows = db.pending().pending_for_account(&dest).unwrap();
        assert_eq!(rows, vec![(key1, entry)]);
    }
}
