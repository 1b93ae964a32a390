//! In-RAM caches derived from the store.
//!
//! Collects derived, RAM-resident state behind a single guarded struct
//! rather than scattering module-level statics.

use std::collections::HashMap;

use ledger_db::Database;
use ledger_primitives::prelude::*;
use parking_lot::RwLock;

use crate::context::LedgerParams;
use crate::errors::LedgerResult;

#[derive(Default)]
struct Counters {
    account_count: u64,
    block_count: u64,
    cemented_count: u64,
    /// Derived side effect of having applied any epoch-2 (or higher) block
    /// anywhere on the chain. Never load-bearing: an implementation that always re-derives this by scanning would
    /// be equally conformant. Cached here purely for O(1) reads.
    epoch_two_started: bool,
}

/// Representative weights and the small set of process-wide counters the
/// ledger needs on the hot path, all guarded by one lock so a reader never
/// observes a torn update.
pub struct LedgerCache {
    weights: RwLock<HashMap<AccountId, Amount>>,
    bootstrap_weights: HashMap<AccountId, Amount>,
    bootstrap_weight_max_blocks: u64,
    counters: RwLock<Counters>,
}

impl LedgerCache {
    pub fn new(params: &LedgerParams, bootstrap_weights: HashMap<AccountId, Amount>) -> Self {
        Self {
            weights: RwLock::new(HashMap::new()),
            bootstrap_weights,
            bootstrap_weight_max_blocks: params.bootstrap_weight_max_blocks,
            counters: RwLock::new(Counters::default()),
        }
    }

    /// Rebuilds every cache field from the store, summing
    /// weights from every account's declared representative and balance
    ///.
    pub fn rebuild_from_store<D: Database>(&self, db: &D) -> LedgerResult<()> {
        let accounts = db.accounts().all_accounts()?;

        let mut weights = HashMap::new();
        let mut epoch_two_started = false;
        for (_, info) in &accounts {
            *weights.entry(info.representative).or_insert(0u128) += info.balance;
            if info.epoch >= 2 {
                epoch_two_started = true;
            }
        }

        let cemented_count = db
            .confirmation_heights()
            .all_confirmation_heights()?
            .into_iter()
            .map(|(_, info)| info.height)
            .sum();

        *self.weights.write() = weights;
        let mut counters = self.counters.write();
        counters.account_count = accounts.len() as u64;
        counters.block_count = db.blocks().block_count()?;
        counters.cemented_count = cemented_count;
        counters.epoch_two_started = epoch_two_started;
        Ok(())
    }

    pub fn weight(&self, representative: &AccountId) -> Amount {
        let block_count = self.counters.read().block_count;
        if block_count < self.bootstrap_weight_max_blocks {
            return *self.bootstrap_weights.get(representative).unwrap_or(&0);
        }
        *self.weights.read().get(representative).unwrap_or(&0)
    }

    pub fn add_weight(&self, representative: &AccountId, amount: Amount) {
        if amount == 0 {
            return;
        }
        let mut weights = self.weights.write();
        *weights.entry(*representative).or_insert(0) += amount;
    }

    pub fn sub_weight(&self, representative: &AccountId, amount: Amount) {
        if amount == 0 {
            return;
        }
        let mut weights = self.weights.write();
        let entry = weights.entry(*representative).or_insert(0);
        *entry = entry.saturating_sub(amount);
    }

    /// Moves `amount` of stake from one representative to another, used by
    /// change blocks. A single locked critical
    /// section so a concurrent reader never observes the intermediate
    /// "removed from old, not yet added to new" state.
    pub fn move_weight(&self, from: &AccountId, to: &AccountId, amount: Amount) {
        if amount == 0 {
            return;
        }
        let mut weights = self.weights.write();
        let from_entry = weights.entry(*from).or_insert(0);
        *from_entry = from_entry.saturating_sub(amount);
        *weights.entry(*to).or_insert(0) += amount;
    }

    pub fn account_count(&self) -> u64 {
        self.counters.read().account_count
    }

    pub fn block_count(&self) -> u64 {
        self.counters.read().block_count
    }

    pub fn cemented_count(&self) -> u64 {
        self.counters.read().cemented_count
    }

    pub fn on_account_opened(&self) {
        self.counters.write().account_count += 1;
    }

    pub fn on_account_closed(&self) {
        let mut c = self.counters.write();
        c.account_count = c.account_count.saturating_sub(1);
    }

    pub fn on_block_applied(&self) {
        self.counters.write().block_count += 1;
    }

    pub fn on_block_rolled_back(&self) {
        let mut c = self.counters.write();
        c.block_count = c.block_count.saturating_sub(1);
    }

    pub fn on_cemented(&self, delta: u64) {
        self.counters.write().cemented_count += delta;
    }

    pub fn on_uncemented(&self, delta: u64) {
        let mut c = self.counters.write();
        c.cemented_count = c.cemented_count.saturating_sub(delta);
    }

    pub fn note_epoch_two_started(&self) {
        self.counters.write().epoch_two_started = true;
    }

    pub fn epoch_two_started(&self) -> bool {
        self.counters.read().epoch_two_started
    }
}

#[cfg(test)]
mod rebuild_tests {
    use super::*;
    use ledger_db::memory::MemoryDatabase;
    use ledger_db::{AccountStore, ConfirmationHeightStore};
    use ledger_state::prelude::{AccountInfo, ConfirmationHeightInfo};

    fn acct(b: u8) -> AccountId {
        AccountId::from(Buf32::from([b; 32]))
    }

    fn hash(b: u8) -> BlockHash {
        BlockHash::from(Buf32::from([b; 32]))
    }

    #[test]
    fn rebuild_from_store_recomputes_weights_and_cemented_count() {
        let db = MemoryDatabase::new();
        let rep = acct(9);
        db.accounts()
            .put_account(&acct(1), &AccountInfo::new_opened(hash(1), rep, 30, 0, 0))
            .unwrap();
        db.accounts()
            .put_account(&acct(2), &AccountInfo::new_opened(hash(2), rep, 70, 0, 2))
            .unwrap();
        db.confirmation_heights()
            .put_confirmation_height(&acct(1), &ConfirmationHeightInfo { height: 3, frontier: hash(1) })
            .unwrap();
        db.confirmation_heights()
            .put_confirmation_height(&acct(2), &ConfirmationHeightInfo { height: 5, frontier: hash(2) })
            .unwrap();

        let params = LedgerParams { bootstrap_weight_max_blocks: 0, ..Default::default() };
        let cache = LedgerCache::new(&params, HashMap::new());
        cache.rebuild_from_store(&db).unwrap();

        assert_eq!(cache.weight(&rep), 100);
        assert_eq!(cache.account_count(), 2);
        assert_eq!(cache.cemented_count(), 8);
        assert!(cache.epoch_two_started());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acct(b: u8) -> AccountId {
        AccountId::from(Buf32::from([b; 32]))
    }

    #[test]
    fn bootstrap_weights_shadow_live_aggregate_below_threshold() {
        let params = LedgerParams {
            bootstrap_weight_max_blocks: 100,
            ..Default::default()
        };
        let mut seed = HashMap::new();
        seed.insert(acct(1), 500u128);
        let cache = LedgerCache::new(&params, seed);

        cache.add_weight(&acct(1), 10);
        // Still below threshold: bootstrap seed wins, not merged with live.
        assert_eq!(cache.weight(&acct(1)), 500);

        cache.on_block_applied();
        for _ in 0..200 {
            cache.on_block_applied();
        }
        assert_eq!(cache.weight(&acct(1)), 10);
    }

    #[test]
    fn move_weight_transfers_exact_amount() {
        let cache = LedgerCache::new(&LedgerParams::default(), HashMap::new());
        for _ in 0..1_000_000 {
            cache.on_block_applied();
        }
        cache.add_weight(&acct(1), 100);
        cache.move_weight(&acct(1), &acct(2), 40);
        assert_eq!(cache.weight(&acct(1)), 60);
        assert_eq!(cache.weight(&acct(2)), 40);
    }
}
