//! The validation state machine: `Ledger::process`
//! classifies and applies one inbound block. Rollback lives in
//! [`crate::rollback`]; read-only queries live in [`crate::queries`].

use std::sync::Arc;

use ledger_db::{Database, UncheckedTag, WriteQueue, Writer};
use ledger_primitives::prelude::*;
use ledger_primitives::work::WorkVersion;
use ledger_state::prelude::*;
use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use crate::cache::LedgerCache;
use crate::context::{BlockObservedEvent, BlockObserver, Clock, ConfirmationObserver, KeySigner, LedgerParams};
use crate::errors::{LedgerResult, ProcessResult};
use crate::unchecked::UncheckedPool;

/// Owns the store handle, the derived caches, and every external
/// collaborator contract the state machine calls through.
/// The sole writer of the accounts/blocks/pending/frontier/confirmation-
/// height tables and the representative-weight cache.
pub struct Ledger<D: Database> {
    pub(crate) db: D,
    pub(crate) cache: LedgerCache,
    pub(crate) params: LedgerParams,
    pub(crate) signer: Arc<dyn KeySigner>,
    pub(crate) work: Arc<dyn WorkValidator>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) unchecked: UncheckedPool,
    pub(crate) write_queue: WriteQueue,
    block_observers: RwLock<Vec<Arc<dyn BlockObserver>>>,
    confirmation_observers: RwLock<Vec<Arc<dyn ConfirmationObserver>>>,
}

impl<D: Database> Ledger<D> {
    pub fn new(
        db: D,
        params: LedgerParams,
        signer: Arc<dyn KeySigner>,
        work: Arc<dyn WorkValidator>,
        clock: Arc<dyn Clock>,
        bootstrap_weights: std::collections::HashMap<AccountId, Amount>,
    ) -> LedgerResult<Self> {
        Self::with_unchecked_capacity(
            db,
            params,
            signer,
            work,
            clock,
            bootstrap_weights,
            ledger_primitives::constants::DEFAULT_UNCHECKED_CAPACITY,
        )
    }

    /// Same as [`Ledger::new`], but with the unchecked pool's eviction
    /// capacity configurable instead of the hardcoded
    /// default, for deployments that tune it in their config file.
    pub fn with_unchecked_capacity(
        db: D,
        params: LedgerParams,
        signer: Arc<dyn KeySigner>,
        work: Arc<dyn WorkValidator>,
        clock: Arc<dyn Clock>,
        bootstrap_weights: std::collections::HashMap<AccountId, Amount>,
        unchecked_capacity: usize,
    ) -> LedgerResult<Self> {
        let cache = LedgerCache::new(&params, bootstrap_weights);
        cache.rebuild_from_store(&db)?;
        let ledger = Self {
            db,
            cache,
            params,
            signer,
            work,
            clock,
            unchecked: UncheckedPool::new(unchecked_capacity),
            write_queue: WriteQueue::new(),
            block_observers: RwLock::new(Vec::new()),
            confirmation_observers: RwLock::new(Vec::new()),
        };
        ledger.ensure_genesis()?;
        Ok(ledger)
    }

    pub fn db(&self) -> &D {
        &self.db
    }

    pub fn cache(&self) -> &LedgerCache {
        &self.cache
    }

    pub fn params(&self) -> &LedgerParams {
        &self.params
    }

    pub fn register_block_observer(&self, observer: Arc<dyn BlockObserver>) {
        self.block_observers.write().push(observer);
    }

    pub fn register_confirmation_observer(&self, observer: Arc<dyn ConfirmationObserver>) {
        self.confirmation_observers.write().push(observer);
    }

    pub(crate) fn notify_confirmation(&self, event: crate::context::ConfirmationEvent) {
        for obs in self.confirmation_observers.read().iter() {
            obs.on_confirmation(&event);
        }
    }

    pub(crate) fn notify_block_observers(&self, hash: BlockHash, account: AccountId, result: &'static str) {
        for obs in self.block_observers.read().iter() {
            obs.on_block_observed(&BlockObservedEvent { hash, account, result });
        }
    }

    /// Seeds the genesis account directly, bypassing `process` (a block
    /// with `previous == 0 && link == 0` is never valid through the normal
    /// state machine -- genesis is privileged bootstrap, not a submitted
    /// block). No-op if the store already has it.
    fn ensure_genesis(&self) -> LedgerResult<()> {
        if self.db.accounts().get_account(&self.params.genesis_account)?.is_some() {
            return Ok(());
        }
        let genesis_block = Block::State(StateBlock {
            payload: StatePayload {
                account: self.params.genesis_account,
                previous: BlockHash::zero(),
                representative: self.params.genesis_representative,
                balance: self.params.genesis_supply,
                link: Buf32::zero(),
            },
            signature: Signature(Buf64::zero()),
            work: Work(0),
        });
        let hash = genesis_block.hash();
        let now = self.clock.unix_time();
        let sideband = Sideband {
            account: self.params.genesis_account,
            height: 1,
            timestamp: now,
            successor: None,
            balance: self.params.genesis_supply,
            details: BlockDetails::default(),
        };
        self.db.blocks().put_block(&hash, &genesis_block, &sideband)?;
        self.db.frontiers().put_frontier(&hash, &self.params.genesis_account)?;
        let info = AccountInfo::new_opened(
            hash,
            self.params.genesis_representative,
            self.params.genesis_supply,
            now,
            0,
        );
        self.db.accounts().put_account(&self.params.genesis_account, &info)?;
        self.db.confirmation_heights().put_confirmation_height(
            &self.params.genesis_account,
            &ConfirmationHeightInfo::genesis(hash),
        )?;
        self.cache.add_weight(&self.params.genesis_representative, self.params.genesis_supply);
        self.cache.on_account_opened();
        self.cache.on_block_applied();
        self.cache.on_cemented(1);
        debug!(?hash, "seeded genesis block");
        Ok(())
    }

    /// Classifies and, if acceptable, applies `block`.
    pub fn process(&self, block: Block) -> LedgerResult<ProcessResult> {
        let _ticket = self.write_queue.acquire(Writer::BlockProcessor);
        self.process_locked(block)
    }

    /// Entry point used by tests and bootstrap tooling that want the
    /// `Testing` writer role recorded rather than `BlockProcessor`.
    pub fn process_as(&self, block: Block, writer: Writer) -> LedgerResult<ProcessResult> {
        let _ticket = self.write_queue.acquire(writer);
        self.process_locked(block)
    }

    fn process_locked(&self, block: Block) -> LedgerResult<ProcessResult> {
        let hash = block.hash();
        if self.db.blocks().block_exists(&hash)? {
            return Ok(ProcessResult::Old);
        }

        let result = match &block {
            Block::Send(b) => self.process_legacy_send(hash, &block, b)?,
            Block::Receive(b) => self.process_legacy_receive(hash, &block, b)?,
            Block::Open(b) => self.process_legacy_open(hash, &block, b)?,
            Block::Change(b) => self.process_legacy_change(hash, &block, b)?,
            Block::State(b) => self.process_state(hash, &block, b)?,
        };

        match result {
            ProcessResult::Progress => {
                self.cache.on_block_applied();
                if let Some(sideband) = self.db.blocks().get_sideband(&hash)? {
                    let account = sideband.account;
                    let send_dest = if sideband.details.is_send { self.send_destination(&block) } else { None };
                    let dependents = self.unchecked.resubmit_candidates(&self.db, &hash, send_dest.as_ref())?;
                    self.notify_block_observers(hash, account, "progress");
                    for entry in dependents {
                        trace!(?hash, "resubmitting unchecked dependent");
                        // Resubmission result is intentionally discarded here:
                        // a dependent that fails again (e.g. still gapped on a
                        // second dependency) is simply re-parked by the
                        // recursive call.
                        let _ = self.process_locked(entry.block);
                    }
                }
            }
            ProcessResult::GapPrevious => {
                if let Some(previous) = block.previous() {
                    self.unchecked.park(&self.db, previous, block, UncheckedTag::Unknown, self.clock.as_ref())?;
                }
            }
            ProcessResult::GapSource => {
                if let Some(source) = self.legacy_or_state_source(&block) {
                    self.unchecked.park(&self.db, source, block, UncheckedTag::Unknown, self.clock.as_ref())?;
                }
            }
            ProcessResult::GapEpochOpenPending => {
                if let Some(account) = block.declared_account() {
                    self.unchecked.park(
                        &self.db,
                        BlockHash::from(account.0),
                        block,
                        UncheckedTag::ValidEpoch,
                        self.clock.as_ref(),
                    )?;
                }
            }
            other => {
                warn!(code = other.as_str(), ?hash, "block rejected");
            }
        }

        Ok(result)
    }

    /// The destination account of a block already known (via its sideband)
    /// to be a send, used to probe the unchecked pool for a parked open/
    /// receive that was waiting on this send to exist.
    pub(crate) fn send_destination(&self, block: &Block) -> Option<AccountId> {
        match block {
            Block::Send(b) => Some(b.payload.destination),
            Block::State(b) => Some(AccountId::from(b.payload.link)),
            _ => None,
        }
    }

    fn legacy_or_state_source(&self, block: &Block) -> Option<BlockHash> {
        match block {
            Block::Receive(b) => Some(b.payload.source),
            Block::Open(b) => Some(b.payload.source),
            Block::State(b) => Some(BlockHash::from(b.payload.link)),
            _ => None,
        }
    }

    fn signing_message(hash: &BlockHash) -> [u8; 32] {
        *hash.0.as_bytes()
    }

    fn verify_account_signature(&self, account: &AccountId, block: &Block) -> bool {
        let msg = Self::signing_message(&block.hash());
        self.signer.verify_account(account, &msg, block.signature())
    }

    fn root_for_work(previous: Option<BlockHash>, account: AccountId) -> Buf32 {
        previous.map(|p| p.0).unwrap_or(account.0)
    }

    fn verify_work(&self, block: &Block, previous: Option<BlockHash>, account: AccountId, version: WorkVersion, high_priority: bool) -> bool {
        let root = Self::root_for_work(previous, account);
        self.work.meets_threshold(root, block.work(), version, high_priority)
    }

    // ---- legacy kinds -----------------------------------------------

    fn process_legacy_send(&self, hash: BlockHash, block: &Block, b: &SendBlock) -> LedgerResult<ProcessResult> {
        let Some(account) = self.resolve_legacy_account(&b.payload.previous)? else {
            return Ok(ProcessResult::GapPrevious);
        };
        let Some(info) = self.db.accounts().get_account(&account)? else {
            return Ok(ProcessResult::GapPrevious);
        };
        if info.head != b.payload.previous {
            return Ok(ProcessResult::Fork);
        }
        if self.chain_has_state_block(&info)? {
            return Ok(ProcessResult::BlockPosition);
        }
        if !self.verify_account_signature(&account, block) {
            return Ok(ProcessResult::BadSignature);
        }
        if !self.verify_work(block, Some(b.payload.previous), account, WorkVersion(0), true) {
            return Ok(ProcessResult::InsufficientWork);
        }
        self.finish_send(hash, block, account, b.payload.previous, b.payload.destination, b.payload.balance, &info)
    }

    fn process_legacy_receive(&self, hash: BlockHash, block: &Block, b: &ReceiveBlock) -> LedgerResult<ProcessResult> {
        let Some(account) = self.resolve_legacy_account(&b.payload.previous)? else {
            return Ok(ProcessResult::GapPrevious);
        };
        if !self.db.blocks().block_exists(&b.payload.source)? {
            return Ok(ProcessResult::GapSource);
        }
        let Some(info) = self.db.accounts().get_account(&account)? else {
            return Ok(ProcessResult::GapPrevious);
        };
        if info.head != b.payload.previous {
            return Ok(ProcessResult::Fork);
        }
        if self.chain_has_state_block(&info)? {
            return Ok(ProcessResult::BlockPosition);
        }
        if !self.verify_account_signature(&account, block) {
            return Ok(ProcessResult::BadSignature);
        }
        if !self.verify_work(block, Some(b.payload.previous), account, WorkVersion(0), false) {
            return Ok(ProcessResult::InsufficientWork);
        }
        self.finish_receive_or_open(
            hash,
            block,
            account,
            Some(b.payload.previous),
            b.payload.source,
            None,
            None,
            Some(&info),
        )
    }

    fn process_legacy_open(&self, hash: BlockHash, block: &Block, b: &OpenBlock) -> LedgerResult<ProcessResult> {
        let account = b.payload.account;
        if account.is_burn() {
            return Ok(ProcessResult::OpenedBurnAccount);
        }
        if !self.db.blocks().block_exists(&b.payload.source)? {
            return Ok(ProcessResult::GapSource);
        }
        if self.db.accounts().get_account(&account)?.is_some() {
            return Ok(ProcessResult::Fork);
        }
        if !self.verify_account_signature(&account, block) {
            return Ok(ProcessResult::BadSignature);
        }
        if !self.verify_work(block, None, account, WorkVersion(0), true) {
            return Ok(ProcessResult::InsufficientWork);
        }
        self.finish_receive_or_open(
            hash,
            block,
            account,
            None,
            b.payload.source,
            Some(b.payload.representative),
            None,
            None,
        )
    }

    fn process_legacy_change(&self, hash: BlockHash, block: &Block, b: &ChangeBlock) -> LedgerResult<ProcessResult> {
        let Some(account) = self.resolve_legacy_account(&b.payload.previous)? else {
            return Ok(ProcessResult::GapPrevious);
        };
        let Some(info) = self.db.accounts().get_account(&account)? else {
            return Ok(ProcessResult::GapPrevious);
        };
        if info.head != b.payload.previous {
            return Ok(ProcessResult::Fork);
        }
        if self.chain_has_state_block(&info)? {
            return Ok(ProcessResult::BlockPosition);
        }
        if !self.verify_account_signature(&account, block) {
            return Ok(ProcessResult::BadSignature);
        }
        if !self.verify_work(block, Some(b.payload.previous), account, WorkVersion(0), true) {
            return Ok(ProcessResult::InsufficientWork);
        }
        self.finish_change(hash, block, account, b.payload.previous, b.payload.representative, &info)
    }

    /// Resolves the account owning `hash` via the frontier index
    ///. `None` both when the hash is altogether unknown and
    /// when it's known but not yet indexed (an invariant violation this
    /// crate never produces, so the two cases collapse to the same
    /// `gap_previous` response).
    fn resolve_legacy_account(&self, hash: &BlockHash) -> LedgerResult<Option<AccountId>> {
        Ok(self.db.frontiers().get_frontier_account(hash)?)
    }

    /// True once any state block has been appended to this chain: from
    /// then on no further legacy-kind block may follow it.
    fn chain_has_state_block(&self, info: &AccountInfo) -> LedgerResult<bool> {
        Ok(matches!(self.db.blocks().get_block(&info.head)?, Some(Block::State(_))))
    }

    // ---- unified state kind -------------------------------------------

    fn process_state(&self, hash: BlockHash, block: &Block, b: &StateBlock) -> LedgerResult<ProcessResult> {
        let account = b.payload.account;
        let declared_previous_zero = b.payload.previous.is_zero();
        let info = self.db.accounts().get_account(&account)?;

        let previous_balance = match &info {
            None => {
                if !declared_previous_zero {
                    return Ok(ProcessResult::GapPrevious);
                }
                None
            }
            Some(existing) => {
                if declared_previous_zero {
                    return Ok(ProcessResult::Fork);
                }
                if existing.head != b.payload.previous {
                    return Ok(ProcessResult::Fork);
                }
                Some(existing.balance)
            }
        };

        let msg = Self::signing_message(&hash);
        let subtype = match infer_subtype(b, previous_balance, |epoch| {
            self.signer.verify_epoch_signer(epoch, &msg, &b.signature)
        }) {
            Ok(s) => s,
            // Unopened account, zero previous, zero link: no source to credit and
            // no epoch it could be jumping to. Never a valid block under any account.
            Err(SubtypeError::EmptyOpen) => return Ok(ProcessResult::Unreceivable),
        };

        if !matches!(subtype, StateSubtype::EpochUpgrade(_) | StateSubtype::OpenAtEpoch(_)) && !self.verify_account_signature(&account, block) {
            return Ok(ProcessResult::BadSignature);
        }

        let previous = if declared_previous_zero { None } else { Some(b.payload.previous) };
        let high_priority = !matches!(subtype, StateSubtype::Receive);
        if !self.verify_work(block, previous, account, WorkVersion(1), high_priority) {
            return Ok(ProcessResult::InsufficientWork);
        }

        match subtype {
            StateSubtype::Send => self.finish_send(
                hash,
                block,
                account,
                previous.expect("send always has a previous"),
                AccountId::from(b.payload.link),
                b.payload.balance,
                info.as_ref().expect("send requires an opened account"),
            ),
            StateSubtype::Receive => self.finish_receive_or_open(
                hash,
                block,
                account,
                previous,
                BlockHash::from(b.payload.link),
                None,
                Some(b.payload.balance),
                info.as_ref(),
            ),
            StateSubtype::Open => self.finish_receive_or_open(
                hash,
                block,
                account,
                None,
                BlockHash::from(b.payload.link),
                Some(b.payload.representative),
                Some(b.payload.balance),
                None,
            ),
            StateSubtype::OpenAtEpoch(n) => self.finish_epoch_open(hash, block, account, b.payload.balance, b.payload.representative, n),
            StateSubtype::Change => self.finish_change(
                hash,
                block,
                account,
                previous.expect("change always has a previous"),
                b.payload.representative,
                info.as_ref().expect("change requires an opened account"),
            ),
            StateSubtype::EpochUpgrade(n) => self.finish_epoch_upgrade(
                hash,
                block,
                account,
                previous.expect("epoch upgrade on an opened account always has a previous"),
                n,
                b.payload.representative,
                info.as_ref().expect("epoch upgrade requires an opened account"),
            ),
        }
    }

    // ---- shared apply helpers ------------------------------------------

    #[allow(clippy::too_many_arguments)]
    fn finish_send(
        &self,
        hash: BlockHash,
        block: &Block,
        account: AccountId,
        previous: BlockHash,
        destination: AccountId,
        new_balance: Amount,
        info: &AccountInfo,
    ) -> LedgerResult<ProcessResult> {
        if new_balance >= info.balance {
            return Ok(ProcessResult::NegativeSpend);
        }
        let amount_sent = info.balance - new_balance;
        let now = self.clock.unix_time();
        let height = info.block_count + 1;
        let sideband = Sideband {
            account,
            height,
            timestamp: now,
            successor: None,
            balance: new_balance,
            details: BlockDetails { epoch: info.epoch, is_send: true, is_receive: false, is_epoch: false },
        };
        self.db.blocks().put_block(&hash, block, &sideband)?;
        self.db.blocks().set_successor(&previous, Some(hash))?;
        self.db.frontiers().put_frontier(&hash, &account)?;
        let new_info = AccountInfo {
            head: hash,
            representative: info.representative,
            open_block: info.open_block,
            balance: new_balance,
            modified_time: now,
            block_count: height,
            epoch: info.epoch,
        };
        self.db.accounts().put_account(&account, &new_info)?;
        self.db.pending().put_pending(
            &PendingKey::new(destination, hash),
            &PendingEntry { source: account, amount: amount_sent, epoch: info.epoch },
        )?;
        self.cache.sub_weight(&info.representative, amount_sent);
        Ok(ProcessResult::Progress)
    }

    #[allow(clippy::too_many_arguments)]
    fn finish_receive_or_open(
        &self,
        hash: BlockHash,
        block: &Block,
        account: AccountId,
        previous: Option<BlockHash>,
        source_hash: BlockHash,
        representative_if_open: Option<AccountId>,
        declared_balance: Option<Amount>,
        info: Option<&AccountInfo>,
    ) -> LedgerResult<ProcessResult> {
        if account.is_burn() {
            return Ok(ProcessResult::OpenedBurnAccount);
        }
        let pending_key = PendingKey::new(account, source_hash);
        let Some(pending) = self.db.pending().get_pending(&pending_key)? else {
            return Ok(ProcessResult::Unreceivable);
        };

        let old_balance = info.map(|i| i.balance).unwrap_or(0);
        let new_balance = old_balance + pending.amount;
        if let Some(declared) = declared_balance {
            if declared != new_balance {
                return Ok(ProcessResult::BalanceMismatch);
            }
        }

        let now = self.clock.unix_time();
        let is_open = info.is_none();
        let new_epoch = info.map(|i| i.epoch).unwrap_or(0).max(pending.epoch);
        let height = info.map(|i| i.block_count + 1).unwrap_or(1);
        let representative = if is_open {
            representative_if_open.expect("open must declare a representative")
        } else {
            info.expect("checked is_open above").representative
        };

        let sideband = Sideband {
            account,
            height,
            timestamp: now,
            successor: None,
            balance: new_balance,
            details: BlockDetails { epoch: new_epoch, is_send: false, is_receive: true, is_epoch: false },
        };
        self.db.blocks().put_block(&hash, block, &sideband)?;
        if let Some(prev) = previous {
            self.db.blocks().set_successor(&prev, Some(hash))?;
        }
        self.db.frontiers().put_frontier(&hash, &account)?;

        let open_block = if is_open { hash } else { info.expect("checked is_open above").open_block };
        let new_info = AccountInfo {
            head: hash,
            representative,
            open_block,
            balance: new_balance,
            modified_time: now,
            block_count: height,
            epoch: new_epoch,
        };
        self.db.accounts().put_account(&account, &new_info)?;
        self.db.pending().delete_pending(&pending_key)?;
        self.db.pending().put_receiver(&source_hash, &hash)?;
        self.cache.add_weight(&representative, pending.amount);
        if is_open {
            self.cache.on_account_opened();
        }
        if new_epoch >= 2 {
            self.cache.note_epoch_two_started();
        }
        Ok(ProcessResult::Progress)
    }

    fn finish_change(
        &self,
        hash: BlockHash,
        block: &Block,
        account: AccountId,
        previous: BlockHash,
        new_representative: AccountId,
        info: &AccountInfo,
    ) -> LedgerResult<ProcessResult> {
        let now = self.clock.unix_time();
        let height = info.block_count + 1;
        self.cache.move_weight(&info.representative, &new_representative, info.balance);
        let sideband = Sideband {
            account,
            height,
            timestamp: now,
            successor: None,
            balance: info.balance,
            details: BlockDetails { epoch: info.epoch, is_send: false, is_receive: false, is_epoch: false },
        };
        self.db.blocks().put_block(&hash, block, &sideband)?;
        self.db.blocks().set_successor(&previous, Some(hash))?;
        self.db.frontiers().put_frontier(&hash, &account)?;
        let new_info = AccountInfo {
            head: hash,
            representative: new_representative,
            open_block: info.open_block,
            balance: info.balance,
            modified_time: now,
            block_count: height,
            epoch: info.epoch,
        };
        self.db.accounts().put_account(&account, &new_info)?;
        Ok(ProcessResult::Progress)
    }

    #[allow(clippy::too_many_arguments)]
    fn finish_epoch_upgrade(
        &self,
        hash: BlockHash,
        block: &Block,
        account: AccountId,
        previous: BlockHash,
        new_epoch: u32,
        declared_representative: AccountId,
        info: &AccountInfo,
    ) -> LedgerResult<ProcessResult> {
        if declared_representative != info.representative {
            return Ok(ProcessResult::RepresentativeMismatch);
        }
        if new_epoch != info.epoch + 1 {
            return Ok(ProcessResult::BlockPosition);
        }
        let now = self.clock.unix_time();
        let height = info.block_count + 1;
        let sideband = Sideband {
            account,
            height,
            timestamp: now,
            successor: None,
            balance: info.balance,
            details: BlockDetails { epoch: new_epoch, is_send: false, is_receive: false, is_epoch: true },
        };
        self.db.blocks().put_block(&hash, block, &sideband)?;
        self.db.blocks().set_successor(&previous, Some(hash))?;
        self.db.frontiers().put_frontier(&hash, &account)?;
        let new_info = AccountInfo {
            head: hash,
            representative: info.representative,
            open_block: info.open_block,
            balance: info.balance,
            modified_time: now,
            block_count: height,
            epoch: new_epoch,
        };
        self.db.accounts().put_account(&account, &new_info)?;
        if new_epoch >= 2 {
            self.cache.note_epoch_two_started();
        }
        Ok(ProcessResult::Progress)
    }

    fn finish_epoch_open(
        &self,
        hash: BlockHash,
        block: &Block,
        account: AccountId,
        declared_balance: Amount,
        declared_representative: AccountId,
        epoch: u32,
    ) -> LedgerResult<ProcessResult> {
        if account.is_burn() {
            return Ok(ProcessResult::OpenedBurnAccount);
        }
        if self.db.pending().pending_for_account(&account)?.is_empty() {
            return Ok(ProcessResult::GapEpochOpenPending);
        }
        if declared_balance != 0 {
            return Ok(ProcessResult::BalanceMismatch);
        }
        let now = self.clock.unix_time();
        let sideband = Sideband {
            account,
            height: 1,
            timestamp: now,
            successor: None,
            balance: 0,
            details: BlockDetails { epoch, is_send: false, is_receive: false, is_epoch: true },
        };
        self.db.blocks().put_block(&hash, block, &sideband)?;
        self.db.frontiers().put_frontier(&hash, &account)?;
        let info = AccountInfo::new_opened(hash, declared_representative, 0, now, epoch);
        self.db.accounts().put_account(&account, &info)?;
        self.cache.on_account_opened();
        if epoch >= 2 {
            self.cache.note_epoch_two_started();
        }
        Ok(ProcessResult::Progress)
    }
}

#[cfg(test)]
mod tests {
    use ledger_primitives::prelude::*;
    use ledger_test_utils::fixtures::{account, TestLedger};

    use crate::errors::ProcessResult;

    // S1: send + open, weights move with the balance.
    #[test]
    fn send_then_open_moves_weight_from_sender_to_receiver() {
        let fx = TestLedger::new(account(1), 1_000);
        let head = fx.genesis_head();
        let k1 = account(2);

        let send = fx.build_send(fx.genesis, head, 1_000, k1, 50);
        let send_hash = send.hash();
        assert_eq!(fx.ledger.process(send).unwrap(), ProcessResult::Progress);
        let pending = fx.ledger.account_pending(&k1).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].1.amount, 50);
        assert_eq!(fx.ledger.account_balance(&fx.genesis).unwrap(), Some(950));
        assert_eq!(fx.ledger.weight(&fx.genesis), 950);

        let open = fx.build_open(k1, k1, send_hash, 50);
        assert_eq!(fx.ledger.process(open).unwrap(), ProcessResult::Progress);
        assert_eq!(fx.ledger.account_balance(&k1).unwrap(), Some(50));
        assert_eq!(fx.ledger.weight(&k1), 50);
        assert!(fx.ledger.account_pending(&k1).unwrap().is_empty());
    }

    // S2: two sends sharing the same previous -- the first wins, the second forks.
    #[test]
    fn two_sends_off_the_same_previous_fork() {
        let fx = TestLedger::new(account(1), 1_000);
        let head = fx.genesis_head();
        let k1 = account(2);
        let k2 = account(3);

        let send_to_k1 = fx.build_send(fx.genesis, head, 1_000, k1, 50);
        let send_to_k2 = fx.build_send(fx.genesis, head, 1_000, k2, 1_000);

        assert_eq!(fx.ledger.process(send_to_k1).unwrap(), ProcessResult::Progress);
        assert_eq!(fx.ledger.process(send_to_k2).unwrap(), ProcessResult::Fork);
    }

    // S6: a receiver cannot drain the same pending entry twice.
    #[test]
    fn receiving_the_same_pending_entry_twice_is_unreceivable() {
        let fx = TestLedger::new(account(1), 1_000);
        let head = fx.genesis_head();
        let k1 = account(2);

        let send = fx.build_send(fx.genesis, head, 1_000, k1, 100);
        let send_hash = send.hash();
        assert_eq!(fx.ledger.process(send).unwrap(), ProcessResult::Progress);

        let open = fx.build_open(k1, k1, send_hash, 100);
        assert_eq!(fx.ledger.process(open).unwrap(), ProcessResult::Progress);

        // Same source, but a distinct zero-previous state block collides
        // with the already-opened account: rebuild a "receive" shaped block
        // against the now-opened chain instead, which is what a second,
        // stray attempt to consume the already-spent pending entry looks
        // like in practice.
        let k1_head = fx.ledger.latest(&k1).unwrap().unwrap();
        let replay = fx.build_receive(k1, k1_head, 100, send_hash, 50);
        assert_eq!(fx.ledger.process(replay).unwrap(), ProcessResult::Unreceivable);
    }

    // S4: epoch upgrades must advance by exactly one and reject repeats or skips.
    #[test]
    fn epoch_upgrades_must_advance_by_exactly_one() {
        let fx = TestLedger::new(account(1), 1_000);
        let head = fx.genesis_head();

        // Open k1 at epoch 0 before genesis upgrades any further, so it
        // provides an opened, epoch-0 account to attempt the illegal jump on.
        let k1 = account(2);
        let send = fx.build_send(fx.genesis, head, 1_000, k1, 500);
        let send_hash = send.hash();
        assert_eq!(fx.ledger.process(send).unwrap(), ProcessResult::Progress);
        let open = fx.build_open(k1, k1, send_hash, 500);
        assert_eq!(fx.ledger.process(open).unwrap(), ProcessResult::Progress);

        let genesis_head = fx.ledger.latest(&fx.genesis).unwrap().unwrap();
        let epoch1 = fx.build_epoch_upgrade(fx.genesis, genesis_head, 500, 1);
        let epoch1_hash = epoch1.hash();
        assert_eq!(fx.ledger.process(epoch1).unwrap(), ProcessResult::Progress);
        assert_eq!(fx.ledger.account_balance(&fx.genesis).unwrap(), Some(500));

        // Re-upgrading to epoch 1 again (repeating, not skipping) is illegal.
        let epoch1_again = fx.build_epoch_upgrade(fx.genesis, epoch1_hash, 500, 1);
        assert_eq!(fx.ledger.process(epoch1_again).unwrap(), ProcessResult::BlockPosition);

        let epoch2 = fx.build_epoch_upgrade(fx.genesis, epoch1_hash, 500, 2);
        assert_eq!(fx.ledger.process(epoch2).unwrap(), ProcessResult::Progress);

        // Jumping straight from epoch 0 to epoch 2 on k1's still-epoch-0
        // chain (skipping epoch 1) is illegal.
        let k1_head = fx.ledger.latest(&k1).unwrap().unwrap();
        let bad_jump = fx.build_epoch_upgrade(k1, k1_head, 500, 2);
        assert_eq!(fx.ledger.process(bad_jump).unwrap(), ProcessResult::BlockPosition);
    }

    #[test]
    fn opening_the_burn_account_always_fails() {
        let fx = TestLedger::new(account(1), 1_000);
        let head = fx.genesis_head();
        let burn = AccountId::burn();

        let send = fx.build_send(fx.genesis, head, 1_000, burn, 100);
        let send_hash = send.hash();
        assert_eq!(fx.ledger.process(send).unwrap(), ProcessResult::Progress);

        let open = fx.build_open(burn, burn, send_hash, 100);
        assert_eq!(fx.ledger.process(open).unwrap(), ProcessResult::OpenedBurnAccount);
    }

    #[test]
    fn processing_the_same_block_twice_is_idempotent() {
        let fx = TestLedger::new(account(1), 1_000);
        let head = fx.genesis_head();
        let k1 = account(2);

        let send = fx.build_send(fx.genesis, head, 1_000, k1, 100);
        assert_eq!(fx.ledger.process(send.clone()).unwrap(), ProcessResult::Progress);
        assert_eq!(fx.ledger.process(send).unwrap(), ProcessResult::Old);
        assert_eq!(fx.ledger.account_balance(&fx.genesis).unwrap(), Some(900));
    }
}
