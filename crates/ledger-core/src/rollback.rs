//! Undoes blocks back to (and including) a target hash. Never crosses a confirmed block. A send whose pending entry
//! was already consumed by a receive on another chain is only rolled back
//! after that receive -- and everything built on top of it -- has been
//! rolled back first: this module resolves
//! that dependency via the reverse (send-hash -> receiver) index rather
//! than refusing the rollback outright.

use ledger_db::{Database, Writer};
use ledger_primitives::prelude::*;
use ledger_state::prelude::*;

use crate::errors::{LedgerError, LedgerResult, RollbackResult};
use crate::ledger::Ledger;

impl<D: Database> Ledger<D> {
    /// Rolls `target` and everything appended after it on its chain back
    /// out of the store. Cascades to any other chain whose receive/open
    /// already consumed a send being rolled back.
    pub fn rollback(&self, target: BlockHash) -> LedgerResult<RollbackResult> {
        let _ticket = self.write_queue.acquire(Writer::Rollback);
        self.rollback_chain_to(target)
    }

    fn rollback_chain_to(&self, target: BlockHash) -> LedgerResult<RollbackResult> {
        let Some(account) = self.db.frontiers().get_frontier_account(&target)? else {
            return Ok(RollbackResult::NotFound);
        };
        let Some(info) = self.db.accounts().get_account(&account)? else {
            return Ok(RollbackResult::NotFound);
        };
        let Some(target_sideband) = self.db.blocks().get_sideband(&target)? else {
            return Ok(RollbackResult::NotFound);
        };
        let confirmed_height = self
            .db
            .confirmation_heights()
            .get_confirmation_height(&account)?
            .map(|c| c.height)
            .unwrap_or(0);
        if target_sideband.height <= confirmed_height {
            return Ok(RollbackResult::AlreadyConfirmed);
        }

        let mut chain = Vec::new();
        let mut cursor = info.head;
        loop {
            chain.push(cursor);
            if cursor == target {
                break;
            }
            let block = self
                .db
                .blocks()
                .get_block(&cursor)?
                .ok_or_else(|| LedgerError::Invariant("chain walk hit a missing block".into()))?;
            cursor = block
                .previous()
                .ok_or_else(|| LedgerError::Invariant("chain walk ran past the open block without reaching target".into()))?;
        }

        let mut total = 0u64;
        for hash in chain {
            total += self.rollback_one(hash)?;
        }
        Ok(RollbackResult::RolledBack { blocks: total })
    }

    /// Undoes exactly one block, which must currently be its chain's head.
    /// Returns the number of blocks undone, including any cascaded rollback
    /// of a dependent receive on another chain.
    fn rollback_one(&self, hash: BlockHash) -> LedgerResult<u64> {
        let account = self
            .db
            .frontiers()
            .get_frontier_account(&hash)?
            .ok_or_else(|| LedgerError::Invariant("rollback target missing from frontier index".into()))?;
        let block = self
            .db
            .blocks()
            .get_block(&hash)?
            .ok_or_else(|| LedgerError::Invariant("rollback target missing from block store".into()))?;
        let sideband = self
            .db
            .blocks()
            .get_sideband(&hash)?
            .ok_or_else(|| LedgerError::Invariant("sideband missing for a stored block".into()))?;
        let info = self
            .db
            .accounts()
            .get_account(&account)?
            .ok_or_else(|| LedgerError::Invariant("account missing for a stored block".into()))?;
        if info.head != hash {
            return Err(LedgerError::Invariant("rollback target is not its chain's current head".into()));
        }

        let mut cascaded = 0u64;
        if sideband.details.is_send {
            if let Some(receiver) = self.db.pending().get_receiver(&hash)? {
                cascaded += match self.rollback_chain_to(receiver)? {
                    RollbackResult::RolledBack { blocks } => blocks,
                    RollbackResult::NotFound => 0,
                    RollbackResult::AlreadyConfirmed => {
                        return Err(LedgerError::Invariant(
                            "send's receipt is already confirmed, cannot roll back".into(),
                        ));
                    }
                };
            }
        }

        let previous = block.previous();
        let now = self.clock.unix_time();

        match previous {
            Some(prev_hash) => {
                let prev_sideband = self
                    .db
                    .blocks()
                    .get_sideband(&prev_hash)?
                    .ok_or_else(|| LedgerError::Invariant("predecessor sideband missing".into()))?;
                let representative = self.representative_as_of(prev_hash)?;
                let restored = AccountInfo {
                    head: prev_hash,
                    representative,
                    open_block: info.open_block,
                    balance: prev_sideband.balance,
                    modified_time: now,
                    block_count: prev_sideband.height,
                    epoch: prev_sideband.details.epoch,
                };

                if sideband.details.is_send {
                    let destination = self.send_destination(&block).expect("is_send implies a destination");
                    self.db.pending().delete_pending(&PendingKey::new(destination, hash))?;
                    let amount_sent = restored.balance.saturating_sub(sideband.balance);
                    self.cache.add_weight(&info.representative, amount_sent);
                } else if sideband.details.is_receive {
                    let amount_received = sideband.balance.saturating_sub(restored.balance);
                    self.restore_pending_for_receive(&block, &account, amount_received)?;
                    self.cache.sub_weight(&info.representative, amount_received);
                } else if !sideband.details.is_epoch {
                    // Plain representative change: move the weight back.
                    self.cache.move_weight(&info.representative, &restored.representative, info.balance);
                }

                self.db.blocks().set_successor(&prev_hash, None)?;
                self.db.accounts().put_account(&account, &restored)?;
            }
            None => {
                if sideband.details.is_receive {
                    let amount_received = sideband.balance;
                    self.restore_pending_for_receive(&block, &account, amount_received)?;
                    self.cache.sub_weight(&info.representative, amount_received);
                }
                self.db.accounts().delete_account(&account)?;
                self.cache.on_account_closed();
            }
        }

        self.db.blocks().delete_block(&hash)?;
        self.db.frontiers().delete_frontier(&hash)?;
        self.cache.on_block_rolled_back();
        self.notify_block_observers(hash, account, "rolled_back");

        Ok(1 + cascaded)
    }

    /// Re-credits the pending entry a receive/open consumed, reconstructing
    /// it from the send block it pointed at.
    fn restore_pending_for_receive(&self, block: &Block, destination: &AccountId, amount: Amount) -> LedgerResult<()> {
        let send_hash = block.source().expect("receive/open always names a source");
        let send_sideband = self
            .db
            .blocks()
            .get_sideband(&send_hash)?
            .ok_or_else(|| LedgerError::Invariant("source send missing its sideband".into()))?;
        let source = self
            .db
            .frontiers()
            .get_frontier_account(&send_hash)?
            .ok_or_else(|| LedgerError::Invariant("source send missing from frontier index".into()))?;
        self.db.pending().put_pending(
            &PendingKey::new(*destination, send_hash),
            &PendingEntry { source, amount, epoch: send_sideband.details.epoch },
        )?;
        self.db.pending().delete_receiver(&send_hash)?;
        Ok(())
    }

    /// Walks backward from `hash` to the nearest block that declares a
    /// representative (every state block restates it; legacy chains only
    /// carry it on `Open`/`Change`), which is the representative in effect
    /// at that chain position.
    fn representative_as_of(&self, hash: BlockHash) -> LedgerResult<AccountId> {
        let mut cursor = hash;
        loop {
            let block = self
                .db
                .blocks()
                .get_block(&cursor)?
                .ok_or_else(|| LedgerError::Invariant("chain walk hit a missing block".into()))?;
            if let Some(representative) = block.declared_representative() {
                return Ok(representative);
            }
            cursor = block
                .previous()
                .ok_or_else(|| LedgerError::Invariant("chain walk ran past the open block without finding a representative".into()))?;
        }
    }
}

#[cfg(test)]
mod tests {
    use ledger_test_utils::fixtures::{account, TestLedger};

    use crate::errors::{ProcessResult, RollbackResult};

    // S3: rolling back an open, then the send that fed it, restores every
    // derived structure -- pending, weights, and the sender's frontier.
    #[test]
    fn rollback_restores_pending_and_weights() {
        let fx = TestLedger::new(account(1), 1_000);
        let genesis_head = fx.genesis_head();
        let k1 = account(2);

        let send = fx.build_send(fx.genesis, genesis_head, 1_000, k1, 50);
        let send_hash = send.hash();
        assert_eq!(fx.ledger.process(send).unwrap(), ProcessResult::Progress);

        let open = fx.build_open(k1, k1, send_hash, 50);
        let open_hash = open.hash();
        assert_eq!(fx.ledger.process(open).unwrap(), ProcessResult::Progress);
        assert_eq!(fx.ledger.weight(&k1), 50);
        assert_eq!(fx.ledger.weight(&fx.genesis), 950);

        assert_eq!(fx.ledger.rollback(open_hash).unwrap(), RollbackResult::RolledBack { blocks: 1 });
        assert_eq!(fx.ledger.account_balance(&k1).unwrap(), None);
        assert_eq!(fx.ledger.weight(&k1), 0);
        let pending = fx.ledger.account_pending(&k1).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].1.amount, 50);

        assert_eq!(fx.ledger.rollback(send_hash).unwrap(), RollbackResult::RolledBack { blocks: 1 });
        assert!(fx.ledger.account_pending(&k1).unwrap().is_empty());
        assert_eq!(fx.ledger.weight(&fx.genesis), 1_000);
        assert_eq!(fx.ledger.latest(&fx.genesis).unwrap(), Some(genesis_head));
    }

    // §9 open question 2: rolling back a send whose pending was already
    // consumed by a receive on another chain cascades that receive (and
    // everything built on it) back first, atomically.
    #[test]
    fn rollback_of_a_received_send_cascades_the_receiver() {
        let fx = TestLedger::new(account(1), 1_000);
        let genesis_head = fx.genesis_head();
        let k1 = account(2);

        let send = fx.build_send(fx.genesis, genesis_head, 1_000, k1, 100);
        let send_hash = send.hash();
        assert_eq!(fx.ledger.process(send).unwrap(), ProcessResult::Progress);

        let open = fx.build_open(k1, k1, send_hash, 100);
        assert_eq!(fx.ledger.process(open).unwrap(), ProcessResult::Progress);
        assert_eq!(fx.ledger.weight(&k1), 100);

        // Rolling back the send must cascade into rolling back k1's open
        // first -- the cascade counts as 2 blocks undone in one call.
        assert_eq!(fx.ledger.rollback(send_hash).unwrap(), RollbackResult::RolledBack { blocks: 2 });
        assert_eq!(fx.ledger.account_balance(&k1).unwrap(), None);
        assert_eq!(fx.ledger.weight(&k1), 0);
        assert_eq!(fx.ledger.weight(&fx.genesis), 1_000);
        assert!(fx.ledger.account_pending(&k1).unwrap().is_empty());
    }

    // A rollback may never cross a confirmed block.
    #[test]
    fn rollback_through_a_confirmed_block_is_refused() {
        let fx = TestLedger::new(account(1), 1_000);
        let genesis_head = fx.genesis_head();
        let k1 = account(2);

        let send = fx.build_send(fx.genesis, genesis_head, 1_000, k1, 100);
        let send_hash = send.hash();
        assert_eq!(fx.ledger.process(send).unwrap(), ProcessResult::Progress);
        fx.ledger.confirm(send_hash).unwrap();

        assert_eq!(fx.ledger.rollback(send_hash).unwrap(), RollbackResult::AlreadyConfirmed);
    }

    #[test]
    fn rollback_of_unknown_hash_is_not_found() {
        let fx = TestLedger::new(account(1), 1_000);
        let bogus = fx.build_send(fx.genesis, fx.genesis_head(), 1_000, account(9), 1).hash();
        assert_eq!(fx.ledger.rollback(bogus).unwrap(), RollbackResult::NotFound);
    }
}
