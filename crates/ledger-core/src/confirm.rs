//! Commits a confirmation-height advance: given the winning hash of an
//! election (or any hash an admin path wants to force-confirm), records
//! the new confirmation height if it is higher than what is stored, and
//! notifies confirmation observers once the write has committed.

use ledger_db::{Database, Writer};
use ledger_primitives::prelude::*;
use ledger_state::prelude::*;

use crate::context::ConfirmationEvent;
use crate::errors::{LedgerError, LedgerResult};
use crate::ledger::Ledger;

impl<D: Database> Ledger<D> {
    /// Advances `account`'s confirmation height to `winner`'s height, if
    /// higher than what is currently stored. Returns `None` if `winner`
    /// is at or below the current height -- a no-op, not an error.
    pub fn confirm(&self, winner: BlockHash) -> LedgerResult<Option<ConfirmationEvent>> {
        let _ticket = self.write_queue.acquire(Writer::BlockProcessor);
        self.confirm_locked(winner)
    }

    fn confirm_locked(&self, winner: BlockHash) -> LedgerResult<Option<ConfirmationEvent>> {
        let Some(account) = self.db.frontiers().get_frontier_account(&winner)? else {
            return Err(LedgerError::Invariant("confirm target not found in frontier index".into()));
        };
        let sideband = self
            .db
            .blocks()
            .get_sideband(&winner)?
            .ok_or_else(|| LedgerError::Invariant("confirm target missing its sideband".into()))?;
        let current_height = self
            .db
            .confirmation_heights()
            .get_confirmation_height(&account)?
            .map(|c| c.height)
            .unwrap_or(0);

        if sideband.height <= current_height {
            return Ok(None);
        }

        self.db
            .confirmation_heights()
            .put_confirmation_height(&account, &ConfirmationHeightInfo { height: sideband.height, frontier: winner })?;
        self.cache.on_cemented(sideband.height - current_height);

        let event = ConfirmationEvent { account, new_height: sideband.height, winner };
        self.notify_confirmation(event.clone());
        Ok(Some(event))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ledger_db::memory::MemoryDatabase;

    use crate::context::LedgerParams;
    use crate::ledger::Ledger;
    use ledger_test_utils::{DeterministicSigner, FixedClock, NullWorkValidator};

    fn acct(b: u8) -> AccountId {
        AccountId::from(Buf32::from([b; 32]))
    }

    fn genesis_ledger(genesis: AccountId, supply: Amount) -> Ledger<MemoryDatabase> {
        let params = LedgerParams {
            genesis_supply: supply,
            genesis_account: genesis,
            genesis_representative: genesis,
            ..Default::default()
        };
        Ledger::new(
            MemoryDatabase::new(),
            params,
            Arc::new(DeterministicSigner::new()),
            Arc::new(NullWorkValidator),
            Arc::new(FixedClock::new(1)),
            Default::default(),
        )
        .unwrap()
    }

    #[test]
    fn confirm_is_a_noop_below_current_height() {
        let ledger = genesis_ledger(acct(1), 1_000);
        let head = ledger.latest(&acct(1)).unwrap().unwrap();
        // Genesis seeds confirmation height 1 already; confirming the same
        // hash again must not move anything.
        assert_eq!(ledger.confirm(head).unwrap(), None);
    }
}
