//! Block builders and a ready-to-process genesis ledger, shared by the
//! seeded end-to-end scenarios across the core,
//! processor and consensus test suites.

use std::collections::HashMap;
use std::sync::Arc;

use ledger_core::context::LedgerParams;
use ledger_core::ledger::Ledger;
use ledger_db::memory::MemoryDatabase;
use ledger_primitives::prelude::*;
use ledger_state::block::{Block, StateBlock, StatePayload};

use crate::clock::FixedClock;
use crate::signer::DeterministicSigner;
use crate::work::NullWorkValidator;

pub fn account(b: u8) -> AccountId {
    AccountId::from(Buf32::from([b; 32]))
}

/// A genesis-seeded [`Ledger`] over an in-memory store, plus the
/// collaborators used to build and sign further blocks against it.
pub struct TestLedger {
    pub ledger: Ledger<MemoryDatabase>,
    pub signer: Arc<DeterministicSigner>,
    pub clock: Arc<FixedClock>,
    pub genesis: AccountId,
}

impl TestLedger {
    pub fn new(genesis: AccountId, supply: Amount) -> Self {
        Self::with_bootstrap_weights(genesis, supply, HashMap::new())
    }

    pub fn with_bootstrap_weights(genesis: AccountId, supply: Amount, bootstrap_weights: HashMap<AccountId, Amount>) -> Self {
        let signer = Arc::new(DeterministicSigner::new());
        let clock = Arc::new(FixedClock::new(1));
        let params = LedgerParams {
            genesis_supply: supply,
            genesis_account: genesis,
            genesis_representative: genesis,
            ..Default::default()
        };
        let ledger = Ledger::new(
            MemoryDatabase::new(),
            params,
            signer.clone() as Arc<dyn ledger_core::context::KeySigner>,
            Arc::new(NullWorkValidator),
            clock.clone() as Arc<dyn ledger_core::context::Clock>,
            bootstrap_weights,
        )
        .expect("genesis ledger construction must succeed");
        Self { ledger, signer, clock, genesis }
    }

    pub fn genesis_head(&self) -> BlockHash {
        self.ledger.latest(&self.genesis).unwrap().expect("genesis must be opened")
    }

    /// Builds and signs a state-send: `account` sends `amount` to
    /// `destination`, dropping its balance from `previous_balance`.
    pub fn build_send(
        &self,
        account: AccountId,
        previous: BlockHash,
        previous_balance: Amount,
        destination: AccountId,
        amount: Amount,
    ) -> Block {
        self.build_state(account, previous, previous_balance - amount, account, destination.0)
    }

    /// Builds and signs a state-receive crediting the pending entry created
    /// by `source` (a prior send's hash).
    pub fn build_receive(
        &self,
        account: AccountId,
        previous: BlockHash,
        previous_balance: Amount,
        source: BlockHash,
        amount: Amount,
    ) -> Block {
        self.build_state(account, previous, previous_balance + amount, account, source.0)
    }

    /// Builds and signs a state-open: the first block on `account`'s chain,
    /// crediting the pending entry created by `source`.
    pub fn build_open(&self, account: AccountId, representative: AccountId, source: BlockHash, amount: Amount) -> Block {
        self.build_state(account, BlockHash::zero(), amount, representative, source.0)
    }

    /// Builds and signs a state-change: no balance movement, just a new
    /// declared representative.
    pub fn build_change(
        &self,
        account: AccountId,
        previous: BlockHash,
        balance: Amount,
        new_representative: AccountId,
    ) -> Block {
        self.build_state(account, previous, balance, new_representative, Buf32::zero())
    }

    /// Builds and signs a state epoch-upgrade block: no balance movement,
    /// `link` set to the epoch-`n` sentinel.
    pub fn build_epoch_upgrade(&self, account: AccountId, previous: BlockHash, balance: Amount, epoch: u32) -> Block {
        let link = ledger_primitives::epoch::epoch_link(epoch);
        self.build_state_raw(account, previous, balance, self.representative_hint(account), link)
    }

    fn representative_hint(&self, account: AccountId) -> AccountId {
        self.ledger.db().accounts().get_account(&account).unwrap().map(|i| i.representative).unwrap_or(account)
    }

    fn build_state(&self, account: AccountId, previous: BlockHash, balance: Amount, representative: AccountId, link: Buf32) -> Block {
        self.build_state_raw(account, previous, balance, representative, link)
    }

    fn build_state_raw(&self, account: AccountId, previous: BlockHash, balance: Amount, representative: AccountId, link: Buf32) -> Block {
        let payload = StatePayload { account, previous, representative, balance, link };
        let unsigned = StateBlock { payload, signature: Signature(Buf64::zero()), work: Work(0) };
        let hash = unsigned.hash();
        let signature = self.signer.sign_account(&account, hash.0.as_bytes());
        Block::State(StateBlock { signature, work: Work(1), ..unsigned })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::errors::ProcessResult;

    #[test]
    fn send_then_open_credits_destination() {
        let fx = TestLedger::new(account(1), 1_000);
        let genesis_head = fx.genesis_head();
        let dest = account(2);

        let send = fx.build_send(fx.genesis, genesis_head, 1_000, dest, 400);
        let send_hash = send.hash();
        assert_eq!(fx.ledger.process(send).unwrap(), ProcessResult::Progress);
        assert_eq!(fx.ledger.account_balance(&fx.genesis).unwrap(), Some(600));

        let open = fx.build_open(dest, dest, send_hash, 400);
        assert_eq!(fx.ledger.process(open).unwrap(), ProcessResult::Progress);
        assert_eq!(fx.ledger.account_balance(&dest).unwrap(), Some(400));
        assert!(fx.ledger.account_pending(&dest).unwrap().is_empty());
    }
}
