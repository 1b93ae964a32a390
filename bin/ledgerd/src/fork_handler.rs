//! Bridges the block processor's fork notifications into the election
//! manager, so a losing-race block actually starts a vote instead of
//! just sitting in the store unconfirmed.

use std::sync::Arc;

use ledger_consensus::prelude::{qualified_root_for, ElectionManager, MonotonicClock};
use ledger_processor::ForkHandler;
use ledger_state::block::Block;
use tracing::{trace, warn};

pub struct ElectionForkHandler {
    elections: Arc<ElectionManager>,
    clock: Arc<dyn MonotonicClock>,
}

impl ElectionForkHandler {
    pub fn new(elections: Arc<ElectionManager>, clock: Arc<dyn MonotonicClock>) -> Self {
        Self { elections, clock }
    }
}

impl ForkHandler for ElectionForkHandler {
    fn on_fork(&self, block: Block) {
        let Some(account) = block.declared_account() else {
            // Legacy blocks don't embed their account; resolving one would
            // need a frontier lookup this handler doesn't have a store
            // handle for. Legacy chains predate the election mechanism
            // entirely, so this is not a live path.
            warn!(hash = ?block.hash(), "fork on a legacy block has no election route");
            return;
        };
        let qualified_root = qualified_root_for(account, block.previous());
        let created = self.elections.insert(qualified_root, block.clone(), self.clock.now_ms());
        trace!(hash = ?block.hash(), created, "routed fork to election");
    }
}
