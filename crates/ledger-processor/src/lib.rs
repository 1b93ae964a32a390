//! The block processor: a single serial worker that
//! submits blocks to the ledger state machine in strict FIFO order and
//! routes the outcome -- parked dependency, fork, or drop.

pub mod processor;
pub mod stats;

pub use processor::{BlockProcessor, ForkHandler};
pub use stats::{Stats, StatsSnapshot};

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use ledger_core::errors::ProcessResult;
    use ledger_state::block::Block;
    use ledger_test_utils::fixtures::{account, TestLedger};

    use super::*;

    struct RecordingForkHandler {
        forks: Mutex<Vec<Block>>,
    }

    impl ForkHandler for RecordingForkHandler {
        fn on_fork(&self, block: Block) {
            self.forks.lock().unwrap().push(block);
        }
    }

    #[test]
    fn processes_blocks_in_order_and_updates_stats() {
        let fx = TestLedger::new(account(1), 1_000);
        let head = fx.genesis_head();
        let dest = account(2);
        let send = fx.build_send(fx.genesis, head, 1_000, dest, 400);

        let ledger = Arc::new(fx.ledger);
        let processor = BlockProcessor::new(ledger.clone(), None);
        let recv = processor.submit(send);
        processor.flush();
        assert_eq!(recv.recv().unwrap().unwrap(), ProcessResult::Progress);
        assert_eq!(processor.stats().progress, 1);
    }

    #[test]
    fn routes_fork_to_handler() {
        let fx = TestLedger::new(account(1), 1_000);
        let head = fx.genesis_head();
        let k1 = account(2);
        let k2 = account(3);
        let send1 = fx.build_send(fx.genesis, head, 1_000, k1, 400);
        let send2 = fx.build_send(fx.genesis, head, 1_000, k2, 0);

        let ledger = Arc::new(fx.ledger);
        let handler = Arc::new(RecordingForkHandler { forks: Mutex::new(Vec::new()) });
        let processor = BlockProcessor::new(ledger.clone(), Some(handler.clone() as Arc<dyn ForkHandler>));

        let r1 = processor.submit(send1);
        let r2 = processor.submit(send2);
        processor.flush();
        assert_eq!(r1.recv().unwrap().unwrap(), ProcessResult::Progress);
        assert_eq!(r2.recv().unwrap().unwrap(), ProcessResult::Fork);
        assert_eq!(handler.forks.lock().unwrap().len(), 1);
    }
}
