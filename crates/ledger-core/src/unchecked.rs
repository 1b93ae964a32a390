//! Orphan buffer keyed by missing dependency.
//!
//! A block that fails to process because its `previous` or `source` isn't
//! known yet is parked here under that dependency's hash. When a block is
//! successfully applied, this pool is probed for anything waiting on it
//! (by hash, and -- for sends -- by destination account) and those entries
//! are handed back to the caller for resubmission.

use ledger_db::{Database, UncheckedEntry, UncheckedTag};
use ledger_primitives::prelude::*;
use ledger_state::prelude::*;
use tracing::trace;

use crate::context::Clock;
use crate::errors::LedgerResult;

pub struct UncheckedPool {
    capacity: usize,
}

impl UncheckedPool {
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    /// Parks `block` under `dependency`, evicting the oldest entry first if
    /// the pool is at capacity.
    pub fn park<D: Database>(
        &self,
        db: &D,
        dependency: BlockHash,
        block: Block,
        tag: UncheckedTag,
        clock: &dyn Clock,
    ) -> LedgerResult<()> {
        if db.unchecked().unchecked_count()? >= self.capacity {
            if let Some(evicted) = db.unchecked().evict_oldest_unchecked()? {
                trace!(?evicted, "unchecked pool at capacity, evicted oldest entry");
            }
        }
        db.unchecked().put_unchecked(
            &dependency,
            UncheckedEntry {
                block,
                tag,
                inserted_at: clock.unix_time(),
            },
        )?;
        Ok(())
    }

    /// Drains every entry waiting on `dependency`, for resubmission by the
    /// caller.
    pub fn take_dependents<D: Database>(&self, db: &D, dependency: &BlockHash) -> LedgerResult<Vec<UncheckedEntry>> {
        Ok(db.unchecked().take_unchecked(dependency)?)
    }

    /// Probes both ways a just-applied block can unblock parked entries:
    /// by its own hash (anything waiting on it directly), and, if it was a
    /// send, by the destination account reinterpreted as a hash-shaped key
    /// (an open/receive parked before the send it depends on existed).
    pub fn resubmit_candidates<D: Database>(
        &self,
        db: &D,
        applied_hash: &BlockHash,
        send_destination: Option<&AccountId>,
    ) -> LedgerResult<Vec<UncheckedEntry>> {
        let mut out = self.take_dependents(db, applied_hash)?;
        if let Some(dest) = send_destination {
            out.extend(self.take_dependents(db, &BlockHash::from(dest.0))?);
        }
        Ok(out)
    }

    pub fn len<D: Database>(&self, db: &D) -> LedgerResult<usize> {
        Ok(db.unchecked().unchecked_count()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_db::memory::MemoryDatabase;

    struct FixedClock(u64);
    impl Clock for FixedClock {
        fn unix_time(&self) -> u64 {
            self.0
        }
    }

    fn dummy_block() -> Block {
        Block::Change(ChangeBlock {
            payload: ChangePayload {
                previous: BlockHash::zero(),
                representative: AccountId::from(Buf32::from([9u8; 32])),
            },
            signature: Signature(ledger_primitives::buf::Buf64::zero()),
            work: Work(0),
        })
    }

    #[test]
    fn park_then_take_round_trips() {
        let db = MemoryDatabase::new();
        let pool = UncheckedPool::new(10);
        let dep = BlockHash::from(Buf32::from([1u8; 32]));
        pool.park(&db, dep, dummy_block(), UncheckedTag::Unknown, &FixedClock(1)).unwrap();
        assert_eq!(pool.len(&db).unwrap(), 1);

        let taken = pool.take_dependents(&db, &dep).unwrap();
        assert_eq!(taken.len(), 1);
        assert_eq!(pool.len(&db).unwrap(), 0);
    }

    #[test]
    fn eviction_kicks_in_at_capacity() {
        let db = MemoryDatabase::new();
        let pool = UncheckedPool::new(1);
        let dep1 = BlockHash::from(Buf32::from([1u8; 32]));
        let dep2 = BlockHash::from(Buf32::from([2u8; 32]));
        pool.park(&db, dep1, dummy_block(), UncheckedTag::Unknown, &FixedClock(1)).unwrap();
        pool.park(&db, dep2, dummy_block(), UncheckedTag::Unknown, &FixedClock(2)).unwrap();
        assert_eq!(pool.len(&db).unwrap(), 1);
        assert!(pool.take_dependents(&db, &dep2).unwrap().len() == 1 || pool.take_dependents(&db, &dep1).unwrap().len() == 1);
    }
}
