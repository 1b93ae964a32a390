//! Narrow view of the ledger an election needs for tallying: just representative weight, nothing else. Kept as a trait rather
//! than taking `&Ledger<D>` directly so `Election` itself stays free of a
//! `Database` type parameter.

use ledger_core::ledger::Ledger;
use ledger_db::Database;
use ledger_primitives::prelude::*;

pub trait WeightSource: Send + Sync {
    fn weight(&self, representative: &AccountId) -> Amount;
}

impl<D: Database> WeightSource for Ledger<D> {
    fn weight(&self, representative: &AccountId) -> Amount {
        Ledger::weight(self, representative)
    }
}
