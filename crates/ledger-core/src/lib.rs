//! The validation state machine over stored blocks: process, rollback, and
//! the small set of in-RAM caches they depend on. Pure data shapes live in
//! `ledger-state`; storage access is generic over `ledger-db::Database`.

pub mod cache;
pub mod confirm;
pub mod context;
pub mod errors;
pub mod ledger;
pub mod queries;
pub mod rollback;
pub mod unchecked;

pub mod prelude {
    pub use crate::cache::LedgerCache;
    pub use crate::context::{
        BlockObservedEvent, BlockObserver, Clock, ConfirmationEvent, ConfirmationObserver, KeySigner, LedgerParams,
    };
    pub use crate::errors::{LedgerError, LedgerResult, ProcessResult, RollbackResult};
    pub use crate::ledger::Ledger;
    pub use crate::unchecked::UncheckedPool;
}
