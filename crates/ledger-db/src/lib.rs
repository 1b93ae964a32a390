//! Backend-agnostic store interface for the ledger core.
//! Concrete backends live in separate crates (`ledger-rocksdb` for
//! production, [`memory::MemoryDatabase`] here for tests).

pub mod errors;
pub mod memory;
pub mod traits;
pub mod writequeue;

pub use errors::{DbError, DbResult};
pub use traits::*;
pub use writequeue::{WriteQueue, WriteTicket, Writer};
