//! Generic, widely-used data types shared across the ledger core: account
//! and block identifiers, fixed-size buffers, hashing, epoch sentinels, the
//! work-threshold contract, and protocol constants.

pub mod buf;
pub mod constants;
pub mod epoch;
pub mod hash;
pub mod ids;
pub mod work;

pub mod prelude {
    pub use crate::{
        buf::{Buf32, Buf64},
        constants::*,
        epoch::{epoch_from_link, epoch_link},
        ids::{AccountId, Amount, BlockHash, QualifiedRoot, Root, Signature, Work},
        work::{WorkGenerator, WorkValidator, WorkVersion},
    };
}
