//! Block, account, and vote data types for the ledger core. This crate
//! holds shapes only -- the validation state machine lives in
//! `ledger-core`.

pub mod account;
pub mod block;
pub mod errors;
pub mod sideband;
pub mod subtype;
pub mod vote;

pub mod prelude {
    pub use crate::{
        account::{AccountInfo, ConfirmationHeightInfo, PendingEntry, PendingKey},
        block::{
            Block, ChangeBlock, ChangePayload, OpenBlock, OpenPayload, ReceiveBlock,
            ReceivePayload, SendBlock, SendPayload, StateBlock, StatePayload,
        },
        errors::StateError,
        sideband::{BlockDetails, Sideband},
        subtype::{infer_subtype, StateSubtype, SubtypeError},
        vote::Vote,
    };
}
