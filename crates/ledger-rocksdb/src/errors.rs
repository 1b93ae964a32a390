//! Maps this backend's two failure sources -- `rocksdb`/`rockbound` I/O and
//! Borsh codec errors -- onto `ledger_db::DbError`'s existing
//! backend-agnostic variants.

use ledger_db::DbError;

pub fn backend_error(err: impl std::fmt::Display) -> DbError {
    DbError::Backend(err.to_string())
}

pub fn codec_error(err: impl std::fmt::Display) -> DbError {
    DbError::Codec(err.to_string())
}
