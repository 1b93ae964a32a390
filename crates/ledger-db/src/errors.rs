use thiserror::Error;

/// Errors surfaced by the store layer itself -- infrastructure faults, not
/// ledger-level rejections.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("key already exists")]
    DuplicateKey,

    #[error("backend error: {0}")]
    Backend(String),

    #[error("codec error: {0}")]
    Codec(String),

    #[error("database not yet initialized")]
    NotBootstrapped,
}

pub type DbResult<T> = Result<T, DbError>;
