//! Work (proof-of-work) contract. Generation lives entirely outside this
//! crate -- the ledger only ever needs to ask "does this
//! nonce clear the threshold", never how the nonce was found.

use crate::{buf::Buf32, ids::Work};

/// Block version, used (together with the block's details) to pick the
/// applicable work threshold. Legacy blocks are all version 0; state
/// blocks carry whatever version the protocol is currently at.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct WorkVersion(pub u8);

/// Oracle for proof-of-work validity. An implementation may check locally
/// or proxy to a remote pool; the ledger treats it as a pure function.
pub trait WorkValidator: Send + Sync {
    /// Returns `true` iff `digest(root, work)` meets the threshold for
    /// `(version, is_send_or_epoch)`.
    fn meets_threshold(&self, root: Buf32, work: Work, version: WorkVersion, is_high_priority: bool) -> bool;
}

/// Generator half of the same contract; the ledger never
/// calls this directly, it exists so collaborators share the trait.
pub trait WorkGenerator: Send + Sync {
    fn generate(&self, root: Buf32, version: WorkVersion, is_high_priority: bool) -> Work;
}
