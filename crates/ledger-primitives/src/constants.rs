//! Protocol-wide constants, centralized here rather than scattering magic
//! numbers through the ledger.

use crate::ids::AccountId;

/// Cooldown before a higher-sequence vote from the same voter is accepted
/// for a different hash at the same root.
pub const VOTE_COOLDOWN_MS: u64 = 15_000;

/// Maximum number of hashes a single vote may cover.
pub const MAX_VOTE_HASHES: usize = 12;

/// Stored block count below which representative weight queries fall back
/// to the bootstrap seed rather than the live aggregate. Chosen generously so a freshly joined node has a
/// plausible weight view before it has synced much of the chain.
pub const DEFAULT_BOOTSTRAP_WEIGHT_MAX_BLOCKS: u64 = 450_000;

/// Soft cap on the number of blocks buffered in the unchecked pool before
/// the oldest entries are evicted.
pub const DEFAULT_UNCHECKED_CAPACITY: usize = 65_536;

/// Returns the all-zero "burn" account, which may never be opened.
pub fn burn_account() -> AccountId {
    AccountId::burn()
}
