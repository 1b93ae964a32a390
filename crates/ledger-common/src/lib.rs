//! Reusable plumbing shared by the ledger binaries and services: tracing
//! setup, the on-disk config schema, and the retry-with-backoff helper used
//! wherever a fallible operation is worth a few attempts.

pub mod clock;
pub mod config;
pub mod logging;
pub mod retry;
