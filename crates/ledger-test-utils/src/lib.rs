//! Test doubles and fixtures shared by the ledger workspace's test suites:
//! a deterministic signer and clock, work-threshold stand-ins, an
//! `Arbitrary`-backed random value generator, and a handful of block
//! builders for the seeded end-to-end scenarios.

pub mod arbitrary_gen;
pub mod clock;
pub mod fixtures;
pub mod signer;
pub mod work;

pub use arbitrary_gen::ArbitraryGenerator;
pub use clock::FixedClock;
pub use signer::DeterministicSigner;
pub use work::{AlwaysFailsWorkValidator, NullWorkGenerator, NullWorkValidator};
