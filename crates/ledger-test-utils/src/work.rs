//! Stand-in for the work (proof-of-work) service. The
//! algorithm itself is out of scope for the core; a
//! test build just needs something that always clears the threshold so the
//! ledger's classification logic can be exercised without mining anything.

use ledger_primitives::buf::Buf32;
use ledger_primitives::ids::Work;
use ledger_primitives::work::{WorkGenerator, WorkValidator, WorkVersion};

pub struct NullWorkValidator;

impl WorkValidator for NullWorkValidator {
    fn meets_threshold(&self, _root: Buf32, _work: Work, _version: WorkVersion, _is_high_priority: bool) -> bool {
        true
    }
}

pub struct NullWorkGenerator;

impl WorkGenerator for NullWorkGenerator {
    fn generate(&self, _root: Buf32, _version: WorkVersion, _is_high_priority: bool) -> Work {
        Work(0)
    }
}

/// Rejects every nonce, for exercising the `insufficient_work` path.
pub struct AlwaysFailsWorkValidator;

impl WorkValidator for AlwaysFailsWorkValidator {
    fn meets_threshold(&self, _root: Buf32, _work: Work, _version: WorkVersion, _is_high_priority: bool) -> bool {
        false
    }
}
