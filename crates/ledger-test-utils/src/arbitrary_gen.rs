//! Arbitrary-backed random value generation for property tests, pulled
//! into one small reusable type instead of being copy-pasted per crate.

use arbitrary::{Arbitrary, Unstructured};
use rand::RngCore;

pub struct ArbitraryGenerator {
    buffer: Vec<u8>,
}

impl Default for ArbitraryGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ArbitraryGenerator {
    pub fn new() -> Self {
        Self::with_size(1024)
    }

    pub fn with_size(size: usize) -> Self {
        let mut rng = rand::thread_rng();
        let mut buffer = vec![0u8; size];
        rng.fill_bytes(&mut buffer);
        Self { buffer }
    }

    pub fn generate<'a, T: Arbitrary<'a> + Clone>(&'a self) -> T {
        let mut u = Unstructured::new(&self.buffer);
        T::arbitrary(&mut u).expect("failed to generate arbitrary instance")
    }
}
