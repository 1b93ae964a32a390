//! Canonical hashing used for block hashes and work roots.

use digest::Digest;
use sha2::Sha256;

use crate::buf::Buf32;

/// Direct untagged hash over raw bytes.
pub fn raw(buf: &[u8]) -> Buf32 {
    Buf32::from(<[u8; 32]>::from(Sha256::digest(buf)))
}

/// Hashes the borsh-serialized encoding of a canonical block payload.
pub fn compute_borsh_hash<T: borsh::BorshSerialize>(v: &T) -> Buf32 {
    let mut hasher = Sha256::new();
    v.serialize(&mut hasher).expect("in-memory hasher write cannot fail");
    let out: [u8; 32] = hasher.finalize().into();
    Buf32::from(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_is_deterministic() {
        assert_eq!(raw(b"hello"), raw(b"hello"));
        assert_ne!(raw(b"hello"), raw(b"world"));
    }
}
