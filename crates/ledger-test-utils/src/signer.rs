//! A deterministic stand-in for the wallet key service and the epoch
//! signer. Never backed by real asymmetric crypto -- this crate exists
//! purely so the ledger's test suite can produce blocks whose signatures
//! verify without pulling a signature scheme into the core. Private
//! material is wrapped in a zeroize-on-drop newtype.

use ledger_core::context::KeySigner;
use ledger_primitives::prelude::*;
use sha2::{Digest, Sha512};
use zeroize::Zeroizing;

/// Deterministically "signs" by hashing `seed || account || message` with
/// SHA-512, whose 64-byte output lines up exactly with [`Signature`]'s
/// width. Verification just recomputes and compares -- there is no
/// asymmetric keypair, so every account is implicitly "signed for" by
/// whichever `DeterministicSigner` instance produced the block.
pub struct DeterministicSigner {
    seed: Zeroizing<[u8; 32]>,
    epoch_seed: Zeroizing<[u8; 32]>,
}

impl Default for DeterministicSigner {
    fn default() -> Self {
        Self::new()
    }
}

impl DeterministicSigner {
    pub fn new() -> Self {
        Self {
            seed: Zeroizing::new([0xab; 32]),
            epoch_seed: Zeroizing::new([0xcd; 32]),
        }
    }

    pub fn with_seed(seed: [u8; 32], epoch_seed: [u8; 32]) -> Self {
        Self {
            seed: Zeroizing::new(seed),
            epoch_seed: Zeroizing::new(epoch_seed),
        }
    }

    /// Produces a signature over `message` that `verify_account` will
    /// accept for `account`, regardless of what real key (if any) that
    /// account corresponds to.
    pub fn sign_account(&self, account: &AccountId, message: &[u8]) -> Signature {
        Signature(Buf64::from(Self::digest(&self.seed, account.0.as_bytes(), message)))
    }

    /// Produces a signature the configured epoch signer for `epoch` accepts.
    pub fn sign_epoch(&self, epoch: u32, message: &[u8]) -> Signature {
        Signature(Buf64::from(Self::digest(&self.epoch_seed, &epoch.to_be_bytes(), message)))
    }

    fn digest(seed: &[u8; 32], tag: &[u8], message: &[u8]) -> [u8; 64] {
        let mut hasher = Sha512::new();
        hasher.update(seed);
        hasher.update(tag);
        hasher.update(message);
        hasher.finalize().into()
    }
}

impl KeySigner for DeterministicSigner {
    fn verify_account(&self, account: &AccountId, message: &[u8], signature: &Signature) -> bool {
        signature.0 == Buf64::from(Self::digest(&self.seed, account.0.as_bytes(), message))
    }

    fn verify_epoch_signer(&self, epoch: u32, message: &[u8], signature: &Signature) -> bool {
        signature.0 == Buf64::from(Self::digest(&self.epoch_seed, &epoch.to_be_bytes(), message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acct(b: u8) -> AccountId {
        AccountId::from(Buf32::from([b; 32]))
    }

    #[test]
    fn signs_and_verifies_round_trip() {
        let signer = DeterministicSigner::new();
        let msg = b"some block hash bytes";
        let sig = signer.sign_account(&acct(1), msg);
        assert!(signer.verify_account(&acct(1), msg, &sig));
        assert!(!signer.verify_account(&acct(2), msg, &sig));
    }

    #[test]
    fn epoch_signatures_are_distinct_per_epoch() {
        let signer = DeterministicSigner::new();
        let msg = b"epoch upgrade payload";
        let sig1 = signer.sign_epoch(1, msg);
        assert!(signer.verify_epoch_signer(1, msg, &sig1));
        assert!(!signer.verify_epoch_signer(2, msg, &sig1));
    }
}
