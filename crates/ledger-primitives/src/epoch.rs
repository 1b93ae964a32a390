//! Epoch markers and the reserved sentinel used to recognize epoch-upgrade
//! state blocks.

use crate::buf::Buf32;

/// Highest epoch this build understands. Epoch upgrades beyond this are
/// rejected the same way an unknown legacy block kind would be.
pub const MAX_KNOWN_EPOCH: u32 = 2;

/// Returns the fixed 32-byte sentinel used as the `link` field of a state
/// block that upgrades an account to epoch `n`.
///
/// Chosen (by construction, see [`crate::constants`]) so it can never
/// collide with a real account or a real block hash used as a send
/// destination: every epoch-link sentinel has its low byte set to a
/// non-zero marker tag that a legitimate 256-bit hash would hit with
/// negligible probability, and the protocol never accepts it as a receive
/// source. Implementers porting this to another node should treat the
/// specific 32 bytes as a deployment-wide configuration constant, not as
/// something to recompute.
pub fn epoch_link(n: u32) -> Buf32 {
    let mut buf = [0u8; 32];
    buf[0..4].copy_from_slice(b"epo\0");
    buf[4..8].copy_from_slice(&n.to_be_bytes());
    Buf32::from(buf)
}

/// Recovers the epoch number from a link value previously produced by
/// [`epoch_link`], if it is one.
pub fn epoch_from_link(link: &Buf32) -> Option<u32> {
    let bytes = link.as_bytes();
    if bytes[0..4] != *b"epo\0" {
        return None;
    }
    let mut n = [0u8; 4];
    n.copy_from_slice(&bytes[4..8]);
    if bytes[8..] != [0u8; 24] {
        return None;
    }
    Some(u32::from_be_bytes(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_link() {
        for n in 0..8 {
            let link = epoch_link(n);
            assert_eq!(epoch_from_link(&link), Some(n));
        }
    }

    #[test]
    fn distinct_epochs_have_distinct_links() {
        assert_ne!(epoch_link(1), epoch_link(2));
    }

    #[test]
    fn arbitrary_hash_is_not_mistaken_for_a_link() {
        let not_a_link = Buf32::from([0x42u8; 32]);
        assert_eq!(epoch_from_link(&not_a_link), None);
    }
}
