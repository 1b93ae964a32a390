//! Fixed-size byte buffers used for account identifiers, hashes and
//! signatures. Kept as distinct newtypes rather than bare arrays so the
//! compiler stops us from passing a hash where an account is expected.

use std::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

macro_rules! define_buf {
    ($name:ident, $len:expr) => {
        /// Fixed-size opaque byte buffer.
        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            pub const LEN: usize = $len;

            pub const fn zero() -> Self {
                Self([0u8; $len])
            }

            pub fn is_zero(&self) -> bool {
                self.0 == [0u8; $len]
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            pub fn from_slice(s: &[u8]) -> Option<Self> {
                if s.len() != $len {
                    return None;
                }
                let mut buf = [0u8; $len];
                buf.copy_from_slice(s);
                Some(Self(buf))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::zero()
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(buf: [u8; $len]) -> Self {
                Self(buf)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), hex::encode(self.0))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", hex::encode_upper(self.0))
            }
        }

        impl BorshSerialize for $name {
            fn serialize<W: std::io::Write>(&self, writer: &mut W) -> std::io::Result<()> {
                writer.write_all(&self.0)
            }
        }

        impl BorshDeserialize for $name {
            fn deserialize_reader<R: std::io::Read>(reader: &mut R) -> std::io::Result<Self> {
                let mut buf = [0u8; $len];
                reader.read_exact(&mut buf)?;
                Ok(Self(buf))
            }
        }

        #[cfg(feature = "arbitrary")]
        impl<'a> arbitrary::Arbitrary<'a> for $name {
            fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
                let mut buf = [0u8; $len];
                u.fill_buffer(&mut buf)?;
                Ok(Self(buf))
            }
        }
    };
}

define_buf!(Buf32, 32);
define_buf!(Buf64, 64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_zero() {
        assert!(Buf32::zero().is_zero());
        assert!(!Buf32::from([1u8; 32]).is_zero());
    }

    #[test]
    fn borsh_round_trip() {
        let b = Buf32::from([7u8; 32]);
        let enc = borsh::to_vec(&b).unwrap();
        let dec: Buf32 = borsh::BorshDeserialize::try_from_slice(&enc).unwrap();
        assert_eq!(b, dec);
    }

    #[test]
    fn from_slice_rejects_wrong_len() {
        assert!(Buf32::from_slice(&[0u8; 31]).is_none());
        assert!(Buf32::from_slice(&[0u8; 32]).is_some());
    }
}
