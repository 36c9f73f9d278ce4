//! Compact recoverable signatures
//!
//! Layout: `header || r || s`, 65 bytes. The header folds the recovery id
//! together with the key type the signer claims:
//!
//! | header | claim |
//! |---|---|
//! | 27-30 | P2PKH, uncompressed key |
//! | 31-34 | P2PKH, compressed key |
//! | 35-38 | P2WPKH nested in P2SH |
//! | 39-42 | native P2WPKH (not supported) |

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bitcoin::hashes::{sha256d, Hash};
use bitcoin::PublicKey;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, Secp256k1};

pub const COMPACT_SIGNATURE_LEN: usize = 65;

pub const MIN_HEADER: u8 = 27;
pub const MAX_HEADER: u8 = 42;

const UNCOMPRESSED_BASE: u8 = 27;
const COMPRESSED_BASE: u8 = 31;
const WITNESS_WRAPPED_BASE: u8 = 35;

/// Key type claimed by a signature header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderClass {
    PubKeyHash { compressed: bool },
    WitnessWrapped,
    WitnessDirectUnsupported,
    Invalid,
}

impl HeaderClass {
    pub const fn from_header(header: u8) -> HeaderClass {
        match header {
            27..=30 => HeaderClass::PubKeyHash { compressed: false },
            31..=34 => HeaderClass::PubKeyHash { compressed: true },
            35..=38 => HeaderClass::WitnessWrapped,
            39..=42 => HeaderClass::WitnessDirectUnsupported,
            _ => HeaderClass::Invalid,
        }
    }

    /// Whether the recovered key is serialized compressed.
    /// Witness keys are always compressed.
    pub const fn compressed_key(&self) -> bool {
        !matches!(self, HeaderClass::PubKeyHash { compressed: false })
    }

    /// Header byte for this class and a recovery id in `0..4`
    pub fn header(&self, recovery_id: u8) -> Option<u8> {
        if recovery_id > 3 {
            return None;
        }
        let base = match self {
            HeaderClass::PubKeyHash { compressed: false } => UNCOMPRESSED_BASE,
            HeaderClass::PubKeyHash { compressed: true } => COMPRESSED_BASE,
            HeaderClass::WitnessWrapped => WITNESS_WRAPPED_BASE,
            HeaderClass::WitnessDirectUnsupported | HeaderClass::Invalid => return None,
        };
        Some(base + recovery_id)
    }
}

/// Recovery id encoded in a header, `None` outside 27..=42
pub fn recovery_id(header: u8) -> Option<u8> {
    match header {
        MIN_HEADER..=MAX_HEADER => Some((header - MIN_HEADER) % 4),
        _ => None,
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct CompactSignature([u8; COMPACT_SIGNATURE_LEN]);

impl std::fmt::Debug for CompactSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CompactSignature({})", hex::encode(self.0))
    }
}

impl CompactSignature {
    pub fn from_slice(bytes: &[u8]) -> Option<CompactSignature> {
        let array: [u8; COMPACT_SIGNATURE_LEN] = bytes.try_into().ok()?;
        Some(CompactSignature(array))
    }

    /// Wrap a recoverable signature under the given claim
    pub fn from_recoverable(sig: &RecoverableSignature, class: HeaderClass) -> Option<CompactSignature> {
        let (recid, rs) = sig.serialize_compact();
        let header = class.header(u8::try_from(recid.to_i32()).ok()?)?;
        let mut bytes = [0u8; COMPACT_SIGNATURE_LEN];
        bytes[0] = header;
        bytes[1..].copy_from_slice(&rs);
        Some(CompactSignature(bytes))
    }

    pub fn header(&self) -> u8 {
        self.0[0]
    }

    pub fn class(&self) -> HeaderClass {
        HeaderClass::from_header(self.header())
    }

    pub fn as_bytes(&self) -> &[u8; COMPACT_SIGNATURE_LEN] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Recover the signing key for `digest`.
    pub fn recover(&self, digest: &sha256d::Hash) -> Result<PublicKey, secp256k1::Error> {
        let recid = recovery_id(self.header()).ok_or(secp256k1::Error::InvalidRecoveryId)?;
        let recid = RecoveryId::from_i32(i32::from(recid))?;
        let sig = RecoverableSignature::from_compact(&self.0[1..], recid)?;

        let secp = Secp256k1::verification_only();
        let msg = Message::from_digest(digest.to_byte_array());
        let inner = secp.recover_ecdsa(&msg, &sig)?;

        Ok(PublicKey {
            compressed: self.class().compressed_key(),
            inner,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secp256k1::SecretKey;

    #[test]
    fn test_header_table() {
        for header in 0..=u8::MAX {
            let class = HeaderClass::from_header(header);
            let expected = match header {
                27..=30 => HeaderClass::PubKeyHash { compressed: false },
                31..=34 => HeaderClass::PubKeyHash { compressed: true },
                35..=38 => HeaderClass::WitnessWrapped,
                39..=42 => HeaderClass::WitnessDirectUnsupported,
                _ => HeaderClass::Invalid,
            };
            assert_eq!(class, expected, "header {}", header);
            assert_eq!(recovery_id(header).is_some(), class != HeaderClass::Invalid);
        }
        assert_eq!(HeaderClass::from_header(26), HeaderClass::Invalid);
        assert_eq!(HeaderClass::from_header(43), HeaderClass::Invalid);
    }

    #[test]
    fn test_recovery_ids() {
        assert_eq!(recovery_id(27), Some(0));
        assert_eq!(recovery_id(32), Some(1));
        assert_eq!(recovery_id(37), Some(2));
        assert_eq!(recovery_id(42), Some(3));
        assert_eq!(recovery_id(43), None);
    }

    #[test]
    fn test_header_roundtrip() {
        let classes = [
            HeaderClass::PubKeyHash { compressed: false },
            HeaderClass::PubKeyHash { compressed: true },
            HeaderClass::WitnessWrapped,
        ];
        for class in classes {
            for recid in 0..4 {
                let header = class.header(recid).unwrap();
                assert_eq!(HeaderClass::from_header(header), class);
                assert_eq!(recovery_id(header), Some(recid));
            }
            assert_eq!(class.header(4), None);
        }
        assert_eq!(HeaderClass::WitnessDirectUnsupported.header(0), None);
    }

    #[test]
    fn test_sign_and_recover() {
        let secp = Secp256k1::new();
        let secret = SecretKey::from_slice(&[0x11; 32]).unwrap();
        let digest = sha256d::Hash::hash(b"compact");
        let msg = Message::from_digest(digest.to_byte_array());
        let sig = secp.sign_ecdsa_recoverable(&msg, &secret);

        let compact =
            CompactSignature::from_recoverable(&sig, HeaderClass::PubKeyHash { compressed: false }).unwrap();
        let recovered = compact.recover(&digest).unwrap();
        assert!(!recovered.compressed);
        assert_eq!(recovered.inner, secret.public_key(&secp));

        let wrapped = CompactSignature::from_recoverable(&sig, HeaderClass::WitnessWrapped).unwrap();
        assert!(wrapped.recover(&digest).unwrap().compressed);
    }

    #[test]
    fn test_from_slice_length() {
        assert!(CompactSignature::from_slice(&[31u8; 64]).is_none());
        assert!(CompactSignature::from_slice(&[31u8; 66]).is_none());
        assert_eq!(CompactSignature::from_slice(&[31u8; 65]).unwrap().header(), 31);
    }
}
