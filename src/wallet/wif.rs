//! Wallet Import Format keys
//!
//! Decoding is network-agnostic: the version byte is kept so callers can
//! check it against a chain with [`Wif::is_for_chain`] when they care.

use bitcoin::secp256k1::{Secp256k1, SecretKey};
use bitcoin::PublicKey;

use crate::address::Address;
use crate::error::{FlosigError, FlosigResult};
use crate::types::ChainParams;
use crate::utils::crypto::{base58check_decode, base58check_encode};

/// Compression flag byte appended to compressed-key WIF payloads
const COMPRESSED_FLAG: u8 = 0x01;

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Wif {
    pub secret_key: SecretKey,
    pub compressed: bool,
    pub prefix: u8,
}

impl std::fmt::Debug for Wif {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wif")
            .field("secret_key", &"[REDACTED]")
            .field("compressed", &self.compressed)
            .field("prefix", &format_args!("0x{:02x}", self.prefix))
            .finish()
    }
}

impl Wif {
    pub fn new(secret_key: SecretKey, compressed: bool, params: &ChainParams) -> Self {
        Self {
            secret_key,
            compressed,
            prefix: params.wif_prefix,
        }
    }

    pub fn decode(wif: &str) -> FlosigResult<Wif> {
        let payload = base58check_decode(wif.trim())
            .map_err(|e| FlosigError::InvalidPrivateKey(format!("Invalid WIF: {}", e)))?;

        let compressed = match payload.len() {
            33 => false,
            34 if payload[33] == COMPRESSED_FLAG => true,
            34 => {
                return Err(FlosigError::InvalidPrivateKey(format!(
                    "Invalid WIF compression flag: 0x{:02x}",
                    payload[33]
                )))
            }
            n => {
                return Err(FlosigError::InvalidPrivateKey(format!(
                    "Invalid WIF payload length: {}",
                    n
                )))
            }
        };

        let secret_key = SecretKey::from_slice(&payload[1..33])?;

        Ok(Wif {
            secret_key,
            compressed,
            prefix: payload[0],
        })
    }

    pub fn encode(&self) -> String {
        let mut data = zeroize::Zeroizing::new(Vec::with_capacity(34));
        data.push(self.prefix);
        data.extend_from_slice(&self.secret_key.secret_bytes());
        if self.compressed {
            data.push(COMPRESSED_FLAG);
        }
        base58check_encode(&data)
    }

    pub fn is_for_chain(&self, params: &ChainParams) -> bool {
        self.prefix == params.wif_prefix
    }

    /// Public key serialized according to the compression flag
    pub fn public_key(&self) -> PublicKey {
        let secp = Secp256k1::signing_only();
        let inner = self.secret_key.public_key(&secp);
        PublicKey {
            compressed: self.compressed,
            inner,
        }
    }

    pub fn p2pkh_address(&self, params: &ChainParams) -> Address {
        Address::p2pkh(&self.public_key(), params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BITCOIN, FLORINCOIN};

    fn key_one() -> SecretKey {
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        SecretKey::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_bitcoin_wif_vectors() {
        let compressed = Wif::new(key_one(), true, &BITCOIN);
        assert_eq!(
            compressed.encode(),
            "KwDiBf89QgGbjEhKnhXJuH7LrciVrZi3qYjgd9M7rFU73sVHnoWn"
        );
        assert_eq!(compressed.p2pkh_address(&BITCOIN).encode(), "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH");

        let uncompressed = Wif::new(key_one(), false, &BITCOIN);
        assert_eq!(
            uncompressed.encode(),
            "5HpHagT65TZzG1PH3CSu63k8DbpvD8s5ip4nEB3kEsreAnchuDf"
        );
        assert_eq!(uncompressed.p2pkh_address(&BITCOIN).encode(), "1EHNa6Q4Jz2uvNExL497mE43ikXhwF6kZm");
    }

    #[test]
    fn test_decode_roundtrip() {
        let wif = Wif::new(key_one(), true, &FLORINCOIN);
        let decoded = Wif::decode(&wif.encode()).unwrap();
        assert_eq!(decoded, wif);
        assert!(decoded.is_for_chain(&FLORINCOIN));
        assert!(!decoded.is_for_chain(&BITCOIN));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            Wif::decode("invalid_wif_string"),
            Err(FlosigError::InvalidPrivateKey(_))
        ));
        // valid base58check, but an address rather than a key
        assert!(Wif::decode("1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH").is_err());
    }

    #[test]
    fn test_debug_hides_secret() {
        let wif = Wif::new(key_one(), true, &BITCOIN);
        let rendered = format!("{:?}", wif);
        assert!(rendered.contains("REDACTED"));
        assert!(!rendered.contains("0000000000000001"));
    }
}
