//! Bitcoin-family signed messages
//!
//! Preimage: `varstring(coin_name + " Signed Message:\n") || varstring(message)`,
//! hashed with double SHA-256. The coin name must match byte for byte between
//! signer and verifier.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bitcoin::consensus::encode::serialize;
use bitcoin::hashes::{sha256d, Hash};
use bitcoin::PublicKey;
use secp256k1::{Message, Secp256k1, SecretKey};

use super::compact::{CompactSignature, HeaderClass, MAX_HEADER, MIN_HEADER};
use crate::address::{Address, AddressKind};
use crate::error::{FlosigError, FlosigResult};
use crate::types::ChainParams;
use crate::wallet::Wif;
use crate::{log_debug, log_info};

const MAGIC_SUFFIX: &str = " Signed Message:\n";

/// Digest a wallet signs for `message` under `coin_name`
pub fn signed_message_hash(coin_name: &str, message: &str) -> sha256d::Hash {
    let magic = format!("{}{}", coin_name, MAGIC_SUFFIX).into_bytes();
    let mut preimage = serialize(&magic);
    preimage.extend_from_slice(&serialize(&message.as_bytes().to_vec()));
    sha256d::Hash::hash(&preimage)
}

/// Decode a base64 envelope and classify its header.
fn decode_envelope(signature: &str) -> FlosigResult<(Vec<u8>, HeaderClass)> {
    let bytes = STANDARD
        .decode(signature.trim_matches(|c| c == '\r' || c == '\n'))
        .map_err(|e| FlosigError::MalformedEncoding(e.to_string()))?;

    let header = *bytes.first().ok_or(FlosigError::MalformedSignature)?;
    if !(MIN_HEADER..=MAX_HEADER).contains(&header) {
        return Err(FlosigError::InvalidSignaturePrefix(header));
    }

    Ok((bytes, HeaderClass::from_header(header)))
}

/// Check that `signature` proves control of `address` over `message`.
///
/// Caller-input problems are errors. A signature that is well formed but
/// does not recover to `address`, including one whose curve point cannot be
/// recovered at all, yields `Ok(false)`.
pub fn verify_message(
    address: &str,
    signature: &str,
    message: &str,
    coin_name: &str,
    params: &ChainParams,
) -> FlosigResult<bool> {
    let decoded = Address::decode(address, params)
        .map_err(|e| FlosigError::InvalidAddressOrKey(e.to_string()))?;

    let (bytes, class) = decode_envelope(signature)?;

    let expected = match class {
        HeaderClass::PubKeyHash { .. } => AddressKind::PubKeyHash,
        HeaderClass::WitnessWrapped => AddressKind::ScriptHash,
        HeaderClass::WitnessDirectUnsupported => {
            return Err(FlosigError::UnsupportedAddressType(
                "native P2WPKH signatures (header 39-42) are not supported".to_string(),
            ))
        }
        HeaderClass::Invalid => return Err(FlosigError::InvalidSignaturePrefix(bytes[0])),
    };
    if decoded.kind() != expected {
        return Err(FlosigError::AddressTypeMismatch {
            expected,
            actual: decoded.kind(),
        });
    }

    let digest = signed_message_hash(coin_name, message);

    let Some(compact) = CompactSignature::from_slice(&bytes) else {
        log_debug!("message_signer", "Signature has wrong length", len = bytes.len());
        return Ok(false);
    };
    let pubkey = match compact.recover(&digest) {
        Ok(pk) => pk,
        Err(e) => {
            log_debug!("message_signer", "Key recovery failed", error = e, digest = digest);
            return Ok(false);
        }
    };

    let candidate = match class {
        HeaderClass::WitnessWrapped => Address::p2sh_p2wpkh(&pubkey.inner.serialize(), params),
        _ => Address::p2pkh(&pubkey, params),
    };

    let valid = candidate.encode() == address;
    log_debug!(
        "message_signer",
        "Verified signed message",
        address = address,
        recovered_address = candidate,
        valid = valid,
    );
    Ok(valid)
}

fn sign_with_class(
    message: &str,
    coin_name: &str,
    secret_key: &SecretKey,
    class: HeaderClass,
) -> FlosigResult<String> {
    let secp = Secp256k1::signing_only();
    let digest = signed_message_hash(coin_name, message);
    let msg = Message::from_digest(digest.to_byte_array());
    let sig = secp.sign_ecdsa_recoverable(&msg, secret_key);

    let compact = CompactSignature::from_recoverable(&sig, class).ok_or_else(|| {
        FlosigError::SigningFailed("recovery id out of range".to_string())
    })?;

    log_info!("message_signer", "Signed message", coin = coin_name, header = compact.header());
    Ok(compact.to_base64())
}

/// Sign `message` for a P2PKH address.
///
/// `compressed` selects which serialization of the public key the
/// resulting signature recovers to, and so which address it proves.
pub fn sign_message(
    message: &str,
    coin_name: &str,
    secret_key: &SecretKey,
    compressed: bool,
) -> FlosigResult<String> {
    sign_with_class(message, coin_name, secret_key, HeaderClass::PubKeyHash { compressed })
}

pub fn sign_message_with_wif(message: &str, coin_name: &str, wif: &str) -> FlosigResult<String> {
    let key = Wif::decode(wif)?;
    sign_message(message, coin_name, &key.secret_key, key.compressed)
}

/// Sign `message` for the P2SH-P2WPKH address of `secret_key` (headers 35-38).
pub fn sign_message_p2sh_p2wpkh(
    message: &str,
    coin_name: &str,
    secret_key: &SecretKey,
) -> FlosigResult<String> {
    sign_with_class(message, coin_name, secret_key, HeaderClass::WitnessWrapped)
}

/// Recover the public key that produced `signature`.
pub fn recover_message_pubkey(signature: &str, message: &str, coin_name: &str) -> FlosigResult<PublicKey> {
    let (bytes, _) = decode_envelope(signature)?;
    let compact = CompactSignature::from_slice(&bytes).ok_or_else(|| {
        FlosigError::VerificationFailed(format!("expected 65 signature bytes, got {}", bytes.len()))
    })?;
    let digest = signed_message_hash(coin_name, message);
    compact
        .recover(&digest)
        .map_err(|e| FlosigError::VerificationFailed(format!("key recovery failed: {}", e)))
}
