//! Encoding helpers shared by address and WIF handling.

use bitcoin::hashes::{sha256d, Hash};
use zeroize::Zeroizing;

/// Base58Check encode: payload followed by the first four bytes of its
/// double SHA256.
pub fn base58check_encode(payload: &[u8]) -> String {
    let mut data = Zeroizing::new(Vec::with_capacity(payload.len() + 4));
    data.extend_from_slice(payload);

    let checksum = sha256d::Hash::hash(payload);
    data.extend_from_slice(&checksum[..4]);

    bs58::encode(data.as_slice()).into_string()
}

/// Base58Check decode, returning the payload without its checksum.
///
/// The returned buffer is wiped on drop since WIF payloads pass through here.
pub fn base58check_decode(encoded: &str) -> Result<Zeroizing<Vec<u8>>, String> {
    let decoded = Zeroizing::new(
        bs58::decode(encoded)
            .into_vec()
            .map_err(|e| format!("invalid base58: {}", e))?,
    );

    if decoded.len() < 5 {
        return Err("base58 payload too short".to_string());
    }

    let (payload, checksum) = decoded.split_at(decoded.len() - 4);
    let computed = sha256d::Hash::hash(payload);
    if checksum != &computed[..4] {
        return Err("checksum mismatch".to_string());
    }

    Ok(Zeroizing::new(payload.to_vec()))
}
