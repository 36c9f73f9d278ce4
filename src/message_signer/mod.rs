//! Message Signing Module
//!
//! Signed-message proofs for Bitcoin-family addresses using 65-byte compact
//! recoverable signatures.
//!
//! Supported address types:
//! - P2PKH, compressed and uncompressed keys
//! - P2SH-P2WPKH (wrapped segwit)

pub mod compact;
pub mod signed_message;

pub use compact::{recovery_id, CompactSignature, HeaderClass};
pub use signed_message::{
    recover_message_pubkey, sign_message, sign_message_p2sh_p2wpkh, sign_message_with_wif,
    signed_message_hash, verify_message,
};
