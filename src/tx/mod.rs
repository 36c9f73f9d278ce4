//! Transaction Module
//!
//! Assembly and signing of legacy spends with optional metadata:
//! - Unsigned transaction construction
//! - Metadata-aware serialization and signature hashing
//! - P2PKH / P2PK signature scripts
//! - Key lookup and all-or-nothing signing

pub mod builder;
pub mod script;
pub mod sighash;
pub mod signer;

pub use builder::{
    create_unsigned_tx, create_unsigned_tx_with_version, MetaTransaction, Vin, Vout,
    MAX_METADATA_LEN, METADATA_TX_VERSION, TX_VERSION,
};
pub use script::{signature_script, verify_input, verify_tx};
pub use sighash::legacy_sighash;
pub use signer::{
    create_and_sign_tx, key_map_from_wifs, sign_tx, sign_tx_output, KeyFn, KeyMap, KeySource,
};
