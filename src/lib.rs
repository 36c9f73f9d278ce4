//! Flosig Core Library
//!
//! Signed-message proofs and metadata-carrying transactions for
//! Bitcoin-family chains (Florincoin, Bitcoin, Litecoin).
//!
//! # Architecture
//!
//! This crate provides:
//! - **message_signer**: compact-signature message signing and verification
//! - **tx**: unsigned transaction assembly and per-input signing
//! - **wallet**: WIF private keys
//! - **address**: Base58Check and bech32 addresses for any chain's parameters
//!
//! Every operation takes its chain parameters explicitly; there is no global
//! network selection.
//!
//! # Example
//!
//! ```rust
//! use flosig::{verify_message, types::FLORINCOIN};
//!
//! let valid = verify_message(
//!     "FDxa2dUXPw592svsebdHfGRHxB46DKWVUy",
//!     "IMjnGVBNW4kvoSITwijwYkrguszkyMQ08TBNu9wvRiVZB3f+L8Me1gkkK30LT9EO2xyMj0lFHORkSi/zM3cOTF0=",
//!     "Flo signed message test",
//!     "Florincoin",
//!     &FLORINCOIN,
//! )?;
//! assert!(valid);
//! # Ok::<(), flosig::FlosigError>(())
//! ```

pub mod address;
pub mod error;
pub mod message_signer;
pub mod tx;
pub mod types;
pub mod utils;
pub mod wallet;

pub use address::{Address, AddressKind};
pub use error::{ErrorCode, FlosigError, FlosigResult};
pub use message_signer::{
    sign_message, sign_message_p2sh_p2wpkh, sign_message_with_wif, signed_message_hash,
    verify_message,
};
pub use tx::{create_and_sign_tx, create_unsigned_tx, sign_tx, KeyMap, KeySource};
pub use types::{ApiResponse, Chain, ChainParams};
pub use wallet::Wif;
