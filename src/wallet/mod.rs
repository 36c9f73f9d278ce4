//! Wallet Module
//!
//! Private key handling for signing.

pub mod wif;

pub use wif::Wif;
