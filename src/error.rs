//! Unified error types for flosig
//!
//! Caller-input problems surface as typed errors. A signature that simply
//! fails to prove control of an address is not an error: verification
//! reports it as `Ok(false)`.

use serde::{Deserialize, Serialize};

use crate::address::AddressKind;

/// Main error type for all flosig operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlosigError {
    #[error("Invalid address or key: {0}")]
    InvalidAddressOrKey(String),

    #[error("Malformed base64 encoding: {0}")]
    MalformedEncoding(String),

    #[error("Malformed signature: signature is empty")]
    MalformedSignature,

    #[error("Invalid signature prefix: {0}")]
    InvalidSignaturePrefix(u8),

    #[error("Address type mismatch: signature claims {expected}, address is {actual}")]
    AddressTypeMismatch {
        expected: AddressKind,
        actual: AddressKind,
    },

    #[error("Unsupported address type: {0}")]
    UnsupportedAddressType(String),

    #[error("No key for address {0}")]
    NoKeyForAddress(String),

    #[error("Script construction failed: {0}")]
    ScriptConstructionFailed(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Metadata is {len} bytes, limit is {max}")]
    MetadataTooLarge { len: usize, max: usize },

    #[error("Transaction has {inputs} inputs but {vins} previous outputs were supplied")]
    InputCountMismatch { inputs: usize, vins: usize },

    #[error("Input {index} spends {actual}, but the previous output supplied for it is {expected}")]
    InputOutpointMismatch {
        index: usize,
        expected: String,
        actual: String,
    },

    #[error("Input index {index} out of range for {count} inputs")]
    InputIndexOutOfRange { index: usize, count: usize },

    #[error("Script verification failed: {0}")]
    VerificationFailed(String),

    #[error("Unknown chain: {0}")]
    UnknownChain(String),

    #[error("Invalid chain parameters: {0}")]
    InvalidConfig(String),
}

impl FlosigError {
    pub fn code(&self) -> ErrorCode {
        match self {
            FlosigError::InvalidAddressOrKey(_) => ErrorCode::InvalidAddressOrKey,
            FlosigError::MalformedEncoding(_) => ErrorCode::MalformedEncoding,
            FlosigError::MalformedSignature => ErrorCode::MalformedSignature,
            FlosigError::InvalidSignaturePrefix(_) => ErrorCode::InvalidSignaturePrefix,
            FlosigError::AddressTypeMismatch { .. } => ErrorCode::AddressTypeMismatch,
            FlosigError::UnsupportedAddressType(_) => ErrorCode::UnsupportedAddressType,
            FlosigError::NoKeyForAddress(_) => ErrorCode::NoKeyForAddress,
            FlosigError::ScriptConstructionFailed(_) => ErrorCode::ScriptConstructionFailed,
            FlosigError::InvalidPrivateKey(_) => ErrorCode::InvalidPrivateKey,
            FlosigError::SigningFailed(_) => ErrorCode::SigningFailed,
            FlosigError::MetadataTooLarge { .. } => ErrorCode::MetadataTooLarge,
            FlosigError::InputCountMismatch { .. }
            | FlosigError::InputOutpointMismatch { .. }
            | FlosigError::InputIndexOutOfRange { .. } => {
                ErrorCode::InvalidTransaction
            }
            FlosigError::VerificationFailed(_) => ErrorCode::VerificationFailed,
            FlosigError::UnknownChain(_) | FlosigError::InvalidConfig(_) => ErrorCode::InvalidConfig,
        }
    }

    /// Serializable form used in JSON responses
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Verification input errors
    InvalidAddressOrKey,
    MalformedEncoding,
    MalformedSignature,
    InvalidSignaturePrefix,
    AddressTypeMismatch,
    UnsupportedAddressType,

    // Signing errors
    NoKeyForAddress,
    ScriptConstructionFailed,
    InvalidPrivateKey,
    SigningFailed,

    // Transaction errors
    MetadataTooLarge,
    InvalidTransaction,
    VerificationFailed,

    // Configuration
    InvalidConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

/// Result type alias for flosig operations
pub type FlosigResult<T> = Result<T, FlosigError>;

impl From<bitcoin::secp256k1::Error> for FlosigError {
    fn from(e: bitcoin::secp256k1::Error) -> Self {
        FlosigError::InvalidPrivateKey(format!("Secp256k1 error: {}", e))
    }
}

impl From<serde_json::Error> for FlosigError {
    fn from(e: serde_json::Error) -> Self {
        FlosigError::InvalidConfig(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let err = FlosigError::NoKeyForAddress("FDxa2dUXPw592svsebdHfGRHxB46DKWVUy".to_string());
        let json = serde_json::to_string(&err.to_body()).unwrap();
        assert!(json.contains("no_key_for_address"));
        assert!(json.contains("FDxa2dUXPw592svsebdHfGRHxB46DKWVUy"));
    }

    #[test]
    fn test_type_mismatch_message() {
        let err = FlosigError::AddressTypeMismatch {
            expected: AddressKind::ScriptHash,
            actual: AddressKind::PubKeyHash,
        };
        assert_eq!(err.code(), ErrorCode::AddressTypeMismatch);
        assert_eq!(
            err.to_string(),
            "Address type mismatch: signature claims script-hash, address is pubkey-hash"
        );
    }
}
