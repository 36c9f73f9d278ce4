//! Shared types for flosig
//!
//! Chain parameters are always passed explicitly; there is no process-wide
//! network selection, so several coin networks can be served side by side.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorBody, FlosigError, FlosigResult};

// =============================================================================
// Chain Parameters
// =============================================================================

/// Encoding parameters of one coin network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainParams {
    /// Short identifier, e.g. `florincoin`
    pub name: Cow<'static, str>,
    /// Coin name used verbatim in the signed-message preimage
    pub message_coin_name: Cow<'static, str>,
    /// Base58 version byte of pay-to-pubkey-hash addresses
    pub p2pkh_prefix: u8,
    /// Base58 version byte of pay-to-script-hash addresses
    pub p2sh_prefix: u8,
    /// Version byte of WIF private keys
    pub wif_prefix: u8,
    /// Human readable part of bech32 segwit addresses
    pub bech32_hrp: Cow<'static, str>,
}

pub static FLORINCOIN: ChainParams = ChainParams {
    name: Cow::Borrowed("florincoin"),
    message_coin_name: Cow::Borrowed("Florincoin"),
    p2pkh_prefix: 0x23,
    p2sh_prefix: 0x5e,
    wif_prefix: 0xa3,
    bech32_hrp: Cow::Borrowed("flo"),
};

pub static FLORINCOIN_TESTNET: ChainParams = ChainParams {
    name: Cow::Borrowed("florincoin-testnet"),
    message_coin_name: Cow::Borrowed("Florincoin"),
    p2pkh_prefix: 0x73,
    p2sh_prefix: 0xc6,
    wif_prefix: 0xef,
    bech32_hrp: Cow::Borrowed("tflo"),
};

pub static BITCOIN: ChainParams = ChainParams {
    name: Cow::Borrowed("bitcoin"),
    message_coin_name: Cow::Borrowed("Bitcoin"),
    p2pkh_prefix: 0x00,
    p2sh_prefix: 0x05,
    wif_prefix: 0x80,
    bech32_hrp: Cow::Borrowed("bc"),
};

pub static BITCOIN_TESTNET: ChainParams = ChainParams {
    name: Cow::Borrowed("bitcoin-testnet"),
    message_coin_name: Cow::Borrowed("Bitcoin"),
    p2pkh_prefix: 0x6f,
    p2sh_prefix: 0xc4,
    wif_prefix: 0xef,
    bech32_hrp: Cow::Borrowed("tb"),
};

pub static LITECOIN: ChainParams = ChainParams {
    name: Cow::Borrowed("litecoin"),
    message_coin_name: Cow::Borrowed("Litecoin"),
    p2pkh_prefix: 0x30,
    p2sh_prefix: 0x32,
    wif_prefix: 0xb0,
    bech32_hrp: Cow::Borrowed("ltc"),
};

impl ChainParams {
    /// Load a custom parameter set from JSON
    pub fn from_json(json: &str) -> FlosigResult<ChainParams> {
        let params: ChainParams = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    fn validate(&self) -> FlosigResult<()> {
        if self.name.trim().is_empty() {
            return Err(FlosigError::InvalidConfig("name must not be empty".to_string()));
        }
        if self.message_coin_name.is_empty() {
            return Err(FlosigError::InvalidConfig(
                "message_coin_name must not be empty".to_string(),
            ));
        }
        if self.p2pkh_prefix == self.p2sh_prefix {
            return Err(FlosigError::InvalidConfig(
                "p2pkh_prefix and p2sh_prefix must differ".to_string(),
            ));
        }
        let hrp = &self.bech32_hrp;
        if hrp.is_empty() || !hrp.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()) {
            return Err(FlosigError::InvalidConfig(format!("invalid bech32 hrp {:?}", hrp)));
        }
        Ok(())
    }
}

// =============================================================================
// Chain Types
// =============================================================================

/// Built-in coin networks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Chain {
    Florincoin,
    FlorincoinTestnet,
    Bitcoin,
    BitcoinTestnet,
    Litecoin,
}

impl Chain {
    pub fn all() -> &'static [Chain] {
        &[
            Chain::Florincoin,
            Chain::FlorincoinTestnet,
            Chain::Bitcoin,
            Chain::BitcoinTestnet,
            Chain::Litecoin,
        ]
    }

    pub fn params(&self) -> &'static ChainParams {
        match self {
            Chain::Florincoin => &FLORINCOIN,
            Chain::FlorincoinTestnet => &FLORINCOIN_TESTNET,
            Chain::Bitcoin => &BITCOIN,
            Chain::BitcoinTestnet => &BITCOIN_TESTNET,
            Chain::Litecoin => &LITECOIN,
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.params().name)
    }
}

impl FromStr for Chain {
    type Err = FlosigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "florincoin" | "flo" => Ok(Chain::Florincoin),
            "florincoin-testnet" | "flo-testnet" => Ok(Chain::FlorincoinTestnet),
            "bitcoin" | "btc" => Ok(Chain::Bitcoin),
            "bitcoin-testnet" | "btc-testnet" => Ok(Chain::BitcoinTestnet),
            "litecoin" | "ltc" => Ok(Chain::Litecoin),
            other => Err(FlosigError::UnknownChain(other.to_string())),
        }
    }
}

// =============================================================================
// Response Envelope
// =============================================================================

/// JSON envelope written by the command line tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ErrorBody>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: &FlosigError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_body()),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"success":false,"error":{"code":"invalid_config","message":"Serialization failed"}}"#
                .to_string()
        })
    }
}
