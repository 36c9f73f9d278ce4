//! Chain-aware addresses
//!
//! Addresses are decoded against an explicit [`ChainParams`] and carry those
//! parameters so they can be re-encoded without any ambient network state.

use std::fmt;

use bech32::{FromBase32, ToBase32, Variant};
use bitcoin::hashes::Hash;
use bitcoin::{
    PubkeyHash, PublicKey, Script, ScriptBuf, ScriptHash, WPubkeyHash, WitnessProgram,
    WitnessVersion,
};
use serde::{Deserialize, Serialize};

use crate::types::ChainParams;
use crate::utils::crypto::{base58check_decode, base58check_encode};

/// Address variant, independent of the chain it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AddressKind {
    PubKeyHash,
    ScriptHash,
    WitnessProgram,
}

impl fmt::Display for AddressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressKind::PubKeyHash => write!(f, "pubkey-hash"),
            AddressKind::ScriptHash => write!(f, "script-hash"),
            AddressKind::WitnessProgram => write!(f, "witness-program"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Payload {
    PubKeyHash(PubkeyHash),
    ScriptHash(ScriptHash),
    WitnessProgram(WitnessProgram),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("invalid base58check encoding: {0}")]
    Base58(String),

    #[error("invalid bech32 encoding: {0}")]
    Bech32(String),

    #[error("address payload is {0} bytes, expected 21")]
    InvalidLength(usize),

    #[error("version byte 0x{0:02x} does not belong to network {1}")]
    WrongNetwork(u8, String),

    #[error("invalid witness program: {0}")]
    InvalidWitnessProgram(String),
}

/// A decoded address bound to the network it was decoded for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    payload: Payload,
    params: ChainParams,
    encoded: String,
}

impl Address {
    /// Decode a human readable address for `params`.
    ///
    /// Strings carrying the chain's bech32 hrp are parsed as segwit
    /// addresses; everything else as Base58Check.
    pub fn decode(s: &str, params: &ChainParams) -> Result<Address, AddressError> {
        let separator = format!("{}1", params.bech32_hrp);
        if s.to_ascii_lowercase().starts_with(&separator) {
            return Self::decode_bech32(s, params);
        }

        let payload = base58check_decode(s).map_err(AddressError::Base58)?;
        if payload.len() != 21 {
            return Err(AddressError::InvalidLength(payload.len()));
        }

        let mut hash = [0u8; 20];
        hash.copy_from_slice(&payload[1..]);

        match payload[0] {
            v if v == params.p2pkh_prefix => Ok(Self::from_pubkey_hash(
                PubkeyHash::from_byte_array(hash),
                params,
            )),
            v if v == params.p2sh_prefix => Ok(Self::from_script_hash(
                ScriptHash::from_byte_array(hash),
                params,
            )),
            v => Err(AddressError::WrongNetwork(v, params.name.to_string())),
        }
    }

    fn decode_bech32(s: &str, params: &ChainParams) -> Result<Address, AddressError> {
        let (hrp, data, variant) =
            bech32::decode(s).map_err(|e| AddressError::Bech32(e.to_string()))?;

        if hrp != params.bech32_hrp {
            return Err(AddressError::Bech32(format!(
                "hrp {} does not belong to network {}",
                hrp, params.name
            )));
        }

        let (version, program) = data
            .split_first()
            .ok_or_else(|| AddressError::Bech32("empty data part".to_string()))?;
        let version = version.to_u8();
        let program = Vec::<u8>::from_base32(program)
            .map_err(|e| AddressError::Bech32(e.to_string()))?;

        let expected_variant = if version == 0 { Variant::Bech32 } else { Variant::Bech32m };
        if variant != expected_variant {
            return Err(AddressError::Bech32(format!(
                "witness version {} requires {:?} checksum",
                version, expected_variant
            )));
        }

        Self::new_witness_program(version, program, params)
    }

    fn new_witness_program(
        version: u8,
        program: Vec<u8>,
        params: &ChainParams,
    ) -> Result<Address, AddressError> {
        let witness_version = WitnessVersion::try_from(version)
            .map_err(|e| AddressError::InvalidWitnessProgram(e.to_string()))?;
        let witness_program = WitnessProgram::new(witness_version, &program)
            .map_err(|e| AddressError::InvalidWitnessProgram(e.to_string()))?;
        let encoded = encode_segwit(&params.bech32_hrp, version, &program)?;

        Ok(Address {
            payload: Payload::WitnessProgram(witness_program),
            params: params.clone(),
            encoded,
        })
    }

    fn from_pubkey_hash(hash: PubkeyHash, params: &ChainParams) -> Address {
        Address {
            encoded: base58check_encode(&prefixed(params.p2pkh_prefix, hash.as_byte_array())),
            payload: Payload::PubKeyHash(hash),
            params: params.clone(),
        }
    }

    fn from_script_hash(hash: ScriptHash, params: &ChainParams) -> Address {
        Address {
            encoded: base58check_encode(&prefixed(params.p2sh_prefix, hash.as_byte_array())),
            payload: Payload::ScriptHash(hash),
            params: params.clone(),
        }
    }

    /// Pay-to-pubkey-hash address of `pubkey`, honouring its compression flag
    pub fn p2pkh(pubkey: &PublicKey, params: &ChainParams) -> Address {
        Self::from_pubkey_hash(PubkeyHash::hash(&pubkey.to_bytes()), params)
    }

    /// Pay-to-script-hash address of `script`
    pub fn p2sh(script: &Script, params: &ChainParams) -> Address {
        Self::from_script_hash(ScriptHash::hash(script.as_bytes()), params)
    }

    /// Pay-to-witness-pubkey-hash nested in pay-to-script-hash.
    ///
    /// The key hash becomes the witness program `0x00 0x14 <hash160>`,
    /// and those script bytes are hashed again into the script-hash address.
    pub fn p2sh_p2wpkh(pubkey_bytes: &[u8], params: &ChainParams) -> Address {
        let witness_script = ScriptBuf::new_p2wpkh(&WPubkeyHash::hash(pubkey_bytes));
        Self::p2sh(&witness_script, params)
    }

    /// Extract the address a locking script pays to.
    ///
    /// Bare pay-to-pubkey scripts map onto the P2PKH address of their key,
    /// which is what key stores index them by.
    pub fn from_script(script: &Script, params: &ChainParams) -> Option<Address> {
        let bytes = script.as_bytes();

        if script.is_p2pkh() {
            let hash = PubkeyHash::from_slice(&bytes[3..23]).ok()?;
            Some(Self::from_pubkey_hash(hash, params))
        } else if script.is_p2sh() {
            let hash = ScriptHash::from_slice(&bytes[2..22]).ok()?;
            Some(Self::from_script_hash(hash, params))
        } else if script.is_p2pk() {
            let key = PublicKey::from_slice(&bytes[1..bytes.len() - 1]).ok()?;
            Some(Self::p2pkh(&key, params))
        } else if script.is_witness_program() {
            // OP_0, or OP_1..OP_16 encoded as 0x51..0x60
            let version = match bytes[0] {
                0x00 => 0,
                op => op - 0x50,
            };
            Self::new_witness_program(version, bytes[2..].to_vec(), params).ok()
        } else {
            None
        }
    }

    pub fn kind(&self) -> AddressKind {
        match self.payload {
            Payload::PubKeyHash(_) => AddressKind::PubKeyHash,
            Payload::ScriptHash(_) => AddressKind::ScriptHash,
            Payload::WitnessProgram(_) => AddressKind::WitnessProgram,
        }
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    /// Human readable form for this address's network
    pub fn encode(&self) -> String {
        self.encoded.clone()
    }

    /// Locking script paying to this address
    pub fn script_pubkey(&self) -> ScriptBuf {
        match &self.payload {
            Payload::PubKeyHash(hash) => ScriptBuf::new_p2pkh(hash),
            Payload::ScriptHash(hash) => ScriptBuf::new_p2sh(hash),
            Payload::WitnessProgram(program) => ScriptBuf::new_witness_program(program),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded)
    }
}

fn prefixed(prefix: u8, hash: &[u8; 20]) -> [u8; 21] {
    let mut out = [0u8; 21];
    out[0] = prefix;
    out[1..].copy_from_slice(hash);
    out
}

fn encode_segwit(hrp: &str, version: u8, program: &[u8]) -> Result<String, AddressError> {
    let variant = if version == 0 { Variant::Bech32 } else { Variant::Bech32m };
    let version =
        bech32::u5::try_from_u8(version).map_err(|e| AddressError::Bech32(e.to_string()))?;

    let mut data = vec![version];
    data.extend(program.to_base32());
    bech32::encode(hrp, data, variant).map_err(|e| AddressError::Bech32(e.to_string()))
}
