//! Transaction Signer
//!
//! Signs every input of a transaction with keys looked up by the address of
//! the output being spent. Signing is all-or-nothing: the first failure is
//! returned and the partially signed transaction is dropped.

use std::collections::HashMap;

use bitcoin::sighash::EcdsaSighashType;
use bitcoin::{Script, ScriptBuf};

use super::builder::{create_unsigned_tx, MetaTransaction, Vin, Vout};
use super::script::signature_script;
use crate::address::Address;
use crate::error::{FlosigError, FlosigResult};
use crate::types::ChainParams;
use crate::wallet::Wif;
use crate::{log_debug, log_info, log_warn};

/// Private key lookup by address
pub trait KeySource {
    fn key_for(&self, address: &Address) -> Option<Wif>;
}

/// Keys indexed by encoded address
pub type KeyMap = HashMap<String, Wif>;

impl KeySource for KeyMap {
    fn key_for(&self, address: &Address) -> Option<Wif> {
        self.get(&address.encode()).copied()
    }
}

/// Adapter for lookup closures
pub struct KeyFn<F>(pub F);

impl<F> KeySource for KeyFn<F>
where
    F: Fn(&Address) -> Option<Wif>,
{
    fn key_for(&self, address: &Address) -> Option<Wif> {
        (self.0)(address)
    }
}

/// Index keys by the P2PKH address they control on `params`.
pub fn key_map_from_wifs<'a, I>(wifs: I, params: &ChainParams) -> FlosigResult<KeyMap>
where
    I: IntoIterator<Item = &'a str>,
{
    wifs.into_iter()
        .map(|s| {
            let wif = Wif::decode(s)?;
            Ok((wif.p2pkh_address(params).encode(), wif))
        })
        .collect()
}

/// Unlocking script for input `input_index`, using the key of the address
/// `prev_script` pays to.
pub fn sign_tx_output<K: KeySource + ?Sized>(
    params: &ChainParams,
    tx: &MetaTransaction,
    input_index: usize,
    prev_script: &Script,
    sighash_type: EcdsaSighashType,
    keys: &K,
) -> FlosigResult<ScriptBuf> {
    let address = Address::from_script(prev_script, params).ok_or_else(|| {
        FlosigError::ScriptConstructionFailed(format!(
            "no address for previous output script {}",
            prev_script.to_hex_string()
        ))
    })?;

    let Some(key) = keys.key_for(&address) else {
        log_warn!("tx", "No key for input", input = input_index, address = address);
        return Err(FlosigError::NoKeyForAddress(address.encode()));
    };

    signature_script(tx, input_index, prev_script, sighash_type, &key)
}

/// Sign every input of `unsigned`, `vins[i]` describing the output input `i` spends.
pub fn sign_tx<K: KeySource + ?Sized>(
    keys: &K,
    vins: &[Vin],
    params: &ChainParams,
    unsigned: MetaTransaction,
) -> FlosigResult<MetaTransaction> {
    if vins.len() != unsigned.tx.input.len() {
        return Err(FlosigError::InputCountMismatch {
            inputs: unsigned.tx.input.len(),
            vins: vins.len(),
        });
    }

    for (index, (input, vin)) in unsigned.tx.input.iter().zip(vins).enumerate() {
        if input.previous_output != vin.outpoint() {
            return Err(FlosigError::InputOutpointMismatch {
                index,
                expected: vin.outpoint().to_string(),
                actual: input.previous_output.to_string(),
            });
        }
    }

    let mut tx = unsigned;
    for (index, vin) in vins.iter().enumerate() {
        let script = sign_tx_output(params, &tx, index, &vin.prev_script, EcdsaSighashType::All, keys)?;
        tx.tx.input[index].script_sig = script;
        log_debug!("tx", "Signed input", input = index, outpoint = vin.outpoint());
    }

    log_info!("tx", "Signed transaction", inputs = vins.len(), txid = tx.txid());
    Ok(tx)
}

/// [`create_unsigned_tx`] followed by [`sign_tx`].
pub fn create_and_sign_tx<K: KeySource + ?Sized>(
    vins: &[Vin],
    vouts: &[Vout],
    metadata: &[u8],
    keys: &K,
    params: &ChainParams,
) -> FlosigResult<MetaTransaction> {
    let unsigned = create_unsigned_tx(vins, vouts, metadata)?;
    sign_tx(keys, vins, params, unsigned)
}
