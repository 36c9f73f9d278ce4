//! Legacy signature hashing over the metadata-aware serialization
//!
//! Metadata is committed to by every signature. Without metadata the digest
//! is the ordinary pre-segwit one.

use bitcoin::hashes::{sha256d, Hash};
use bitcoin::sighash::{EcdsaSighashType, LegacySighash};
use bitcoin::{Script, ScriptBuf, Sequence, TxIn, TxOut, Witness};

use super::builder::MetaTransaction;
use crate::error::{FlosigError, FlosigResult};

/// Digest signed by SIGHASH_SINGLE when the input has no matching output
const SIGHASH_SINGLE_BUG: [u8; 32] = {
    let mut one = [0u8; 32];
    one[0] = 1;
    one
};

fn split_anyonecanpay(ty: EcdsaSighashType) -> (EcdsaSighashType, bool) {
    match ty {
        EcdsaSighashType::AllPlusAnyoneCanPay => (EcdsaSighashType::All, true),
        EcdsaSighashType::NonePlusAnyoneCanPay => (EcdsaSighashType::None, true),
        EcdsaSighashType::SinglePlusAnyoneCanPay => (EcdsaSighashType::Single, true),
        base => (base, false),
    }
}

/// Signature hash for input `input_index` spending an output locked by `script_code`.
pub fn legacy_sighash(
    tx: &MetaTransaction,
    input_index: usize,
    script_code: &Script,
    sighash_type: EcdsaSighashType,
) -> FlosigResult<LegacySighash> {
    let inputs = &tx.tx.input;
    if input_index >= inputs.len() {
        return Err(FlosigError::InputIndexOutOfRange {
            index: input_index,
            count: inputs.len(),
        });
    }

    let (base, anyone_can_pay) = split_anyonecanpay(sighash_type);

    if base == EcdsaSighashType::Single && input_index >= tx.tx.output.len() {
        return Ok(LegacySighash::from_byte_array(SIGHASH_SINGLE_BUG));
    }

    let mut copy = tx.clone();

    copy.tx.input = if anyone_can_pay {
        let signed = &inputs[input_index];
        vec![TxIn {
            previous_output: signed.previous_output,
            script_sig: script_code.to_owned(),
            sequence: signed.sequence,
            witness: Witness::default(),
        }]
    } else {
        inputs
            .iter()
            .enumerate()
            .map(|(n, input)| {
                let own = n == input_index;
                TxIn {
                    previous_output: input.previous_output,
                    script_sig: if own { script_code.to_owned() } else { ScriptBuf::new() },
                    sequence: if !own && base != EcdsaSighashType::All {
                        Sequence::ZERO
                    } else {
                        input.sequence
                    },
                    witness: Witness::default(),
                }
            })
            .collect()
    };

    copy.tx.output = match base {
        EcdsaSighashType::None => Vec::new(),
        EcdsaSighashType::Single => tx
            .tx
            .output
            .iter()
            .take(input_index + 1)
            .enumerate()
            .map(|(n, out)| if n == input_index { out.clone() } else { TxOut::NULL })
            .collect(),
        _ => tx.tx.output.clone(),
    };

    let mut preimage = copy.serialize();
    preimage.extend_from_slice(&sighash_type.to_u32().to_le_bytes());

    Ok(LegacySighash::from_raw_hash(sha256d::Hash::hash(&preimage)))
}
