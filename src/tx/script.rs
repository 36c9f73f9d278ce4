//! Signature scripts for legacy outputs
//!
//! Builds and checks unlocking scripts for P2PKH and bare P2PK outputs.

use bitcoin::ecdsa::Signature;
use bitcoin::hashes::Hash;
use bitcoin::script::{Builder, Instruction, PushBytesBuf};
use bitcoin::sighash::EcdsaSighashType;
use bitcoin::{PublicKey, Script, ScriptBuf};
use secp256k1::{Message, Secp256k1};

use super::builder::{MetaTransaction, Vin};
use super::sighash::legacy_sighash;
use crate::error::{FlosigError, FlosigResult};
use crate::wallet::Wif;

fn pubkey_of_p2pk(script: &Script) -> Option<PublicKey> {
    let bytes = script.as_bytes();
    PublicKey::from_slice(&bytes[1..bytes.len() - 1]).ok()
}

/// Sign input `input_index` and return its unlocking script.
///
/// `prev_script` is the locking script of the output being spent. The key
/// must be the one that script commits to.
pub fn signature_script(
    tx: &MetaTransaction,
    input_index: usize,
    prev_script: &Script,
    sighash_type: EcdsaSighashType,
    key: &Wif,
) -> FlosigResult<ScriptBuf> {
    let pubkey = key.public_key();

    let is_p2pkh = prev_script.is_p2pkh();
    if is_p2pkh {
        if ScriptBuf::new_p2pkh(&pubkey.pubkey_hash()) != *prev_script {
            return Err(FlosigError::ScriptConstructionFailed(
                "key does not match the pubkey hash of the previous output".to_string(),
            ));
        }
    } else if prev_script.is_p2pk() {
        if pubkey_of_p2pk(prev_script).map(|pk| pk.inner) != Some(pubkey.inner) {
            return Err(FlosigError::ScriptConstructionFailed(
                "key does not match the previous output".to_string(),
            ));
        }
    } else {
        return Err(FlosigError::ScriptConstructionFailed(format!(
            "cannot sign previous output script {}",
            prev_script.to_hex_string()
        )));
    }

    let sighash = legacy_sighash(tx, input_index, prev_script, sighash_type)?;
    let secp = Secp256k1::signing_only();
    let msg = Message::from_digest(sighash.to_byte_array());
    let signature = Signature {
        signature: secp.sign_ecdsa(&msg, &key.secret_key),
        sighash_type,
    };

    let sig_push = PushBytesBuf::try_from(signature.serialize().to_vec())
        .map_err(|e| FlosigError::ScriptConstructionFailed(e.to_string()))?;

    let builder = Builder::new().push_slice(sig_push);
    let script = if is_p2pkh {
        builder.push_key(&pubkey).into_script()
    } else {
        builder.into_script()
    };
    Ok(script)
}

fn pushes(script: &Script) -> FlosigResult<Vec<Vec<u8>>> {
    script
        .instructions()
        .map(|ins| match ins {
            Ok(Instruction::PushBytes(bytes)) => Ok(bytes.as_bytes().to_vec()),
            Ok(Instruction::Op(op)) => Err(FlosigError::VerificationFailed(format!(
                "unexpected opcode {} in signature script",
                op
            ))),
            Err(e) => Err(FlosigError::VerificationFailed(e.to_string())),
        })
        .collect()
}

/// Check that input `input_index` validly spends an output locked by `prev_script`.
pub fn verify_input(tx: &MetaTransaction, input_index: usize, prev_script: &Script) -> FlosigResult<()> {
    let input = tx.tx.input.get(input_index).ok_or(FlosigError::InputIndexOutOfRange {
        index: input_index,
        count: tx.tx.input.len(),
    })?;
    let items = pushes(&input.script_sig)?;

    let (sig_bytes, pubkey) = if prev_script.is_p2pkh() {
        let [sig, key] = items.as_slice() else {
            return Err(FlosigError::VerificationFailed(format!(
                "P2PKH spend needs 2 pushes, found {}",
                items.len()
            )));
        };
        let pubkey = PublicKey::from_slice(key)
            .map_err(|e| FlosigError::VerificationFailed(format!("bad public key: {}", e)))?;
        if ScriptBuf::new_p2pkh(&pubkey.pubkey_hash()) != *prev_script {
            return Err(FlosigError::VerificationFailed(
                "public key does not hash to the previous output".to_string(),
            ));
        }
        (sig, pubkey)
    } else if prev_script.is_p2pk() {
        let [sig] = items.as_slice() else {
            return Err(FlosigError::VerificationFailed(format!(
                "P2PK spend needs 1 push, found {}",
                items.len()
            )));
        };
        let pubkey = pubkey_of_p2pk(prev_script)
            .ok_or_else(|| FlosigError::VerificationFailed("bad P2PK script".to_string()))?;
        (sig, pubkey)
    } else {
        return Err(FlosigError::VerificationFailed(format!(
            "unsupported previous output script {}",
            prev_script.to_hex_string()
        )));
    };

    let signature = Signature::from_slice(sig_bytes)
        .map_err(|e| FlosigError::VerificationFailed(format!("bad signature encoding: {}", e)))?;
    let sighash = legacy_sighash(tx, input_index, prev_script, signature.sighash_type)?;

    let secp = Secp256k1::verification_only();
    secp.verify_ecdsa(
        &Message::from_digest(sighash.to_byte_array()),
        &signature.signature,
        &pubkey.inner,
    )
    .map_err(|e| FlosigError::VerificationFailed(format!("input {}: {}", input_index, e)))
}

/// Check every input against the output it spends.
pub fn verify_tx(tx: &MetaTransaction, vins: &[Vin]) -> FlosigResult<()> {
    if vins.len() != tx.tx.input.len() {
        return Err(FlosigError::InputCountMismatch {
            inputs: tx.tx.input.len(),
            vins: vins.len(),
        });
    }
    for (index, vin) in vins.iter().enumerate() {
        if tx.tx.input[index].previous_output != vin.outpoint() {
            return Err(FlosigError::VerificationFailed(format!(
                "input {} does not spend {}",
                index,
                vin.outpoint()
            )));
        }
        verify_input(tx, index, &vin.prev_script)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use crate::tx::builder::{create_unsigned_tx, Vout};
    use crate::types::FLORINCOIN;
    use bitcoin::{Amount, Txid};
    use secp256k1::SecretKey;

    fn key(byte: u8, compressed: bool) -> Wif {
        Wif::new(SecretKey::from_slice(&[byte; 32]).unwrap(), compressed, &FLORINCOIN)
    }

    fn spend(prev_script: ScriptBuf) -> (MetaTransaction, Vin) {
        let vin = Vin::new(Txid::from_byte_array([7; 32]), 1, prev_script);
        let out = Vout::new(key(9, true).p2pkh_address(&FLORINCOIN), Amount::from_sat(900));
        (create_unsigned_tx(&[vin.clone()], &[out], b"memo").unwrap(), vin)
    }

    #[test]
    fn test_p2pkh_sign_and_verify() {
        for compressed in [true, false] {
            let wif = key(1, compressed);
            let (mut tx, vin) = spend(wif.p2pkh_address(&FLORINCOIN).script_pubkey());
            let script =
                signature_script(&tx, 0, &vin.prev_script, EcdsaSighashType::All, &wif).unwrap();
            assert_eq!(script.instructions().count(), 2);
            tx.tx.input[0].script_sig = script;
            verify_tx(&tx, &[vin.clone()]).unwrap();

            tx.metadata = b"tampered".to_vec();
            assert!(matches!(
                verify_tx(&tx, &[vin]),
                Err(FlosigError::VerificationFailed(_))
            ));
        }
    }

    #[test]
    fn test_p2pk_sign_and_verify() {
        let wif = key(2, true);
        let prev = Builder::new()
            .push_key(&wif.public_key())
            .push_opcode(bitcoin::opcodes::all::OP_CHECKSIG)
            .into_script();
        let (mut tx, vin) = spend(prev);
        let script = signature_script(&tx, 0, &vin.prev_script, EcdsaSighashType::All, &wif).unwrap();
        assert_eq!(script.instructions().count(), 1);
        tx.tx.input[0].script_sig = script;
        verify_input(&tx, 0, &vin.prev_script).unwrap();
    }

    #[test]
    fn test_wrong_key_rejected() {
        let owner = key(1, true);
        let (tx, vin) = spend(owner.p2pkh_address(&FLORINCOIN).script_pubkey());
        // same secret, other serialization: different pubkey hash
        let other = key(1, false);
        assert!(matches!(
            signature_script(&tx, 0, &vin.prev_script, EcdsaSighashType::All, &other),
            Err(FlosigError::ScriptConstructionFailed(_))
        ));
    }

    #[test]
    fn test_unsupported_script() {
        let wif = key(3, true);
        let prev = Address::p2sh_p2wpkh(&wif.public_key().to_bytes(), &FLORINCOIN).script_pubkey();
        let (tx, vin) = spend(prev);
        assert!(matches!(
            signature_script(&tx, 0, &vin.prev_script, EcdsaSighashType::All, &wif),
            Err(FlosigError::ScriptConstructionFailed(_))
        ));
    }

    #[test]
    fn test_unsigned_input_fails_verification() {
        let wif = key(4, true);
        let (tx, vin) = spend(wif.p2pkh_address(&FLORINCOIN).script_pubkey());
        assert!(matches!(
            verify_input(&tx, 0, &vin.prev_script),
            Err(FlosigError::VerificationFailed(_))
        ));
    }
}
