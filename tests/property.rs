use base64::{engine::general_purpose::STANDARD, Engine as _};
use proptest::prelude::*;
use secp256k1::{Secp256k1, SecretKey};

use flosig::message_signer::{
    recover_message_pubkey, recovery_id, sign_message, sign_message_p2sh_p2wpkh, verify_message, HeaderClass,
};
use flosig::tx::{create_unsigned_tx, MAX_METADATA_LEN};
use flosig::types::{Chain, FLORINCOIN};
use flosig::{Address, FlosigError, Wif};

fn any_secret_key() -> impl Strategy<Value = SecretKey> {
    prop::array::uniform32(any::<u8>()).prop_filter_map("valid secp256k1 scalar", |bytes| {
        SecretKey::from_slice(&bytes).ok()
    })
}

fn any_chain() -> impl Strategy<Value = Chain> {
    prop::sample::select(Chain::all().to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn signed_messages_verify(
        secret in any_secret_key(),
        message in ".*",
        compressed in any::<bool>(),
        chain in any_chain(),
    ) {
        let params = chain.params();
        let coin = &*params.message_coin_name;
        let wif = Wif::new(secret, compressed, params);
        let address = wif.p2pkh_address(params).encode();

        let sig = sign_message(&message, coin, &secret, compressed).unwrap();
        prop_assert_eq!(verify_message(&address, &sig, &message, coin, params), Ok(true));

        let altered = format!("{}!", message);
        prop_assert_eq!(verify_message(&address, &sig, &altered, coin, params), Ok(false));

        let recovered = recover_message_pubkey(&sig, &message, coin).unwrap();
        prop_assert_eq!(recovered, wif.public_key());
    }

    #[test]
    fn wrapped_witness_messages_verify(secret in any_secret_key(), message in ".*") {
        let secp = Secp256k1::new();
        let address = Address::p2sh_p2wpkh(&secret.public_key(&secp).serialize(), &FLORINCOIN).encode();
        let sig = sign_message_p2sh_p2wpkh(&message, "Florincoin", &secret).unwrap();
        prop_assert_eq!(verify_message(&address, &sig, &message, "Florincoin", &FLORINCOIN), Ok(true));
    }

    #[test]
    fn header_byte_decides_the_outcome(secret in any_secret_key(), header in any::<u8>()) {
        let wif = Wif::new(secret, true, &FLORINCOIN);
        let address = wif.p2pkh_address(&FLORINCOIN).encode();
        let sig = sign_message("header", "Florincoin", &secret, true).unwrap();

        let mut bytes = STANDARD.decode(&sig).unwrap();
        let original = bytes[0];
        bytes[0] = header;
        let result = verify_message(&address, &STANDARD.encode(&bytes), "header", "Florincoin", &FLORINCOIN);

        match HeaderClass::from_header(header) {
            HeaderClass::Invalid => {
                prop_assert_eq!(result, Err(FlosigError::InvalidSignaturePrefix(header)));
                prop_assert_eq!(recovery_id(header), None);
            }
            HeaderClass::WitnessDirectUnsupported => {
                prop_assert!(
                    matches!(result, Err(FlosigError::UnsupportedAddressType(_))),
                    "expected UnsupportedAddressType, got {:?}",
                    result
                );
            }
            HeaderClass::WitnessWrapped => {
                prop_assert!(
                    matches!(result, Err(FlosigError::AddressTypeMismatch { .. })),
                    "expected AddressTypeMismatch, got {:?}",
                    result
                );
            }
            HeaderClass::PubKeyHash { .. } => {
                prop_assert_eq!(result, Ok(header == original));
            }
        }
    }

    #[test]
    fn metadata_floors_version(metadata in prop::collection::vec(any::<u8>(), 0..=MAX_METADATA_LEN)) {
        let tx = create_unsigned_tx(&[], &[], &metadata).unwrap();
        if metadata.is_empty() {
            prop_assert_eq!(tx.version(), 1);
        } else {
            prop_assert_eq!(tx.version(), 2);
            prop_assert!(tx.serialize().ends_with(&metadata));
        }
    }
}
