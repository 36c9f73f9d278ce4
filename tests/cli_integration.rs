use serde_json::Value;
use std::process::{Command, Output};

fn flosig(args: &[&str]) -> Output {
    let binary_path = assert_cmd::cargo::cargo_bin!("flosig");
    Command::new(binary_path)
        .args(args)
        .output()
        .expect("cli runs")
}

fn json(output: &Output) -> Value {
    let stdout = String::from_utf8(output.stdout.clone()).expect("stdout is utf8");
    serde_json::from_str(stdout.trim()).expect("stdout is valid json")
}

const FLO_WIF_SECRET: &str = "22a47fa09a223f2aa079edf85a7c2d4f8720ee63e502ee2869afab7de234b80c";

fn flo_wif() -> String {
    let secret = secp256k1::SecretKey::from_slice(&hex::decode(FLO_WIF_SECRET).unwrap()).unwrap();
    flosig::Wif::new(secret, true, &flosig::types::FLORINCOIN).encode()
}

#[test]
fn verify_reference_signature() {
    let output = flosig(&[
        "verify",
        "--chain",
        "flo",
        "--address",
        "FDxa2dUXPw592svsebdHfGRHxB46DKWVUy",
        "--signature",
        "IMjnGVBNW4kvoSITwijwYkrguszkyMQ08TBNu9wvRiVZB3f+L8Me1gkkK30LT9EO2xyMj0lFHORkSi/zM3cOTF0=",
        "--message",
        "Flo signed message test",
    ]);
    assert!(output.status.success(), "cli failed: {:?}", output);
    let body = json(&output);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["valid"], true);
}

#[test]
fn verify_bad_address_fails_with_code() {
    let output = flosig(&[
        "verify",
        "--address",
        "not-an-address",
        "--signature",
        "IMjn",
        "--message",
        "x",
    ]);
    assert!(!output.status.success());
    let body = json(&output);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "invalid_address_or_key");
}

#[test]
fn sign_then_verify() {
    let wif = flo_wif();
    let signed = flosig(&["sign", "--chain", "florincoin", "--wif", &wif, "--message", "hello"]);
    assert!(signed.status.success(), "sign failed: {:?}", signed);
    let body = json(&signed);
    let signature = body["data"]["signature"].as_str().unwrap().to_string();
    let address = body["data"]["address"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["coin_name"], "Florincoin");

    let verified = flosig(&[
        "verify", "--address", &address, "--signature", &signature, "--message", "hello",
    ]);
    assert!(verified.status.success());
    assert_eq!(json(&verified)["data"]["valid"], true);
}

#[test]
fn segwit_address_and_signature() {
    let wif = flo_wif();
    let address = flosig(&["address", "--wif", &wif, "--segwit"]);
    assert!(address.status.success());
    let body = json(&address);
    assert_eq!(body["data"]["kind"], "script-hash");
    let address = body["data"]["address"].as_str().unwrap().to_string();

    let signed = flosig(&["sign", "--chain", "flo", "--wif", &wif, "--message", "m", "--segwit"]);
    let sig_body = json(&signed);
    assert_eq!(sig_body["data"]["address"].as_str().unwrap(), address);

    let verified = flosig(&[
        "verify",
        "--address",
        &address,
        "--signature",
        sig_body["data"]["signature"].as_str().unwrap(),
        "--message",
        "m",
    ]);
    assert_eq!(json(&verified)["data"]["valid"], true);
}

#[test]
fn sign_requires_a_coin_name() {
    let output = flosig(&["sign", "--wif", &flo_wif(), "--message", "m"]);
    assert!(!output.status.success());
    assert_eq!(json(&output)["error"]["code"], "invalid_config");
}

#[test]
fn chains_lists_builtin_params() {
    let output = flosig(&["chains"]);
    assert!(output.status.success());
    let body = json(&output);
    let chains = body["data"].as_array().unwrap();
    assert_eq!(chains.len(), 5);
    assert_eq!(chains[0]["name"], "florincoin");
    assert_eq!(chains[0]["p2pkh_prefix"], 0x23);
}

#[test]
fn params_file_overrides_chain() {
    let dir = std::env::temp_dir().join(format!("flosig-cli-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("btc.json");
    std::fs::write(&path, serde_json::to_string(&flosig::types::BITCOIN).unwrap()).unwrap();

    let output = flosig(&[
        "--params-file",
        path.to_str().unwrap(),
        "verify",
        "--address",
        "1PVdqQygncV32a5YMWUmfEz2h3CqdHfXJe",
        "--signature",
        "G25OicB3g46g9kZ0dGOI8+d9ZTlGrH8yKbCa5Xcd10UHcXZ0NRncgwCsKKGyXkU2+BLy0aq3013a0dTFfWf6mDQ=",
        "--message",
        "Bitcoin signed message test",
    ]);
    std::fs::remove_dir_all(&dir).ok();

    assert!(output.status.success(), "cli failed: {:?}", output);
    assert_eq!(json(&output)["data"]["valid"], true);
}
