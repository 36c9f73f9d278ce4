//! flosig command line tool
//!
//! Every command prints one JSON `ApiResponse` document on stdout. Failures
//! exit with a non-zero status.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use flosig::address::{Address, AddressKind};
use flosig::message_signer::{sign_message, sign_message_p2sh_p2wpkh, verify_message};
use flosig::types::{ApiResponse, Chain, ChainParams};
use flosig::utils::logging::enable_debug;
use flosig::wallet::Wif;
use flosig::{log_error, log_warn, FlosigError};

/// Sign and verify Bitcoin-family messages.
#[derive(Parser, Debug)]
#[command(name = "flosig", version, about, long_about = None)]
struct Cli {
    /// Load chain parameters from a JSON file; overrides --chain.
    #[arg(long, global = true)]
    params_file: Option<PathBuf>,

    /// Turn on debug output.
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a signed message against an address.
    Verify {
        #[arg(long, default_value = "florincoin")]
        chain: Chain,
        #[arg(long)]
        address: String,
        /// Base64 compact signature
        #[arg(long)]
        signature: String,
        #[arg(long)]
        message: String,
        /// Coin name in the signed preimage; defaults to the chain's.
        #[arg(long)]
        coin_name: Option<String>,
    },
    /// Sign a message with a WIF key.
    Sign {
        #[arg(long)]
        wif: String,
        #[arg(long)]
        message: String,
        #[arg(long)]
        chain: Option<Chain>,
        #[arg(long)]
        coin_name: Option<String>,
        /// Sign for the P2SH-P2WPKH address of the key.
        #[arg(long)]
        segwit: bool,
    },
    /// Print the address controlled by a WIF key.
    Address {
        #[arg(long)]
        wif: String,
        #[arg(long, default_value = "florincoin")]
        chain: Chain,
        #[arg(long)]
        segwit: bool,
    },
    /// List the built-in chains.
    Chains,
}

#[derive(Debug, Serialize)]
struct VerifyOutput {
    address: String,
    valid: bool,
}

#[derive(Debug, Serialize)]
struct SignOutput {
    signature: String,
    coin_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<String>,
}

#[derive(Debug, Serialize)]
struct AddressOutput {
    address: String,
    kind: AddressKind,
    chain: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.debug {
        enable_debug();
    }

    match run(&cli) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(err) => {
            log_error!("cli", "Command failed", error = format!("{:#}", err));
            let flosig_err = match err.downcast::<FlosigError>() {
                Ok(e) => e,
                Err(other) => FlosigError::InvalidConfig(format!("{:#}", other)),
            };
            println!("{}", ApiResponse::<()>::err(&flosig_err).to_json());
            ExitCode::FAILURE
        }
    }
}

fn resolve_params(cli: &Cli, chain: Option<Chain>) -> Result<Option<ChainParams>> {
    if let Some(path) = &cli.params_file {
        let json = fs::read_to_string(path)
            .with_context(|| format!("reading chain parameters from {}", path.display()))?;
        return Ok(Some(ChainParams::from_json(&json)?));
    }
    Ok(chain.map(|c| c.params().clone()))
}

fn run(cli: &Cli) -> Result<String> {
    match &cli.command {
        Command::Verify {
            chain,
            address,
            signature,
            message,
            coin_name,
        } => {
            let params = resolve_params(cli, Some(*chain))?.unwrap_or_else(|| chain.params().clone());
            let coin = coin_name.as_deref().unwrap_or(&*params.message_coin_name);
            let valid = verify_message(address, signature, message, coin, &params)?;
            Ok(ApiResponse::ok(VerifyOutput {
                address: address.clone(),
                valid,
            })
            .to_json())
        }
        Command::Sign {
            wif,
            message,
            chain,
            coin_name,
            segwit,
        } => {
            let params = resolve_params(cli, *chain)?;
            let coin = match (coin_name, &params) {
                (Some(name), _) => name.clone(),
                (None, Some(p)) => p.message_coin_name.to_string(),
                (None, None) => {
                    return Err(FlosigError::InvalidConfig(
                        "either --chain, --params-file or --coin-name is required".to_string(),
                    )
                    .into())
                }
            };

            let key = Wif::decode(wif)?;
            let signature = if *segwit {
                sign_message_p2sh_p2wpkh(message, &coin, &key.secret_key)?
            } else {
                sign_message(message, &coin, &key.secret_key, key.compressed)?
            };
            let address = params.as_ref().map(|p| signing_address(&key, p, *segwit).encode());

            Ok(ApiResponse::ok(SignOutput {
                signature,
                coin_name: coin,
                address,
            })
            .to_json())
        }
        Command::Address { wif, chain, segwit } => {
            let params = resolve_params(cli, Some(*chain))?.unwrap_or_else(|| chain.params().clone());
            let key = Wif::decode(wif)?;
            if !key.is_for_chain(&params) {
                log_warn!("cli", "WIF version byte does not match chain", chain = params.name);
            }
            let address = signing_address(&key, &params, *segwit);
            Ok(ApiResponse::ok(AddressOutput {
                address: address.encode(),
                kind: address.kind(),
                chain: params.name.to_string(),
            })
            .to_json())
        }
        Command::Chains => {
            let chains: Vec<&ChainParams> = Chain::all().iter().map(|c| c.params()).collect();
            Ok(ApiResponse::ok(chains).to_json())
        }
    }
}

fn signing_address(key: &Wif, params: &ChainParams, segwit: bool) -> Address {
    if segwit {
        Address::p2sh_p2wpkh(&key.public_key().inner.serialize(), params)
    } else {
        key.p2pkh_address(params)
    }
}
