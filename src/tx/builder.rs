//! Transaction Builder
//!
//! Assembles unsigned spends with an optional metadata payload. Metadata is
//! serialized after the lock time as a varstring, present whenever the
//! transaction version is 2 or higher:
//!
//! `version || inputs || outputs || lock_time || varstring(metadata)`

use bitcoin::absolute::LockTime;
use bitcoin::consensus::encode::serialize;
use bitcoin::hashes::{sha256d, Hash};
use bitcoin::transaction::Version;
use bitcoin::{Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid, Witness};

use crate::address::Address;
use crate::error::{FlosigError, FlosigResult};
use crate::log_debug;
use crate::types::ChainParams;

/// Version of a transaction without metadata
pub const TX_VERSION: i32 = 1;

/// Lowest version that carries metadata on the wire
pub const METADATA_TX_VERSION: i32 = 2;

pub const MAX_METADATA_LEN: usize = 1040;

/// A previous output being spent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vin {
    pub txid: Txid,
    pub vout: u32,
    /// Locking script of the output being spent
    pub prev_script: ScriptBuf,
}

impl Vin {
    pub fn new(txid: Txid, vout: u32, prev_script: ScriptBuf) -> Self {
        Self { txid, vout, prev_script }
    }

    pub fn outpoint(&self) -> OutPoint {
        OutPoint::new(self.txid, self.vout)
    }
}

/// A payment to create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vout {
    pub address: Address,
    pub amount: Amount,
}

impl Vout {
    pub fn new(address: Address, amount: Amount) -> Self {
        Self { address, amount }
    }

    /// Decode `address` under `params`; `amount` is in the smallest unit.
    pub fn parse(address: &str, amount: u64, params: &ChainParams) -> FlosigResult<Vout> {
        let address = Address::decode(address, params)
            .map_err(|e| FlosigError::InvalidAddressOrKey(e.to_string()))?;
        Ok(Vout::new(address, Amount::from_sat(amount)))
    }

    fn to_txout(&self) -> TxOut {
        TxOut {
            value: self.amount,
            script_pubkey: self.address.script_pubkey(),
        }
    }
}

/// A transaction plus its trailing metadata payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaTransaction {
    pub tx: Transaction,
    pub metadata: Vec<u8>,
}

impl MetaTransaction {
    pub fn new(tx: Transaction) -> Self {
        Self { tx, metadata: Vec::new() }
    }

    pub fn version(&self) -> i32 {
        self.tx.version.0
    }

    pub fn carries_metadata(&self) -> bool {
        self.version() >= METADATA_TX_VERSION
    }

    /// Attach metadata, raising the version to 2 if it is lower.
    /// A higher version is left alone; empty metadata changes nothing.
    pub fn set_metadata(&mut self, metadata: &[u8]) -> FlosigResult<()> {
        if metadata.len() > MAX_METADATA_LEN {
            return Err(FlosigError::MetadataTooLarge {
                len: metadata.len(),
                max: MAX_METADATA_LEN,
            });
        }
        if metadata.is_empty() {
            return Ok(());
        }
        self.metadata = metadata.to_vec();
        if self.tx.version.0 < METADATA_TX_VERSION {
            self.tx.version = Version(METADATA_TX_VERSION);
        }
        Ok(())
    }

    /// Wire serialization
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = serialize(&self.tx.version);
        buf.extend_from_slice(&serialize(&self.tx.input));
        buf.extend_from_slice(&serialize(&self.tx.output));
        buf.extend_from_slice(&serialize(&self.tx.lock_time));
        if self.carries_metadata() {
            buf.extend_from_slice(&serialize(&self.metadata));
        }
        buf
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.serialize())
    }

    pub fn txid(&self) -> Txid {
        Txid::from_raw_hash(sha256d::Hash::hash(&self.serialize()))
    }
}

/// Build an unsigned version 1 transaction.
pub fn create_unsigned_tx(vins: &[Vin], vouts: &[Vout], metadata: &[u8]) -> FlosigResult<MetaTransaction> {
    create_unsigned_tx_with_version(TX_VERSION, vins, vouts, metadata)
}

pub fn create_unsigned_tx_with_version(
    version: i32,
    vins: &[Vin],
    vouts: &[Vout],
    metadata: &[u8],
) -> FlosigResult<MetaTransaction> {
    let input = vins
        .iter()
        .map(|vin| TxIn {
            previous_output: vin.outpoint(),
            script_sig: ScriptBuf::new(),
            sequence: Sequence::MAX,
            witness: Witness::default(),
        })
        .collect();
    let output = vouts.iter().map(Vout::to_txout).collect();

    let mut tx = MetaTransaction::new(Transaction {
        version: Version(version),
        lock_time: LockTime::ZERO,
        input,
        output,
    });
    tx.set_metadata(metadata)?;

    log_debug!(
        "tx",
        "Built unsigned transaction",
        inputs = vins.len(),
        outputs = vouts.len(),
        version = tx.version(),
        metadata_len = tx.metadata.len(),
    );
    Ok(tx)
}
