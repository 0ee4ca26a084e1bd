//! Transaction base records
//!
//! The minimal UTXO-model records the signing core operates on: outpoints,
//! outputs carrying locking scripts, the base input record, and the
//! transaction context the sighash digest commits to.

use serde::{Deserialize, Serialize};

use crate::script::Script;

/// Current transaction version
pub const TX_VERSION: u32 = 2;

/// Sequence number that disables locktime
pub const SEQUENCE_FINAL: u32 = 0xFFFFFFFF;

/// Reference to a previous transaction output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutPoint {
    /// Transaction ID of the previous transaction (hex, 32 bytes)
    pub txid: String,
    /// Index of the output in the previous transaction
    pub vout: u32,
}

impl OutPoint {
    pub fn new(txid: String, vout: u32) -> Self {
        Self { txid, vout }
    }
}

/// Transaction output: an amount locked by a script
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TxOutput {
    /// Amount of coins
    pub amount: u64,
    /// Locking script that must be satisfied to spend this output
    pub script: Script,
}

/// Base transaction input record
///
/// Carries the previous-output reference, a copy of the spent output
/// (needed because the signature digest commits to its amount), the
/// unlocking script, and the sequence number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TxInput {
    /// The output being spent
    pub outpoint: OutPoint,
    /// The spent output itself (script and amount context for signing)
    pub previous_output: TxOutput,
    /// Script satisfying the previous output's locking script
    pub unlocking_script: Script,
    /// Sequence number for RBF and locktime
    #[serde(default = "default_sequence")]
    pub sequence: u32,
}

fn default_sequence() -> u32 {
    SEQUENCE_FINAL
}

impl TxInput {
    /// Create an unsigned input spending the given output
    pub fn new(outpoint: OutPoint, previous_output: TxOutput) -> Self {
        Self {
            outpoint,
            previous_output,
            unlocking_script: Script::new(),
            sequence: SEQUENCE_FINAL,
        }
    }
}

/// Capability interface over a base input record
///
/// Signing code depends on these behaviors only, not on the concrete
/// input variant that implements them.
pub trait SpendableInput {
    /// Amount of the output being spent
    fn previous_output_amount(&self) -> u64;
    /// Locking script of the output being spent
    fn previous_output_script(&self) -> &Script;
    /// Install a freshly reconstructed unlocking script
    fn set_unlocking_script(&mut self, script: Script);
}

impl SpendableInput for TxInput {
    fn previous_output_amount(&self) -> u64 {
        self.previous_output.amount
    }

    fn previous_output_script(&self) -> &Script {
        &self.previous_output.script
    }

    fn set_unlocking_script(&mut self, script: Script) {
        self.unlocking_script = script;
    }
}

/// A transaction: the signing context for its inputs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction version (for future upgrades)
    #[serde(default = "default_version")]
    pub version: u32,
    /// Transaction inputs
    pub inputs: Vec<TxInput>,
    /// Transaction outputs
    pub outputs: Vec<TxOutput>,
    /// Locktime: block height or timestamp when tx becomes valid
    #[serde(default)]
    pub locktime: u32,
}

fn default_version() -> u32 {
    TX_VERSION
}

impl Transaction {
    /// Create a new transaction
    pub fn new(inputs: Vec<TxInput>, outputs: Vec<TxOutput>) -> Self {
        Self {
            version: TX_VERSION,
            inputs,
            outputs,
            locktime: 0,
        }
    }

    /// Total amount across all outputs
    pub fn total_output(&self) -> u64 {
        self.outputs.iter().map(|o| o.amount).sum()
    }
}
