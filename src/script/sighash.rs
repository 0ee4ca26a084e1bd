//! Transaction signature digests (sighash)
//!
//! Computes the per-input digest that is actually signed. The preimage
//! commits to the script-code and the spent output's amount (BIP-143
//! style), so a signature is only valid for the exact policy and value
//! being spent.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::double_sha256;
use crate::script::Script;
use crate::tx::Transaction;

/// Sighash-related errors
#[derive(Error, Debug, Clone)]
pub enum SighashError {
    #[error("Input index {0} out of range")]
    InputIndexOutOfRange(usize),
    #[error("Invalid previous transaction id: {0}")]
    InvalidTxId(String),
}

/// Signature hash type determines what parts of the transaction are signed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum SigHashType {
    /// Sign all inputs and all outputs (default)
    All = 0x01,
    /// Sign all inputs but no outputs (blank check)
    None = 0x02,
    /// Sign all inputs and only the output with same index
    Single = 0x03,
    /// SIGHASH_ALL | SIGHASH_ANYONECANPAY
    AllAnyoneCanPay = 0x81,
    /// SIGHASH_NONE | SIGHASH_ANYONECANPAY
    NoneAnyoneCanPay = 0x82,
    /// SIGHASH_SINGLE | SIGHASH_ANYONECANPAY
    SingleAnyoneCanPay = 0x83,
}

impl Default for SigHashType {
    fn default() -> Self {
        SigHashType::All
    }
}

impl SigHashType {
    /// Parse sighash type from its trailing-byte encoding
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(SigHashType::All),
            0x02 => Some(SigHashType::None),
            0x03 => Some(SigHashType::Single),
            0x81 => Some(SigHashType::AllAnyoneCanPay),
            0x82 => Some(SigHashType::NoneAnyoneCanPay),
            0x83 => Some(SigHashType::SingleAnyoneCanPay),
            _ => None,
        }
    }

    /// The byte appended to DER signatures in unlocking scripts
    pub fn as_byte(&self) -> u8 {
        *self as u8
    }

    /// Check if this sighash includes the ANYONECANPAY flag
    pub fn is_anyone_can_pay(&self) -> bool {
        (*self as u8) & 0x80 != 0
    }

    /// Get the base type (without the ANYONECANPAY flag)
    pub fn base_type(&self) -> SigHashType {
        match (*self as u8) & 0x1f {
            0x02 => SigHashType::None,
            0x03 => SigHashType::Single,
            _ => SigHashType::All,
        }
    }
}

fn txid_bytes(txid: &str) -> Result<[u8; 32], SighashError> {
    let bytes = hex::decode(txid).map_err(|_| SighashError::InvalidTxId(txid.to_string()))?;
    bytes
        .try_into()
        .map_err(|_| SighashError::InvalidTxId(txid.to_string()))
}

fn hash_to_array(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&double_sha256(data));
    out
}

fn output_bytes(amount: u64, script: &Script) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&amount.to_le_bytes());
    out.extend_from_slice(&(script.len() as u32).to_le_bytes());
    out.extend_from_slice(script.as_bytes());
    out
}

/// Compute the digest signed for one input of a transaction.
///
/// `script_code` is the script being satisfied: for a P2SH multisig spend
/// this is the redeem script, not the locking script. `amount` is the value
/// of the spent output, which the digest commits to.
pub fn sighash_digest(
    tx: &Transaction,
    input_index: usize,
    script_code: &Script,
    amount: u64,
    sighash_type: SigHashType,
) -> Result<[u8; 32], SighashError> {
    let input = tx
        .inputs
        .get(input_index)
        .ok_or(SighashError::InputIndexOutOfRange(input_index))?;

    let anyone_can_pay = sighash_type.is_anyone_can_pay();
    let base = sighash_type.base_type();

    let hash_prevouts = if anyone_can_pay {
        [0u8; 32]
    } else {
        let mut prevouts = Vec::new();
        for inp in &tx.inputs {
            prevouts.extend_from_slice(&txid_bytes(&inp.outpoint.txid)?);
            prevouts.extend_from_slice(&inp.outpoint.vout.to_le_bytes());
        }
        hash_to_array(&prevouts)
    };

    let hash_sequences = if anyone_can_pay || base != SigHashType::All {
        [0u8; 32]
    } else {
        let mut sequences = Vec::new();
        for inp in &tx.inputs {
            sequences.extend_from_slice(&inp.sequence.to_le_bytes());
        }
        hash_to_array(&sequences)
    };

    let hash_outputs = match base {
        SigHashType::None => [0u8; 32],
        SigHashType::Single => match tx.outputs.get(input_index) {
            Some(output) => hash_to_array(&output_bytes(output.amount, &output.script)),
            None => [0u8; 32],
        },
        _ => {
            let mut outputs = Vec::new();
            for output in &tx.outputs {
                outputs.extend_from_slice(&output_bytes(output.amount, &output.script));
            }
            hash_to_array(&outputs)
        }
    };

    let mut preimage = Vec::new();
    preimage.extend_from_slice(&tx.version.to_le_bytes());
    preimage.extend_from_slice(&hash_prevouts);
    preimage.extend_from_slice(&hash_sequences);
    preimage.extend_from_slice(&txid_bytes(&input.outpoint.txid)?);
    preimage.extend_from_slice(&input.outpoint.vout.to_le_bytes());
    preimage.extend_from_slice(&(script_code.len() as u32).to_le_bytes());
    preimage.extend_from_slice(script_code.as_bytes());
    preimage.extend_from_slice(&amount.to_le_bytes());
    preimage.extend_from_slice(&input.sequence.to_le_bytes());
    preimage.extend_from_slice(&hash_outputs);
    preimage.extend_from_slice(&tx.locktime.to_le_bytes());
    preimage.extend_from_slice(&(sighash_type.as_byte() as u32).to_le_bytes());

    Ok(hash_to_array(&preimage))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::double_sha256_hex;
    use crate::tx::{OutPoint, Transaction, TxInput, TxOutput};

    fn sample_tx(amount: u64) -> Transaction {
        let prev_txid = double_sha256_hex(b"previous tx");
        let prev_output = TxOutput {
            amount,
            script: Script::from_bytes(vec![0x51]),
        };
        let input = TxInput::new(OutPoint::new(prev_txid, 0), prev_output);
        let output = TxOutput {
            amount: amount - 1_000,
            script: Script::from_bytes(vec![0x52]),
        };
        Transaction::new(vec![input], vec![output])
    }

    #[test]
    fn test_sighash_types() {
        assert_eq!(SigHashType::default(), SigHashType::All);
        assert!(!SigHashType::All.is_anyone_can_pay());
        assert!(SigHashType::AllAnyoneCanPay.is_anyone_can_pay());
        assert_eq!(SigHashType::AllAnyoneCanPay.base_type(), SigHashType::All);
        assert_eq!(SigHashType::from_byte(0x81), Some(SigHashType::AllAnyoneCanPay));
        assert_eq!(SigHashType::from_byte(0x80), None);
        assert_eq!(SigHashType::Single.as_byte(), 0x03);
    }

    #[test]
    fn test_digest_is_deterministic() {
        let tx = sample_tx(100_000);
        let script_code = Script::from_bytes(vec![0x51, 0x52]);

        let a = sighash_digest(&tx, 0, &script_code, 100_000, SigHashType::All).unwrap();
        let b = sighash_digest(&tx, 0, &script_code, 100_000, SigHashType::All).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_digest_commits_to_context() {
        let tx = sample_tx(100_000);
        let script_code = Script::from_bytes(vec![0x51, 0x52]);

        let base = sighash_digest(&tx, 0, &script_code, 100_000, SigHashType::All).unwrap();

        // Different spent amount
        let other = sighash_digest(&tx, 0, &script_code, 99_999, SigHashType::All).unwrap();
        assert_ne!(base, other);

        // Different script code
        let other_code = Script::from_bytes(vec![0x53]);
        let other = sighash_digest(&tx, 0, &other_code, 100_000, SigHashType::All).unwrap();
        assert_ne!(base, other);

        // Different sighash type
        let other = sighash_digest(&tx, 0, &script_code, 100_000, SigHashType::None).unwrap();
        assert_ne!(base, other);
        let other =
            sighash_digest(&tx, 0, &script_code, 100_000, SigHashType::AllAnyoneCanPay).unwrap();
        assert_ne!(base, other);
    }

    #[test]
    fn test_input_index_out_of_range() {
        let tx = sample_tx(100_000);
        let script_code = Script::from_bytes(vec![0x51]);
        assert!(matches!(
            sighash_digest(&tx, 5, &script_code, 100_000, SigHashType::All),
            Err(SighashError::InputIndexOutOfRange(5))
        ));
    }

    #[test]
    fn test_invalid_txid_rejected() {
        let mut tx = sample_tx(100_000);
        tx.inputs[0].outpoint.txid = "not hex".to_string();
        let script_code = Script::from_bytes(vec![0x51]);
        assert!(matches!(
            sighash_digest(&tx, 0, &script_code, 100_000, SigHashType::All),
            Err(SighashError::InvalidTxId(_))
        ));
    }
}
