//! Transaction records
//!
//! Base input/output bookkeeping consumed by the multisig signing core.

pub mod transaction;

pub use transaction::{
    OutPoint, SpendableInput, Transaction, TxInput, TxOutput, SEQUENCE_FINAL, TX_VERSION,
};
