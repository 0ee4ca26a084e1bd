//! P2SH multisig input signing
//!
//! This crate manages the signing lifecycle of a spending input that
//! unlocks funds governed by an m-of-n threshold policy embedded in a
//! redeem script. It features:
//! - Redeem script binding (construction fails unless the script hashes
//!   to the spent output's P2SH commitment)
//! - Slot-aligned signature collection: each authorized key owns a fixed
//!   slot, so independent signers can contribute in any order
//! - Signature validation against a BIP-143 style digest committing to
//!   the redeem script and the spent amount
//! - Deterministic unlocking script reconstruction in verifier-mandated
//!   key order
//! - Pure merging of partially signed copies from independent parties
//! - Upper-bound size estimation for fee planning
//!
//! # Example
//!
//! ```rust
//! use p2sh_multisig::crypto::KeyPair;
//! use p2sh_multisig::multisig::MultisigScriptHashInput;
//! use p2sh_multisig::script::{Script, SigHashType};
//! use p2sh_multisig::tx::{OutPoint, Transaction, TxInput, TxOutput};
//!
//! // A 2-of-3 policy
//! let keys: Vec<KeyPair> = (0..3).map(|_| KeyPair::generate()).collect();
//! let pubkeys: Vec<String> = keys.iter().map(|k| k.public_key_hex()).collect();
//! let redeem = Script::multisig_redeem(2, &pubkeys).unwrap();
//!
//! // The funding output commits to the redeem script's hash
//! let base = TxInput::new(
//!     OutPoint::new("00".repeat(32), 0),
//!     TxOutput { amount: 100_000, script: redeem.p2sh_locking_script() },
//! );
//! let tx = Transaction::new(vec![base.clone()], vec![]);
//!
//! let mut input = MultisigScriptHashInput::new(base, redeem).unwrap();
//!
//! // Two signers are enough
//! for key in &keys[..2] {
//!     for entry in input.produce_signatures(&tx, key, 0, SigHashType::All).unwrap() {
//!         input.add_signature(&tx, entry).unwrap();
//!     }
//! }
//! assert!(input.is_fully_signed());
//! ```

pub mod crypto;
pub mod multisig;
pub mod script;
pub mod tx;

// Re-export commonly used types
pub use crypto::KeyPair;
pub use multisig::{
    estimated_unlock_size, MultisigInputError, MultisigInputRecord, MultisigScriptHashInput,
    SignedEntry,
};
pub use script::{sighash_digest, Script, ScriptError, SigHashType, SighashError};
pub use tx::{OutPoint, SpendableInput, Transaction, TxInput, TxOutput};
