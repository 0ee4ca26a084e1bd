//! P2SH multisig input signing
//!
//! Manages the signing lifecycle of a spending input governed by an
//! m-of-n threshold policy committed to by a P2SH output.
//!
//! # Example
//!
//! ```ignore
//! use p2sh_multisig::multisig::MultisigScriptHashInput;
//! use p2sh_multisig::script::SigHashType;
//!
//! // Bind the redeem script to the input being signed
//! let mut input = MultisigScriptHashInput::new(base_input, redeem_script)?;
//!
//! // Each party signs independently, in any order
//! for entry in input.produce_signatures(&tx, &key_pair, 0, SigHashType::All)? {
//!     input.add_signature(&tx, entry)?;
//! }
//!
//! // Once the threshold is met, the unlocking script is ready
//! assert!(input.is_fully_signed());
//! ```

pub mod entry;
pub mod input;

pub use entry::SignedEntry;
pub use input::{
    estimated_unlock_size, MultisigInputError, MultisigInputRecord, MultisigScriptHashInput,
    PUBKEY_MAX_SIZE, SIGNATURE_MAX_SIZE, UNLOCK_OPCODES_SIZE,
};
