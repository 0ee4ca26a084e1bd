//! Script system
//!
//! Byte-level script building for the P2SH multisig templates, plus the
//! per-input signature digest (sighash) computation.

pub mod builder;
pub mod opcodes;
pub mod sighash;

pub use builder::{Script, ScriptError, COMPRESSED_PUBKEY_LEN, P2SH_ADDRESS_VERSION};
pub use sighash::{sighash_digest, SigHashType, SighashError};
