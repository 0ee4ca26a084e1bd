//! P2SH multisig input signing core
//!
//! `MultisigScriptHashInput` manages the signing lifecycle of one spending
//! input governed by an m-of-n threshold policy. Each authorized public key
//! owns a fixed signature slot (its position in the redeem script), so
//! independent signers can contribute in any order and the unlocking script
//! always comes out in the verifier-mandated key order.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::{public_key_from_hex, verify_der_signature, KeyError, KeyPair};
use crate::multisig::entry::SignedEntry;
use crate::script::{sighash_digest, Script, ScriptError, SigHashType, SighashError};
use crate::tx::{SpendableInput, Transaction, TxInput};

// =============================================================================
// Size estimation constants
// =============================================================================

/// Opcode and push overhead of a fully signed unlocking script
pub const UNLOCK_OPCODES_SIZE: usize = 7;

/// Worst-case size of a DER signature plus sighash byte and push prefix
pub const SIGNATURE_MAX_SIZE: usize = 74;

/// Worst-case size of a pushed compressed public key
pub const PUBKEY_MAX_SIZE: usize = 34;

/// Upper-bound byte size of the unlocking script for fee planning.
///
/// Intentionally overestimates rather than matching the exact final size.
pub fn estimated_unlock_size(threshold: u8, total: u8) -> usize {
    UNLOCK_OPCODES_SIZE
        + threshold as usize * SIGNATURE_MAX_SIZE
        + total as usize * PUBKEY_MAX_SIZE
}

// =============================================================================
// Errors
// =============================================================================

/// Errors from the multisig input signing core
#[derive(Error, Debug)]
pub enum MultisigInputError {
    /// Construction-fatal: the claimed policy was never committed to
    /// by the output being spent
    #[error("Redeem script does not hash to the referenced output's locking script")]
    RedeemScriptMismatch,
    #[error("Already fully signed: all {0} required signatures are present")]
    AlreadyFullySigned(u8),
    #[error("Signer not authorized: {0}")]
    UnknownSigner(String),
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Authorized keys do not match the redeem script template")]
    KeySetMismatch,
    #[error("Cannot merge inputs that spend different outputs or policies")]
    MergeMismatch,
    #[error("Malformed input record: {0}")]
    InvalidRecord(String),
    #[error("Script error: {0}")]
    ScriptError(#[from] ScriptError),
    #[error("Sighash error: {0}")]
    SighashError(#[from] SighashError),
    #[error("Crypto error: {0}")]
    CryptoError(#[from] KeyError),
}

// =============================================================================
// Serialization record
// =============================================================================

/// Serialized form of a (possibly partially signed) multisig input.
///
/// The signature list is sparse: unsigned slots serialize as `null` so that
/// slot alignment survives the round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultisigInputRecord {
    /// Base input record
    pub input: TxInput,
    /// Required signature count (m)
    pub threshold: u8,
    /// Canonical public keys in authoritative slot order
    pub public_keys: Vec<String>,
    /// The bound redeem script
    pub redeem_script: Script,
    /// Slot-aligned signatures; `None` marks an unsigned slot
    pub signatures: Vec<Option<SignedEntry>>,
}

// =============================================================================
// The signing core
// =============================================================================

/// A spending input unlocking a P2SH output that commits to an m-of-n
/// multisig redeem script.
///
/// Construction binds the redeem script to the spent output (fails with
/// [`MultisigInputError::RedeemScriptMismatch`] if the output never
/// committed to it) and derives the threshold and authorized key set by
/// parsing the redeem script template. The key set order is fixed from
/// then on; signatures land in the slot of their key, and the unlocking
/// script is reconstructed from the slots after every mutation.
#[derive(Debug, Clone)]
pub struct MultisigScriptHashInput {
    base: TxInput,
    redeem_script: Script,
    threshold: u8,
    public_keys: Vec<String>,
    key_index: HashMap<String, usize>,
    signatures: Vec<Option<SignedEntry>>,
}

impl MultisigScriptHashInput {
    /// Bind a redeem script to a base input and derive the policy from it.
    ///
    /// Fails with `RedeemScriptMismatch` if `HASH160(redeem_script)` is not
    /// what the spent output's locking script commits to, and with a script
    /// error if the redeem script is not an m-of-n template.
    pub fn new(base: TxInput, redeem_script: Script) -> Result<Self, MultisigInputError> {
        if redeem_script.p2sh_locking_script() != *base.previous_output_script() {
            log::warn!(
                "redeem script hash does not match output {}:{}",
                base.outpoint.txid,
                base.outpoint.vout
            );
            return Err(MultisigInputError::RedeemScriptMismatch);
        }

        let (threshold, public_keys) = redeem_script.parse_multisig_redeem()?;

        // Duplicate canonical keys map to their first slot; later duplicate
        // slots are only reachable through produce_signatures.
        let mut key_index = HashMap::with_capacity(public_keys.len());
        for (slot, key) in public_keys.iter().enumerate() {
            key_index.entry(key.clone()).or_insert(slot);
        }

        let signatures = vec![None; public_keys.len()];
        let mut input = Self {
            base,
            redeem_script,
            threshold,
            public_keys,
            key_index,
            signatures,
        };
        input.rebuild_unlocking_script();
        Ok(input)
    }

    /// Like [`new`](Self::new), but additionally checks that the caller's
    /// expected key list matches the redeem script template exactly.
    pub fn with_authorized_keys(
        base: TxInput,
        authorized_keys: &[String],
        redeem_script: Script,
    ) -> Result<Self, MultisigInputError> {
        let input = Self::new(base, redeem_script)?;
        if input.public_keys != authorized_keys {
            return Err(MultisigInputError::KeySetMismatch);
        }
        Ok(input)
    }

    // =========================================================================
    // Signing
    // =========================================================================

    /// Produce signed entries for every slot whose key matches `key_pair`.
    ///
    /// Returns an empty vector when the key is not in the authorized set;
    /// probing an input with a non-member key is not an error.
    pub fn produce_signatures(
        &self,
        tx: &Transaction,
        key_pair: &KeyPair,
        input_index: u32,
        sighash_type: SigHashType,
    ) -> Result<Vec<SignedEntry>, MultisigInputError> {
        let signer = key_pair.public_key_hex();
        let mut entries = Vec::new();

        for key in &self.public_keys {
            if *key != signer {
                continue;
            }
            let digest = sighash_digest(
                tx,
                input_index as usize,
                &self.redeem_script,
                self.base.previous_output_amount(),
                sighash_type,
            )?;
            let signature = key_pair.sign_der(&digest)?;
            entries.push(SignedEntry::new(
                key.clone(),
                self.base.outpoint.txid.clone(),
                self.base.outpoint.vout,
                input_index,
                signature,
                sighash_type,
            ));
        }

        Ok(entries)
    }

    /// Recompute the digest a candidate entry claims to sign and verify it
    /// against the claimed public key.
    ///
    /// Returns `Ok(false)` for any verification failure without revealing
    /// which part failed.
    pub fn validate_signature(
        &self,
        tx: &Transaction,
        candidate: &SignedEntry,
    ) -> Result<bool, MultisigInputError> {
        let digest = sighash_digest(
            tx,
            candidate.input_index as usize,
            &self.redeem_script,
            self.base.previous_output_amount(),
            candidate.sighash_type,
        )?;
        let public_key = public_key_from_hex(&candidate.public_key)?;
        Ok(verify_der_signature(
            &public_key,
            &digest,
            &candidate.signature,
        )?)
    }

    /// Accept a validated signature into its key's slot and rebuild the
    /// unlocking script.
    ///
    /// Preconditions, checked in order: the store is not already at the
    /// threshold, the signer is authorized, and the signature verifies.
    /// Re-submitting a signature for an occupied slot overwrites it; any
    /// failure leaves the input untouched.
    pub fn add_signature(
        &mut self,
        tx: &Transaction,
        candidate: SignedEntry,
    ) -> Result<(), MultisigInputError> {
        if self.count_signatures() >= self.threshold as usize {
            return Err(MultisigInputError::AlreadyFullySigned(self.threshold));
        }

        let slot = *self
            .key_index
            .get(&candidate.public_key)
            .ok_or_else(|| MultisigInputError::UnknownSigner(candidate.public_key.clone()))?;

        if !self.validate_signature(tx, &candidate)? {
            log::warn!(
                "rejected invalid signature for slot {} of {}:{}",
                slot,
                self.base.outpoint.txid,
                self.base.outpoint.vout
            );
            return Err(MultisigInputError::InvalidSignature);
        }

        self.signatures[slot] = Some(candidate);
        self.rebuild_unlocking_script();
        Ok(())
    }

    /// Reset every slot to empty and rebuild the minimal unsigned
    /// unlocking placeholder
    pub fn clear_signatures(&mut self) {
        for slot in self.signatures.iter_mut() {
            *slot = None;
        }
        self.rebuild_unlocking_script();
    }

    /// Rebuild the unlocking script from the slot store: OP_0, then each
    /// occupied slot's signature bytes in key order, then the redeem script
    fn rebuild_unlocking_script(&mut self) {
        let signature_bytes: Vec<Vec<u8>> = self
            .signatures
            .iter()
            .flatten()
            .map(SignedEntry::to_script_bytes)
            .collect();
        let script = Script::multisig_unlock(&signature_bytes, &self.redeem_script);
        self.base.set_unlocking_script(script);
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Number of occupied signature slots
    pub fn count_signatures(&self) -> usize {
        self.signatures.iter().filter(|s| s.is_some()).count()
    }

    /// Whether the signature count has reached the threshold exactly
    pub fn is_fully_signed(&self) -> bool {
        self.count_signatures() == self.threshold as usize
    }

    /// How many more signatures are needed
    pub fn count_missing_signatures(&self) -> usize {
        (self.threshold as usize).saturating_sub(self.count_signatures())
    }

    /// Authorized keys whose slot is still empty, in key-set order
    pub fn public_keys_without_signature(&self) -> Vec<&str> {
        self.public_keys
            .iter()
            .zip(&self.signatures)
            .filter(|(_, slot)| slot.is_none())
            .map(|(key, _)| key.as_str())
            .collect()
    }

    /// Upper-bound unlocking script size for fee planning
    pub fn estimated_size(&self) -> usize {
        estimated_unlock_size(self.threshold, self.public_keys.len() as u8)
    }

    /// Required signature count (m)
    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Authorized public keys in authoritative slot order
    pub fn public_keys(&self) -> &[String] {
        &self.public_keys
    }

    /// The bound redeem script
    pub fn redeem_script(&self) -> &Script {
        &self.redeem_script
    }

    /// The base input record, carrying the current unlocking script
    pub fn base(&self) -> &TxInput {
        &self.base
    }

    /// The current unlocking script
    pub fn unlocking_script(&self) -> &Script {
        &self.base.unlocking_script
    }

    /// Slot-aligned view of the collected signatures
    pub fn signatures(&self) -> &[Option<SignedEntry>] {
        &self.signatures
    }

    /// The P2SH address of the bound redeem script
    pub fn address(&self) -> String {
        self.redeem_script.p2sh_address()
    }

    /// Human-readable policy description like "2-of-3"
    pub fn description(&self) -> String {
        format!("{}-of-{}", self.threshold, self.public_keys.len())
    }

    // =========================================================================
    // Cross-party merging
    // =========================================================================

    /// Merge two copies of the same input signed by independent parties.
    ///
    /// For each slot, keeps this copy's entry if present, otherwise takes
    /// the other's. If the union exceeds the threshold, excess entries are
    /// dropped from the highest slot down, so the result is deterministic
    /// regardless of which party runs the merge.
    pub fn merge(&self, other: &Self) -> Result<Self, MultisigInputError> {
        if self.redeem_script != other.redeem_script || self.base.outpoint != other.base.outpoint
        {
            return Err(MultisigInputError::MergeMismatch);
        }

        let mut merged = self.clone();
        for (slot, entry) in other.signatures.iter().enumerate() {
            if merged.signatures[slot].is_none() {
                merged.signatures[slot] = entry.clone();
            }
        }

        let mut excess = merged
            .count_signatures()
            .saturating_sub(merged.threshold as usize);
        for slot in (0..merged.signatures.len()).rev() {
            if excess == 0 {
                break;
            }
            if merged.signatures[slot].is_some() {
                log::debug!("merge over-subscribed, dropping signature in slot {}", slot);
                merged.signatures[slot] = None;
                excess -= 1;
            }
        }

        merged.rebuild_unlocking_script();
        Ok(merged)
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    /// Export the current state as a serializable record
    pub fn to_record(&self) -> MultisigInputRecord {
        MultisigInputRecord {
            input: self.base.clone(),
            threshold: self.threshold,
            public_keys: self.public_keys.clone(),
            redeem_script: self.redeem_script.clone(),
            signatures: self.signatures.clone(),
        }
    }

    /// Rebuild an input from a record, re-running the redeem script binding
    /// check and verifying slot alignment.
    pub fn from_record(record: MultisigInputRecord) -> Result<Self, MultisigInputError> {
        let mut input = Self::new(record.input, record.redeem_script)?;

        if record.threshold != input.threshold || record.public_keys != input.public_keys {
            return Err(MultisigInputError::InvalidRecord(
                "policy fields disagree with the redeem script".to_string(),
            ));
        }
        if record.signatures.len() != input.public_keys.len() {
            return Err(MultisigInputError::InvalidRecord(
                "signature list length disagrees with the key count".to_string(),
            ));
        }
        for (slot, entry) in record.signatures.iter().enumerate() {
            if let Some(entry) = entry {
                if entry.public_key != input.public_keys[slot] {
                    return Err(MultisigInputError::InvalidRecord(format!(
                        "signature in slot {} belongs to a different key",
                        slot
                    )));
                }
            }
        }

        input.signatures = record.signatures;
        input.rebuild_unlocking_script();
        Ok(input)
    }
}
