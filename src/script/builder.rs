//! Script byte builder and the P2SH multisig templates
//!
//! A `Script` is a plain byte sequence. This module provides the data-push
//! encoding plus the three templates the crate needs:
//! - the m-of-n redeem script (`OP_m <keys...> OP_n OP_CHECKMULTISIG`),
//! - the P2SH locking script committing to its HASH160
//!   (`OP_HASH160 <20 bytes> OP_EQUAL`),
//! - the unlocking script (`OP_0 <sigs...> <redeem script>`).

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::crypto::hash160;
use crate::script::opcodes::{
    decode_op_n, op_n, OP_0, OP_CHECKMULTISIG, OP_EQUAL, OP_HASH160, OP_PUSHDATA1, OP_PUSHDATA2,
};

/// Length of a compressed SEC public key
pub const COMPRESSED_PUBKEY_LEN: usize = 33;

/// Base58Check version byte for P2SH addresses (produces addresses starting with '3')
pub const P2SH_ADDRESS_VERSION: u8 = 0x05;

/// Script-related errors
#[derive(Error, Debug, Clone)]
pub enum ScriptError {
    #[error("Invalid threshold: need {0} of {1} signatures")]
    InvalidThreshold(u8, u8),
    #[error("Too many public keys: {0} (maximum 16)")]
    TooManyKeys(usize),
    #[error("Invalid public key encoding")]
    InvalidPublicKey,
    #[error("Not a multisig redeem script: {0}")]
    NotMultisigTemplate(String),
    #[error("Invalid script hex")]
    InvalidHex,
}

/// A script as raw bytes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script(Vec<u8>);

impl Script {
    /// Create an empty script
    pub fn new() -> Self {
        Script(Vec::new())
    }

    /// Wrap existing script bytes
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Script(bytes)
    }

    /// Parse a script from hex
    pub fn from_hex(s: &str) -> Result<Self, ScriptError> {
        Ok(Script(hex::decode(s).map_err(|_| ScriptError::InvalidHex)?))
    }

    /// Get the raw script bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Script length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the script is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Encode the script as hex
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Append a single opcode
    pub fn push_opcode(&mut self, opcode: u8) {
        self.0.push(opcode);
    }

    /// Append a data push with the minimal push encoding
    pub fn push_data(&mut self, data: &[u8]) {
        match data.len() {
            0 => self.0.push(OP_0),
            len if len < OP_PUSHDATA1 as usize => {
                self.0.push(len as u8);
                self.0.extend_from_slice(data);
            }
            len if len <= 0xff => {
                self.0.push(OP_PUSHDATA1);
                self.0.push(len as u8);
                self.0.extend_from_slice(data);
            }
            len => {
                self.0.push(OP_PUSHDATA2);
                self.0.extend_from_slice(&(len as u16).to_le_bytes());
                self.0.extend_from_slice(data);
            }
        }
    }

    /// Build an m-of-n redeem script from compressed public keys in
    /// their authoritative order: `OP_m <key>... OP_n OP_CHECKMULTISIG`
    pub fn multisig_redeem(threshold: u8, pubkeys_hex: &[String]) -> Result<Self, ScriptError> {
        let total = pubkeys_hex.len();
        if total > 16 {
            return Err(ScriptError::TooManyKeys(total));
        }
        let total = total as u8;
        if threshold == 0 || threshold > total {
            return Err(ScriptError::InvalidThreshold(threshold, total));
        }

        let mut script = Script::new();
        script.push_opcode(op_n(threshold).ok_or(ScriptError::InvalidThreshold(threshold, total))?);
        for key_hex in pubkeys_hex {
            let key = hex::decode(key_hex).map_err(|_| ScriptError::InvalidPublicKey)?;
            if key.len() != COMPRESSED_PUBKEY_LEN {
                return Err(ScriptError::InvalidPublicKey);
            }
            script.push_data(&key);
        }
        script.push_opcode(op_n(total).ok_or(ScriptError::TooManyKeys(total as usize))?);
        script.push_opcode(OP_CHECKMULTISIG);
        Ok(script)
    }

    /// Recover `(threshold, public keys)` from an m-of-n redeem script.
    ///
    /// The key list comes back in script order, hex-encoded, which is the
    /// authoritative order for signature slots.
    pub fn parse_multisig_redeem(&self) -> Result<(u8, Vec<String>), ScriptError> {
        let bytes = &self.0;
        let malformed =
            |what: &str| ScriptError::NotMultisigTemplate(what.to_string());

        if bytes.len() < 3 {
            return Err(malformed("script too short"));
        }

        let threshold = decode_op_n(bytes[0]).ok_or_else(|| malformed("missing threshold opcode"))?;

        let mut keys = Vec::new();
        let mut pos = 1;
        while pos < bytes.len() {
            let opcode = bytes[pos];
            if decode_op_n(opcode).is_some() && !keys.is_empty() {
                // OP_n terminator
                break;
            }
            let (data_start, data_len) = match opcode {
                len @ 1..=0x4b => (pos + 1, len as usize),
                OP_PUSHDATA1 => {
                    if pos + 1 >= bytes.len() {
                        return Err(malformed("truncated PUSHDATA1"));
                    }
                    (pos + 2, bytes[pos + 1] as usize)
                }
                _ => return Err(malformed("unexpected opcode in key list")),
            };
            let data_end = data_start + data_len;
            if data_end > bytes.len() {
                return Err(malformed("truncated key push"));
            }
            if data_len != COMPRESSED_PUBKEY_LEN {
                return Err(malformed("key push is not a compressed public key"));
            }
            keys.push(hex::encode(&bytes[data_start..data_end]));
            pos = data_end;
        }

        if pos + 2 != bytes.len() {
            return Err(malformed("trailing bytes after key list"));
        }
        let total =
            decode_op_n(bytes[pos]).ok_or_else(|| malformed("missing key count opcode"))?;
        if bytes[pos + 1] != OP_CHECKMULTISIG {
            return Err(malformed("missing OP_CHECKMULTISIG"));
        }
        if total as usize != keys.len() {
            return Err(malformed("key count opcode disagrees with key list"));
        }
        if threshold > total {
            return Err(malformed("threshold exceeds key count"));
        }

        Ok((threshold, keys))
    }

    /// Build the P2SH locking script committing to a 20-byte script hash:
    /// `OP_HASH160 <hash> OP_EQUAL`
    pub fn pay_to_script_hash(script_hash: &[u8; 20]) -> Self {
        let mut script = Script::new();
        script.push_opcode(OP_HASH160);
        script.push_data(script_hash);
        script.push_opcode(OP_EQUAL);
        script
    }

    /// The P2SH locking script committing to this script's HASH160
    pub fn p2sh_locking_script(&self) -> Self {
        Self::pay_to_script_hash(&hash160(&self.0))
    }

    /// Build the unlocking script for a P2SH multisig spend:
    /// `OP_0 <sig||sighash_byte>... <redeem script>`.
    ///
    /// The leading OP_0 is the dummy item OP_CHECKMULTISIG pops. Signature
    /// order must already match the redeem script's key order.
    pub fn multisig_unlock(signatures: &[Vec<u8>], redeem_script: &Script) -> Self {
        let mut script = Script::new();
        script.push_opcode(OP_0);
        for sig in signatures {
            script.push_data(sig);
        }
        script.push_data(redeem_script.as_bytes());
        script
    }

    /// Derive the Base58Check P2SH address for this script
    ///
    /// Address = Base58Check(0x05 || HASH160(script))
    pub fn p2sh_address(&self) -> String {
        let mut address_bytes = vec![P2SH_ADDRESS_VERSION];
        address_bytes.extend_from_slice(&hash160(&self.0));

        // Checksum is the first 4 bytes of double SHA-256
        let checksum = crate::crypto::double_sha256(&address_bytes);
        address_bytes.extend_from_slice(&checksum[..4]);

        bs58::encode(address_bytes).into_string()
    }
}

impl Serialize for Script {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Script {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Script::from_hex(&s).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_keys(count: usize) -> Vec<String> {
        (0..count)
            .map(|i| {
                let mut key = vec![0x02u8; COMPRESSED_PUBKEY_LEN];
                key[1] = i as u8 + 1;
                hex::encode(key)
            })
            .collect()
    }

    #[test]
    fn test_push_data_encodings() {
        let mut script = Script::new();
        script.push_data(&[0xaa; 10]);
        assert_eq!(script.as_bytes()[0], 10);

        let mut script = Script::new();
        script.push_data(&[0xaa; 200]);
        assert_eq!(script.as_bytes()[0], OP_PUSHDATA1);
        assert_eq!(script.as_bytes()[1], 200);

        let mut script = Script::new();
        script.push_data(&[0xaa; 300]);
        assert_eq!(script.as_bytes()[0], OP_PUSHDATA2);
        assert_eq!(&script.as_bytes()[1..3], &300u16.to_le_bytes());
    }

    #[test]
    fn test_multisig_redeem_round_trip() {
        let keys = sample_keys(3);
        let redeem = Script::multisig_redeem(2, &keys).unwrap();

        // OP_2, 3x (push33 + key), OP_3, OP_CHECKMULTISIG
        assert_eq!(redeem.len(), 1 + 3 * 34 + 1 + 1);

        let (threshold, parsed) = redeem.parse_multisig_redeem().unwrap();
        assert_eq!(threshold, 2);
        assert_eq!(parsed, keys);
    }

    #[test]
    fn test_multisig_redeem_validation() {
        let keys = sample_keys(3);
        assert!(matches!(
            Script::multisig_redeem(0, &keys),
            Err(ScriptError::InvalidThreshold(0, 3))
        ));
        assert!(matches!(
            Script::multisig_redeem(4, &keys),
            Err(ScriptError::InvalidThreshold(4, 3))
        ));
        assert!(matches!(
            Script::multisig_redeem(2, &sample_keys(17)),
            Err(ScriptError::TooManyKeys(17))
        ));
        assert!(matches!(
            Script::multisig_redeem(2, &["zz".repeat(33), "00".repeat(33)]),
            Err(ScriptError::InvalidPublicKey)
        ));
    }

    #[test]
    fn test_parse_rejects_non_template() {
        assert!(Script::from_bytes(vec![]).parse_multisig_redeem().is_err());
        assert!(Script::from_bytes(vec![OP_HASH160, 0x01, 0xaa, OP_EQUAL])
            .parse_multisig_redeem()
            .is_err());

        // Valid prefix but truncated key push
        let keys = sample_keys(2);
        let redeem = Script::multisig_redeem(2, &keys).unwrap();
        let truncated = Script::from_bytes(redeem.as_bytes()[..20].to_vec());
        assert!(truncated.parse_multisig_redeem().is_err());
    }

    #[test]
    fn test_p2sh_locking_script_layout() {
        let redeem = Script::multisig_redeem(2, &sample_keys(3)).unwrap();
        let locking = redeem.p2sh_locking_script();

        // OP_HASH160 <20-byte push> OP_EQUAL
        assert_eq!(locking.len(), 23);
        assert_eq!(locking.as_bytes()[0], OP_HASH160);
        assert_eq!(locking.as_bytes()[1], 20);
        assert_eq!(locking.as_bytes()[22], OP_EQUAL);
        assert_eq!(&locking.as_bytes()[2..22], &hash160(redeem.as_bytes()));
    }

    #[test]
    fn test_multisig_unlock_layout() {
        let redeem = Script::multisig_redeem(2, &sample_keys(3)).unwrap();
        let sigs = vec![vec![0x30; 71], vec![0x30; 72]];
        let unlock = Script::multisig_unlock(&sigs, &redeem);

        let bytes = unlock.as_bytes();
        assert_eq!(bytes[0], OP_0);
        assert_eq!(bytes[1], 71);
        assert_eq!(bytes[1 + 1 + 71], 72);
        // Redeem script is the final push (PUSHDATA1 since it exceeds 0x4b bytes)
        let tail_start = 1 + (1 + 71) + (1 + 72);
        assert_eq!(bytes[tail_start], OP_PUSHDATA1);
        assert_eq!(bytes[tail_start + 1] as usize, redeem.len());
        assert_eq!(&bytes[tail_start + 2..], redeem.as_bytes());
    }

    #[test]
    fn test_p2sh_address() {
        let redeem = Script::multisig_redeem(2, &sample_keys(3)).unwrap();
        let address = redeem.p2sh_address();
        // Version byte 0x05 produces addresses starting with '3'
        assert!(address.starts_with('3'));

        // Deterministic for the same script
        assert_eq!(address, redeem.p2sh_address());
    }

    #[test]
    fn test_script_serde_hex() {
        let redeem = Script::multisig_redeem(2, &sample_keys(3)).unwrap();
        let json = serde_json::to_string(&redeem).unwrap();
        assert_eq!(json, format!("\"{}\"", redeem.to_hex()));

        let back: Script = serde_json::from_str(&json).unwrap();
        assert_eq!(back, redeem);
    }
}
