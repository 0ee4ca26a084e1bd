//! Signed entries
//!
//! A `SignedEntry` is one signer's contribution for one input: the DER
//! signature plus the context it was produced under. Entries are immutable
//! once created and are only accepted into an input after validation.

use serde::{Deserialize, Serialize};

use crate::script::SigHashType;

/// One authorized signer's signature over a specific input digest
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignedEntry {
    /// Canonical hex form of the signer's public key
    pub public_key: String,
    /// Transaction ID of the output being spent (hex)
    pub prev_txid: String,
    /// Index of the spent output in its transaction
    pub output_index: u32,
    /// Index of the input this signature is for
    pub input_index: u32,
    /// DER-encoded ECDSA signature
    #[serde(with = "hex_bytes")]
    pub signature: Vec<u8>,
    /// Which parts of the transaction the digest committed to
    pub sighash_type: SigHashType,
}

impl SignedEntry {
    /// Create a new signed entry
    pub fn new(
        public_key: String,
        prev_txid: String,
        output_index: u32,
        input_index: u32,
        signature: Vec<u8>,
        sighash_type: SigHashType,
    ) -> Self {
        Self {
            public_key,
            prev_txid,
            output_index,
            input_index,
            signature,
            sighash_type,
        }
    }

    /// The bytes pushed into the unlocking script: DER signature with the
    /// sighash type appended as a single trailing byte
    pub fn to_script_bytes(&self) -> Vec<u8> {
        let mut bytes = self.signature.clone();
        bytes.push(self.sighash_type.as_byte());
        bytes
    }
}

mod hex_bytes {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entry() -> SignedEntry {
        SignedEntry::new(
            "02".repeat(33),
            "ab".repeat(32),
            0,
            0,
            vec![0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x01],
            SigHashType::All,
        )
    }

    #[test]
    fn test_script_bytes_append_sighash_byte() {
        let entry = sample_entry();
        let bytes = entry.to_script_bytes();
        assert_eq!(bytes.len(), entry.signature.len() + 1);
        assert_eq!(bytes[..entry.signature.len()], entry.signature[..]);
        assert_eq!(*bytes.last().unwrap(), 0x01);
    }

    #[test]
    fn test_serde_round_trip_hex_signature() {
        let entry = sample_entry();
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains(&hex::encode(&entry.signature)));

        let back: SignedEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }
}
