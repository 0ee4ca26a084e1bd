//! ECDSA key management
//!
//! Provides key pair generation, signing, and verification using
//! the secp256k1 elliptic curve (same as Bitcoin). Signatures are
//! DER-encoded so they can be embedded in unlocking scripts as-is.

use rand::rngs::OsRng;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use thiserror::Error;

/// Errors that can occur during key operations
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Invalid digest: expected 32 bytes")]
    InvalidDigest,
    #[error("Secp256k1 error: {0}")]
    Secp256k1Error(#[from] secp256k1::Error),
}

/// A key pair consisting of a private key and its corresponding public key
#[derive(Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut OsRng);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from an existing secret key
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from a hex-encoded private key
    pub fn from_private_key_hex(hex_key: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPrivateKey)?;
        let secret_key =
            SecretKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Get the private key as a hex string
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Get the public key in canonical form: hex of the 33-byte
    /// compressed SEC encoding. This string is the identity used for
    /// signer authorization and signature slot assignment.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key.serialize())
    }

    /// Sign a 32-byte digest, returning the DER-encoded signature
    pub fn sign_der(&self, digest: &[u8]) -> Result<Vec<u8>, KeyError> {
        sign_der(&self.secret_key, digest)
    }

    /// Verify a DER-encoded signature against this key pair's public key
    pub fn verify_der(&self, digest: &[u8], signature: &[u8]) -> Result<bool, KeyError> {
        verify_der_signature(&self.public_key, digest, signature)
    }
}

/// Parse a public key from its canonical hex form
pub fn public_key_from_hex(hex_key: &str) -> Result<PublicKey, KeyError> {
    let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPublicKey)?;
    PublicKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPublicKey)
}

/// Sign a 32-byte digest with a secret key, returning DER bytes
pub fn sign_der(secret_key: &SecretKey, digest: &[u8]) -> Result<Vec<u8>, KeyError> {
    let secp = Secp256k1::new();
    let message = Message::from_digest_slice(digest).map_err(|_| KeyError::InvalidDigest)?;
    let signature = secp.sign_ecdsa(&message, secret_key);
    Ok(signature.serialize_der().to_vec())
}

/// Verify a DER-encoded signature over a 32-byte digest.
///
/// Returns `Ok(false)` for both undecodable and cryptographically wrong
/// signatures, so callers cannot distinguish which check failed.
pub fn verify_der_signature(
    public_key: &PublicKey,
    digest: &[u8],
    signature: &[u8],
) -> Result<bool, KeyError> {
    let secp = Secp256k1::new();
    let message = Message::from_digest_slice(digest).map_err(|_| KeyError::InvalidDigest)?;

    let sig = match secp256k1::ecdsa::Signature::from_der(signature) {
        Ok(sig) => sig,
        Err(_) => return Ok(false),
    };

    Ok(secp.verify_ecdsa(&message, &sig, public_key).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::sha256;

    #[test]
    fn test_key_pair_generation() {
        let kp = KeyPair::generate();
        assert!(!kp.private_key_hex().is_empty());
        // Compressed public keys are 33 bytes -> 66 hex chars
        assert_eq!(kp.public_key_hex().len(), 66);
    }

    #[test]
    fn test_sign_and_verify_der() {
        let kp = KeyPair::generate();
        let digest = sha256(b"spend authorization");

        let signature = kp.sign_der(&digest).unwrap();
        assert!(kp.verify_der(&digest, &signature).unwrap());

        // A different digest must not verify
        let other = sha256(b"different message");
        assert!(!kp.verify_der(&other, &signature).unwrap());
    }

    #[test]
    fn test_garbage_signature_is_false_not_error() {
        let kp = KeyPair::generate();
        let digest = sha256(b"spend authorization");
        assert!(!kp.verify_der(&digest, &[0xde, 0xad, 0xbe, 0xef]).unwrap());
    }

    #[test]
    fn test_key_pair_from_hex() {
        let kp1 = KeyPair::generate();
        let private_hex = kp1.private_key_hex();

        let kp2 = KeyPair::from_private_key_hex(&private_hex).unwrap();
        assert_eq!(kp1.public_key_hex(), kp2.public_key_hex());
    }

    #[test]
    fn test_short_digest_rejected() {
        let kp = KeyPair::generate();
        assert!(matches!(
            kp.sign_der(&[0u8; 16]),
            Err(KeyError::InvalidDigest)
        ));
    }
}
