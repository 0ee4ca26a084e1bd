//! Cryptographic hashing utilities
//!
//! Provides the SHA-256 and HASH160 primitives used for transaction
//! digests, script-hash commitments, and address derivation.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// Computes SHA-256 hash of the input data
pub fn sha256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Computes double SHA-256 hash (SHA-256 of SHA-256)
/// Used for transaction digests in Bitcoin-style chains
pub fn double_sha256(data: &[u8]) -> Vec<u8> {
    sha256(&sha256(data))
}

/// Computes double SHA-256 hash and returns it as a hex string
pub fn double_sha256_hex(data: &[u8]) -> String {
    hex::encode(double_sha256(data))
}

/// Computes HASH160 (RIPEMD-160 of SHA-256), the 20-byte commitment
/// used by P2SH locking scripts and Base58Check addresses
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let sha256_hash = sha256(data);
    let mut ripemd = Ripemd160::new();
    ripemd.update(&sha256_hash);
    let mut out = [0u8; 20];
    out.copy_from_slice(&ripemd.finalize());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256() {
        let data = b"hello world";
        let hash = sha256(data);
        assert_eq!(hash.len(), 32);
        assert_eq!(
            hex::encode(&hash),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_double_sha256() {
        let data = b"hello world";
        let hash = double_sha256(data);
        assert_eq!(hash.len(), 32);
        assert_eq!(hash, sha256(&sha256(data)));
        assert_eq!(double_sha256_hex(data), hex::encode(&hash));
    }

    #[test]
    fn test_hash160() {
        let digest = hash160(b"hello world");
        let mut ripemd = Ripemd160::new();
        ripemd.update(sha256(b"hello world"));
        assert_eq!(digest.as_slice(), ripemd.finalize().as_slice());
    }
}
