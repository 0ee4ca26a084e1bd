//! Cryptographic primitives
//!
//! Hashing (SHA-256, HASH160) and secp256k1 ECDSA key handling with
//! DER signature encoding.

pub mod hash;
pub mod keys;

pub use hash::{double_sha256, double_sha256_hex, hash160, sha256};
pub use keys::{public_key_from_hex, sign_der, verify_der_signature, KeyError, KeyPair};
