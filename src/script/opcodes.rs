//! Script opcodes
//!
//! The subset of Bitcoin script opcodes needed by the P2SH multisig
//! templates: small-number pushes, data pushes, and the hash/compare/
//! checkmultisig operations.

/// Push an empty byte vector (the CHECKMULTISIG dummy stack item)
pub const OP_0: u8 = 0x00;

/// Next byte is the length of data to push
pub const OP_PUSHDATA1: u8 = 0x4c;

/// Next two bytes (little-endian) are the length of data to push
pub const OP_PUSHDATA2: u8 = 0x4d;

/// Push the number 1 onto the stack
pub const OP_1: u8 = 0x51;

/// Push the number 16 onto the stack
pub const OP_16: u8 = 0x60;

/// Pop two items and push 1 if they are equal, 0 otherwise
pub const OP_EQUAL: u8 = 0x87;

/// Pop the top item and push its HASH160
pub const OP_HASH160: u8 = 0xa9;

/// Verify m-of-n signatures against public keys, in relative order
pub const OP_CHECKMULTISIG: u8 = 0xae;

/// Encode a small number 1..=16 as its push opcode (OP_1..OP_16)
pub fn op_n(n: u8) -> Option<u8> {
    if (1..=16).contains(&n) {
        Some(OP_1 + n - 1)
    } else {
        None
    }
}

/// Decode an OP_1..OP_16 opcode back to its number
pub fn decode_op_n(opcode: u8) -> Option<u8> {
    if (OP_1..=OP_16).contains(&opcode) {
        Some(opcode - OP_1 + 1)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_n_encoding() {
        assert_eq!(op_n(1), Some(OP_1));
        assert_eq!(op_n(16), Some(OP_16));
        assert_eq!(op_n(0), None);
        assert_eq!(op_n(17), None);
    }

    #[test]
    fn test_op_n_round_trip() {
        for n in 1..=16u8 {
            assert_eq!(decode_op_n(op_n(n).unwrap()), Some(n));
        }
        assert_eq!(decode_op_n(OP_0), None);
        assert_eq!(decode_op_n(OP_CHECKMULTISIG), None);
    }
}
