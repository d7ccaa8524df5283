//! Drift fingerprints for cross-replica consistency checks.
//!
//! A fingerprint is `low_hex_digit(hash) + block_number % 100`. Two endpoints
//! that agree on a block always produce the same number; a dashboard plotting
//! one series per replica shows divergence as a visible gap. It is a cheap
//! monitoring signal and collides by construction.

use alloy_primitives::B256;

use crate::types::BlockHeader;

/// Block numbers are folded into `[0, 100)`.
pub const BLOCK_NUMBER_MODULUS: u64 = 100;

/// The lowest hex digit of a hash (`...a` → 10).
pub fn low_digit(hash: &B256) -> u64 {
    u64::from(hash[31] & 0x0f)
}

/// Fingerprint of one hash observed at `block_number`.
pub fn fingerprint(hash: &B256, block_number: u64) -> u64 {
    block_number % BLOCK_NUMBER_MODULUS + low_digit(hash)
}

/// The pair of fingerprints exported for one replica per check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockFingerprints {
    pub block_hash: u64,
    pub state_root: u64,
}

impl BlockFingerprints {
    pub fn of(header: &BlockHeader) -> Self {
        Self {
            block_hash: fingerprint(&header.hash, header.number),
            state_root: fingerprint(&header.state_root, header.number),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash_ending_in(last: u8) -> B256 {
        let mut bytes = [0x11u8; 32];
        bytes[31] = last;
        B256::from(bytes)
    }

    #[test]
    fn low_digit_of_hash() {
        assert_eq!(low_digit(&hash_ending_in(0x3a)), 10);
        assert_eq!(low_digit(&hash_ending_in(0xf0)), 0);
        assert_eq!(low_digit(&hash_ending_in(0x0f)), 15);
    }

    #[test]
    fn fingerprint_at_height_12345() {
        // 12345 % 100 = 45, hash ends in `a` = 10.
        assert_eq!(fingerprint(&hash_ending_in(0x9a), 12345), 55);
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let header = BlockHeader {
            number: 19_000_042,
            hash: hash_ending_in(0xc7),
            state_root: hash_ending_in(0x02),
        };
        assert_eq!(BlockFingerprints::of(&header), BlockFingerprints::of(&header));
        assert_eq!(
            BlockFingerprints::of(&header),
            BlockFingerprints {
                block_hash: 42 + 7,
                state_root: 42 + 2,
            }
        );
    }

    #[test]
    fn diverging_replicas_differ() {
        let a = BlockHeader {
            number: 100,
            hash: hash_ending_in(0x01),
            state_root: hash_ending_in(0x01),
        };
        let b = BlockHeader {
            hash: hash_ending_in(0x02),
            ..a
        };
        assert_ne!(BlockFingerprints::of(&a), BlockFingerprints::of(&b));
    }
}
