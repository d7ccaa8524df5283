//! Raw RPC result decoding.
//!
//! JSON-RPC returns integers as `0x`-prefixed hex quantities and call results
//! as byte strings. Balances routinely exceed 64 bits, so everything goes
//! through [`U256`] before being scaled to an `f64` for export.

use alloy_primitives::U256;

use crate::error::DecodeError;

/// Decimals of the native currency (wei → ether).
pub const ETHER_DECIMALS: u8 = 18;

/// `10^77` is the largest power of ten that fits in a `U256`.
pub const MAX_DECIMALS: u8 = 77;

/// Size of one ABI word.
pub const WORD_SIZE: usize = 32;

/// Parse a JSON-RPC hex quantity (`"0x1bc16d674ec80000"`) into a `U256`.
pub fn parse_quantity(value: &str) -> Result<U256, DecodeError> {
    let digits = strip_hex_prefix(value);
    if digits.is_empty() {
        return Err(DecodeError::InvalidQuantity {
            value: value.to_string(),
            reason: "empty quantity".into(),
        });
    }
    U256::from_str_radix(digits, 16).map_err(|e| DecodeError::InvalidQuantity {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Parse a JSON-RPC hex quantity that must fit in a `u64` (heights, nonces).
pub fn parse_quantity_u64(value: &str) -> Result<u64, DecodeError> {
    let digits = strip_hex_prefix(value);
    u64::from_str_radix(digits, 16).map_err(|e| DecodeError::InvalidQuantity {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn strip_hex_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}

/// `value / 10^decimals` as a float.
///
/// The division is done on the decimal string so that no precision is lost
/// before the final conversion; `1e18` wei with 18 decimals is exactly `1.0`.
pub fn scale(value: U256, decimals: u8) -> f64 {
    let digits = value.to_string();
    let decimals = usize::from(decimals);
    let text = if decimals == 0 {
        digits
    } else if digits.len() > decimals {
        let (int, frac) = digits.split_at(digits.len() - decimals);
        format!("{int}.{frac}")
    } else {
        format!("0.{}{digits}", "0".repeat(decimals - digits.len()))
    };
    // A plain run of ASCII digits with one dot always parses.
    text.parse::<f64>().unwrap_or(f64::NAN)
}

/// Native balance in ether.
pub fn wei_to_ether(wei: U256) -> f64 {
    scale(wei, ETHER_DECIMALS)
}

/// Interpret the last 32 bytes of a call result as an unsigned integer.
///
/// ABI return values are right-aligned words; for single-value getters the
/// interesting word is the last one. Shorter results (empty `0x` from a
/// non-contract address, truncated proxies) are rejected rather than padded.
pub fn tail_word(data: &[u8]) -> Result<U256, DecodeError> {
    if data.len() < WORD_SIZE {
        return Err(DecodeError::ShortReturnData {
            expected: WORD_SIZE,
            got: data.len(),
        });
    }
    Ok(U256::from_be_slice(&data[data.len() - WORD_SIZE..]))
}

/// Tail word scaled by `decimals`.
pub fn decode_scaled_word(data: &[u8], decimals: u8) -> Result<f64, DecodeError> {
    tail_word(data).map(|word| scale(word, decimals))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        if a == b {
            return true;
        }
        ((a - b) / b).abs() < 1e-12
    }

    #[test]
    fn parse_quantity_basic() {
        assert_eq!(parse_quantity("0x0").unwrap(), U256::ZERO);
        assert_eq!(parse_quantity("0xff").unwrap(), U256::from(255u64));
        assert_eq!(
            parse_quantity("0x0de0b6b3a7640000").unwrap(),
            U256::from(1_000_000_000_000_000_000u128)
        );
        assert!(parse_quantity("0x").is_err());
        assert!(parse_quantity("0xzz").is_err());
    }

    #[test]
    fn parse_quantity_u64_basic() {
        assert_eq!(parse_quantity_u64("0x3039").unwrap(), 12345);
        assert!(parse_quantity_u64("0x1ffffffffffffffff").is_err());
    }

    #[test]
    fn one_ether() {
        let wei = U256::from(1_000_000_000_000_000_000u128);
        assert_eq!(wei_to_ether(wei), 1.0);
    }

    #[test]
    fn scale_small_values_get_leading_zeros() {
        assert_eq!(scale(U256::from(5u64), 3), 0.005);
        assert_eq!(scale(U256::from(123u64), 0), 123.0);
        assert_eq!(scale(U256::ZERO, 18), 0.0);
    }

    #[test]
    fn scale_matches_float_division() {
        let values: [u128; 5] = [1, 42, 999_888, 123_456_789_012_345_678, u64::MAX as u128 * 7];
        for v in values {
            for s in [0u8, 2, 6, 18] {
                let expected = v as f64 / 10f64.powi(i32::from(s));
                let got = scale(U256::from(v), s);
                assert!(close(got, expected), "v={v} s={s} got={got} expected={expected}");
            }
        }
    }

    #[test]
    fn scale_beyond_u128() {
        // 2^200 wei is far beyond any integer primitive.
        let big = U256::from(1u8) << 200usize;
        let got = scale(big, 18);
        assert!(close(got, 2f64.powi(200) / 1e18));
    }

    #[test]
    fn tail_word_hundred_with_two_decimals() {
        let word = hex::decode("0000000000000000000000000000000000000000000000000000000000000064")
            .unwrap();
        assert_eq!(decode_scaled_word(&word, 2).unwrap(), 1.0);
    }

    #[test]
    fn scaled_word_matches_integer_value() {
        let cases: [(U256, f64); 5] = [
            (U256::from(1u64), 1.0),
            (U256::from(999_888u64), 999_888.0),
            (U256::from(1_000_000_000_000_000_000u128), 1e18),
            (U256::from(u128::MAX), u128::MAX as f64),
            (U256::from(1u8) << 200usize, 2f64.powi(200)),
        ];
        for (value, as_float) in cases {
            let word = value.to_be_bytes::<32>();
            for s in [0u8, 2, 6, 18] {
                let got = decode_scaled_word(&word, s).unwrap();
                let expected = as_float / 10f64.powi(i32::from(s));
                assert!(close(got, expected), "value={value} s={s} got={got} expected={expected}");
                assert_eq!(got, scale(value, s));
            }
        }
    }

    #[test]
    fn tail_word_uses_last_word_only() {
        let mut data = vec![0xffu8; 32];
        data.extend_from_slice(&[0u8; 31]);
        data.push(7);
        assert_eq!(tail_word(&data).unwrap(), U256::from(7u64));
    }

    #[test]
    fn tail_word_rejects_short_data() {
        let err = tail_word(&[0u8; 4]).unwrap_err();
        assert!(matches!(err, DecodeError::ShortReturnData { expected: 32, got: 4 }));
        assert!(tail_word(&[]).is_err());
    }
}
