//! Scalar encodings: `u64` big-endian, unsigned big-int as a raw big-endian
//! byte string, signed big-int as sign-magnitude with a one-byte prefix
//! (§6.1).

use crate::error::{Result, StorageError};
use byteorder::{BigEndian, ByteOrder};
use num_bigint::{BigInt, BigUint, Sign};

pub const SIGN_POSITIVE: u8 = 0x00;
pub const SIGN_NEGATIVE: u8 = 0x01;

pub fn encode_u64(v: u64) -> [u8; 8] {
    let mut buf = [0u8; 8];
    BigEndian::write_u64(&mut buf, v);
    buf
}

pub fn decode_u64(bytes: &[u8]) -> Result<u64> {
    if bytes.len() != 8 {
        return Err(StorageError::codec("u64", DecodeLenMismatch { expected: 8, got: bytes.len() }));
    }
    Ok(BigEndian::read_u64(bytes))
}

pub fn encode_biguint(v: &BigUint) -> Vec<u8> {
    v.to_bytes_be()
}

pub fn decode_biguint(bytes: &[u8]) -> BigUint {
    BigUint::from_bytes_be(bytes)
}

/// Sign-magnitude: one prefix byte (`0x00` positive/zero, `0x01` negative)
/// followed by the magnitude's unsigned big-endian bytes.
pub fn encode_bigint(v: &BigInt) -> Vec<u8> {
    let (sign, magnitude) = v.to_bytes_be();
    let prefix = if sign == Sign::Minus { SIGN_NEGATIVE } else { SIGN_POSITIVE };
    let mut out = Vec::with_capacity(1 + magnitude.len());
    out.push(prefix);
    out.extend_from_slice(&magnitude);
    out
}

pub fn decode_bigint(bytes: &[u8]) -> Result<BigInt> {
    let (prefix, magnitude) = bytes.split_first().ok_or_else(|| {
        StorageError::codec("bigint", DecodeLenMismatch { expected: 1, got: 0 })
    })?;
    let sign = match *prefix {
        SIGN_POSITIVE => Sign::Plus,
        SIGN_NEGATIVE => Sign::Minus,
        other => return Err(StorageError::codec("bigint", InvalidSignByte(other))),
    };
    Ok(BigInt::from_bytes_be(sign, magnitude))
}

#[derive(Debug, thiserror::Error)]
#[error("expected {expected} bytes, got {got}")]
struct DecodeLenMismatch {
    expected: usize,
    got: usize,
}

#[derive(Debug, thiserror::Error)]
#[error("invalid sign byte: {0:#04x}")]
struct InvalidSignByte(u8);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u64_round_trips() {
        for v in [0u64, 1, u64::MAX, 123_456_789] {
            let encoded = encode_u64(v);
            assert_eq!(decode_u64(&encoded).unwrap(), v);
        }
    }

    #[test]
    fn u64_decode_rejects_wrong_length() {
        assert!(decode_u64(&[1, 2, 3]).is_err());
    }

    #[test]
    fn biguint_round_trips() {
        let v = BigUint::from(123456789012345678901234567890u128);
        assert_eq!(decode_biguint(&encode_biguint(&v)), v);
    }

    #[test]
    fn bigint_round_trips_positive_and_negative() {
        for v in [BigInt::from(0), BigInt::from(42), BigInt::from(-42), BigInt::from(i64::MIN)] {
            let encoded = encode_bigint(&v);
            assert_eq!(decode_bigint(&encoded).unwrap(), v);
        }
    }

    #[test]
    fn bigint_decode_rejects_bad_sign_byte() {
        assert!(decode_bigint(&[0x02, 0x01]).is_err());
    }
}
