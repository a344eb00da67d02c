//! Sentinel-prefixed bit paths and big integer byte conversions

use num_bigint::BigUint;

/// Arbitrary bytes reinterpreted as a tree address.
///
/// A synthetic leading `1` bit is prepended so leading zero bits of the
/// data survive the integer form. The root address is the bare sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitString(BigUint);

impl BitString {
    pub fn new(data: &[u8]) -> Self {
        let mut bytes = Vec::with_capacity(data.len() + 1);
        bytes.push(1);
        bytes.extend_from_slice(data);
        Self(BigUint::from_bytes_be(&bytes))
    }

    pub fn to_big_uint(&self) -> BigUint {
        self.0.clone()
    }
}

/// Minimal big-endian bytes of an unsigned integer; zero encodes as empty
pub fn big_uint_to_bytes(value: &BigUint) -> Vec<u8> {
    if *value == BigUint::from(0u32) {
        return Vec::new();
    }

    value.to_bytes_be()
}

/// Inverse of [`big_uint_to_bytes`]
pub fn big_uint_from_bytes(bytes: &[u8]) -> BigUint {
    BigUint::from_bytes_be(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_preserves_leading_zeros() {
        let a = BitString::new(&[0x00, 0x01]);
        let b = BitString::new(&[0x01]);
        assert_ne!(a, b);
        assert_eq!(a.to_big_uint(), BigUint::from(0x010001u32));
        assert_eq!(b.to_big_uint(), BigUint::from(0x0101u32));
    }

    #[test]
    fn test_empty_data_is_bare_sentinel() {
        assert_eq!(BitString::new(&[]).to_big_uint(), BigUint::from(1u32));
    }

    #[test]
    fn test_byte_conversion_roundtrip() {
        let value = BigUint::from(0x01_ff_00u32);
        assert_eq!(big_uint_to_bytes(&value), vec![0x01, 0xff, 0x00]);
        assert_eq!(big_uint_from_bytes(&big_uint_to_bytes(&value)), value);
    }

    #[test]
    fn test_zero_encodes_as_empty() {
        let zero = BigUint::from(0u32);
        assert!(big_uint_to_bytes(&zero).is_empty());
        assert_eq!(big_uint_from_bytes(&[]), zero);
    }
}
