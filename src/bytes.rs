//! Methods to convert storages to and from byte sequences.
//!
//! The layout is a one byte class tag, the number of bins as a varint, and then the bins
//! in the class' own encoding: little-endian integers for the fixed-width classes, a
//! varint length and little-endian magnitude bytes per bin for `BigInt`, and a pair of
//! little-endian `f64` per bin for `Weighted`. An `Empty` storage has no payload.

use num_bigint::BigUint;

use crate::error::DecodeError;
use crate::growth::{Class, Counter};
use crate::storage::{AdaptiveStorage, Bins, Weight};

/// Types that can append their encoding to a byte buffer.
pub trait Encode {
    fn encode(&self, bytes: &mut Vec<u8>);
}

/// Types that can be read back from the front of a byte slice.
pub trait Decode : Sized {
    /// Reads `Self` from the front of `bytes`, advancing it past what was read.
    fn decode(bytes: &mut &[u8]) -> Result<Self, DecodeError>;
}

/// Unsigned LEB128 integers.
pub mod varint {

    use crate::error::DecodeError;

    /// The longest encoding of a `u64`.
    pub const MAX_LEN: usize = 10;

    pub fn encode(mut value: u64, bytes: &mut Vec<u8>) {
        while value >= 0x80 {
            bytes.push((value as u8) | 0x80);
            value >>= 7;
        }
        bytes.push(value as u8);
    }

    pub fn decode(bytes: &mut &[u8]) -> Result<u64, DecodeError> {
        let slice = *bytes;
        let mut value = 0u64;
        for (position, byte) in slice.iter().enumerate() {
            if position == MAX_LEN || (position == MAX_LEN - 1 && *byte > 0x01) {
                return Err(DecodeError::VarintOverflow);
            }
            value |= ((*byte & 0x7F) as u64) << (7 * position);
            if byte & 0x80 == 0 {
                *bytes = &slice[position + 1 ..];
                return Ok(value);
            }
        }
        Err(DecodeError::Truncated { needed: 1, available: 0 })
    }
}

/// Splits `len` bytes off the front of `bytes`.
#[inline]
fn take<'a>(bytes: &mut &'a [u8], len: usize) -> Result<&'a [u8], DecodeError> {
    if bytes.len() < len {
        return Err(DecodeError::Truncated { needed: len, available: bytes.len() });
    }
    let (head, tail) = bytes.split_at(len);
    *bytes = tail;
    Ok(head)
}

macro_rules! implement_encode {
    ($($index_type:ty),*) => { $(
        impl Encode for [$index_type] {
            #[inline]
            fn encode(&self, bytes: &mut Vec<u8>) {
                bytes.reserve(std::mem::size_of_val(self));
                for value in self.iter() {
                    bytes.extend_from_slice(bytemuck::bytes_of(&Counter::to_le(*value)));
                }
            }
        }
    )* }
}

implement_encode!(u8, u16, u32, u64);

/// Reads `count` little-endian counters of type `T`.
fn decode_counters<T: Counter>(bytes: &mut &[u8], count: usize) -> Result<Vec<T>, DecodeError> {
    let width = std::mem::size_of::<T>();
    let needed = count.checked_mul(width).unwrap_or(usize::MAX);
    let payload = take(bytes, needed)?;
    Ok(payload.chunks_exact(width).map(|chunk| T::from_le(bytemuck::pod_read_unaligned(chunk))).collect())
}

impl Encode for [BigUint] {
    fn encode(&self, bytes: &mut Vec<u8>) {
        for value in self.iter() {
            if value.bits() == 0 {
                varint::encode(0, bytes);
            } else {
                let digits = value.to_bytes_le();
                varint::encode(digits.len() as u64, bytes);
                bytes.extend_from_slice(&digits);
            }
        }
    }
}

fn decode_big(bytes: &mut &[u8], count: usize) -> Result<Vec<BigUint>, DecodeError> {
    // Each bin takes at least one byte, which bounds a plausible `count`.
    let mut values = Vec::with_capacity(std::cmp::min(count, bytes.len()));
    for _ in 0 .. count {
        let len = varint::decode(bytes)?;
        let len = usize::try_from(len).map_err(|_| DecodeError::VarintOverflow)?;
        values.push(BigUint::from_bytes_le(take(bytes, len)?));
    }
    Ok(values)
}

impl Encode for [Weight] {
    fn encode(&self, bytes: &mut Vec<u8>) {
        bytes.reserve(16 * self.len());
        for weight in self.iter() {
            bytes.extend_from_slice(&weight.value.to_le_bytes());
            bytes.extend_from_slice(&weight.variance.to_le_bytes());
        }
    }
}

fn decode_weights(bytes: &mut &[u8], count: usize) -> Result<Vec<Weight>, DecodeError> {
    let halves = decode_counters::<u64>(bytes, count.checked_mul(2).unwrap_or(usize::MAX))?;
    Ok(halves.chunks_exact(2).map(|pair| Weight { value: f64::from_bits(pair[0]), variance: f64::from_bits(pair[1]) }).collect())
}

impl Encode for AdaptiveStorage {
    fn encode(&self, bytes: &mut Vec<u8>) {
        bytes.push(self.class().tag());
        varint::encode(self.size() as u64, bytes);
        match self.bins() {
            Bins::Empty => { }
            Bins::U8(values) => values[..].encode(bytes),
            Bins::U16(values) => values[..].encode(bytes),
            Bins::U32(values) => values[..].encode(bytes),
            Bins::U64(values) => values[..].encode(bytes),
            Bins::BigInt(values) => values[..].encode(bytes),
            Bins::Weighted(values) => values[..].encode(bytes),
        }
    }
}

impl Decode for AdaptiveStorage {
    fn decode(bytes: &mut &[u8]) -> Result<Self, DecodeError> {
        let tag = take(bytes, 1)?[0];
        let class = Class::from_tag(tag).ok_or(DecodeError::UnknownTag(tag))?;
        let size = usize::try_from(varint::decode(bytes)?).map_err(|_| DecodeError::VarintOverflow)?;
        let bins = match class {
            Class::Empty => Bins::Empty,
            Class::U8 => Bins::U8(decode_counters(bytes, size)?),
            Class::U16 => Bins::U16(decode_counters(bytes, size)?),
            Class::U32 => Bins::U32(decode_counters(bytes, size)?),
            Class::U64 => Bins::U64(decode_counters(bytes, size)?),
            Class::BigInt => Bins::BigInt(decode_big(bytes, size)?),
            Class::Weighted => Bins::Weighted(decode_weights(bytes, size)?),
        };
        Ok(AdaptiveStorage::from_parts(size, bins))
    }
}

/// The byte encoding of `storage`.
pub fn serialize(storage: &AdaptiveStorage) -> Vec<u8> {
    let mut bytes = Vec::new();
    storage.encode(&mut bytes);
    bytes
}

/// Reconstructs a storage from exactly the bytes `serialize` produced.
pub fn deserialize(mut bytes: &[u8]) -> Result<AdaptiveStorage, DecodeError> {
    let result = AdaptiveStorage::decode(&mut bytes).and_then(|storage| {
        if bytes.is_empty() { Ok(storage) }
        else { Err(DecodeError::LengthMismatch { expected: storage.size(), actual: bytes.len() }) }
    });
    if let Err(error) = &result {
        tracing::debug!(%error, "rejecting storage payload");
    }
    result
}

#[cfg(feature = "serde")]
mod serde_impl {

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::storage::AdaptiveStorage;

    impl Serialize for AdaptiveStorage {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_bytes(&super::serialize(self))
        }
    }

    impl<'de> Deserialize<'de> for AdaptiveStorage {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let bytes = Vec::<u8>::deserialize(deserializer)?;
            super::deserialize(&bytes).map_err(serde::de::Error::custom)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::Error;

    /// One storage per class, each holding a one in its first bin.
    fn one_of_each() -> Vec<AdaptiveStorage> {
        vec![
            AdaptiveStorage::new(1),
            AdaptiveStorage::from_parts(1, Bins::U8(vec![1])),
            AdaptiveStorage::from_parts(1, Bins::U16(vec![1])),
            AdaptiveStorage::from_parts(1, Bins::U32(vec![1])),
            AdaptiveStorage::from_parts(1, Bins::U64(vec![1])),
            AdaptiveStorage::from_parts(1, Bins::BigInt(vec![BigUint::from(1u32)])),
            AdaptiveStorage::from_parts(1, Bins::Weighted(vec![Weight { value: 1.0, variance: 1.0 }])),
        ]
    }

    #[test]
    fn varints() {
        for value in [0, 1, 127, 128, 300, u32::MAX as u64, u64::MAX] {
            let mut bytes = Vec::new();
            varint::encode(value, &mut bytes);
            assert!(bytes.len() <= varint::MAX_LEN);
            let mut slice = &bytes[..];
            assert_eq!(varint::decode(&mut slice), Ok(value));
            assert!(slice.is_empty());
        }
        let mut bytes = Vec::new();
        varint::encode(300, &mut bytes);
        assert_eq!(bytes, vec![0xAC, 0x02]);
        assert_eq!(varint::decode(&mut &[0x80u8][..]), Err(DecodeError::Truncated { needed: 1, available: 0 }));
        assert_eq!(varint::decode(&mut &[0xFFu8; 11][..]), Err(DecodeError::VarintOverflow));
    }

    #[test]
    fn layout() {
        let mut s = AdaptiveStorage::new(2);
        assert_eq!(serialize(&s), vec![0, 2]);
        s.increase(1).unwrap();
        assert_eq!(serialize(&s), vec![1, 2, 0, 1]);
        for _ in 0 .. 255 { s.increase(1).unwrap(); }
        assert_eq!(serialize(&s), vec![2, 2, 0, 0, 0, 1]);
        s.increase_weighted(0, 0.5).unwrap();
        let bytes = serialize(&s);
        assert_eq!(bytes.len(), 2 + 2 * 16);
        assert_eq!(&bytes[2 .. 10], &0.5f64.to_le_bytes());
        assert_eq!(&bytes[10 .. 18], &0.25f64.to_le_bytes());
    }

    #[test]
    fn round_trip_each_class() {
        for storage in one_of_each() {
            let other = deserialize(&serialize(&storage)).unwrap();
            assert_eq!(other.class(), storage.class());
            assert!(other == storage);
        }
        assert!(deserialize(&serialize(&one_of_each()[1])).unwrap() != AdaptiveStorage::new(1));
    }

    #[test]
    fn round_trip_after_promotion() {
        let mut s = AdaptiveStorage::from_parts(3, Bins::U64(vec![u64::MAX, 0, 5]));
        s.increase(0).unwrap();
        s.increase(1).unwrap();
        let other = deserialize(&serialize(&s)).unwrap();
        assert_eq!(other.class(), Class::BigInt);
        assert!(other == s);
        assert_eq!(other.count(0).unwrap().unwrap().to_string(), "18446744073709551616");
        assert_eq!(other.value(2), Ok(5.0));
    }

    #[test]
    fn rejects_malformed() {
        assert_eq!(deserialize(&[]), Err(DecodeError::Truncated { needed: 1, available: 0 }));
        assert_eq!(deserialize(&[7, 1, 0]), Err(DecodeError::UnknownTag(7)));
        assert_eq!(deserialize(&[3, 2, 1, 0, 0, 0]), Err(DecodeError::Truncated { needed: 8, available: 4 }));
        assert_eq!(deserialize(&[1, 1, 1, 9]), Err(DecodeError::LengthMismatch { expected: 1, actual: 1 }));
        assert_eq!(deserialize(&[0, 1, 0]), Err(DecodeError::LengthMismatch { expected: 1, actual: 1 }));
        assert_eq!(deserialize(&[5, 1, 3, 1, 2]), Err(DecodeError::Truncated { needed: 3, available: 2 }));
        assert!(deserialize(&[6, 1, 0, 0, 0, 0, 0, 0, 0, 0]).is_err());
        let huge = [1u8, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x7F];
        assert!(matches!(deserialize(&huge), Err(DecodeError::Truncated { .. })));
        let error: Error = DecodeError::UnknownTag(9).into();
        assert_eq!(error, Error::Decode(DecodeError::UnknownTag(9)));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_round_trip() {
        for storage in one_of_each() {
            let encoded = bincode::serialize(&storage).unwrap();
            let decoded: AdaptiveStorage = bincode::deserialize(&encoded).unwrap();
            assert!(decoded == storage);

            let json = serde_json::to_string(&storage).unwrap();
            let decoded: AdaptiveStorage = serde_json::from_str(&json).unwrap();
            assert!(decoded == storage);
        }
        assert!(serde_json::from_str::<AdaptiveStorage>("[9, 1]").is_err());
    }
}
