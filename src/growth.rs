//! Rules for when a bin counter must widen, and to what.
//!
//! Counters live in one of a fixed chain of representation classes, each able to
//! hold strictly more than the last. An addition is tested against the current
//! class before it is committed; if the result would not fit, the caller learns
//! the narrowest class that does admit it. The chain ends in an arbitrary
//! precision integer, so there is always such a class.
//!
//! Weighted accumulation sits outside the chain: it is entered by choice (the
//! first weighted fill) rather than by overflow, and is never left.

use num_bigint::BigUint;
use num_traits::ToPrimitive;

use crate::storage::Bins;

/// The encoding shared by every bin of one storage.
///
/// The derived order is the promotion order; `Weighted` absorbs everything.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Class {
    /// No allocation; every bin is zero.
    Empty,
    U8,
    U16,
    U32,
    U64,
    /// Arbitrary precision unsigned integers.
    BigInt,
    /// A floating sum of weights and a floating sum of squared weights.
    Weighted,
}

impl Class {
    /// The persisted tag for this class.
    #[inline(always)]
    pub fn tag(self) -> u8 { self as u8 }

    /// The class for a persisted tag, should one exist.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Class::Empty),
            1 => Some(Class::U8),
            2 => Some(Class::U16),
            3 => Some(Class::U32),
            4 => Some(Class::U64),
            5 => Some(Class::BigInt),
            6 => Some(Class::Weighted),
            _ => None,
        }
    }

    /// The narrowest integer class that can hold `value`.
    #[inline]
    pub fn for_u64(value: u64) -> Self {
        if value <= u8::MAX as u64 { Class::U8 }
        else if value <= u16::MAX as u64 { Class::U16 }
        else if value <= u32::MAX as u64 { Class::U32 }
        else { Class::U64 }
    }

    /// The narrowest integer class that can hold `value`, including `BigInt`.
    pub fn for_big(value: &BigUint) -> Self {
        match value.to_u64() {
            Some(value) => Class::for_u64(value),
            None => Class::BigInt,
        }
    }

    /// The least class at least as wide as both arguments.
    #[inline(always)]
    pub fn join(self, other: Self) -> Self { std::cmp::max(self, other) }

    /// Whether this class holds exact integer counts.
    #[inline(always)]
    pub fn is_integral(self) -> bool { self != Class::Weighted }
}

/// The narrowest class that holds `current + delta`.
///
/// Overflowing `u64` lands in `BigInt`, which admits any magnitude.
#[inline]
pub fn required_class(current: u64, delta: u64) -> Class {
    match current.checked_add(delta) {
        Some(sum) => Class::for_u64(sum),
        None => Class::BigInt,
    }
}

/// Adds `delta` to `slot` if the sum fits in `T`.
///
/// On overflow `slot` is untouched and the class that would admit the sum is returned.
#[inline(always)]
pub fn try_add<T: Counter>(slot: &mut T, delta: u64) -> Result<(), Class> {
    match slot.checked_add_u64(delta) {
        Some(sum) => { *slot = sum; Ok(()) }
        None => Err(required_class(slot.to_u64(), delta)),
    }
}

/// A fixed-width unsigned counter occupying one class of the chain.
pub trait Counter : bytemuck::Pod + crate::HeapSize + Default + Eq + Ord + std::fmt::Debug + Send + Sync + 'static {
    /// The class this type encodes.
    const CLASS: Class;
    /// The largest representable count.
    const MAX: Self;

    fn to_u64(self) -> u64;
    /// Converts from `u64`, truncating; callers establish that `value` fits.
    fn from_u64_truncating(value: u64) -> Self;
    /// Adds `delta`, or `None` if the sum exceeds `Self::MAX`.
    fn checked_add_u64(self, delta: u64) -> Option<Self>;
    /// Adds one, wrapping at `Self::MAX`.
    fn wrapping_increment(self) -> Self;
    /// Converts between native and little-endian byte order.
    fn to_le(self) -> Self;
    fn from_le(self) -> Self;
    /// Wraps a buffer of this type as storage bins.
    fn into_bins(values: Vec<Self>) -> Bins;
}

macro_rules! implement_counter {
    ($($index_type:ty => $class:ident),*) => { $(
        impl Counter for $index_type {
            const CLASS: Class = Class::$class;
            const MAX: Self = <$index_type>::MAX;

            #[inline(always)] fn to_u64(self) -> u64 { self as u64 }
            #[inline(always)] fn from_u64_truncating(value: u64) -> Self {
                debug_assert!(value <= <$index_type>::MAX as u64);
                value as $index_type
            }
            #[inline(always)] fn checked_add_u64(self, delta: u64) -> Option<Self> {
                <$index_type>::try_from(delta).ok().and_then(|delta| self.checked_add(delta))
            }
            #[inline(always)] fn wrapping_increment(self) -> Self { self.wrapping_add(1) }
            #[inline(always)] fn to_le(self) -> Self { <$index_type>::to_le(self) }
            #[inline(always)] fn from_le(self) -> Self { <$index_type>::from_le(self) }
            #[inline(always)] fn into_bins(values: Vec<Self>) -> Bins { Bins::$class(values) }
        }
    )* }
}

implement_counter!(u8 => U8, u16 => U16, u32 => U32, u64 => U64);
