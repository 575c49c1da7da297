//! Bin counters that adapt their width to the largest count they hold.
//!
//! An `AdaptiveStorage` keeps all of its bins in one homogeneous buffer, whose element
//! type is the current representation `Class`. It starts out with no buffer at all,
//! and each time an addition would overflow the current element type the whole buffer
//! is re-encoded in the narrowest wider type that admits the result. Counts are never
//! lost: the chain ends in arbitrary precision integers, and weighted fills move the
//! storage to a pair of floating sums that it then keeps for good.

use std::ops::AddAssign;

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};

use crate::error::Error;
use crate::growth::{self, Class, Counter};
use crate::HeapSize;

/// The capabilities a histogram needs from its bin storage.
pub trait Storage {
    /// A storage of `size` bins, all zero.
    fn with_size(size: usize) -> Self where Self: Sized;
    /// The number of bins.
    fn size(&self) -> usize;
    /// Adds one to bin `index`.
    fn increase(&mut self, index: usize) -> Result<(), Error>;
    /// Adds `weight` to bin `index`.
    fn increase_weighted(&mut self, index: usize, weight: f64) -> Result<(), Error>;
    /// The count or sum of weights in bin `index`.
    fn value(&self, index: usize) -> Result<f64, Error>;
    /// The variance estimate for bin `index`.
    fn variance(&self, _index: usize) -> Result<f64, Error> {
        Err(Error::UnsupportedOperation("variance"))
    }
}

/// A sum of weights and a sum of squared weights.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Weight {
    pub value: f64,
    pub variance: f64,
}

impl Weight {
    /// The accumulation of `count` unit-weight fills.
    #[inline(always)]
    pub fn poisson(count: f64) -> Self { Weight { value: count, variance: count } }
    /// The accumulation of a single fill with weight `weight`.
    #[inline(always)]
    pub fn single(weight: f64) -> Self { Weight { value: weight, variance: weight * weight } }
}

impl AddAssign for Weight {
    #[inline(always)]
    fn add_assign(&mut self, other: Self) {
        self.value += other.value;
        self.variance += other.variance;
    }
}

/// The buffer of an `AdaptiveStorage`, one variant per representation class.
#[derive(Clone, Debug, Default)]
pub enum Bins {
    #[default]
    Empty,
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    U64(Vec<u64>),
    BigInt(Vec<BigUint>),
    Weighted(Vec<Weight>),
}

/// A read-only view of one bin, in whatever form the buffer holds it.
#[derive(Copy, Clone, Debug)]
pub(crate) enum Entry<'a> {
    Int(u64),
    Big(&'a BigUint),
    Weight(Weight),
}

impl Entry<'_> {
    #[inline]
    pub(crate) fn value(&self) -> f64 {
        match self {
            Entry::Int(count) => *count as f64,
            Entry::Big(count) => count.to_f64().unwrap_or(f64::INFINITY),
            Entry::Weight(weight) => weight.value,
        }
    }
    #[inline]
    pub(crate) fn variance(&self) -> f64 {
        match self {
            Entry::Weight(weight) => weight.variance,
            _ => self.value(),
        }
    }
}

impl PartialEq for Entry<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Entry::Int(a), Entry::Int(b)) => a == b,
            (Entry::Big(a), Entry::Big(b)) => a == b,
            (Entry::Int(a), Entry::Big(b)) | (Entry::Big(b), Entry::Int(a)) => b.to_u64() == Some(*a),
            (Entry::Weight(a), Entry::Weight(b)) => a == b,
            // Only one side tracks variance, so only values are compared.
            (Entry::Weight(w), other) | (other, Entry::Weight(w)) => w.value == other.value(),
        }
    }
}

impl Bins {
    /// The representation class of the buffer.
    pub fn class(&self) -> Class {
        match self {
            Bins::Empty => Class::Empty,
            Bins::U8(_) => Class::U8,
            Bins::U16(_) => Class::U16,
            Bins::U32(_) => Class::U32,
            Bins::U64(_) => Class::U64,
            Bins::BigInt(_) => Class::BigInt,
            Bins::Weighted(_) => Class::Weighted,
        }
    }

    #[inline]
    pub(crate) fn entry(&self, index: usize) -> Entry<'_> {
        match self {
            Bins::Empty => Entry::Int(0),
            Bins::U8(values) => Entry::Int(values[index].to_u64()),
            Bins::U16(values) => Entry::Int(values[index].to_u64()),
            Bins::U32(values) => Entry::Int(values[index].to_u64()),
            Bins::U64(values) => Entry::Int(values[index]),
            Bins::BigInt(values) => Entry::Big(&values[index]),
            Bins::Weighted(values) => Entry::Weight(values[index]),
        }
    }
}

/// An array of bin counters whose width grows to fit the largest count.
#[derive(Clone, Debug, Default)]
pub struct AdaptiveStorage {
    size: usize,
    bins: Bins,
}

impl AdaptiveStorage {
    /// A storage of `size` bins, all zero, without allocating.
    pub fn new(size: usize) -> Self {
        AdaptiveStorage { size, bins: Bins::Empty }
    }

    /// Assembles a storage from a buffer, which must hold `size` entries unless empty.
    pub(crate) fn from_parts(size: usize, bins: Bins) -> Self {
        AdaptiveStorage { size, bins }
    }

    #[inline(always)]
    pub fn size(&self) -> usize { self.size }

    /// The representation class currently shared by all bins.
    #[inline(always)]
    pub fn class(&self) -> Class { self.bins.class() }

    /// The buffer backing the bins.
    #[inline(always)]
    pub fn bins(&self) -> &Bins { &self.bins }

    #[inline(always)]
    fn check(&self, index: usize) -> Result<(), Error> {
        if index < self.size { Ok(()) }
        else { Err(Error::IndexOutOfRange { index, size: self.size }) }
    }

    /// Adds one to bin `index`, widening every bin first if the count would overflow.
    #[inline]
    pub fn increase(&mut self, index: usize) -> Result<(), Error> {
        self.check(index)?;
        self.add_count(index, 1);
        Ok(())
    }

    /// Adds `weight` to bin `index` and `weight * weight` to its variance.
    ///
    /// The first weighted fill converts every bin to `Weighted`, treating the counts
    /// accumulated so far as unit-weight fills.
    pub fn increase_weighted(&mut self, index: usize, weight: f64) -> Result<(), Error> {
        self.check(index)?;
        self.add_weight(index, Weight::single(weight));
        Ok(())
    }

    /// The count, or sum of weights, in bin `index`.
    pub fn value(&self, index: usize) -> Result<f64, Error> {
        self.check(index)?;
        Ok(self.bins.entry(index).value())
    }

    /// The variance of bin `index`.
    ///
    /// Integer classes report the count itself, which is the Poisson estimate.
    pub fn variance(&self, index: usize) -> Result<f64, Error> {
        self.check(index)?;
        Ok(self.bins.entry(index).variance())
    }

    /// The exact count in bin `index`, or `None` once the storage is weighted.
    pub fn count(&self, index: usize) -> Result<Option<BigUint>, Error> {
        self.check(index)?;
        Ok(match self.bins.entry(index) {
            Entry::Int(count) => Some(BigUint::from(count)),
            Entry::Big(count) => Some(count.clone()),
            Entry::Weight(_) => None,
        })
    }

    /// Replaces the contents with `size` zero bins, releasing the buffer.
    pub fn reset(&mut self) {
        *self = AdaptiveStorage::new(self.size);
    }

    /// Moves the contents out, leaving `self` as empty bins of the same size.
    pub fn take(&mut self) -> Self {
        std::mem::replace(self, AdaptiveStorage::new(self.size))
    }

    /// Replaces the contents with a copy of a fixed-width container.
    pub fn assign<T: Counter>(&mut self, other: &crate::ContainerStorage<T>) {
        *self = AdaptiveStorage::from(other);
    }

    /// Adds `delta` to bin `index`, which must be in bounds.
    pub(crate) fn add_count(&mut self, index: usize, delta: u64) {
        if delta == 0 { return; }
        let required = match &mut self.bins {
            Bins::Empty => Class::for_u64(delta),
            Bins::U8(values) => match growth::try_add(&mut values[index], delta) { Ok(()) => return, Err(class) => class },
            Bins::U16(values) => match growth::try_add(&mut values[index], delta) { Ok(()) => return, Err(class) => class },
            Bins::U32(values) => match growth::try_add(&mut values[index], delta) { Ok(()) => return, Err(class) => class },
            Bins::U64(values) => match growth::try_add(&mut values[index], delta) { Ok(()) => return, Err(class) => class },
            Bins::BigInt(values) => { values[index] += delta; return; }
            Bins::Weighted(values) => { values[index] += Weight::poisson(delta as f64); return; }
        };
        self.promote(required);
        self.add_count(index, delta);
    }

    /// Adds an arbitrary precision `delta` to bin `index`, which must be in bounds.
    pub(crate) fn add_big(&mut self, index: usize, delta: &BigUint) {
        if let Some(delta) = delta.to_u64() {
            return self.add_count(index, delta);
        }
        if self.class() < Class::BigInt {
            self.promote(Class::BigInt);
        }
        match &mut self.bins {
            Bins::BigInt(values) => values[index] += delta,
            Bins::Weighted(values) => values[index] += Weight::poisson(delta.to_f64().unwrap_or(f64::INFINITY)),
            _ => unreachable!("promotion to BigInt leaves at least BigInt"),
        }
    }

    /// Adds an accumulated `weight` to bin `index`, which must be in bounds.
    pub(crate) fn add_weight(&mut self, index: usize, weight: Weight) {
        self.promote(Class::Weighted);
        if let Bins::Weighted(values) = &mut self.bins {
            values[index] += weight;
        }
    }

    /// Re-encodes every bin in `target`, if `target` is wider than the current class.
    pub(crate) fn promote(&mut self, target: Class) {
        let current = self.class();
        if target <= current { return; }
        tracing::trace!(from = ?current, to = ?target, bins = self.size, "promoting storage");
        let bins = match target {
            Class::Empty => Bins::Empty,
            Class::U8 => Bins::U8(self.collect_fixed()),
            Class::U16 => Bins::U16(self.collect_fixed()),
            Class::U32 => Bins::U32(self.collect_fixed()),
            Class::U64 => Bins::U64(self.collect_fixed()),
            Class::BigInt => Bins::BigInt(self.collect_big()),
            Class::Weighted => Bins::Weighted((0 .. self.size).map(|index| Weight::poisson(self.bins.entry(index).value())).collect()),
        };
        self.bins = bins;
    }

    fn collect_fixed<T: Counter>(&self) -> Vec<T> {
        if let Bins::Empty = self.bins {
            return vec![T::default(); self.size];
        }
        (0 .. self.size).map(|index| match self.bins.entry(index) {
            Entry::Int(count) => T::from_u64_truncating(count),
            _ => unreachable!("promotion only widens integer classes"),
        }).collect()
    }

    fn collect_big(&self) -> Vec<BigUint> {
        if let Bins::Empty = self.bins {
            return vec![BigUint::zero(); self.size];
        }
        (0 .. self.size).map(|index| match self.bins.entry(index) {
            Entry::Int(count) => BigUint::from(count),
            Entry::Big(count) => count.clone(),
            Entry::Weight(_) => unreachable!("weighted storage is never narrowed"),
        }).collect()
    }
}

impl Storage for AdaptiveStorage {
    fn with_size(size: usize) -> Self { AdaptiveStorage::new(size) }
    #[inline(always)] fn size(&self) -> usize { self.size }
    #[inline(always)] fn increase(&mut self, index: usize) -> Result<(), Error> { AdaptiveStorage::increase(self, index) }
    fn increase_weighted(&mut self, index: usize, weight: f64) -> Result<(), Error> { AdaptiveStorage::increase_weighted(self, index, weight) }
    fn value(&self, index: usize) -> Result<f64, Error> { AdaptiveStorage::value(self, index) }
    fn variance(&self, index: usize) -> Result<f64, Error> { AdaptiveStorage::variance(self, index) }
}

impl PartialEq for AdaptiveStorage {
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size && (0 .. self.size).all(|index| self.bins.entry(index) == other.bins.entry(index))
    }
}

impl<'a> AddAssign<&'a AdaptiveStorage> for AdaptiveStorage {
    /// Adds `rhs` bin by bin, widening as needed.
    ///
    /// # Panics
    ///
    /// Panics if the two storages have different sizes.
    fn add_assign(&mut self, rhs: &'a AdaptiveStorage) {
        assert_eq!(self.size, rhs.size, "storages of different sizes cannot be added");
        match &rhs.bins {
            Bins::Empty => { }
            Bins::Weighted(values) => {
                self.promote(Class::Weighted);
                for (index, weight) in values.iter().enumerate() {
                    self.add_weight(index, *weight);
                }
            }
            Bins::BigInt(values) => {
                for (index, delta) in values.iter().enumerate() {
                    self.add_big(index, delta);
                }
            }
            bins => {
                for index in 0 .. rhs.size {
                    if let Entry::Int(delta) = bins.entry(index) {
                        self.add_count(index, delta);
                    }
                }
            }
        }
    }
}

impl HeapSize for AdaptiveStorage {
    fn heap_size(&self) -> (usize, usize) {
        match &self.bins {
            Bins::Empty => (0, 0),
            Bins::U8(values) => values.heap_size(),
            Bins::U16(values) => values.heap_size(),
            Bins::U32(values) => values.heap_size(),
            Bins::U64(values) => values.heap_size(),
            Bins::BigInt(values) => values.heap_size(),
            Bins::Weighted(values) => values.heap_size(),
        }
    }
}
