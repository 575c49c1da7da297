//! Bin counters of one fixed integer type, without growth.
//!
//! This is the plain `Vec<T>` baseline that adaptive storage converts from and compares
//! against. Counts wrap at `T::MAX`, and there is no variance or weighted accumulation.

use std::ops::AddAssign;

use crate::error::Error;
use crate::growth::Counter;
use crate::storage::{AdaptiveStorage, Entry, Storage};
use crate::HeapSize;

/// A storage backed by a `Vec<T>` of fixed-width counters.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContainerStorage<T> {
    pub values: Vec<T>,
}

impl<T: Counter> ContainerStorage<T> {
    /// A storage of `size` zero counters.
    pub fn new(size: usize) -> Self {
        ContainerStorage { values: vec![T::default(); size] }
    }

    #[inline(always)]
    pub fn size(&self) -> usize { self.values.len() }

    /// Adds one to bin `index`, wrapping at `T::MAX`.
    #[inline]
    pub fn increase(&mut self, index: usize) -> Result<(), Error> {
        let size = self.values.len();
        let slot = self.values.get_mut(index).ok_or(Error::IndexOutOfRange { index, size })?;
        *slot = slot.wrapping_increment();
        Ok(())
    }

    /// The count in bin `index`.
    pub fn get(&self, index: usize) -> Result<T, Error> {
        self.values.get(index).copied().ok_or(Error::IndexOutOfRange { index, size: self.values.len() })
    }
}

impl<T: Counter> Storage for ContainerStorage<T> {
    fn with_size(size: usize) -> Self { ContainerStorage::new(size) }
    #[inline(always)] fn size(&self) -> usize { self.values.len() }
    #[inline(always)] fn increase(&mut self, index: usize) -> Result<(), Error> { ContainerStorage::increase(self, index) }
    fn increase_weighted(&mut self, _index: usize, _weight: f64) -> Result<(), Error> {
        Err(Error::UnsupportedOperation("weighted increase"))
    }
    fn value(&self, index: usize) -> Result<f64, Error> {
        self.get(index).map(|count| count.to_u64() as f64)
    }
}

impl<T: Counter> HeapSize for ContainerStorage<T> {
    fn heap_size(&self) -> (usize, usize) { self.values.heap_size() }
}

impl<'a, T: Counter> From<&'a ContainerStorage<T>> for AdaptiveStorage {
    /// Copies the counters into the class of `T`, which holds any value of `T`.
    fn from(other: &'a ContainerStorage<T>) -> Self {
        AdaptiveStorage::from_parts(other.values.len(), T::into_bins(other.values.clone()))
    }
}

impl<T: Counter> From<ContainerStorage<T>> for AdaptiveStorage {
    fn from(other: ContainerStorage<T>) -> Self {
        AdaptiveStorage::from_parts(other.values.len(), T::into_bins(other.values))
    }
}

impl<'a, T: Counter> AddAssign<&'a ContainerStorage<T>> for AdaptiveStorage {
    /// Adds the counters bin by bin, widening as needed.
    ///
    /// # Panics
    ///
    /// Panics if the two storages have different sizes.
    fn add_assign(&mut self, rhs: &'a ContainerStorage<T>) {
        assert_eq!(self.size(), rhs.values.len(), "storages of different sizes cannot be added");
        for (index, count) in rhs.values.iter().enumerate() {
            self.add_count(index, count.to_u64());
        }
    }
}

impl<T: Counter> PartialEq<ContainerStorage<T>> for AdaptiveStorage {
    fn eq(&self, other: &ContainerStorage<T>) -> bool {
        self.size() == other.values.len()
            && other.values.iter().enumerate().all(|(index, count)| self.bins().entry(index) == Entry::Int(count.to_u64()))
    }
}

impl<T: Counter> PartialEq<AdaptiveStorage> for ContainerStorage<T> {
    #[inline(always)]
    fn eq(&self, other: &AdaptiveStorage) -> bool { other == self }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::growth::Class;

    #[test]
    fn fixed_width_counts() {
        let mut c = ContainerStorage::<u8>::new(2);
        assert_eq!(c.size(), 2);
        for _ in 0 .. 255 { c.increase(1).unwrap(); }
        assert_eq!(c.get(1), Ok(255));
        c.increase(1).unwrap();
        assert_eq!(c.get(1), Ok(0));
        assert_eq!(c.increase(2), Err(Error::IndexOutOfRange { index: 2, size: 2 }));
        assert_eq!(Storage::variance(&c, 0), Err(Error::UnsupportedOperation("variance")));
        assert_eq!(c.increase_weighted(0, 1.0), Err(Error::UnsupportedOperation("weighted increase")));
    }

    #[test]
    fn equal_to_adaptive() {
        let mut c = ContainerStorage::<u32>::new(1);
        let mut a = AdaptiveStorage::new(1);
        assert!(c == a);
        c.increase(0).unwrap();
        assert!(c != a);
        a.increase(0).unwrap();
        assert!(a == c);
        a.increase_weighted(0, 0.0).unwrap();
        assert!(a == c);
        assert!(AdaptiveStorage::new(2) != ContainerStorage::<u8>::new(1));
    }

    #[test]
    fn convert_from_container() {
        let mut s = ContainerStorage::<u8>::new(1);
        s.increase(0).unwrap();

        let mut a = AdaptiveStorage::new(1);
        a.increase_weighted(0, 3.0).unwrap();
        a.assign(&s);
        assert_eq!(a.value(0), Ok(1.0));
        assert!(a == s);
        a.increase(0).unwrap();
        assert!(a != s);

        let mut b = AdaptiveStorage::from(&s);
        assert_eq!(b.class(), Class::U8);
        assert!(b == s);
        b.increase(0).unwrap();
        assert!(b != s);

        let mut c = AdaptiveStorage::new(1);
        c += &s;
        assert_eq!(c.value(0), Ok(1.0));
        assert!(c == s);
        assert!(s == c);

        let mut t = ContainerStorage::<u8>::new(2);
        t.increase(0).unwrap();
        assert!(c != t);
    }

    #[test]
    fn conversion_class_fits_container_type() {
        let mut wide = ContainerStorage::<u64>::new(3);
        wide.values[2] = u64::MAX;
        let a = AdaptiveStorage::from(wide.clone());
        assert_eq!(a.class(), Class::U64);
        assert!(a == wide);

        let mut grown = AdaptiveStorage::new(3);
        grown.increase(2).unwrap();
        grown += &wide;
        assert_eq!(grown.class(), Class::BigInt);
        assert_eq!(grown.count(2).unwrap().unwrap().to_string(), "18446744073709551616");
    }
}
