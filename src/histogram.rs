//! Histograms over a sequence of axes.
//!
//! A histogram owns its axes and a storage with one bin per combination of axis slots.
//! Fills map sample values through the axes to a flat offset and increase that bin;
//! samples that fall outside an axis without flow bins are dropped. Reads address bins
//! by per-axis index, where `-1` and `bins()` name the flow bins.

use std::ops::AddAssign;

use smallvec::SmallVec;

use crate::axis::AnyAxis;
use crate::container::ContainerStorage;
use crate::error::Error;
use crate::growth::Counter;
use crate::linear;
use crate::storage::{AdaptiveStorage, Storage};

/// Axes of a histogram; most histograms have few dimensions.
pub type Axes = SmallVec<[AnyAxis; 4]>;

/// Counts of samples, binned by one or more axes.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Histogram<S = AdaptiveStorage> {
    axes: Axes,
    storage: S,
}

impl<S: Storage> Histogram<S> {
    /// A histogram with all bins zero.
    ///
    /// # Panics
    ///
    /// Panics if `axes` is empty.
    pub fn new<I>(axes: I) -> Self where I: IntoIterator, I::Item: Into<AnyAxis> {
        let axes: Axes = axes.into_iter().map(Into::into).collect();
        assert!(!axes.is_empty(), "at least one axis required");
        let storage = S::with_size(linear::total_shape(&axes[..]));
        Histogram { axes, storage }
    }

    /// The number of axes.
    #[inline(always)]
    pub fn dim(&self) -> usize { self.axes.len() }

    /// The number of bins, including flow bins.
    #[inline(always)]
    pub fn size(&self) -> usize { self.storage.size() }

    /// The `n`th axis, should it exist.
    pub fn axis(&self, n: usize) -> Option<&AnyAxis> { self.axes.get(n) }

    pub fn axes(&self) -> &[AnyAxis] { &self.axes[..] }

    pub fn storage(&self) -> &S { &self.storage }

    /// Counts one sample with one value per axis.
    pub fn fill(&mut self, values: &[f64]) -> Result<(), Error> {
        match linear::linearize_values(&self.axes[..], values)? {
            Some(offset) => self.storage.increase(offset),
            None => {
                tracing::trace!(?values, "dropping sample outside the axes");
                Ok(())
            }
        }
    }

    /// Counts one sample with weight `weight`.
    pub fn fill_weighted(&mut self, values: &[f64], weight: f64) -> Result<(), Error> {
        match linear::linearize_values(&self.axes[..], values)? {
            Some(offset) => self.storage.increase_weighted(offset, weight),
            None => {
                tracing::trace!(?values, weight, "dropping sample outside the axes");
                Ok(())
            }
        }
    }

    fn locate(&self, indices: &[i32]) -> Result<usize, Error> {
        linear::linearize_indices(&self.axes[..], indices)?
            .ok_or_else(|| Error::InvalidIndex { indices: indices.to_vec() })
    }

    /// The count, or sum of weights, in the bin at `indices`.
    pub fn value(&self, indices: &[i32]) -> Result<f64, Error> {
        self.storage.value(self.locate(indices)?)
    }

    /// The variance of the bin at `indices`, if the storage provides one.
    pub fn variance(&self, indices: &[i32]) -> Result<f64, Error> {
        self.storage.variance(self.locate(indices)?)
    }

    /// The sum over all bins, including flow bins.
    pub fn sum(&self) -> f64 {
        (0 .. self.storage.size()).filter_map(|index| self.storage.value(index).ok()).sum()
    }

    /// Sets every bin to zero.
    pub fn reset(&mut self) {
        self.storage = S::with_size(self.storage.size());
    }

    /// Adds the counts of `other`, which must have the same axes.
    pub fn merge<S2>(&mut self, other: &Histogram<S2>) -> Result<(), Error> where S: for<'a> AddAssign<&'a S2> {
        if self.axes != other.axes {
            return Err(Error::IncompatibleAxes);
        }
        self.storage += &other.storage;
        Ok(())
    }
}

impl<'a, T: Counter> From<&'a Histogram<ContainerStorage<T>>> for Histogram<AdaptiveStorage> {
    fn from(other: &'a Histogram<ContainerStorage<T>>) -> Self {
        Histogram { axes: other.axes.clone(), storage: AdaptiveStorage::from(&other.storage) }
    }
}

impl<T: Counter> PartialEq<Histogram<ContainerStorage<T>>> for Histogram<AdaptiveStorage> {
    fn eq(&self, other: &Histogram<ContainerStorage<T>>) -> bool {
        self.axes == other.axes && self.storage == other.storage
    }
}
