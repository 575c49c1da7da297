//! Multi-dimensional histograms over bin counters that adapt their width.
//!
//! A histogram maps each sample, one value per axis, to a single bin of a flat storage.
//! The mapping folds the per-axis bin indices together with running strides, and signals
//! an out-of-range sample with a zero stride rather than a branch per axis.
//!
//! The default storage starts with no buffer at all, and holds all of its counts in the
//! narrowest of `u8`, `u16`, `u32`, `u64` or an arbitrary precision integer that fits
//! the largest count. Weighted samples move it to floating sums of weights and squared
//! weights. Storages compare and merge by value, whatever their representation, and
//! encode to a compact tagged byte layout.
//!
//! Mutation is single-threaded; concurrent fills should go to separate histograms that
//! are merged afterwards.

pub mod error;
pub mod growth;
pub mod storage;
pub mod container;
pub mod linear;
pub mod bytes;
pub mod axis;
pub mod histogram;

pub use error::{Error, DecodeError};
pub use growth::{Class, Counter};
pub use storage::{AdaptiveStorage, Bins, Storage, Weight};
pub use container::ContainerStorage;
pub use linear::{Axis, Linear};
pub use bytes::{Encode, Decode, serialize, deserialize};
pub use axis::{AnyAxis, Integer, Regular};
pub use histogram::Histogram;

/// Types that can report the heap memory they occupy.
pub trait HeapSize {
    /// Active (len) and allocated (cap) heap sizes in bytes.
    /// This should not include the size of `self` itself.
    fn heap_size(&self) -> (usize, usize) { (0, 0) }
}

macro_rules! implement_heap_size {
    ($($index_type:ty),*) => { $(
        impl HeapSize for $index_type { }
    )* }
}

implement_heap_size!(u8, u16, u32, u64);
implement_heap_size!(storage::Weight);

impl HeapSize for num_bigint::BigUint {
    fn heap_size(&self) -> (usize, usize) {
        // Digits are 64 bit words; the allocation's spare capacity is not visible.
        let bytes = 8 * self.bits().div_ceil(64) as usize;
        (bytes, bytes)
    }
}

// This counts the heap contributions of the owned items, so that a vector of
// arbitrary precision counts is charged for its digits as well as its handles.
impl<T: HeapSize> HeapSize for Vec<T> {
    fn heap_size(&self) -> (usize, usize) {
        let mut l = std::mem::size_of::<T>() * self.len();
        let mut c = std::mem::size_of::<T>() * self.capacity();
        for item in self.iter() {
            let (il, ic) = item.heap_size();
            l += il;
            c += ic;
        }
        (l, c)
    }
}
