//! Folding per-axis bin indices into one flat storage offset.
//!
//! Axes are visited in order. Each contributes `j * stride` to the offset, after which the
//! stride is multiplied by the axis' shape. An index outside the axis' addressable range
//! multiplies the stride by zero instead, and the zero then survives every later axis, so
//! a single test at the end tells whether the whole combination addresses a bin.

use crate::error::Error;

/// What linearization needs to know about an axis.
pub trait Axis {
    /// The number of regular bins.
    fn bins(&self) -> i32;
    /// One if the axis reserves an underflow and an overflow bin, zero otherwise.
    fn uoflow(&self) -> i32;
    /// The number of storage slots the axis spans: `bins() + 2 * uoflow()`.
    #[inline(always)]
    fn shape(&self) -> i32 { self.bins() + 2 * self.uoflow() }
    /// The bin for `value`, in `[-1, bins()]`, with `-1` for underflow and `bins()` for overflow.
    fn index(&self, value: f64) -> i32;
}

impl<A: Axis + ?Sized> Axis for &A {
    #[inline(always)] fn bins(&self) -> i32 { A::bins(*self) }
    #[inline(always)] fn uoflow(&self) -> i32 { A::uoflow(*self) }
    #[inline(always)] fn shape(&self) -> i32 { A::shape(*self) }
    #[inline(always)] fn index(&self, value: f64) -> i32 { A::index(*self, value) }
}

/// A running offset and stride across a sequence of axes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Linear {
    pub offset: usize,
    pub stride: usize,
}

impl Default for Linear {
    fn default() -> Self { Linear::new() }
}

impl Linear {
    #[inline(always)]
    pub fn new() -> Self { Linear { offset: 0, stride: 1 } }

    /// Accounts for bin `j` of the next axis.
    #[inline(always)]
    pub fn push_index<A: Axis + ?Sized>(&mut self, axis: &A, j: i32) {
        // Hot path, evaluated for every axis of every fill: keep it free of branches.
        let uoflow = axis.uoflow() as i64;
        let shape = axis.shape() as i64;
        let j = j as i64;
        self.stride *= ((j >= -uoflow) & (j < axis.bins() as i64 + uoflow)) as usize;
        let j = j + (j < 0) as i64 * shape;
        // An out-of-range `j` may still be negative here, but the stride is then zero.
        self.offset = self.offset.wrapping_add((j as usize).wrapping_mul(self.stride));
        self.stride *= shape as usize;
    }

    /// Accounts for the bin of `value` on the next axis.
    #[inline(always)]
    pub fn push_value<A: Axis + ?Sized>(&mut self, axis: &A, value: f64) {
        self.push_index(axis, axis.index(value));
    }

    /// Whether every axis so far was addressed within range.
    #[inline(always)]
    pub fn is_valid(&self) -> bool { self.stride != 0 }

    /// The flat offset, should the combination address a bin.
    #[inline(always)]
    pub fn offset(&self) -> Option<usize> {
        if self.stride != 0 { Some(self.offset) } else { None }
    }
}

/// The flat offset of per-axis bin indices.
///
/// The outer `Result` rejects a wrong number of indices; the inner `Option` is `None`
/// when some index lies outside its axis.
pub fn linearize_indices<A: Axis>(axes: &[A], indices: &[i32]) -> Result<Option<usize>, Error> {
    if axes.len() != indices.len() {
        return Err(Error::DimensionMismatch { expected: axes.len(), got: indices.len() });
    }
    let mut linear = Linear::new();
    for (axis, j) in axes.iter().zip(indices) {
        linear.push_index(axis, *j);
    }
    Ok(linear.offset())
}

/// The flat offset of per-axis sample values.
pub fn linearize_values<A: Axis>(axes: &[A], values: &[f64]) -> Result<Option<usize>, Error> {
    if axes.len() != values.len() {
        return Err(Error::DimensionMismatch { expected: axes.len(), got: values.len() });
    }
    let mut linear = Linear::new();
    for (axis, x) in axes.iter().zip(values) {
        linear.push_value(axis, *x);
    }
    Ok(linear.offset())
}

/// The number of storage slots spanned by `axes`.
pub fn total_shape<A: Axis>(axes: &[A]) -> usize {
    axes.iter().map(|axis| axis.shape() as usize).product()
}

#[cfg(test)]
mod test {
    use super::*;

    /// An axis of `bins` bins, each of unit width from zero.
    struct Unit { bins: i32, uoflow: i32 }

    impl Axis for Unit {
        fn bins(&self) -> i32 { self.bins }
        fn uoflow(&self) -> i32 { self.uoflow }
        fn index(&self, value: f64) -> i32 {
            if value < 0.0 { -1 }
            else if value >= self.bins as f64 { self.bins }
            else { value as i32 }
        }
    }

    fn axes() -> [Unit; 2] { [Unit { bins: 3, uoflow: 1 }, Unit { bins: 4, uoflow: 1 }] }

    #[test]
    fn shapes() {
        let axes = axes();
        assert_eq!(axes[0].shape(), 5);
        assert_eq!(axes[1].shape(), 6);
        assert_eq!(total_shape(&axes), 30);
    }

    #[test]
    fn regular_bins() {
        let axes = axes();
        assert_eq!(linearize_indices(&axes, &[0, 0]), Ok(Some(0)));
        assert_eq!(linearize_indices(&axes, &[2, 0]), Ok(Some(2)));
        assert_eq!(linearize_indices(&axes, &[1, 2]), Ok(Some(1 + 2 * 5)));
    }

    #[test]
    fn flow_bins() {
        let axes = axes();
        let mut linear = Linear::new();
        linear.push_index(&axes[0], -1);
        linear.push_index(&axes[1], 0);
        assert!(linear.is_valid());
        assert_eq!(linear.offset(), Some(4));

        // Overflow lands right after the regular bins, underflow after that.
        assert_eq!(linearize_indices(&axes, &[3, 0]), Ok(Some(3)));
        assert_eq!(linearize_indices(&axes, &[0, -1]), Ok(Some(5 * 5)));
        assert_eq!(linearize_indices(&axes, &[3, 4]), Ok(Some(3 + 4 * 5)));
        assert_eq!(linearize_indices(&axes, &[-1, -1]), Ok(Some(4 + 5 * 5)));
    }

    #[test]
    fn out_of_range() {
        let axes = axes();
        let mut linear = Linear::new();
        linear.push_index(&axes[0], -2);
        linear.push_index(&axes[1], 0);
        assert_eq!(linear.stride, 0);
        assert_eq!(linear.offset(), None);

        assert_eq!(linearize_indices(&axes, &[4, 0]), Ok(None));
        assert_eq!(linearize_indices(&axes, &[0, 5]), Ok(None));
        assert_eq!(linearize_indices(&axes, &[0, -7]), Ok(None));
        assert_eq!(linearize_indices(&axes, &[i32::MIN, i32::MAX]), Ok(None));
    }

    #[test]
    fn without_flow_bins() {
        let axes = [Unit { bins: 3, uoflow: 0 }, Unit { bins: 2, uoflow: 0 }];
        assert_eq!(total_shape(&axes), 6);
        assert_eq!(linearize_indices(&axes, &[2, 1]), Ok(Some(5)));
        assert_eq!(linearize_indices(&axes, &[-1, 0]), Ok(None));
        assert_eq!(linearize_indices(&axes, &[3, 0]), Ok(None));
        assert_eq!(linearize_values(&axes, &[-0.5, 0.0]), Ok(None));
        assert_eq!(linearize_values(&axes, &[0.5, 7.0]), Ok(None));
        assert_eq!(linearize_values(&axes, &[2.5, 1.5]), Ok(Some(5)));
    }

    #[test]
    fn values_and_indices_agree() {
        let axes = axes();
        for (x, y) in [(-3.0, 0.5), (0.5, 1.5), (2.5, 3.5), (9.0, -1.0), (9.0, 9.0)] {
            let j = [axes[0].index(x), axes[1].index(y)];
            assert_eq!(linearize_values(&axes, &[x, y]), linearize_indices(&axes, &j));
            assert!(linearize_values(&axes, &[x, y]).unwrap().is_some());
        }
    }

    #[test]
    fn dimension_mismatch() {
        let axes = axes();
        assert_eq!(linearize_indices(&axes, &[0]), Err(Error::DimensionMismatch { expected: 2, got: 1 }));
        assert_eq!(linearize_values(&axes, &[0.0, 0.0, 0.0]), Err(Error::DimensionMismatch { expected: 2, got: 3 }));
    }
}
