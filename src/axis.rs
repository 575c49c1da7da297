//! Axis kinds that map sample values to bins.
//!
//! Each kind implements `Axis`, and `AnyAxis` closes over them so that a histogram can
//! hold a sequence of differently-typed axes and compare them for equality.

use crate::linear::Axis;

/// Equal-width bins over `[lower, upper)`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Regular {
    bins: i32,
    lower: f64,
    upper: f64,
    uoflow: bool,
}

impl Regular {
    /// `bins` equal-width bins over `[lower, upper)`, with underflow and overflow bins.
    pub fn new(bins: u32, lower: f64, upper: f64) -> Self {
        assert!(bins > 0, "an axis needs at least one bin");
        assert!(bins <= i32::MAX as u32, "too many bins for one axis");
        assert!(lower < upper, "lower edge must be below upper edge");
        Regular { bins: bins as i32, lower, upper, uoflow: true }
    }

    /// The same axis without underflow and overflow bins.
    pub fn without_flow(mut self) -> Self {
        self.uoflow = false;
        self
    }

    /// The lower edge of bin `index`, which may be `-1` or `bins()`.
    pub fn lower_edge(&self, index: i32) -> f64 {
        if index < 0 { return f64::NEG_INFINITY; }
        if index > self.bins { return f64::INFINITY; }
        let z = index as f64 / self.bins as f64;
        (1.0 - z) * self.lower + z * self.upper
    }
}

impl Axis for Regular {
    #[inline(always)] fn bins(&self) -> i32 { self.bins }
    #[inline(always)] fn uoflow(&self) -> i32 { self.uoflow as i32 }
    #[inline]
    fn index(&self, value: f64) -> i32 {
        let z = (value - self.lower) / (self.upper - self.lower);
        // NaN fails every comparison, and lands in overflow here.
        if !(z < 1.0) { self.bins }
        else if z < 0.0 { -1 }
        else { std::cmp::min((z * self.bins as f64) as i32, self.bins - 1) }
    }
}

/// One bin for each integer in `[lower, upper)`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Integer {
    lower: i32,
    upper: i32,
    uoflow: bool,
}

impl Integer {
    pub fn new(lower: i32, upper: i32) -> Self {
        assert!(lower < upper, "lower bound must be below upper bound");
        Integer { lower, upper, uoflow: true }
    }

    /// The same axis without underflow and overflow bins.
    pub fn without_flow(mut self) -> Self {
        self.uoflow = false;
        self
    }
}

impl Axis for Integer {
    #[inline(always)] fn bins(&self) -> i32 { self.upper - self.lower }
    #[inline(always)] fn uoflow(&self) -> i32 { self.uoflow as i32 }
    #[inline]
    fn index(&self, value: f64) -> i32 {
        if value.is_nan() { return self.bins(); }
        let j = value.floor() - self.lower as f64;
        if j < 0.0 { -1 }
        else if j >= self.bins() as f64 { self.bins() }
        else { j as i32 }
    }
}

/// Any of the axis kinds.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum AnyAxis {
    Regular(Regular),
    Integer(Integer),
}

impl From<Regular> for AnyAxis {
    fn from(axis: Regular) -> Self { AnyAxis::Regular(axis) }
}
impl From<Integer> for AnyAxis {
    fn from(axis: Integer) -> Self { AnyAxis::Integer(axis) }
}

impl Axis for AnyAxis {
    #[inline(always)]
    fn bins(&self) -> i32 {
        match self {
            AnyAxis::Regular(axis) => axis.bins(),
            AnyAxis::Integer(axis) => axis.bins(),
        }
    }
    #[inline(always)]
    fn uoflow(&self) -> i32 {
        match self {
            AnyAxis::Regular(axis) => axis.uoflow(),
            AnyAxis::Integer(axis) => axis.uoflow(),
        }
    }
    #[inline(always)]
    fn index(&self, value: f64) -> i32 {
        match self {
            AnyAxis::Regular(axis) => axis.index(value),
            AnyAxis::Integer(axis) => axis.index(value),
        }
    }
}
