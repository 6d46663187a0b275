//! Blob shapes.
//!
//! A [`Shape`] is the logical tensor shape a layer asks for. The arena only
//! stores flat runs of columns; the shape is kept alongside so views can be
//! handed back with their original dimensions.

use smallvec::SmallVec;
use std::fmt;

/// Dimensions of a parameter blob, outermost first.
///
/// Most parameters are 1-D (biases) or 2-D (weights), a few are 3-D (maxout
/// pieces), so up to four dims are stored inline.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Shape(SmallVec<[usize; 4]>);

impl Shape {
    /// The 0-d shape. It holds exactly one element.
    pub fn scalar() -> Self {
        Self(SmallVec::new())
    }

    /// Build a shape from a slice of dimensions.
    pub fn new(dims: &[usize]) -> Self {
        Self(SmallVec::from_slice(dims))
    }

    /// The dimensions, outermost first.
    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    /// Number of dimensions.
    pub fn ndim(&self) -> usize {
        self.0.len()
    }

    /// Total number of elements, or `None` if the product overflows `usize`.
    ///
    /// The empty product is 1; any zero dimension gives 0.
    pub fn numel(&self) -> Option<usize> {
        self.0.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
    }

    /// Row-major flat index of `index`, or `None` if the index has the wrong
    /// rank or any coordinate is out of bounds.
    pub fn flat_index(&self, index: &[usize]) -> Option<usize> {
        if index.len() != self.0.len() {
            return None;
        }
        let mut flat = 0usize;
        for (&i, &d) in index.iter().zip(self.0.iter()) {
            if i >= d {
                return None;
            }
            flat = flat * d + i;
        }
        Some(flat)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{d}")?;
        }
        if self.0.len() == 1 {
            f.write_str(",")?;
        }
        f.write_str(")")
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Self::new(dims)
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(dims: [usize; N]) -> Self {
        Self::new(&dims)
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self(SmallVec::from_vec(dims))
    }
}

impl From<usize> for Shape {
    fn from(len: usize) -> Self {
        Self::new(&[len])
    }
}
