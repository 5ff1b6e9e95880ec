use std::fmt;

// Shape — Dimension sizes of an IDX tensor
//
// An IDX header lists one big-endian u32 size per dimension, outermost
// first, and the data section holds exactly their product of elements:
//
//   labels   [60000]           one byte per sample
//   images   [60000, 28, 28]   samples, then rows, then columns
//   scalar   []                rank 0, a single element
//
// Sizes come from untrusted files, so the decoder counts elements with
// checked_elem_count and treats overflow as a malformed header.

/// N-dimensional shape of a tensor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    pub fn new(dims: Vec<usize>) -> Self {
        Shape { dims }
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Number of dimensions; 0 for a scalar.
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Number of elements. A scalar holds one; any zero-sized dim gives none.
    pub fn elem_count(&self) -> usize {
        self.dims.iter().product()
    }

    /// Number of elements, or `None` if the product does not fit in `usize`.
    pub fn checked_elem_count(&self) -> Option<usize> {
        self.dims
            .iter()
            .try_fold(1usize, |count, &d| count.checked_mul(d))
    }

    /// Size of dimension `d`.
    pub fn dim(&self, d: usize) -> crate::Result<usize> {
        match self.dims.get(d) {
            Some(&size) => Ok(size),
            None => Err(crate::Error::DimOutOfRange {
                dim: d,
                rank: self.rank(),
            }),
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims: Vec<String> = self.dims.iter().map(|d| d.to_string()).collect();
        write!(f, "[{}]", dims.join(", "))
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Shape { dims }
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Shape::new(dims.to_vec())
    }
}

impl From<()> for Shape {
    fn from(_: ()) -> Self {
        Shape::new(Vec::new())
    }
}

impl From<usize> for Shape {
    fn from(count: usize) -> Self {
        Shape::new(vec![count])
    }
}

impl From<(usize, usize)> for Shape {
    fn from((rows, cols): (usize, usize)) -> Self {
        Shape::new(vec![rows, cols])
    }
}

impl From<(usize, usize, usize)> for Shape {
    fn from((count, rows, cols): (usize, usize, usize)) -> Self {
        Shape::new(vec![count, rows, cols])
    }
}
