use std::fmt;

use crate::dtype::{DType, WithDType};
use crate::error::{Error, Result};
use crate::shape::Shape;

// Tensor — A typed, shaped, immutable n-dimensional array
//
// A Tensor is what the IDX decoder produces: a shape plus a flat row-major
// buffer of one of the six IDX element types. It is owned by whoever decoded
// it and never mutated afterwards; the one reshaping operation the loader
// needs (swapping image rows and columns) builds a new tensor.
//
// STORAGE:
//
//   The buffer is a Storage enum with one variant per dtype, so a tensor
//   decoded from a file whose type is only known at runtime still keeps its
//   exact element type. Typed access goes through WithDType:
//
//     let pixels: &[u8] = images.as_slice::<u8>()?;
//
//   and fails with DTypeMismatch rather than silently converting.

/// Flat element buffer of a tensor, one variant per supported dtype.
#[derive(Debug, Clone, PartialEq)]
pub enum Storage {
    U8(Vec<u8>),
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

// Run `$body` with `$v` bound to the typed Vec inside a Storage.
macro_rules! with_storage {
    ($storage:expr, $v:ident => $body:expr) => {
        match $storage {
            Storage::U8($v) => $body,
            Storage::I8($v) => $body,
            Storage::I16($v) => $body,
            Storage::I32($v) => $body,
            Storage::F32($v) => $body,
            Storage::F64($v) => $body,
        }
    };
}

// Like with_storage!, but `$body` yields a Vec that is re-wrapped in the
// same variant.
macro_rules! map_storage {
    ($storage:expr, $v:ident => $body:expr) => {
        match $storage {
            Storage::U8($v) => Storage::U8($body),
            Storage::I8($v) => Storage::I8($body),
            Storage::I16($v) => Storage::I16($body),
            Storage::I32($v) => Storage::I32($body),
            Storage::F32($v) => Storage::F32($body),
            Storage::F64($v) => Storage::F64($body),
        }
    };
}

impl Storage {
    /// Decode a buffer of big-endian elements of `dtype`.
    ///
    /// The length of `bytes` must be a whole multiple of the element size;
    /// a trailing partial element is ignored, so callers validate first.
    pub fn from_be_bytes(dtype: DType, bytes: &[u8]) -> Storage {
        fn decode<T: WithDType>(bytes: &[u8]) -> Storage {
            let n = T::DTYPE.size_in_bytes();
            T::into_storage(bytes.chunks_exact(n).map(T::from_be_slice).collect())
        }
        match dtype {
            DType::U8 => Storage::U8(bytes.to_vec()),
            DType::I8 => decode::<i8>(bytes),
            DType::I16 => decode::<i16>(bytes),
            DType::I32 => decode::<i32>(bytes),
            DType::F32 => decode::<f32>(bytes),
            DType::F64 => decode::<f64>(bytes),
        }
    }

    /// Append every element, big-endian, to `out`.
    pub fn extend_be(&self, out: &mut Vec<u8>) {
        match self {
            Storage::U8(v) => out.extend_from_slice(v),
            other => with_storage!(other, v => {
                out.reserve(v.len() * other.dtype().size_in_bytes());
                for &x in v.iter() {
                    x.extend_be(out);
                }
            }),
        }
    }

    pub fn dtype(&self) -> DType {
        match self {
            Storage::U8(_) => DType::U8,
            Storage::I8(_) => DType::I8,
            Storage::I16(_) => DType::I16,
            Storage::I32(_) => DType::I32,
            Storage::F32(_) => DType::F32,
            Storage::F64(_) => DType::F64,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        with_storage!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element `i` converted to f64. Panics if `i` is out of range.
    pub fn get_f64(&self, i: usize) -> f64 {
        with_storage!(self, v => v[i].to_f64())
    }

    /// Build a new storage from the elements at `indices`, in order.
    fn gather(&self, indices: impl Iterator<Item = usize>) -> Storage {
        map_storage!(self, v => indices.map(|i| v[i]).collect())
    }
}

/// An immutable n-dimensional array decoded from (or encodable to) IDX.
#[derive(Clone, PartialEq)]
pub struct Tensor {
    shape: Shape,
    storage: Storage,
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tensor(shape={}, dtype={})", self.shape, self.dtype())
    }
}

impl Tensor {
    // Constructors

    /// Create a tensor from a typed vector. The vector length must equal the
    /// element count of `shape`.
    ///
    /// ```
    /// use mnists_core::Tensor;
    /// let t = Tensor::from_vec(vec![0u8, 1, 2, 3, 4, 5], (2, 3)).unwrap();
    /// assert_eq!(t.dims(), &[2, 3]);
    /// ```
    pub fn from_vec<T: WithDType>(data: Vec<T>, shape: impl Into<Shape>) -> Result<Self> {
        Self::from_storage(T::into_storage(data), shape)
    }

    /// Create a tensor from an already-typed storage.
    pub fn from_storage(storage: Storage, shape: impl Into<Shape>) -> Result<Self> {
        let shape = shape.into();
        let expected = shape.elem_count();
        if storage.len() != expected {
            return Err(Error::ElementCountMismatch {
                shape,
                expected,
                got: storage.len(),
            });
        }
        Ok(Tensor { shape, storage })
    }

    // Accessors

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// The dimensions as a slice (shortcut for shape().dims()).
    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    pub fn elem_count(&self) -> usize {
        self.storage.len()
    }

    pub fn dtype(&self) -> DType {
        self.storage.dtype()
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    // Typed access

    /// Borrow the elements as `&[T]`. Fails if `T` is not the stored dtype.
    pub fn as_slice<T: WithDType>(&self) -> Result<&[T]> {
        T::storage_slice(&self.storage).ok_or(Error::DTypeMismatch {
            expected: T::DTYPE,
            got: self.dtype(),
        })
    }

    /// Copy the elements out as `Vec<T>`. Fails if `T` is not the stored dtype.
    pub fn to_vec<T: WithDType>(&self) -> Result<Vec<T>> {
        self.as_slice::<T>().map(|s| s.to_vec())
    }

    /// Read one element at a multi-dimensional index.
    pub fn get<T: WithDType>(&self, index: &[usize]) -> Result<T> {
        let flat = self.flat_index(index)?;
        Ok(self.as_slice::<T>()?[flat])
    }

    // Row-major position of `index`, checked against the shape.
    fn flat_index(&self, index: &[usize]) -> Result<usize> {
        let in_bounds = index.len() == self.rank()
            && index.iter().zip(self.dims()).all(|(&i, &d)| i < d);
        if !in_bounds {
            return Err(Error::IndexOutOfBounds {
                index: index.to_vec(),
                shape: self.shape.clone(),
            });
        }
        Ok(index
            .iter()
            .zip(self.dims())
            .fold(0, |acc, (&i, &d)| acc * d + i))
    }

    // Image orientation

    /// Swap the last two dimensions: every `rows x cols` plane becomes
    /// `cols x rows`, so element `[.., r, c]` moves to `[.., c, r]`.
    ///
    /// EMNIST stores its images transposed relative to MNIST; the loader
    /// applies this on request.
    pub fn swap_last_two_axes(&self) -> Result<Tensor> {
        let rank = self.rank();
        if rank < 2 {
            crate::bail!("cannot swap the last two axes of a rank-{rank} tensor");
        }
        let (rows, cols) = (self.dims()[rank - 2], self.dims()[rank - 1]);
        let plane = rows * cols;
        let planes = if plane == 0 { 0 } else { self.elem_count() / plane };

        let mut dims = self.dims().to_vec();
        dims.swap(rank - 2, rank - 1);

        // output slot [p, c, r] reads source element [p, r, c]
        let order = (0..planes).flat_map(move |p| {
            (0..cols).flat_map(move |c| (0..rows).map(move |r| p * plane + r * cols + c))
        });
        Ok(Tensor {
            shape: Shape::from(dims),
            storage: self.storage.gather(order),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vec_checks_count() {
        let err = Tensor::from_vec(vec![1i16, 2, 3], (2, 2)).unwrap_err();
        assert!(matches!(
            err,
            Error::ElementCountMismatch {
                expected: 4,
                got: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_typed_access() {
        let t = Tensor::from_vec(vec![1.5f32, -2.0, 3.25, 0.0], (2, 2)).unwrap();
        assert_eq!(t.dtype(), DType::F32);
        assert_eq!(t.as_slice::<f32>().unwrap(), &[1.5, -2.0, 3.25, 0.0]);
        assert_eq!(t.get::<f32>(&[1, 0]).unwrap(), 3.25);
        assert!(matches!(
            t.as_slice::<u8>(),
            Err(Error::DTypeMismatch {
                expected: DType::U8,
                got: DType::F32
            })
        ));
    }

    #[test]
    fn test_get_row_major() {
        let t = Tensor::from_vec((0u8..24).collect(), (2, 3, 4)).unwrap();
        assert_eq!(t.get::<u8>(&[1, 2, 3]).unwrap(), 23);
        assert_eq!(t.get::<u8>(&[1, 0, 2]).unwrap(), 14);
        assert_eq!(t.get::<u8>(&[0, 0, 0]).unwrap(), 0);
    }

    #[test]
    fn test_get_out_of_bounds() {
        let t = Tensor::from_vec(vec![0u8; 6], (2, 3)).unwrap();
        assert!(t.get::<u8>(&[2, 0]).is_err());
        assert!(t.get::<u8>(&[0, 3]).is_err());
        assert!(t.get::<u8>(&[0]).is_err());
        assert!(t.get::<u8>(&[1, 2]).is_ok());
    }

    #[test]
    fn test_scalar_tensor() {
        let t = Tensor::from_vec(vec![42i32], ()).unwrap();
        assert_eq!(t.rank(), 0);
        assert_eq!(t.get::<i32>(&[]).unwrap(), 42);
    }

    #[test]
    fn test_swap_last_two_axes() {
        // two 2x3 images
        let data: Vec<u8> = (0..12).collect();
        let t = Tensor::from_vec(data, (2, 2, 3)).unwrap();
        let s = t.swap_last_two_axes().unwrap();
        assert_eq!(s.dims(), &[2, 3, 2]);
        assert_eq!(
            s.as_slice::<u8>().unwrap(),
            &[0, 3, 1, 4, 2, 5, 6, 9, 7, 10, 8, 11]
        );
        for n in 0..2 {
            for r in 0..2 {
                for c in 0..3 {
                    assert_eq!(
                        t.get::<u8>(&[n, r, c]).unwrap(),
                        s.get::<u8>(&[n, c, r]).unwrap()
                    );
                }
            }
        }
        // applying it twice gets back the original
        assert_eq!(s.swap_last_two_axes().unwrap(), t);
    }

    #[test]
    fn test_swap_last_two_axes_single_image() {
        let t = Tensor::from_vec(vec![1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0], (3, 2)).unwrap();
        let s = t.swap_last_two_axes().unwrap();
        assert_eq!(s.dims(), &[2, 3]);
        assert_eq!(s.as_slice::<f64>().unwrap(), &[1.0, 3.0, 5.0, 2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_swap_last_two_axes_empty() {
        let t = Tensor::from_vec(Vec::<u8>::new(), (0, 28, 28)).unwrap();
        let s = t.swap_last_two_axes().unwrap();
        assert_eq!(s.dims(), &[0, 28, 28]);

        let t = Tensor::from_vec(Vec::<i16>::new(), (4, 0, 3)).unwrap();
        assert_eq!(t.swap_last_two_axes().unwrap().dims(), &[4, 3, 0]);
    }

    #[test]
    fn test_swap_last_two_axes_rank_one() {
        let t = Tensor::from_vec(vec![1u8, 2, 3], 3).unwrap();
        assert!(matches!(t.swap_last_two_axes(), Err(Error::Msg(_))));
    }

    #[test]
    fn test_storage_big_endian_roundtrip() {
        let s = Storage::I32(vec![1, -2, 0x0102_0304]);
        let mut bytes = Vec::new();
        s.extend_be(&mut bytes);
        assert_eq!(&bytes[8..], &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(Storage::from_be_bytes(DType::I32, &bytes), s);
        assert_eq!(s.get_f64(1), -2.0);
    }
}
