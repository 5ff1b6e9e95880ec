use std::fmt;

use crate::tensor::Storage;

// DType — Element types of an IDX container
//
// The IDX format stores a one-byte type code right after the two zero magic
// bytes. Six codes are defined:
//
//   0x08 — unsigned byte       (u8)   images and labels of every MNIST set
//   0x09 — signed byte         (i8)
//   0x0B — short, 2 bytes      (i16)
//   0x0C — int, 4 bytes        (i32)
//   0x0D — float, 4 bytes      (f32)
//   0x0E — double, 8 bytes     (f64)
//
// Multi-byte values are always big-endian on disk. The WithDType trait below
// is where the byte order gets converted to and from the host representation.

/// Enum of all element types an IDX container can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    U8,
    I8,
    I16,
    I32,
    F32,
    F64,
}

impl DType {
    /// All supported dtypes, in IDX type-code order.
    pub const ALL: [DType; 6] = [
        DType::U8,
        DType::I8,
        DType::I16,
        DType::I32,
        DType::F32,
        DType::F64,
    ];

    /// Size of one element in bytes.
    pub fn size_in_bytes(&self) -> usize {
        match self {
            DType::U8 | DType::I8 => 1,
            DType::I16 => 2,
            DType::I32 | DType::F32 => 4,
            DType::F64 => 8,
        }
    }

    /// The IDX type code for this dtype.
    pub fn idx_code(&self) -> u8 {
        match self {
            DType::U8 => 0x08,
            DType::I8 => 0x09,
            DType::I16 => 0x0B,
            DType::I32 => 0x0C,
            DType::F32 => 0x0D,
            DType::F64 => 0x0E,
        }
    }

    /// Map an IDX type code back to a dtype. `None` for undefined codes.
    pub fn from_idx_code(code: u8) -> Option<DType> {
        match code {
            0x08 => Some(DType::U8),
            0x09 => Some(DType::I8),
            0x0B => Some(DType::I16),
            0x0C => Some(DType::I32),
            0x0D => Some(DType::F32),
            0x0E => Some(DType::F64),
            _ => None,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DType::U8 => "u8",
            DType::I8 => "i8",
            DType::I16 => "i16",
            DType::I32 => "i32",
            DType::F32 => "f32",
            DType::F64 => "f64",
        };
        write!(f, "{}", s)
    }
}

// WithDType — Trait that connects Rust types to DType enum
//
// By implementing it for u8, i16, f32, etc. we can write generic code like
//
//   let pixels: &[u8] = tensor.as_slice::<u8>()?;
//
// and have the dtype check happen against T::DTYPE. The trait also owns the
// big-endian conversion so the IDX codec can stay generic over elements.

/// Trait implemented by Rust types that can be stored in a tensor.
pub trait WithDType: Copy + Send + Sync + PartialEq + 'static + fmt::Debug {
    /// The corresponding DType enum variant.
    const DTYPE: DType;

    /// Decode one element from exactly `DTYPE.size_in_bytes()` big-endian bytes.
    fn from_be_slice(bytes: &[u8]) -> Self;

    /// Append the big-endian encoding of this element to `out`.
    fn extend_be(self, out: &mut Vec<u8>);

    /// Convert this value to f64, e.g. to report a label of any dtype.
    fn to_f64(self) -> f64;

    /// Borrow the typed buffer out of a storage of the matching dtype.
    fn storage_slice(storage: &Storage) -> Option<&[Self]>;

    /// Wrap a typed buffer into a storage.
    fn into_storage(data: Vec<Self>) -> Storage;
}

macro_rules! with_dtype {
    ($ty:ty, $dtype:ident, $n:expr) => {
        impl WithDType for $ty {
            const DTYPE: DType = DType::$dtype;

            fn from_be_slice(bytes: &[u8]) -> Self {
                let mut buf = [0u8; $n];
                buf.copy_from_slice(&bytes[..$n]);
                <$ty>::from_be_bytes(buf)
            }

            fn extend_be(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_be_bytes());
            }

            fn to_f64(self) -> f64 {
                self as f64
            }

            fn storage_slice(storage: &Storage) -> Option<&[Self]> {
                match storage {
                    Storage::$dtype(data) => Some(data),
                    _ => None,
                }
            }

            fn into_storage(data: Vec<Self>) -> Storage {
                Storage::$dtype(data)
            }
        }
    };
}

with_dtype!(u8, U8, 1);
with_dtype!(i8, I8, 1);
with_dtype!(i16, I16, 2);
with_dtype!(i32, I32, 4);
with_dtype!(f32, F32, 4);
with_dtype!(f64, F64, 8);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_size() {
        assert_eq!(DType::U8.size_in_bytes(), 1);
        assert_eq!(DType::I8.size_in_bytes(), 1);
        assert_eq!(DType::I16.size_in_bytes(), 2);
        assert_eq!(DType::I32.size_in_bytes(), 4);
        assert_eq!(DType::F32.size_in_bytes(), 4);
        assert_eq!(DType::F64.size_in_bytes(), 8);
    }

    #[test]
    fn test_idx_code_mapping() {
        for dtype in DType::ALL {
            assert_eq!(DType::from_idx_code(dtype.idx_code()), Some(dtype));
        }
        assert_eq!(DType::from_idx_code(0x0A), None);
        assert_eq!(DType::from_idx_code(0x00), None);
        assert_eq!(DType::from_idx_code(0xFF), None);
    }

    #[test]
    fn test_big_endian_decode() {
        assert_eq!(i16::from_be_slice(&[0xFF, 0xFE]), -2);
        assert_eq!(i32::from_be_slice(&[0x00, 0x00, 0x01, 0x00]), 256);
        assert_eq!(f32::from_be_slice(&1.5f32.to_be_bytes()), 1.5);
        assert_eq!(i8::from_be_slice(&[0x80]), -128);
    }

    #[test]
    fn test_big_endian_encode() {
        let mut out = Vec::new();
        258i16.extend_be(&mut out);
        (-1i32).extend_be(&mut out);
        assert_eq!(out, vec![0x01, 0x02, 0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_with_dtype_to_f64() {
        assert_eq!(f32::DTYPE, DType::F32);
        assert_eq!(0.1f32.to_f64(), 0.10000000149011612); // f32 precision
        assert_eq!((-7i8).to_f64(), -7.0);
        assert_eq!(255u8.to_f64(), 255.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(DType::I16.to_string(), "i16");
        assert_eq!(DType::F64.to_string(), "f64");
    }
}
