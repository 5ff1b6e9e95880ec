// IDX — the binary container every MNIST-family file is stored in
//
// Layout (all values big-endian):
//
//   offset  size   field
//   0       2      magic, must be 0x0000
//   2       1      element type code (see DType::from_idx_code)
//   3       1      rank N
//   4       4*N    dimension sizes as u32, outermost first
//   4+4N    ...    product(dims) elements, row-major, each big-endian
//
// MNIST images are `00 00 08 03 | count | rows | cols | pixels...`, labels
// are `00 00 08 01 | count | labels...`. Files are usually distributed
// gzip-compressed (.gz); decompression is transparent here.
//
// Decoding is a pure function of the input bytes. It knows nothing about
// which dataset a file belongs to.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use mnists_core::{DType, Shape, Storage, Tensor};

use crate::error::{Error, FormatError, Result};

/// The two leading bytes of every gzip stream.
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Size of the fixed part of the header (magic + type + rank).
const FIXED_HEADER_LEN: usize = 4;

/// Parsed IDX header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub dtype: DType,
    pub shape: Shape,
    /// Byte offset of the first element, i.e. the header length.
    pub data_offset: usize,
}

/// Whether `bytes` starts with the gzip magic.
pub fn is_gzip(bytes: &[u8]) -> bool {
    bytes.starts_with(&GZIP_MAGIC)
}

/// Parse and validate the header of an uncompressed IDX buffer.
pub fn parse_header(bytes: &[u8]) -> std::result::Result<Header, FormatError> {
    if bytes.len() >= 2 {
        let magic = u16::from_be_bytes([bytes[0], bytes[1]]);
        if magic != 0 {
            return Err(FormatError::BadMagic { found: magic });
        }
    }
    if bytes.len() < FIXED_HEADER_LEN {
        return Err(FormatError::Truncated {
            needed: FIXED_HEADER_LEN,
            got: bytes.len(),
        });
    }

    let code = bytes[2];
    let dtype = DType::from_idx_code(code).ok_or(FormatError::UnknownType { code })?;

    let rank = bytes[3] as usize;
    let data_offset = FIXED_HEADER_LEN + 4 * rank;
    if bytes.len() < data_offset {
        return Err(FormatError::Truncated {
            needed: data_offset,
            got: bytes.len(),
        });
    }

    let dims = bytes[FIXED_HEADER_LEN..data_offset]
        .chunks_exact(4)
        .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]) as usize)
        .collect::<Vec<_>>();

    Ok(Header {
        dtype,
        shape: Shape::new(dims),
        data_offset,
    })
}

/// Decode an IDX buffer into a tensor.
///
/// Gzip input (detected by its leading magic bytes) is decompressed first.
///
/// ```
/// let bytes = [0x00, 0x00, 0x08, 0x01, 0, 0, 0, 3, 7, 8, 9];
/// let t = mnists_data::idx::decode(&bytes).unwrap();
/// assert_eq!(t.dims(), &[3]);
/// assert_eq!(t.as_slice::<u8>().unwrap(), &[7, 8, 9]);
/// ```
pub fn decode(bytes: &[u8]) -> std::result::Result<Tensor, FormatError> {
    if is_gzip(bytes) {
        decode_raw(&gunzip(bytes)?)
    } else {
        decode_raw(bytes)
    }
}

/// Decode an uncompressed IDX buffer.
pub fn decode_raw(bytes: &[u8]) -> std::result::Result<Tensor, FormatError> {
    let Header {
        dtype,
        shape,
        data_offset,
    } = parse_header(bytes)?;
    let data = &bytes[data_offset..];
    let elem_size = dtype.size_in_bytes();

    let declared = shape.checked_elem_count();
    let expected_bytes = declared.and_then(|n| n.checked_mul(elem_size));
    if expected_bytes != Some(data.len()) {
        return Err(FormatError::SizeMismatch {
            shape,
            declared: declared.unwrap_or(usize::MAX),
            got_bytes: data.len(),
            elem_size,
        });
    }

    let storage = Storage::from_be_bytes(dtype, data);
    let got_bytes = data.len();
    Tensor::from_storage(storage, shape.clone()).map_err(|_| FormatError::SizeMismatch {
        shape,
        declared: declared.unwrap_or(usize::MAX),
        got_bytes,
        elem_size,
    })
}

fn gunzip(bytes: &[u8]) -> std::result::Result<Vec<u8>, FormatError> {
    let mut out = Vec::new();
    MultiGzDecoder::new(bytes)
        .read_to_end(&mut out)
        .map_err(FormatError::Gzip)?;
    Ok(out)
}

fn has_gz_extension(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("gz")
}

/// Read and decode an IDX file.
///
/// The file is treated as gzip-compressed if its extension is `.gz` or if it
/// starts with the gzip magic; otherwise it is parsed directly.
pub fn read_idx_file(path: impl AsRef<Path>) -> Result<Tensor> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let decoded = if has_gz_extension(path) || is_gzip(&bytes) {
        gunzip(&bytes).and_then(|raw| decode_raw(&raw))
    } else {
        decode_raw(&bytes)
    };
    decoded.map_err(|source| Error::Format {
        path: path.to_path_buf(),
        source,
    })
}

/// Encode a tensor as an uncompressed IDX buffer.
///
/// Fails if the tensor has more than 255 dimensions or a dimension does not
/// fit in a u32, since neither can be represented in the header.
pub fn encode(tensor: &Tensor) -> mnists_core::Result<Vec<u8>> {
    let rank = tensor.rank();
    if rank > u8::MAX as usize {
        mnists_core::bail!("IDX supports at most 255 dimensions, tensor has {rank}");
    }

    let mut out = Vec::with_capacity(
        FIXED_HEADER_LEN + 4 * rank + tensor.elem_count() * tensor.dtype().size_in_bytes(),
    );
    out.extend_from_slice(&[0, 0, tensor.dtype().idx_code(), rank as u8]);
    for &d in tensor.dims() {
        let d = u32::try_from(d)
            .map_err(|_| mnists_core::Error::msg(format!("dimension {d} does not fit in u32")))?;
        out.extend_from_slice(&d.to_be_bytes());
    }
    tensor.storage().extend_be(&mut out);
    Ok(out)
}

/// Write a tensor to an IDX file, gzip-compressed if `compress` is set.
pub fn write_idx_file(path: impl AsRef<Path>, tensor: &Tensor, compress: bool) -> Result<()> {
    let bytes = encode(tensor)?;
    let mut file = fs::File::create(path.as_ref())?;
    if compress {
        let mut gz = GzEncoder::new(file, Compression::default());
        gz.write_all(&bytes)?;
        gz.finish()?;
    } else {
        file.write_all(&bytes)?;
    }
    Ok(())
}
