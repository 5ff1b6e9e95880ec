use std::io;
use std::path::PathBuf;

use mnists_core::Shape;

use crate::extract::ExtractError;
use crate::fetch::FetchError;

/// A malformed IDX container.
///
/// Always fatal to the decode call; the decoder never retries.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// The first two bytes were not zero.
    #[error("bad magic: IDX data must start with two zero bytes, found {found:#06x}")]
    BadMagic { found: u16 },

    /// Byte 2 is not one of the six defined element type codes.
    #[error("unknown type: IDX type code {code:#04x} is not defined")]
    UnknownType { code: u8 },

    /// The header (magic, type, rank, dims) is cut short.
    #[error("truncated header: need {needed} bytes, got {got}")]
    Truncated { needed: usize, got: usize },

    /// The element data does not hold exactly product(dims) elements.
    #[error(
        "size mismatch: shape {shape} declares {declared} elements, data holds {got_bytes} bytes \
         of {elem_size}-byte elements"
    )]
    SizeMismatch {
        shape: Shape,
        declared: usize,
        got_bytes: usize,
        elem_size: usize,
    },

    /// The input looked gzip-compressed but could not be inflated.
    #[error("gzip: {0}")]
    Gzip(#[source] io::Error),
}

/// Errors from the dataset pipeline: download, unzip, load, access.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid IDX file '{}': {source}", .path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: FormatError,
    },

    /// A resource is missing or its checksum does not match.
    #[error(
        "{resource} not found in '{}' or its MD5 checksum is not valid; {hint}",
        .path.display()
    )]
    Integrity {
        resource: String,
        path: PathBuf,
        hint: &'static str,
    },

    /// Every mirror failed for a resource.
    #[error("failed to download {resource}: {source}")]
    Download {
        resource: String,
        #[source]
        source: FetchError,
    },

    /// A member could not be extracted from the archive.
    #[error("failed to extract {resource}: {source}")]
    Extract {
        resource: String,
        #[source]
        source: ExtractError,
    },

    /// An accessor was called before `load()` succeeded.
    #[error("dataset wasn't loaded; call load() first")]
    NotLoaded,

    /// `unzip()` was called on a dataset that has no source archive.
    #[error("dataset '{0}' is not part of an archive, there is nothing to unzip")]
    NotComposite(String),

    /// Lookup of an unknown catalog entry or composite variant.
    #[error("unknown dataset or variant '{0}'")]
    UnknownVariant(String),

    /// Images and labels of one split disagree on the number of samples.
    #[error("{split} split: {images} images vs {labels} labels")]
    SampleCountMismatch {
        split: &'static str,
        images: usize,
        labels: usize,
    },

    #[error(transparent)]
    Tensor(#[from] mnists_core::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Convenience Result type used throughout mnists-data.
pub type Result<T> = std::result::Result<T, Error>;
