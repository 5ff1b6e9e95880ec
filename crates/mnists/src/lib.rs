//! # mnists
//!
//! Typed, cached access to MNIST-family datasets.
//!
//! This is the top-level facade crate that re-exports everything you need.
//!
//! ## Usage
//!
//! ```no_run
//! use mnists::prelude::*;
//!
//! let mnist = IdxDataset::open(&catalog::MNIST, DatasetOptions::default())?;
//! let images = mnist.train_images()?;
//! assert_eq!(images.dims(), &[60000, 28, 28]);
//!
//! let emnist = CompositeDataset::in_default_dir(&catalog::EMNIST);
//! # Ok::<(), mnists::Error>(())
//! ```
//!
//! ## Architecture
//!
//! | Crate | Purpose |
//! |-------|----------|
//! | `mnists-core` | Tensor, Shape, DType |
//! | `mnists-data` | IDX codec, checksums, fetcher, extractor, catalog, loader |

/// Re-export core types.
pub use mnists_core::{DType, Shape, Storage, Tensor, WithDType};

/// Re-export the dataset pipeline.
pub use mnists_data::{
    catalog, check_file_integrity, checksum, composite, dataset, extract, fetch, idx, loader,
    md5_file, CompositeDataset, Dataset, DatasetOptions, Error, ExtractError, Extractor,
    FetchError, Fetcher, FormatError, HttpFetcher, IdxDataset, Result, Sample, Split, SplitView,
    VariantOptions, ZipExtractor,
};

/// Tensor-level errors, distinct from the pipeline [`Error`].
pub use mnists_core::Error as TensorError;

/// Convenient imports for typical use.
pub mod prelude {
    pub use crate::catalog;
    pub use crate::{
        CompositeDataset, DType, Dataset, DatasetOptions, IdxDataset, Shape, Split, Tensor,
        VariantOptions,
    };
}
