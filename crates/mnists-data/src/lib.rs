//! # mnists-data
//!
//! Download, verify, and decode MNIST-family datasets.
//!
//! This crate provides:
//! - [`idx`] — decoder/encoder for the IDX binary tensor container
//! - [`checksum`] — streaming MD5 used to gate every pipeline step
//! - [`Fetcher`] / [`HttpFetcher`] — mirror-aware file retrieval
//! - [`Extractor`] / [`ZipExtractor`] — single-member archive extraction
//! - [`catalog`] — MNIST, Fashion-MNIST, KMNIST and the EMNIST variants
//! - [`IdxDataset`] — download → (unzip) → load pipeline with typed accessors
//! - [`CompositeDataset`] — archive-backed factory for EMNIST variants
//! - [`Dataset`] / [`SplitView`] — sample-by-sample access to a loaded split

pub mod catalog;
pub mod checksum;
pub mod composite;
pub mod dataset;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod idx;
pub mod loader;

pub use catalog::{
    CompositeDescriptor, DatasetDescriptor, Entry, Resource, ResourceKind, COMPOSITES, DATASETS,
};
pub use checksum::{check_file_integrity, md5_file};
pub use composite::{CompositeDataset, VariantOptions};
pub use dataset::{Dataset, Sample, Split, SplitView};
pub use error::{Error, FormatError, Result};
pub use extract::{ExtractError, Extractor, ZipExtractor};
pub use fetch::{FetchError, Fetcher, HttpFetcher, MirrorFailure};
pub use loader::{DatasetOptions, IdxDataset, Splits};
