//! # mnists-core
//!
//! Typed tensor primitives shared by the mnists crates.
//!
//! This crate provides:
//! - [`Tensor`] — immutable n-dimensional array with one of the IDX element types
//! - [`Shape`] — dimension sizes with an overflow-checked element count
//! - [`DType`] / [`WithDType`] — element types, IDX type codes, big-endian conversion
//! - [`Error`] / [`Result`] — tensor-level errors

pub mod dtype;
pub mod error;
pub mod shape;
pub mod tensor;

pub use dtype::{DType, WithDType};
pub use error::{Error, Result};
pub use shape::Shape;
pub use tensor::{Storage, Tensor};
