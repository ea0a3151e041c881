//! Tensor types
//!
//! A `Tensor` is an n-dimensional view (`Layout`) over reference-counted
//! device memory (`Storage`).

mod core;
mod layout;
mod storage;

pub use core::Tensor;
pub use layout::{Layout, Shape, Strides};
pub use storage::Storage;
