//! Helper functions for CPU tensor operations
//!
//! Shared glue between the `ReduceOps` implementation and the worker kernels.

pub mod reduce;

pub use reduce::{argmax_dim_impl, reduce_axis_impl, reduce_full_impl};
