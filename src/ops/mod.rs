//! Tensor operations
//!
//! Operations are defined as traits implemented by each runtime's client,
//! which gives them access to the device, the reduction configuration, and
//! the autotune cache.
//!
//! ```text
//! RuntimeClient<R>
//!   └── implements ReduceOps<R>
//!         ├── reduce_full   sum, mean, argmax over every element
//!         └── reduce_axis   sum/mean over dims, argmax over one dim
//! ```
//!
//! # Layers
//!
//! - [`reduce`]: backend-independent decisions made before a launch. Output
//!   shape and dtype, the [`IndexWidth`] of the call, and tiling.
//! - `dispatch`: `dispatch_dtype!` and `dispatch_index_width!` turn runtime
//!   `DType` and `IndexWidth` values into concrete type parameters.
//! - Backend modules implement the traits on top of their kernels.

#[cfg(feature = "cpu")]
pub(crate) mod cpu;
mod dispatch;
pub mod reduce;
pub(crate) mod traits;

pub use reduce::{
    AxisTileConfig, FullReducePlan, FullReduceStrategy, IndexWidth, ReduceConfig, ReduceOp,
    TuneCache, TuneKey, reduce_output_shape,
};
pub use traits::ReduceOps;
