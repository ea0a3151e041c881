//! # numkern
//!
//! **Hierarchical reduction kernels for dense n-dimensional tensors.**
//!
//! numkern computes sum, mean, and argmax over a whole tensor or along
//! chosen dims. Full reductions run in two stages: a fixed pool of workers
//! reduces disjoint tiles into an intermediate buffer, then one final pass
//! folds the valid partials. Axis reductions launch one program per row tile
//! and grid-stride over the rest.
//!
//! ## Features
//!
//! - **Index width**: 32-bit offsets by default, 64-bit whenever any offset a
//!   call can form reaches `i32::MAX`
//! - **Tiling**: fixed-worker or square-root split for full reductions, a
//!   heuristic or autotuned row tile for axis reductions
//! - **Argmax**: first-occurrence ties, NaN treated as the maximum
//! - **Multiple dtypes**: f64, f32, f16, bf16, integers, bool
//!
//! ## Quick Start
//!
//! ```rust
//! use numkern::prelude::*;
//!
//! let device = CpuDevice::new();
//! let client = CpuRuntime::default_client(&device);
//! let a = Tensor::<CpuRuntime>::from_slice(&[1.0f32, 7.0, 3.0, 4.0], &[2, 2], &device);
//!
//! let total = client.sum(&a, false)?;
//! let per_row = client.mean_dims(&a, &[1], false)?;
//! let best = client.argmax_dim(&a, -1, false)?;
//!
//! assert_eq!(total.item::<f32>()?, 15.0);
//! assert_eq!(per_row.to_vec::<f32>(), [4.0, 3.5]);
//! assert_eq!(best.to_vec::<i64>(), [1, 1]);
//! # Ok::<(), numkern::error::Error>(())
//! ```
//!
//! ## Configuration
//!
//! [`ReduceConfig`](ops::ReduceConfig) holds the tunables of a client.
//! `CpuClient::new` reads them from `NUMKERN_REDUCE_WORKERS`,
//! `NUMKERN_MAX_GRID`, `NUMKERN_AUTOTUNE` and `NUMKERN_FORCE_I64_INDEX`.
//!
//! ## Feature Flags
//!
//! - `cpu` (default): CPU backend
//! - `rayon` (default): Multi-threaded kernel launches
//! - `f16`: Half-precision floats (F16, BF16)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod dtype;
pub mod error;
pub mod ops;
pub mod runtime;
pub mod tensor;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::dtype::{Accumulation, AccumulationPrecision, DType};
    pub use crate::error::{Error, Result};
    pub use crate::ops::{FullReduceStrategy, ReduceConfig, ReduceOp, ReduceOps, TuneCache};
    pub use crate::runtime::{Device, Runtime, RuntimeClient};
    pub use crate::tensor::{Layout, Tensor};

    #[cfg(feature = "cpu")]
    pub use crate::runtime::cpu::{CpuClient, CpuDevice, CpuRuntime};
}

/// Default runtime based on enabled features
#[cfg(feature = "cpu")]
pub type DefaultRuntime = runtime::cpu::CpuRuntime;
