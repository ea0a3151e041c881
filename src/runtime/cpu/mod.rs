//! CPU runtime implementation
//!
//! The CPU runtime uses aligned heap allocation and runs reduction programs
//! on the rayon global pool (or sequentially without the `rayon` feature).
//!
//! # Non-contiguous Tensors
//!
//! Reductions densify strided inputs before launch, so kernels always index
//! a row-major block. Sum and mean over several dims permute the reduced
//! dims to the back first.

mod client;
mod device;
pub(crate) mod helpers;
pub(crate) mod kernels;
mod runtime;

pub use crate::tensor::Tensor;
pub use client::CpuClient;
pub use device::CpuDevice;
pub use runtime::CpuRuntime;
