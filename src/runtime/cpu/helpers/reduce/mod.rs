//! Reduction glue for the CPU runtime
//!
//! These functions sit between the `ReduceOps` entry points and the worker
//! kernels: they validate arguments, resolve the output dtype, pick tiling
//! and offset width, allocate intermediates, and launch.

/// Bind `$A` to the sum/mean accumulator selected by an [`Accumulation`].
///
/// [`Accumulation`]: crate::dtype::Accumulation
macro_rules! dispatch_accumulator {
    ($acc:expr, $A:ident => $body:block) => {
        match $acc {
            $crate::dtype::Accumulation::I64 => {
                type $A = i64;
                $body
            }
            $crate::dtype::Accumulation::F64 => {
                type $A = f64;
                $body
            }
            $crate::dtype::Accumulation::F32 => {
                type $A = f32;
                $body
            }
        }
    };
}

mod axis;
mod full;

pub use axis::{argmax_dim_impl, reduce_axis_impl};
pub use full::reduce_full_impl;

use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::ops::reduce::ReduceOp;
use crate::runtime::cpu::{CpuDevice, CpuRuntime};
use crate::tensor::Tensor;

/// Element type the sum/mean workers read for `dtype`.
///
/// Bool shares the one-byte storage of U8, so it is summed as `u8`.
#[inline]
pub(super) fn kernel_dtype(dtype: DType) -> DType {
    if dtype.is_bool() { DType::U8 } else { dtype }
}

/// Allocate an intermediate buffer of `len` copies of `fill`.
///
/// Allocation failure is reported as `OutOfMemory` instead of aborting.
pub(super) fn alloc_intermediate<S: Clone>(len: usize, fill: S) -> Result<Vec<S>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| Error::OutOfMemory {
        size: len.saturating_mul(std::mem::size_of::<S>()),
    })?;
    buf.resize(len, fill);
    Ok(buf)
}

/// Output filled with the value a reduction takes over zero elements.
///
/// Sum is 0 and mean is NaN. Operations without an identity are errors.
pub(super) fn empty_reduction_output(
    op: ReduceOp,
    shape: &[usize],
    dtype: DType,
    device: &CpuDevice,
) -> Result<Tensor<CpuRuntime>> {
    match op {
        ReduceOp::Sum => Tensor::try_full_scalar(shape, dtype, 0.0, device),
        ReduceOp::Mean => Tensor::try_full_scalar(shape, dtype, f64::NAN, device),
        ReduceOp::ArgMax => Err(Error::EmptyReduction { op: op.name() }),
    }
}
