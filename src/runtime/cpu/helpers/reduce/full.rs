//! Full reduction: every element of the input to one value

use super::{alloc_intermediate, empty_reduction_output, kernel_dtype};
use crate::dispatch_dtype;
use crate::dispatch_index_width;
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::ops::reduce::{FullReducePlan, IndexWidth, ReduceOp, full_output_shape, layout_bounds};
use crate::runtime::cpu::kernels::reduce::{
    Accumulator, final_argmax, final_sum, partial_argmax_kernel, partial_sum_kernel,
};
use crate::runtime::cpu::{CpuClient, CpuRuntime};
use crate::runtime::helpers::ensure_contiguous;
use crate::tensor::Tensor;

/// Reduce all elements of `a` with `op`.
///
/// The output has rank 0, or rank `a.ndim()` with every extent 1 when
/// `keepdim` is set. `out_dtype` overrides the default output dtype (see
/// [`ReduceOp::output_dtype`]).
pub fn reduce_full_impl(
    client: &CpuClient,
    a: &Tensor<CpuRuntime>,
    op: ReduceOp,
    keepdim: bool,
    out_dtype: Option<DType>,
) -> Result<Tensor<CpuRuntime>> {
    let config = client.config();
    config.validate()?;

    let in_dtype = a.dtype();
    if op == ReduceOp::ArgMax && in_dtype.is_bool() {
        return Err(Error::unsupported_dtype(in_dtype, op.name()));
    }
    let out_dtype = op.output_dtype(in_dtype, out_dtype)?;
    let out_shape = full_output_shape(a.ndim(), keepdim);

    let numel = a.numel();
    if numel == 0 {
        return empty_reduction_output(op, &out_shape, out_dtype, &client.device);
    }

    let a = ensure_contiguous(a)?;
    let plan = FullReducePlan::select(numel, config.full_reduce)?;
    let [count, span] = layout_bounds(a.layout());
    let width = IndexWidth::select(&[count, span, plan.covered()], config.force_wide_index);

    log::debug!(
        "{} full {}: numel={numel} workers={} tile={} valid={} index={width:?}",
        op.name(),
        in_dtype,
        plan.worker_count,
        plan.tile_size,
        plan.valid_partials,
    );

    let out = Tensor::<CpuRuntime>::try_empty(&out_shape, out_dtype, &client.device)?;
    let a_ptr = a.storage().ptr();

    match op {
        ReduceOp::Sum | ReduceOp::Mean => {
            let mean = op == ReduceOp::Mean;
            let acc = config.precision.accumulation(in_dtype, out_dtype);
            dispatch_accumulator!(acc, A => {
                let value: A = dispatch_dtype!(kernel_dtype(in_dtype), T => {
                    full_sum::<T, A>(a_ptr, numel, &plan, width, mean)?
                }, op.name());
                write_scalar(&out, value, op.name())?;
            });
        }
        ReduceOp::ArgMax => {
            let index = dispatch_dtype!(in_dtype, T => {
                full_argmax::<T>(a_ptr, numel, &plan, width)?
            }, op.name());
            // SAFETY: `out` is a freshly allocated one-element i64 tensor.
            unsafe { *(out.storage().ptr() as *mut i64) = index };
        }
    }

    Ok(out)
}

/// Two-stage sum (or mean) of `numel` contiguous elements at `a_ptr`.
fn full_sum<T: Element, A: Accumulator>(
    a_ptr: u64,
    numel: usize,
    plan: &FullReducePlan,
    width: IndexWidth,
    mean: bool,
) -> Result<A> {
    let mut partials = alloc_intermediate(plan.worker_count, A::ZERO)?;
    dispatch_index_width!(width, I => {
        // SAFETY: `a_ptr` holds `numel` elements of `T`, `partials` has one
        // slot per worker, and `width` was selected from `plan.covered()`.
        unsafe { partial_sum_kernel::<T, A, I>(a_ptr as *const T, numel, plan, &mut partials) };
    });
    let divisor = mean.then_some(numel);
    Ok(final_sum(&partials, plan.valid_partials, divisor))
}

/// Two-stage argmax of `numel` contiguous elements at `a_ptr`.
fn full_argmax<T: Element>(
    a_ptr: u64,
    numel: usize,
    plan: &FullReducePlan,
    width: IndexWidth,
) -> Result<i64> {
    let mut mid_value = alloc_intermediate(plan.worker_count, T::lowest())?;
    let mut mid_index = alloc_intermediate(plan.worker_count, 0i64)?;
    dispatch_index_width!(width, I => {
        // SAFETY: as in `full_sum`; both intermediates have one slot per worker.
        unsafe {
            partial_argmax_kernel::<T, I>(
                a_ptr as *const T,
                numel,
                plan,
                &mut mid_value,
                &mut mid_index,
            )
        };
    });
    Ok(final_argmax(&mid_value, &mid_index, plan.valid_partials))
}

/// Write `value` converted to the dtype of the one-element tensor `out`.
fn write_scalar<A: Accumulator>(out: &Tensor<CpuRuntime>, value: A, op: &'static str) -> Result<()> {
    debug_assert_eq!(out.numel(), 1);
    dispatch_dtype!(out.dtype(), O => {
        // SAFETY: `out` owns one freshly allocated element of `O`.
        unsafe { *(out.storage().ptr() as *mut O) = value.acc_out::<O>() };
    }, op);
    Ok(())
}
