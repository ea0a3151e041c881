//! Axis (segmented) reductions: one output element per kept position

use std::time::Instant;

use super::{alloc_intermediate, empty_reduction_output, kernel_dtype};
use crate::dispatch_dtype;
use crate::dispatch_index_width;
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::ops::reduce::{
    AxisTileConfig, IndexWidth, ReduceOp, TuneKey, all_dims, argmax_dim_tiles,
    axis_reduce_candidates, axis_reduce_heuristic, grid_size, layout_bounds, normalize_dims,
    permutation_to_back, reduce_output_shape, split_around_dim,
};
use crate::runtime::cpu::kernels::reduce::{
    Accumulator, argmax_dim_kernel, segmented_sum_kernel, store_kernel,
};
use crate::runtime::cpu::{CpuClient, CpuRuntime};
use crate::runtime::helpers::ensure_contiguous;
use crate::tensor::Tensor;

/// Reduce `a` over `dims` with `op`.
///
/// Sum and mean accept any set of distinct dims; an empty `dims` reduces
/// every dim. Argmax takes exactly one dim. Negative dims count from the end.
pub fn reduce_axis_impl(
    client: &CpuClient,
    a: &Tensor<CpuRuntime>,
    dims: &[isize],
    keepdim: bool,
    op: ReduceOp,
    out_dtype: Option<DType>,
) -> Result<Tensor<CpuRuntime>> {
    if op == ReduceOp::ArgMax {
        op.output_dtype(a.dtype(), out_dtype)?;
        return match dims {
            [dim] => argmax_dim_impl(client, a, *dim, keepdim),
            _ => Err(Error::invalid_argument(
                "dims",
                format!("argmax reduces exactly one dim, got {}", dims.len()),
            )),
        };
    }

    let config = client.config();
    config.validate()?;

    let in_dtype = a.dtype();
    let out_dtype = op.output_dtype(in_dtype, out_dtype)?;
    let ndim = a.ndim();
    let dims = if dims.is_empty() {
        all_dims(ndim)
    } else {
        normalize_dims(ndim, dims)?
    };

    // Rank 0 reduces as a single one-element row and stays rank 0.
    let (out_shape, view, m, n) = if ndim == 0 {
        (Vec::new(), a.clone(), 1, 1)
    } else {
        let shape = a.shape();
        let n: usize = dims.iter().map(|&d| shape[d]).product();
        let m: usize = (0..ndim)
            .filter(|d| !dims.contains(d))
            .map(|d| shape[d])
            .product();
        let view = a.permute(&permutation_to_back(ndim, &dims))?;
        (reduce_output_shape(shape, &dims, keepdim), view, m, n)
    };

    if m == 0 {
        return Tensor::try_empty(&out_shape, out_dtype, &client.device);
    }
    if n == 0 {
        return empty_reduction_output(op, &out_shape, out_dtype, &client.device);
    }

    // [M, N] row-major: kept dims outer, reduced dims flattened inner.
    let dense = ensure_contiguous(&view)?;
    let candidates = axis_reduce_candidates();
    let fallback = axis_reduce_heuristic(m, n);

    // One width for the whole call, covering every tile the tuner may try.
    let reach = candidates
        .iter()
        .chain(std::iter::once(&fallback))
        .map(|t| t.padded_rows(m).saturating_mul(n).saturating_add(t.block_n))
        .max()
        .unwrap_or(usize::MAX);
    let [count, span] = layout_bounds(dense.layout());
    let width = IndexWidth::select(&[count, span, reach], config.force_wide_index);

    let mean = op == ReduceOp::Mean;
    let launch = AxisLaunch {
        client,
        a_ptr: dense.storage().ptr(),
        key: TuneKey {
            kernel: if mean { "mean_dim" } else { "sum_dim" },
            dtype: in_dtype,
            m,
            n,
        },
        candidates: &candidates,
        fallback,
        width,
        mean,
    };

    let out = Tensor::<CpuRuntime>::try_empty(&out_shape, out_dtype, &client.device)?;
    let acc = config.precision.accumulation(in_dtype, out_dtype);
    dispatch_accumulator!(acc, A => {
        let rows: Vec<A> = dispatch_dtype!(kernel_dtype(in_dtype), T => {
            launch.run::<T, A>()?
        }, op.name());
        store_rows(&rows, &out, op.name())?;
    });

    Ok(out)
}

/// Everything a sum/mean axis launch needs besides the element types.
struct AxisLaunch<'a> {
    client: &'a CpuClient,
    a_ptr: u64,
    key: TuneKey,
    candidates: &'a [AxisTileConfig],
    fallback: AxisTileConfig,
    width: IndexWidth,
    mean: bool,
}

impl AxisLaunch<'_> {
    /// Pick the tile (cached, tuned, or heuristic) and reduce every row.
    fn run<T: Element, A: Accumulator>(&self) -> Result<Vec<A>> {
        let (m, n) = (self.key.m, self.key.n);
        let max_grid = self.client.config().max_grid;
        let mut rows = alloc_intermediate(m, A::ZERO)?;

        let launch_once = |tiles: AxisTileConfig, rows: &mut [A]| {
            let grid = grid_size(tiles.row_tiles(m), max_grid);
            dispatch_index_width!(self.width, I => {
                // SAFETY: `a_ptr` is a dense [m, n] block of `T`, `rows` has m
                // slots, and `width` covers the padded reach of every tile.
                unsafe {
                    segmented_sum_kernel::<T, A, I>(
                        self.a_ptr as *const T,
                        rows.as_mut_ptr(),
                        m,
                        n,
                        tiles,
                        grid,
                        self.mean,
                    )
                };
            });
            grid
        };

        let tiles = self.client.tune_cache().select(
            self.key.clone(),
            self.candidates,
            self.fallback,
            self.client.config().autotune,
            |candidate| {
                let start = Instant::now();
                launch_once(candidate, &mut rows);
                Ok(start.elapsed())
            },
        )?;
        let grid = launch_once(tiles, &mut rows);

        log::debug!(
            "{} {}: m={m} n={n} block_m={} block_n={} grid={grid} index={:?}",
            self.key.kernel,
            self.key.dtype,
            tiles.block_m,
            tiles.block_n,
            self.width,
        );
        Ok(rows)
    }
}

/// Convert per-row accumulators into the typed output tensor.
fn store_rows<A: Accumulator>(rows: &[A], out: &Tensor<CpuRuntime>, op: &'static str) -> Result<()> {
    debug_assert_eq!(rows.len(), out.numel());
    dispatch_dtype!(out.dtype(), O => {
        // SAFETY: `out` is a fresh contiguous tensor of `rows.len()` elements.
        unsafe { store_kernel::<A, O>(rows, out.storage().ptr() as *mut O) };
    }, op);
    Ok(())
}

/// Index of the first maximum of `a` along `dim`, as an I64 tensor.
///
/// The input is viewed as `[M, N, K]` around `dim` without permuting.
pub fn argmax_dim_impl(
    client: &CpuClient,
    a: &Tensor<CpuRuntime>,
    dim: isize,
    keepdim: bool,
) -> Result<Tensor<CpuRuntime>> {
    const OP: &str = "argmax";
    let config = client.config();
    config.validate()?;

    let in_dtype = a.dtype();
    if in_dtype.is_bool() {
        return Err(Error::unsupported_dtype(in_dtype, OP));
    }
    let ndim = a.ndim();
    let d = normalize_dims(ndim, &[dim])?[0];
    if ndim == 0 {
        return Tensor::try_full_scalar(&[], DType::I64, 0.0, &client.device);
    }

    let (m, n, k) = split_around_dim(a.shape(), d);
    let out_shape = reduce_output_shape(a.shape(), &[d], keepdim);
    if n == 0 {
        return Err(Error::EmptyReduction { op: OP });
    }
    if m == 0 || k == 0 {
        return Tensor::try_empty(&out_shape, DType::I64, &client.device);
    }

    let a = ensure_contiguous(a)?;
    let tiles = argmax_dim_tiles(m, n);
    let reach = tiles
        .padded_rows(m)
        .saturating_mul(n)
        .saturating_add(tiles.block_n)
        .saturating_mul(k);
    let [count, span] = layout_bounds(a.layout());
    let width = IndexWidth::select(&[count, span, reach], config.force_wide_index);
    let grid = grid_size(tiles.row_tiles(m).saturating_mul(k), config.max_grid);

    log::debug!(
        "argmax_dim {in_dtype}: m={m} n={n} k={k} block_m={} block_n={} grid={grid} index={width:?}",
        tiles.block_m,
        tiles.block_n,
    );

    let out = Tensor::<CpuRuntime>::try_empty(&out_shape, DType::I64, &client.device)?;
    let a_ptr = a.storage().ptr();
    let out_ptr = out.storage().ptr();
    dispatch_dtype!(in_dtype, T => {
        dispatch_index_width!(width, I => {
            // SAFETY: `a` is a dense [m, n, k] block of `T`, `out` holds m * k
            // indices, and `width` was selected from the padded reach.
            unsafe {
                argmax_dim_kernel::<T, I>(
                    a_ptr as *const T,
                    out_ptr as *mut i64,
                    (m, n, k),
                    tiles,
                    grid,
                )
            };
        });
    }, OP);

    Ok(out)
}
