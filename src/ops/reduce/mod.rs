//! Reduction engine: operation kinds, shape rules, and launch-parameter selection
//!
//! The worker routines live in `runtime::cpu::kernels::reduce`. This module
//! holds everything decided before a launch: output shape and dtype, the
//! [`IndexWidth`] of the call, and the tiling ([`FullReducePlan`] or an
//! [`AxisTileConfig`] from the [`TuneCache`]).

mod config;
mod index_width;
mod tiling;
mod tune;

pub use config::{
    ENV_AUTOTUNE, ENV_FORCE_I64_INDEX, ENV_MAX_GRID, ENV_REDUCE_WORKERS, ReduceConfig,
};
pub use index_width::{
    I32_OFFSET_LIMIT, IndexType, IndexWidth, layout_bounds, saturating_product,
};
pub use tiling::{
    ARGMAX_DIM_MAX_BLOCK_M, ARGMAX_DIM_MAX_BLOCK_N, ARGMAX_DIM_ROW_SPLIT, AXIS_BLOCK_M_CANDIDATES,
    AXIS_BLOCK_N, AxisTileConfig, DEFAULT_FULL_REDUCE_WORKERS, DEFAULT_MAX_GRID,
    FullReducePlan, FullReduceStrategy, argmax_dim_tiles, axis_reduce_candidates,
    axis_reduce_heuristic, cdiv, ceil_sqrt, grid_size, next_power_of_two,
};
pub use tune::{TuneCache, TuneKey};

use crate::dtype::DType;
use crate::error::{Error, Result};

/// Reduction operation kind
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ReduceOp {
    /// Sum of elements
    Sum,
    /// Arithmetic mean of elements
    Mean,
    /// Index of the first maximal element
    ArgMax,
}

impl ReduceOp {
    /// Operation name used in errors and logs
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Mean => "mean",
            Self::ArgMax => "argmax",
        }
    }

    /// Resolve the output dtype for an input of `input` dtype.
    ///
    /// - `Sum`: floats keep their dtype, integers and bool widen to `I64`.
    ///   Any numeric `requested` dtype is honored.
    /// - `Mean`: the output (requested or input dtype) must be a float.
    /// - `ArgMax`: always `I64`.
    pub fn output_dtype(self, input: DType, requested: Option<DType>) -> Result<DType> {
        match self {
            Self::Sum => {
                let out = requested.unwrap_or(if input.is_float() {
                    input
                } else {
                    DType::I64
                });
                if out.is_bool() {
                    return Err(Error::unsupported_dtype(out, self.name()));
                }
                Ok(out)
            }
            Self::Mean => {
                let out = requested.unwrap_or(input);
                if !out.is_float() {
                    return Err(Error::unsupported_dtype(out, self.name()));
                }
                Ok(out)
            }
            Self::ArgMax => match requested {
                None | Some(DType::I64) => Ok(DType::I64),
                Some(other) => Err(Error::invalid_argument(
                    "out_dtype",
                    format!("argmax returns i64 indices, got {other}"),
                )),
            },
        }
    }
}

/// Compute output shape for reduction
///
/// # Arguments
/// * `input_shape` - Shape of input tensor
/// * `dims` - Normalized dimensions to reduce over
/// * `keepdim` - If true, keep reduced dimensions as size 1
pub fn reduce_output_shape(input_shape: &[usize], dims: &[usize], keepdim: bool) -> Vec<usize> {
    if keepdim {
        input_shape
            .iter()
            .enumerate()
            .map(|(i, &s)| if dims.contains(&i) { 1 } else { s })
            .collect()
    } else {
        input_shape
            .iter()
            .enumerate()
            .filter(|(i, _)| !dims.contains(i))
            .map(|(_, &s)| s)
            .collect()
    }
}

/// Output shape of a full reduction: `[]`, or all ones of the input rank.
pub fn full_output_shape(ndim: usize, keepdim: bool) -> Vec<usize> {
    if keepdim { vec![1; ndim] } else { Vec::new() }
}

/// Normalize reduction dimensions (handle negative indices)
///
/// Each dim must satisfy `-rank <= d < rank`. A rank-0 tensor validates as
/// rank 1, so `0` and `-1` are accepted for scalars. Repeated dims are
/// rejected.
pub fn normalize_dims(ndim: usize, dims: &[isize]) -> Result<Vec<usize>> {
    let rank = ndim.max(1) as isize;
    let mut out = Vec::with_capacity(dims.len());
    for &d in dims {
        let idx = if d < 0 { rank + d } else { d };
        if idx < 0 || idx >= rank {
            return Err(Error::InvalidDimension { dim: d, ndim });
        }
        let idx = idx as usize;
        if out.contains(&idx) {
            return Err(Error::invalid_argument(
                "dims",
                format!("dimension {d} is repeated"),
            ));
        }
        out.push(idx);
    }
    Ok(out)
}

/// All dimensions for full reduction
pub fn all_dims(ndim: usize) -> Vec<usize> {
    (0..ndim).collect()
}

/// View a shape as `(M, N, K)` around reduction axis `dim`.
///
/// `M` is the product of extents before `dim`, `N` the extent of `dim`,
/// `K` the product after it.
pub fn split_around_dim(shape: &[usize], dim: usize) -> (usize, usize, usize) {
    let m = shape[..dim].iter().product();
    let n = shape[dim];
    let k = shape[dim + 1..].iter().product();
    (m, n, k)
}

/// Permutation moving `dims` to the end, keeping relative order elsewhere.
///
/// Reduced dims keep their ascending order, so the flattened trailing axis
/// enumerates them row-major.
pub fn permutation_to_back(ndim: usize, dims: &[usize]) -> Vec<usize> {
    let mut reduced: Vec<usize> = dims.to_vec();
    reduced.sort_unstable();
    let mut order: Vec<usize> = (0..ndim).filter(|d| !reduced.contains(d)).collect();
    order.extend(reduced);
    order
}
