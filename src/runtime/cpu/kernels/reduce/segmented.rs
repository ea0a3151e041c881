//! Segmented (axis) reduction kernels
//!
//! Both kernels cut their rows into tiles of `block_m` rows and launch at
//! most `grid` programs; program `pid` handles tiles `pid, pid + grid, ...`.
//! Inside a row the reduced axis is consumed `block_n` columns at a time.
//! Rows past the end of the last tile are skipped, never written.

use super::{Accumulator, beats, gather, launch};
use crate::dtype::Element;
use crate::ops::reduce::{AxisTileConfig, IndexType, cdiv};

/// Sum (or mean, with `mean = true`) of each row of a dense `[m, n]` block.
///
/// Each program keeps a lane register of `min(block_n, n)` accumulators per
/// row; column tile `c` adds `a[row, c * block_n + lane]` into lane `lane`,
/// loading zero for columns past `n`. The lanes are folded once the row is
/// done, and mean divides by `n` after that.
///
/// # Safety
/// - `a` must point to `m * n` readable elements
/// - `out` must point to `m` writable accumulators
/// - `I` must hold `round_up(m, tiles.block_m) * n + tiles.block_n`
/// - `n > 0`
#[allow(unsafe_op_in_unsafe_fn, clippy::too_many_arguments)]
pub unsafe fn segmented_sum_kernel<T: Element, A: Accumulator, I: IndexType>(
    a: *const T,
    out: *mut A,
    m: usize,
    n: usize,
    tiles: AxisTileConfig,
    grid: usize,
    mean: bool,
) {
    debug_assert!(n > 0);
    let a_addr = a as usize;
    let out_addr = out as usize;
    let tasks = tiles.row_tiles(m);
    let lanes = tiles.block_n.min(n);
    let col_tiles = cdiv(n, tiles.block_n);

    launch(grid, |pid| {
        let a = a_addr as *const T;
        let out = out_addr as *mut A;
        let n_i = I::from_usize(n);
        let mut register = vec![A::ZERO; lanes];

        for task in (pid..tasks).step_by(grid) {
            for r in 0..tiles.block_m {
                let row = task * tiles.block_m + r;
                if row >= m {
                    break;
                }
                let row_base = I::from_usize(row) * n_i;
                register.fill(A::ZERO);

                for ct in 0..col_tiles {
                    let col0 = ct * tiles.block_n;
                    for (lane, slot) in register.iter_mut().enumerate() {
                        let col = col0 + lane;
                        let offset = row_base + I::from_usize(col);
                        let v = unsafe { gather(a, offset, col < n, T::zero()) };
                        *slot = slot.acc_add(A::acc_in(v));
                    }
                }

                let total = register.iter().fold(A::ZERO, |acc, &v| acc.acc_add(v));
                let value = if mean { total.acc_div(n) } else { total };
                unsafe { *out.add(row) = value };
            }
        }
    });
}

/// Argmax over axis 1 of a dense `[m, n, k]` block.
///
/// Task `t` covers row tile `t / k` at inner position `t % k`. Every row
/// carries a running `(max, index)` pair across its column tiles. Element
/// `(row, col, i)` lives at offset `row * n * k + col * k + i` and
/// `out[row * k + i]` receives the first column holding the maximum.
///
/// # Safety
/// - `a` must point to `m * n * k` readable elements
/// - `out` must point to `m * k` writable i64 elements
/// - `I` must hold `(round_up(m, tiles.block_m) * n + tiles.block_n) * k`
/// - `n > 0`
#[allow(unsafe_op_in_unsafe_fn)]
pub unsafe fn argmax_dim_kernel<T: Element, I: IndexType>(
    a: *const T,
    out: *mut i64,
    (m, n, k): (usize, usize, usize),
    tiles: AxisTileConfig,
    grid: usize,
) {
    debug_assert!(n > 0);
    let a_addr = a as usize;
    let out_addr = out as usize;
    let tasks = tiles.row_tiles(m) * k;
    let lanes = tiles.block_n.min(n);
    let col_tiles = cdiv(n, tiles.block_n);

    launch(grid, |pid| {
        let a = a_addr as *const T;
        let out = out_addr as *mut i64;
        let k_i = I::from_usize(k);
        let row_stride = I::from_usize(n) * k_i;

        for task in (pid..tasks).step_by(grid) {
            let tile = task / k;
            let inner = task % k;
            let inner_i = I::from_usize(inner);

            for r in 0..tiles.block_m {
                let row = tile * tiles.block_m + r;
                if row >= m {
                    break;
                }
                let row_base = I::from_usize(row) * row_stride + inner_i;
                let mut best = T::lowest();
                let mut best_col = 0usize;

                for ct in 0..col_tiles {
                    let col0 = ct * tiles.block_n;
                    for lane in 0..lanes {
                        let col = col0 + lane;
                        let offset = row_base + I::from_usize(col) * k_i;
                        let v = unsafe { gather(a, offset, col < n, T::lowest()) };
                        if beats(v, best) {
                            best = v;
                            best_col = col;
                        }
                    }
                }

                unsafe { *out.add(row * k + inner) = best_col as i64 };
            }
        }
    });
}
