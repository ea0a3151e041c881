//! Tiling and launch-parameter selection
//!
//! Full reductions use a closed-form plan ([`FullReducePlan`]). Axis
//! reductions pick an [`AxisTileConfig`] either from the tune cache or from a
//! deterministic heuristic; the candidate space is [`axis_reduce_candidates`].

use crate::error::{Error, Result};

/// Default worker count of the fixed-worker full reduction.
pub const DEFAULT_FULL_REDUCE_WORKERS: usize = 12;

/// Default cap on the number of programs one launch may use.
pub const DEFAULT_MAX_GRID: usize = 65_535;

/// Column tile of the axis mean/sum kernel.
pub const AXIS_BLOCK_N: usize = 1024;

/// Row-tile candidates of the axis mean/sum kernel.
pub const AXIS_BLOCK_M_CANDIDATES: [usize; 4] = [1, 2, 4, 8];

/// Rows are split into this many row tiles by the argmax-over-dim heuristic.
pub const ARGMAX_DIM_ROW_SPLIT: usize = 8;

/// Largest row tile of argmax over a dim.
pub const ARGMAX_DIM_MAX_BLOCK_M: usize = 1024;

/// Largest column tile of argmax over a dim.
pub const ARGMAX_DIM_MAX_BLOCK_N: usize = 4096;

/// Smallest power of two `>= n`; `1` for `n == 0`.
#[inline]
pub fn next_power_of_two(n: usize) -> usize {
    n.max(1).next_power_of_two()
}

/// Ceiling division. `b` must be non-zero.
#[inline]
pub fn cdiv(a: usize, b: usize) -> usize {
    a.div_ceil(b)
}

/// Integer `ceil(sqrt(n))`.
pub fn ceil_sqrt(n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    let mut r = (n as f64).sqrt() as usize;
    while r.saturating_mul(r) < n {
        r += 1;
    }
    while r > 1 && (r - 1) * (r - 1) >= n {
        r -= 1;
    }
    r
}

/// How a full reduction splits its input across workers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FullReduceStrategy {
    /// A fixed number of workers, each taking a power-of-two tile.
    FixedWorkers(usize),
    /// Tile of `next_pow2(ceil(sqrt(n)))`, with as many workers as tiles.
    SqrtSplit,
}

impl Default for FullReduceStrategy {
    fn default() -> Self {
        Self::FixedWorkers(DEFAULT_FULL_REDUCE_WORKERS)
    }
}

/// Launch parameters of a two-stage full reduction.
///
/// Stage 1 runs `worker_count` workers; worker `w` owns
/// `[w * tile_size, (w + 1) * tile_size)` clipped to the input. Stage 2
/// consumes exactly `valid_partials` slots of the intermediate buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FullReducePlan {
    /// Stage 1 programs, and slots in the intermediate buffer
    pub worker_count: usize,
    /// Elements per worker (power of two)
    pub tile_size: usize,
    /// Slots holding a partial computed from real data
    pub valid_partials: usize,
    /// Stage 2 block: smallest power of two covering `worker_count`
    pub final_block: usize,
}

impl FullReducePlan {
    /// Plan a full reduction over `numel > 0` elements.
    pub fn select(numel: usize, strategy: FullReduceStrategy) -> Result<Self> {
        if numel == 0 {
            return Err(Error::Internal(
                "full reduction planned for an empty input".to_string(),
            ));
        }

        let plan = match strategy {
            FullReduceStrategy::FixedWorkers(0) => {
                return Err(Error::invalid_argument(
                    "full_reduce_workers",
                    "worker count must be at least 1",
                ));
            }
            FullReduceStrategy::FixedWorkers(workers) => {
                let tile_size = next_power_of_two(cdiv(numel, workers));
                let valid_partials = cdiv(numel, tile_size).min(workers.min(numel));
                Self {
                    worker_count: workers,
                    tile_size,
                    valid_partials,
                    final_block: next_power_of_two(workers),
                }
            }
            FullReduceStrategy::SqrtSplit => {
                let tile_size = next_power_of_two(ceil_sqrt(numel));
                let workers = cdiv(numel, tile_size);
                Self {
                    worker_count: workers,
                    tile_size,
                    valid_partials: workers,
                    final_block: next_power_of_two(workers),
                }
            }
        };

        debug_assert!(plan.covered() >= numel);
        debug_assert!(plan.valid_partials <= plan.worker_count);
        Ok(plan)
    }

    /// Elements addressed by all workers, including masked lanes.
    ///
    /// Saturates; an overflowing plan is routed to 64-bit offsets.
    #[inline]
    pub fn covered(&self) -> usize {
        self.worker_count.saturating_mul(self.tile_size)
    }
}

/// Tile shape of an axis reduction program: `block_m` rows by `block_n` columns.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct AxisTileConfig {
    /// Rows per program iteration
    pub block_m: usize,
    /// Columns per inner tile
    pub block_n: usize,
}

impl AxisTileConfig {
    /// Row tiles needed to cover `m` rows
    #[inline]
    pub fn row_tiles(&self, m: usize) -> usize {
        cdiv(m, self.block_m)
    }

    /// Rows addressed including the masked tail of the last row tile
    #[inline]
    pub fn padded_rows(&self, m: usize) -> usize {
        self.row_tiles(m).saturating_mul(self.block_m)
    }
}

/// Candidate tiles of the axis mean/sum kernel, in search order.
pub fn axis_reduce_candidates() -> Vec<AxisTileConfig> {
    AXIS_BLOCK_M_CANDIDATES
        .iter()
        .map(|&block_m| AxisTileConfig {
            block_m,
            block_n: AXIS_BLOCK_N,
        })
        .collect()
}

/// Deterministic axis mean/sum tile used when nothing has been measured.
///
/// Sizes the row tile so one iteration covers roughly `AXIS_BLOCK_N`
/// elements, never wider than the row count needs.
pub fn axis_reduce_heuristic(m: usize, n: usize) -> AxisTileConfig {
    let rows_per_block = next_power_of_two(cdiv(AXIS_BLOCK_N, n.max(1)));
    let max_block_m = AXIS_BLOCK_M_CANDIDATES[AXIS_BLOCK_M_CANDIDATES.len() - 1];
    let block_m = rows_per_block.min(max_block_m).min(next_power_of_two(m));
    AxisTileConfig {
        block_m,
        block_n: AXIS_BLOCK_N,
    }
}

/// Closed-form tile of argmax over a dim.
pub fn argmax_dim_tiles(m: usize, n: usize) -> AxisTileConfig {
    AxisTileConfig {
        block_m: next_power_of_two(cdiv(m.max(1), ARGMAX_DIM_ROW_SPLIT)).min(ARGMAX_DIM_MAX_BLOCK_M),
        block_n: next_power_of_two(n).min(ARGMAX_DIM_MAX_BLOCK_N),
    }
}

/// Programs launched for `tasks` units of work under a grid cap.
///
/// Each program then walks `ceil(tasks / grid)` units with a grid stride.
#[inline]
pub fn grid_size(tasks: usize, max_grid: usize) -> usize {
    tasks.min(max_grid.max(1))
}
