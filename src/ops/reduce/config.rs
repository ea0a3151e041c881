//! Reduction configuration
//!
//! Environment overrides (read by [`ReduceConfig::from_env`]):
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `NUMKERN_REDUCE_WORKERS` | full-reduction worker count, or `sqrt` for [`FullReduceStrategy::SqrtSplit`] |
//! | `NUMKERN_MAX_GRID` | cap on programs per axis-reduction launch |
//! | `NUMKERN_AUTOTUNE` | `1`/`true`/`yes`/`on` enables tile measurement |
//! | `NUMKERN_FORCE_I64_INDEX` | `1`/`true`/`yes`/`on` forces 64-bit offsets |

use super::tiling::{DEFAULT_MAX_GRID, FullReduceStrategy};
use crate::dtype::AccumulationPrecision;
use crate::error::{Error, Result};

/// Environment variable for the full-reduction worker count
pub const ENV_REDUCE_WORKERS: &str = "NUMKERN_REDUCE_WORKERS";
/// Environment variable for the launch grid cap
pub const ENV_MAX_GRID: &str = "NUMKERN_MAX_GRID";
/// Environment variable enabling autotuning
pub const ENV_AUTOTUNE: &str = "NUMKERN_AUTOTUNE";
/// Environment variable forcing 64-bit index arithmetic
pub const ENV_FORCE_I64_INDEX: &str = "NUMKERN_FORCE_I64_INDEX";

/// Tunables of the reduction engine, held by a runtime client.
///
/// None of these change results beyond floating-point summation order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReduceConfig {
    /// Worker split of two-stage full reductions
    pub full_reduce: FullReduceStrategy,
    /// Maximum programs per axis-reduction launch; larger problems grid-stride
    pub max_grid: usize,
    /// Measure candidate tiles and cache the fastest
    pub autotune: bool,
    /// Accumulator precision of sum and mean
    pub precision: AccumulationPrecision,
    /// Always use 64-bit offsets
    pub force_wide_index: bool,
}

impl Default for ReduceConfig {
    fn default() -> Self {
        Self {
            full_reduce: FullReduceStrategy::default(),
            max_grid: DEFAULT_MAX_GRID,
            autotune: false,
            precision: AccumulationPrecision::default(),
            force_wide_index: false,
        }
    }
}

fn env_flag(var: &str) -> Option<bool> {
    let v = std::env::var(var).ok()?;
    Some(matches!(
        v.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    ))
}

fn env_positive(var: &str) -> Option<usize> {
    let raw = std::env::var(var).ok()?;
    match raw.trim().parse::<usize>() {
        Ok(v) if v > 0 => Some(v),
        _ => {
            log::warn!("ignoring {var}={raw:?}: expected a positive integer");
            None
        }
    }
}

impl ReduceConfig {
    /// Defaults overridden by the `NUMKERN_*` environment variables.
    ///
    /// Malformed values are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var(ENV_REDUCE_WORKERS) {
            if raw.trim().eq_ignore_ascii_case("sqrt") {
                config.full_reduce = FullReduceStrategy::SqrtSplit;
            } else if let Some(workers) = env_positive(ENV_REDUCE_WORKERS) {
                config.full_reduce = FullReduceStrategy::FixedWorkers(workers);
            }
        }
        if let Some(grid) = env_positive(ENV_MAX_GRID) {
            config.max_grid = grid;
        }
        if let Some(on) = env_flag(ENV_AUTOTUNE) {
            config.autotune = on;
        }
        if let Some(on) = env_flag(ENV_FORCE_I64_INDEX) {
            config.force_wide_index = on;
        }

        config
    }

    /// Use `workers` fixed full-reduction workers
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.full_reduce = FullReduceStrategy::FixedWorkers(workers);
        self
    }

    /// Set the full-reduction strategy
    pub fn with_full_reduce(mut self, strategy: FullReduceStrategy) -> Self {
        self.full_reduce = strategy;
        self
    }

    /// Set the launch grid cap
    pub fn with_max_grid(mut self, max_grid: usize) -> Self {
        self.max_grid = max_grid;
        self
    }

    /// Enable or disable autotuning
    pub fn with_autotune(mut self, autotune: bool) -> Self {
        self.autotune = autotune;
        self
    }

    /// Set the accumulation precision
    pub fn with_precision(mut self, precision: AccumulationPrecision) -> Self {
        self.precision = precision;
        self
    }

    /// Force 64-bit offsets
    pub fn with_force_wide_index(mut self, force: bool) -> Self {
        self.force_wide_index = force;
        self
    }

    /// Reject settings no launch can honor.
    pub fn validate(&self) -> Result<()> {
        if self.full_reduce == FullReduceStrategy::FixedWorkers(0) {
            return Err(Error::invalid_argument(
                "full_reduce_workers",
                "worker count must be at least 1",
            ));
        }
        if self.max_grid == 0 {
            return Err(Error::invalid_argument(
                "max_grid",
                "grid cap must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReduceConfig::default();
        assert_eq!(config.full_reduce, FullReduceStrategy::FixedWorkers(12));
        assert_eq!(config.max_grid, 65_535);
        assert!(!config.autotune);
        assert!(!config.force_wide_index);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builders_and_validate() {
        let config = ReduceConfig::default()
            .with_workers(3)
            .with_max_grid(2)
            .with_autotune(true)
            .with_force_wide_index(true);
        assert_eq!(config.full_reduce, FullReduceStrategy::FixedWorkers(3));
        assert_eq!(config.max_grid, 2);
        assert!(config.validate().is_ok());

        assert!(ReduceConfig::default().with_workers(0).validate().is_err());
        assert!(ReduceConfig::default().with_max_grid(0).validate().is_err());
    }
}
