//! Autotune cache for axis-reduction tile shapes
//!
//! The cache is an injected object, not module state: a client holds it in an
//! `Arc`, clones of the client share it, and clearing it only costs the next
//! call a re-measurement. A missing entry never blocks a reduction. With
//! autotuning disabled the deterministic heuristic is used instead.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::Duration;

use super::tiling::AxisTileConfig;
use crate::dtype::DType;
use crate::error::Result;

/// Identity of one tuning problem.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TuneKey {
    /// Kernel name (e.g. `"mean_dim"`)
    pub kernel: &'static str,
    /// Input element type
    pub dtype: DType,
    /// Rows
    pub m: usize,
    /// Reduced elements per row
    pub n: usize,
}

/// Process-lifetime memo of the fastest tile per [`TuneKey`].
#[derive(Debug, Default)]
pub struct TuneCache {
    entries: RwLock<HashMap<TuneKey, AxisTileConfig>>,
}

impl TuneCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached tile for `key`, if one was measured
    pub fn get(&self, key: &TuneKey) -> Option<AxisTileConfig> {
        self.entries.read().get(key).copied()
    }

    /// Record a tile for `key`, keeping an existing entry.
    ///
    /// Returns the tile actually stored, so concurrent tuners agree.
    pub fn insert(&self, key: TuneKey, config: AxisTileConfig) -> AxisTileConfig {
        *self.entries.write().entry(key).or_insert(config)
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Pick the tile for `key`.
    ///
    /// Order of preference: cached entry, then (when `autotune`) the fastest
    /// candidate as timed by `measure`, then `fallback`. Timing ties keep the
    /// earlier candidate. The lock is not held while measuring.
    ///
    /// A cached entry is only honored if it is `fallback` or one of
    /// `candidates`, the tiles the caller sized its offsets for. Any other
    /// entry is evicted and the key is selected afresh.
    pub fn select<F>(
        &self,
        key: TuneKey,
        candidates: &[AxisTileConfig],
        fallback: AxisTileConfig,
        autotune: bool,
        mut measure: F,
    ) -> Result<AxisTileConfig>
    where
        F: FnMut(AxisTileConfig) -> Result<Duration>,
    {
        if let Some(hit) = self.get(&key) {
            if hit == fallback || candidates.contains(&hit) {
                return Ok(hit);
            }
            self.entries.write().remove(&key);
            log::warn!(
                "evicted cached {} {} m={} n={}: {:?} is not a candidate tile",
                key.kernel,
                key.dtype,
                key.m,
                key.n,
                hit
            );
        }
        if !autotune || candidates.is_empty() {
            return Ok(fallback);
        }

        let mut best: Option<(AxisTileConfig, Duration)> = None;
        for &candidate in candidates {
            let elapsed = measure(candidate)?;
            log::trace!(
                "autotune {} {} m={} n={}: {:?} took {:?}",
                key.kernel,
                key.dtype,
                key.m,
                key.n,
                candidate,
                elapsed
            );
            if best.is_none_or(|(_, t)| elapsed < t) {
                best = Some((candidate, elapsed));
            }
        }

        let Some((winner, elapsed)) = best else {
            return Ok(fallback);
        };
        let (kernel, dtype, m, n) = (key.kernel, key.dtype, key.m, key.n);
        let stored = self.insert(key, winner);
        log::info!(
            "autotune cached {kernel} {dtype} m={m} n={n}: block_m={} block_n={} ({elapsed:?})",
            stored.block_m,
            stored.block_n
        );
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::reduce::tiling::axis_reduce_candidates;

    fn key(m: usize, n: usize) -> TuneKey {
        TuneKey {
            kernel: "mean_dim",
            dtype: DType::F32,
            m,
            n,
        }
    }

    fn fallback() -> AxisTileConfig {
        AxisTileConfig {
            block_m: 1,
            block_n: 1024,
        }
    }

    #[test]
    fn test_disabled_uses_fallback_without_measuring() {
        let cache = TuneCache::new();
        let mut calls = 0;
        let got = cache
            .select(key(8, 8), &axis_reduce_candidates(), fallback(), false, |_| {
                calls += 1;
                Ok(Duration::ZERO)
            })
            .unwrap();
        assert_eq!(got, fallback());
        assert_eq!(calls, 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_autotune_picks_fastest_and_caches() {
        let cache = TuneCache::new();
        let candidates = axis_reduce_candidates();
        let got = cache
            .select(key(64, 64), &candidates, fallback(), true, |c| {
                // block_m = 4 is fastest
                Ok(Duration::from_micros(100 - (c.block_m as u64 == 4) as u64 * 90))
            })
            .unwrap();
        assert_eq!(got.block_m, 4);
        assert_eq!(cache.len(), 1);

        // Cached: no further measurement, same answer.
        let again = cache
            .select(key(64, 64), &candidates, fallback(), true, |_| {
                panic!("cached entry must not be re-measured")
            })
            .unwrap();
        assert_eq!(again, got);
    }

    #[test]
    fn test_ties_keep_first_candidate() {
        let cache = TuneCache::new();
        let got = cache
            .select(key(3, 3), &axis_reduce_candidates(), fallback(), true, |_| {
                Ok(Duration::from_micros(5))
            })
            .unwrap();
        assert_eq!(got.block_m, 1);
    }

    #[test]
    fn test_clear() {
        let cache = TuneCache::new();
        cache.insert(key(1, 1), fallback());
        assert_eq!(cache.get(&key(1, 1)), Some(fallback()));
        cache.clear();
        assert!(cache.get(&key(1, 1)).is_none());
    }

    #[test]
    fn test_foreign_entry_is_not_used() {
        let cache = TuneCache::new();
        let zero_rows = AxisTileConfig {
            block_m: 0,
            block_n: 1024,
        };
        cache.insert(key(5, 3), zero_rows);
        let got = cache
            .select(key(5, 3), &axis_reduce_candidates(), fallback(), false, |_| {
                panic!("disabled autotune must not measure")
            })
            .unwrap();
        assert_eq!(got, fallback());
        assert!(cache.is_empty());

        // With autotune on, the measured winner takes the evicted slot.
        cache.insert(key(5, 3), zero_rows);
        let got = cache
            .select(key(5, 3), &axis_reduce_candidates(), fallback(), true, |_| {
                Ok(Duration::from_micros(1))
            })
            .unwrap();
        assert_eq!(got.block_m, 1);
        assert_eq!(cache.get(&key(5, 3)), Some(got));
    }

    #[test]
    fn test_insert_keeps_existing() {
        let cache = TuneCache::new();
        let first = fallback();
        let second = AxisTileConfig {
            block_m: 8,
            block_n: 1024,
        };
        assert_eq!(cache.insert(key(2, 2), first), first);
        assert_eq!(cache.insert(key(2, 2), second), first);
    }
}
