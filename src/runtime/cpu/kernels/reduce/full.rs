//! Two-stage full reduction
//!
//! Stage 1 (`partial_*_kernel`) runs `plan.worker_count` workers over disjoint
//! tiles and writes exactly one slot each. Stage 2 (`final_*`) is called only
//! after Stage 1 has returned, and reads slots `0..plan.valid_partials`.

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use super::{Accumulator, beats, gather};
use crate::dtype::Element;
use crate::ops::reduce::{FullReducePlan, IndexType};

/// Stage 1 of a full sum or mean.
///
/// Slot `w` receives the sum of `a[w * tile .. (w + 1) * tile]`, with lanes
/// past `numel` loaded as zero.
///
/// # Safety
/// - `a` must point to `numel` readable elements
/// - `partials.len()` must equal `plan.worker_count`
/// - `I` must hold `plan.covered()`
#[allow(unsafe_op_in_unsafe_fn)]
pub unsafe fn partial_sum_kernel<T: Element, A: Accumulator, I: IndexType>(
    a: *const T,
    numel: usize,
    plan: &FullReducePlan,
    partials: &mut [A],
) {
    debug_assert_eq!(partials.len(), plan.worker_count);
    let a_addr = a as usize;
    let tile = plan.tile_size;

    let worker = |(w, slot): (usize, &mut A)| {
        let a = a_addr as *const T;
        let limit = I::from_usize(numel);
        let start = I::from_usize(w) * I::from_usize(tile);
        let mut acc = A::ZERO;
        for lane in 0..tile {
            let offset = start + I::from_usize(lane);
            let v = unsafe { gather(a, offset, offset < limit, T::zero()) };
            acc = acc.acc_add(A::acc_in(v));
        }
        *slot = acc;
    };

    #[cfg(feature = "rayon")]
    partials.par_iter_mut().enumerate().for_each(worker);

    #[cfg(not(feature = "rayon"))]
    partials.iter_mut().enumerate().for_each(worker);
}

/// Stage 1 of a full argmax.
///
/// Slot `w` receives the tile's maximum and the global index of its first
/// occurrence. Each worker starts from the type's lowest value at the tile's
/// first index; masked lanes load that lowest value and never replace it.
///
/// # Safety
/// - `a` must point to `numel` readable elements
/// - `mid_value.len()` and `mid_index.len()` must equal `plan.worker_count`
/// - `I` must hold `plan.covered()`
#[allow(unsafe_op_in_unsafe_fn)]
pub unsafe fn partial_argmax_kernel<T: Element, I: IndexType>(
    a: *const T,
    numel: usize,
    plan: &FullReducePlan,
    mid_value: &mut [T],
    mid_index: &mut [i64],
) {
    debug_assert_eq!(mid_value.len(), plan.worker_count);
    debug_assert_eq!(mid_index.len(), plan.worker_count);
    let a_addr = a as usize;
    let tile = plan.tile_size;

    let worker = |(w, (value, index)): (usize, (&mut T, &mut i64))| {
        let a = a_addr as *const T;
        let limit = I::from_usize(numel);
        let start = I::from_usize(w) * I::from_usize(tile);
        let mut best = T::lowest();
        let mut best_at = start;
        for lane in 0..tile {
            let offset = start + I::from_usize(lane);
            let v = unsafe { gather(a, offset, offset < limit, T::lowest()) };
            if beats(v, best) {
                best = v;
                best_at = offset;
            }
        }
        *value = best;
        *index = best_at.to_i64();
    };

    #[cfg(feature = "rayon")]
    mid_value
        .par_iter_mut()
        .zip(mid_index.par_iter_mut())
        .enumerate()
        .for_each(worker);

    #[cfg(not(feature = "rayon"))]
    mid_value
        .iter_mut()
        .zip(mid_index.iter_mut())
        .enumerate()
        .for_each(worker);
}

/// Stage 2 of a full sum (or mean when `divisor` is `Some(numel)`).
///
/// Folds `partials[..valid]` in slot order.
pub fn final_sum<A: Accumulator>(partials: &[A], valid: usize, divisor: Option<usize>) -> A {
    let total = partials[..valid]
        .iter()
        .fold(A::ZERO, |acc, &p| acc.acc_add(p));
    match divisor {
        Some(n) => total.acc_div(n),
        None => total,
    }
}

/// Stage 2 of a full argmax.
///
/// Scans slots `0..valid` from low to high, keeping the earliest slot whose
/// value is maximal, then returns the global index Stage 1 stored for it.
pub fn final_argmax<T: Element>(mid_value: &[T], mid_index: &[i64], valid: usize) -> i64 {
    let mut best_slot = 0;
    for slot in 1..valid {
        if beats(mid_value[slot], mid_value[best_slot]) {
            best_slot = slot;
        }
    }
    mid_index[best_slot]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::reduce::FullReduceStrategy;

    fn plan(numel: usize, workers: usize) -> FullReducePlan {
        FullReducePlan::select(numel, FullReduceStrategy::FixedWorkers(workers)).unwrap()
    }

    fn argmax_two_stage<T: Element>(data: &[T], workers: usize) -> i64 {
        let p = plan(data.len(), workers);
        let mut values = vec![T::lowest(); p.worker_count];
        let mut indices = vec![0i64; p.worker_count];
        unsafe {
            partial_argmax_kernel::<T, i32>(data.as_ptr(), data.len(), &p, &mut values, &mut indices)
        };
        final_argmax(&values, &indices, p.valid_partials)
    }

    fn sum_two_stage(data: &[f32], workers: usize) -> f64 {
        let p = plan(data.len(), workers);
        let mut partials = vec![0.0f64; p.worker_count];
        unsafe { partial_sum_kernel::<f32, f64, i64>(data.as_ptr(), data.len(), &p, &mut partials) };
        final_sum(&partials, p.valid_partials, None)
    }

    #[test]
    fn test_first_occurrence_across_tiles() {
        assert_eq!(argmax_two_stage(&[3.0f32, 1.0, 3.0, 2.0], 12), 0);
        assert_eq!(argmax_two_stage(&[3.0f32, 1.0, 3.0, 2.0], 2), 0);
        // Max repeated in two different tiles; earlier tile wins.
        let mut data = vec![0i32; 64];
        data[20] = 9;
        data[50] = 9;
        assert_eq!(argmax_two_stage(&data, 12), 20);
    }

    #[test]
    fn test_all_lowest_reports_first_element() {
        let data = [f32::NEG_INFINITY; 9];
        assert_eq!(argmax_two_stage(&data, 4), 0);
        let data = [i8::MIN; 5];
        assert_eq!(argmax_two_stage(&data, 12), 0);
    }

    #[test]
    fn test_first_nan_wins() {
        let data = [1.0f64, f64::NAN, 7.0, f64::NAN];
        assert_eq!(argmax_two_stage(&data, 12), 1);
        assert_eq!(argmax_two_stage(&data, 1), 1);
    }

    #[test]
    fn test_hierarchical_sum_is_lossless() {
        let data: Vec<f32> = (0..64).map(|i| i as f32).collect();
        assert_eq!(sum_two_stage(&data, 12), 2016.0);
        assert_eq!(sum_two_stage(&data, 1), 2016.0);
    }

    #[test]
    fn test_final_reads_only_valid_slots() {
        // Stale slots past `valid` must not leak into the result.
        let partials = [1.0f32, 2.0, 1000.0];
        assert_eq!(final_sum(&partials, 2, None), 3.0);
        assert_eq!(final_sum(&partials, 2, Some(4)), 0.75);

        let values = [1.0f32, 2.0, 99.0];
        let indices = [0i64, 5, 10];
        assert_eq!(final_argmax(&values, &indices, 2), 5);
    }
}
