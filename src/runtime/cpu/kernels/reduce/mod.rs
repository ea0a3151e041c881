//! Reduction worker kernels
//!
//! - [`full`]: two-stage full reduction. Stage 1 writes one partial per
//!   worker into an intermediate buffer, Stage 2 folds the valid partials.
//! - [`segmented`]: axis reduction, one program per row tile with grid-stride
//!   iteration and column tiles accumulated in a running register.
//!
//! Workers are monomorphized over the element type, the accumulator, and the
//! offset type chosen by the index-width selector.

mod accumulate;
mod full;
mod segmented;

pub use accumulate::{Accumulator, store_kernel};
pub use full::{final_argmax, final_sum, partial_argmax_kernel, partial_sum_kernel};
pub use segmented::{argmax_dim_kernel, segmented_sum_kernel};

use crate::dtype::Element;
use crate::ops::reduce::IndexType;

/// Run `body(program_id)` for every program in `0..programs`.
///
/// Programs are independent; with the `rayon` feature they run on the
/// global pool, otherwise sequentially in id order.
#[inline]
pub fn launch<F>(programs: usize, body: F)
where
    F: Fn(usize) + Send + Sync,
{
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        (0..programs).into_par_iter().for_each(body);
    }

    #[cfg(not(feature = "rayon"))]
    (0..programs).for_each(body);
}

/// Masked load: `base[offset]` when `valid`, else the reduction identity `other`.
///
/// # Safety
/// When `valid` is true, `offset` must be in bounds of the buffer at `base`.
#[inline(always)]
#[allow(unsafe_op_in_unsafe_fn)]
unsafe fn gather<T: Copy, I: IndexType>(base: *const T, offset: I, valid: bool, other: T) -> T {
    if valid {
        *base.add(offset.to_usize())
    } else {
        other
    }
}

/// Argmax ordering: does `candidate` replace the current best?
///
/// NaN beats every number and the first NaN is kept. Equal values never
/// replace, so the lowest index wins ties.
#[inline(always)]
fn beats<T: Element>(candidate: T, best: T) -> bool {
    if best.is_nan() {
        false
    } else {
        candidate.is_nan() || candidate > best
    }
}
