//! Accumulator types for sum and mean workers

use crate::dtype::Element;

/// Trait for accumulation types (i64, f32, f64) used by sum/mean workers.
///
/// Float accumulators load through f64. The i64 accumulator loads integers
/// bit-exactly and adds with wrapping, so integer sums never round.
pub trait Accumulator: Copy + Send + Sync + PartialEq + std::fmt::Debug + 'static {
    /// Identity of addition
    const ZERO: Self;

    /// Load one input element
    fn acc_in<T: Element>(v: T) -> Self;

    /// Add two accumulators
    fn acc_add(self, other: Self) -> Self;

    /// Divide by an element count
    fn acc_div(self, n: usize) -> Self;

    /// Convert to an output element
    fn acc_out<O: Element>(self) -> O;
}

impl Accumulator for i64 {
    const ZERO: Self = 0;

    #[inline]
    fn acc_in<T: Element>(v: T) -> Self {
        v.to_i64()
    }

    #[inline]
    fn acc_add(self, other: Self) -> Self {
        self.wrapping_add(other)
    }

    // Means always select a float accumulator; this truncates.
    #[inline]
    fn acc_div(self, n: usize) -> Self {
        self / n as i64
    }

    #[inline]
    fn acc_out<O: Element>(self) -> O {
        O::from_i64(self)
    }
}

impl Accumulator for f32 {
    const ZERO: Self = 0.0;

    #[inline]
    fn acc_in<T: Element>(v: T) -> Self {
        v.to_f64() as f32
    }

    #[inline]
    fn acc_add(self, other: Self) -> Self {
        self + other
    }

    #[inline]
    fn acc_div(self, n: usize) -> Self {
        self / n as f32
    }

    #[inline]
    fn acc_out<O: Element>(self) -> O {
        O::from_f64(self as f64)
    }
}

impl Accumulator for f64 {
    const ZERO: Self = 0.0;

    #[inline]
    fn acc_in<T: Element>(v: T) -> Self {
        v.to_f64()
    }

    #[inline]
    fn acc_add(self, other: Self) -> Self {
        self + other
    }

    #[inline]
    fn acc_div(self, n: usize) -> Self {
        self / n as f64
    }

    #[inline]
    fn acc_out<O: Element>(self) -> O {
        O::from_f64(self)
    }
}

/// Store accumulator values into a typed output buffer.
///
/// # Safety
/// `out` must point to `values.len()` writable elements of `O`.
#[allow(unsafe_op_in_unsafe_fn)]
pub unsafe fn store_kernel<A: Accumulator, O: Element>(values: &[A], out: *mut O) {
    for (i, &v) in values.iter().enumerate() {
        *out.add(i) = v.acc_out::<O>();
    }
}
