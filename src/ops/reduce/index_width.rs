//! Index-width selection for reduction kernels
//!
//! Every reduction call decides once whether its kernels do offset arithmetic
//! in `i32` or `i64`, then launches workers monomorphized over that choice.
//! `i32` is picked only when every offset the call can ever form stays below
//! `i32::MAX`, including padded offsets of masked lanes past the end of the
//! data. Overflowing an offset is a kernel defect; it is never reported as a
//! recoverable error.

use std::fmt::Debug;
use std::ops::{Add, Mul};

use crate::tensor::Layout;

/// Exclusive upper bound for values addressed with 32-bit offsets (`2^31 - 1`).
pub const I32_OFFSET_LIMIT: usize = i32::MAX as usize;

/// Index arithmetic width used by one reduction call.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum IndexWidth {
    /// 32-bit signed offsets
    #[default]
    I32,
    /// 64-bit signed offsets
    I64,
}

impl IndexWidth {
    /// Choose the width for a call whose offsets are bounded by `bounds`.
    ///
    /// Each bound is an exclusive upper limit of some offset the call forms:
    /// element count, storage span, padded composite offsets. `force_wide`
    /// selects `I64` unconditionally.
    pub fn select(bounds: &[usize], force_wide: bool) -> Self {
        if force_wide || bounds.iter().any(|&b| b >= I32_OFFSET_LIMIT) {
            Self::I64
        } else {
            Self::I32
        }
    }
}

impl std::fmt::Display for IndexWidth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::I32 => write!(f, "i32"),
            Self::I64 => write!(f, "i64"),
        }
    }
}

/// Exclusive bounds of the offsets a layout itself can produce.
///
/// Covers the element count and the furthest storage element the view can
/// reach through its strides and offset.
pub fn layout_bounds(layout: &Layout) -> [usize; 2] {
    [layout.elem_count(), layout.storage_span()]
}

/// Product of extents, saturating at `usize::MAX`.
///
/// Saturation pushes any overflowing product into the `I64` bucket, which is
/// the conservative answer.
pub fn saturating_product(extents: &[usize]) -> usize {
    extents
        .iter()
        .try_fold(1usize, |acc, &e| acc.checked_mul(e))
        .unwrap_or(usize::MAX)
}

/// Offset arithmetic type of a reduction worker.
///
/// Implemented for `i32` and `i64`. Offsets are formed in `Self` and only
/// converted to `usize` at the memory access, so a worker monomorphized over
/// `i32` really computes with 32-bit offsets.
pub trait IndexType:
    Copy + Debug + Send + Sync + 'static + PartialOrd + Add<Output = Self> + Mul<Output = Self>
{
    /// The width this type implements
    const WIDTH: IndexWidth;

    /// Convert a host offset. Values outside the type's range are a defect.
    fn from_usize(v: usize) -> Self;

    /// Convert back to a host offset for memory access
    fn to_usize(self) -> usize;

    /// Widen to the i64 index stored in argmax outputs
    fn to_i64(self) -> i64;
}

impl IndexType for i32 {
    const WIDTH: IndexWidth = IndexWidth::I32;

    #[inline]
    fn from_usize(v: usize) -> Self {
        debug_assert!(v <= i32::MAX as usize, "offset {v} overflows i32");
        v as i32
    }

    #[inline]
    fn to_usize(self) -> usize {
        debug_assert!(self >= 0);
        self as usize
    }

    #[inline]
    fn to_i64(self) -> i64 {
        self as i64
    }
}

impl IndexType for i64 {
    const WIDTH: IndexWidth = IndexWidth::I64;

    #[inline]
    fn from_usize(v: usize) -> Self {
        debug_assert!(v <= i64::MAX as usize, "offset {v} overflows i64");
        v as i64
    }

    #[inline]
    fn to_usize(self) -> usize {
        debug_assert!(self >= 0);
        self as usize
    }

    #[inline]
    fn to_i64(self) -> i64 {
        self
    }
}
