//! Data type system for numkern tensors
//!
//! This module provides the `DType` enum representing all supported element types,
//! the accumulation precision used by reductions, and the `Element` trait that
//! binds Rust types to dtypes.

mod element;

pub use element::Element;

use std::fmt;

// ============================================================================
// Accumulation Precision
// ============================================================================

/// Accumulation precision for sum and mean reductions.
///
/// Intermediate float sums are carried in a type at least as wide as this
/// setting. F64 inputs and outputs, and integer inputs summed into a float
/// output, always accumulate in F64. Integer (or bool) inputs summed into an
/// integer output accumulate exactly in i64 with wrapping overflow.
///
/// | Precision | Decimal Digits | Use Case |
/// |-----------|----------------|----------|
/// | **F64**   | ~15-16         | Scientific computing, long reductions |
/// | **F32**   | ~7             | ML workloads, general computing (default) |
/// | **BF16**  | ~3             | Accepted for API parity; accumulates in F32 on CPU |
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum AccumulationPrecision {
    /// Accumulate in F64
    F64,
    /// Accumulate in F32 (default)
    #[default]
    F32,
    /// Accumulate in BF16 (CPU promotes to F32)
    BF16,
}

/// Accumulator a sum or mean runs in.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Accumulation {
    /// Exact wrapping i64
    I64,
    /// f64
    F64,
    /// f32
    F32,
}

impl AccumulationPrecision {
    /// Accumulator for reducing `input` into `output`.
    pub const fn accumulation(self, input: DType, output: DType) -> Accumulation {
        if !input.is_float() && !output.is_float() {
            Accumulation::I64
        } else if self.needs_f64(input, output) {
            Accumulation::F64
        } else {
            Accumulation::F32
        }
    }

    /// Whether a float accumulation of `input` into `output` must be f64.
    ///
    /// Returns `true` when the reduction must accumulate in f64.
    pub const fn needs_f64(self, input: DType, output: DType) -> bool {
        matches!(self, Self::F64)
            || matches!(input, DType::F64)
            || matches!(output, DType::F64)
            || !input.is_float()
            || !output.is_float()
    }
}

// ============================================================================
// DType Enum
// ============================================================================

/// Data types supported by numkern tensors
///
/// Discriminant values are stable:
/// - Floats: 0-9 (F64=0, F32=1, F16=2, BF16=3)
/// - Signed ints: 10-19 (I64=10, I32=11, I16=12, I8=13)
/// - Unsigned ints: 20-29 (U64=20, U32=21, U16=22, U8=23)
/// - Bool: 30
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
#[repr(u8)]
pub enum DType {
    // Floating point types (0-9)
    /// 64-bit floating point
    F64 = 0,
    /// 32-bit floating point (most common)
    F32 = 1,
    /// 16-bit floating point (IEEE 754)
    F16 = 2,
    /// 16-bit brain floating point
    BF16 = 3,

    // Integer types
    /// 64-bit signed integer
    I64 = 10,
    /// 32-bit signed integer
    I32 = 11,
    /// 16-bit signed integer
    I16 = 12,
    /// 8-bit signed integer
    I8 = 13,

    // Unsigned integer types
    /// 64-bit unsigned integer
    U64 = 20,
    /// 32-bit unsigned integer
    U32 = 21,
    /// 16-bit unsigned integer
    U16 = 22,
    /// 8-bit unsigned integer
    U8 = 23,

    /// Boolean type (stored as one byte, 0 or 1)
    Bool = 30,
}

impl DType {
    /// Size of one element in bytes
    #[inline]
    pub const fn size_in_bytes(self) -> usize {
        match self {
            Self::F64 | Self::I64 | Self::U64 => 8,
            Self::F32 | Self::I32 | Self::U32 => 4,
            Self::F16 | Self::BF16 | Self::I16 | Self::U16 => 2,
            Self::I8 | Self::U8 | Self::Bool => 1,
        }
    }

    /// Returns true if this is a floating point type
    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F64 | Self::F32 | Self::F16 | Self::BF16)
    }

    /// Returns true if this is a signed integer type
    #[inline]
    pub const fn is_signed_int(self) -> bool {
        matches!(self, Self::I64 | Self::I32 | Self::I16 | Self::I8)
    }

    /// Returns true if this is an unsigned integer type
    #[inline]
    pub const fn is_unsigned_int(self) -> bool {
        matches!(self, Self::U64 | Self::U32 | Self::U16 | Self::U8)
    }

    /// Returns true if this is any integer type (signed or unsigned)
    #[inline]
    pub const fn is_int(self) -> bool {
        self.is_signed_int() || self.is_unsigned_int()
    }

    /// Returns true if this is a boolean type
    #[inline]
    pub const fn is_bool(self) -> bool {
        matches!(self, Self::Bool)
    }

    /// Get the default dtype for integer operations
    #[inline]
    pub const fn default_int() -> Self {
        Self::I64
    }

    /// Short name for display (e.g., "f32", "i64")
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::F64 => "f64",
            Self::F32 => "f32",
            Self::F16 => "f16",
            Self::BF16 => "bf16",
            Self::I64 => "i64",
            Self::I32 => "i32",
            Self::I16 => "i16",
            Self::I8 => "i8",
            Self::U64 => "u64",
            Self::U32 => "u32",
            Self::U16 => "u16",
            Self::U8 => "u8",
            Self::Bool => "bool",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_name())
    }
}
