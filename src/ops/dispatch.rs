//! Runtime dispatch from `DType` / `IndexWidth` to concrete generic types
//!
//! # Usage
//!
//! ```ignore
//! fn my_reduction(dtype: DType, width: IndexWidth) -> Result<()> {
//!     dispatch_dtype!(dtype, T => {
//!         dispatch_index_width!(width, I => {
//!             run_worker::<T, I>();
//!         });
//!     }, "my_reduction");
//!     Ok(())
//! }
//! ```
//!
//! ## Supported Types
//!
//! - `F64` -> `f64`, `F32` -> `f32`
//! - `F16` -> `half::f16`, `BF16` -> `half::bf16` (require the "f16" feature)
//! - `I64`/`I32`/`I16`/`I8` -> `i64`/`i32`/`i16`/`i8`
//! - `U64`/`U32`/`U16`/`U8` -> `u64`/`u32`/`u16`/`u8`
//! - `Bool` -> `UnsupportedDType` error. Callers that accept bool (sum, mean)
//!   dispatch on `DType::U8` instead, which has the same storage.

/// Internal helper macro to dispatch types requiring the "f16" feature.
#[macro_export]
#[doc(hidden)]
macro_rules! dispatch_f16_type {
    ($T:ident, $body:block, $dtype:expr, $type:ty) => {{
        #[cfg(feature = "f16")]
        {
            type $T = $type;
            $body
        }
        #[cfg(not(feature = "f16"))]
        {
            return Err($crate::error::Error::FeatureRequired {
                dtype: $dtype,
                feature: "f16",
            });
        }
    }};
}

/// Macro for runtime dtype dispatch to typed operations.
///
/// Executes `$body` with `$T` bound to the Rust type of `$dtype`. Returns
/// early from the enclosing function with an error for `Bool` or for
/// feature-gated types that are compiled out.
#[macro_export]
macro_rules! dispatch_dtype {
    ($dtype:expr, $T:ident => $body:block, $error_op:expr) => {
        match $dtype {
            $crate::dtype::DType::F64 => {
                type $T = f64;
                $body
            }
            $crate::dtype::DType::F32 => {
                type $T = f32;
                $body
            }
            $crate::dtype::DType::F16 => {
                $crate::dispatch_f16_type!($T, $body, $dtype, half::f16)
            }
            $crate::dtype::DType::BF16 => {
                $crate::dispatch_f16_type!($T, $body, $dtype, half::bf16)
            }
            $crate::dtype::DType::I64 => {
                type $T = i64;
                $body
            }
            $crate::dtype::DType::I32 => {
                type $T = i32;
                $body
            }
            $crate::dtype::DType::I16 => {
                type $T = i16;
                $body
            }
            $crate::dtype::DType::I8 => {
                type $T = i8;
                $body
            }
            $crate::dtype::DType::U64 => {
                type $T = u64;
                $body
            }
            $crate::dtype::DType::U32 => {
                type $T = u32;
                $body
            }
            $crate::dtype::DType::U16 => {
                type $T = u16;
                $body
            }
            $crate::dtype::DType::U8 => {
                type $T = u8;
                $body
            }
            $crate::dtype::DType::Bool => {
                return Err($crate::error::Error::UnsupportedDType {
                    dtype: $dtype,
                    op: $error_op,
                })
            }
        }
    };
}

/// Bind `$I` to the offset type (`i32` or `i64`) of an `IndexWidth`.
#[macro_export]
macro_rules! dispatch_index_width {
    ($width:expr, $I:ident => $body:block) => {
        match $width {
            $crate::ops::reduce::IndexWidth::I32 => {
                type $I = i32;
                $body
            }
            $crate::ops::reduce::IndexWidth::I64 => {
                type $I = i64;
                $body
            }
        }
    };
}
