//! CPU kernel implementations
//!
//! Kernels are generic over `T: Element` and the offset type selected for
//! the call. They take raw pointers and are marked unsafe; callers uphold
//! the bounds documented on each kernel.

pub mod reduce;
