//! Shared helper functions for runtime backends

use crate::error::Result;
use crate::runtime::Runtime;
use crate::tensor::Tensor;

/// Ensure a tensor is contiguous in memory.
///
/// Already-contiguous tensors are returned as a zero-copy view (Arc clone).
/// Otherwise the strided view is materialized into fresh storage.
///
/// Reduction kernels index their input as a dense `[M, N, K]` block, so every
/// CPU reduction passes its (possibly permuted) input through here first.
#[inline]
pub fn ensure_contiguous<R: Runtime>(tensor: &Tensor<R>) -> Result<Tensor<R>> {
    if tensor.is_contiguous() {
        Ok(tensor.clone())
    } else {
        tensor.try_contiguous()
    }
}
