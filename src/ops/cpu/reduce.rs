//! CPU implementation of reduce operations.

use crate::dtype::DType;
use crate::error::Result;
use crate::ops::{ReduceOp, ReduceOps};
use crate::runtime::cpu::{
    CpuClient, CpuRuntime,
    helpers::{reduce_axis_impl, reduce_full_impl},
};
use crate::tensor::Tensor;

/// ReduceOps implementation for CPU runtime.
impl ReduceOps<CpuRuntime> for CpuClient {
    fn reduce_full(
        &self,
        a: &Tensor<CpuRuntime>,
        op: ReduceOp,
        keepdim: bool,
        out_dtype: Option<DType>,
    ) -> Result<Tensor<CpuRuntime>> {
        reduce_full_impl(self, a, op, keepdim, out_dtype)
    }

    fn reduce_axis(
        &self,
        a: &Tensor<CpuRuntime>,
        dims: &[isize],
        keepdim: bool,
        op: ReduceOp,
        out_dtype: Option<DType>,
    ) -> Result<Tensor<CpuRuntime>> {
        reduce_axis_impl(self, a, dims, keepdim, op, out_dtype)
    }
}
