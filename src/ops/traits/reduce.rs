//! Reduction operations trait.

use crate::dtype::DType;
use crate::error::Result;
use crate::ops::reduce::ReduceOp;
use crate::runtime::Runtime;
use crate::tensor::Tensor;

/// Reduction operations
///
/// Full reductions collapse every element into one value; their output has
/// shape `[]`, or all ones of the input rank with `keepdim`. Axis reductions
/// produce one value per position of the kept dims.
///
/// Dims follow the usual convention: `-rank <= dim < rank`, negatives count
/// from the end, and rank-0 tensors accept `0` and `-1`.
pub trait ReduceOps<R: Runtime> {
    /// Reduce every element of `a` with `op`.
    ///
    /// `out_dtype` overrides the default output dtype:
    /// - `Sum`: any numeric dtype (default: the input dtype for floats, I64
    ///   for integers and bool)
    /// - `Mean`: a float dtype (default: the input dtype, which must be a float)
    /// - `ArgMax`: only I64
    ///
    /// Over zero elements, sum is 0, mean is NaN, and argmax fails with
    /// [`Error::EmptyReduction`](crate::error::Error::EmptyReduction).
    fn reduce_full(
        &self,
        a: &Tensor<R>,
        op: ReduceOp,
        keepdim: bool,
        out_dtype: Option<DType>,
    ) -> Result<Tensor<R>>;

    /// Reduce `a` over `dims` with `op`.
    ///
    /// `Sum` and `Mean` accept any set of distinct dims, and an empty slice
    /// means all dims. `ArgMax` requires exactly one dim. `out_dtype` follows
    /// the rules of [`reduce_full`](Self::reduce_full).
    fn reduce_axis(
        &self,
        a: &Tensor<R>,
        dims: &[isize],
        keepdim: bool,
        op: ReduceOp,
        out_dtype: Option<DType>,
    ) -> Result<Tensor<R>>;

    /// Sum of all elements
    ///
    /// # Example
    ///
    /// ```
    /// # use numkern::prelude::*;
    /// # let device = CpuDevice::new();
    /// # let client = CpuRuntime::default_client(&device);
    /// let a = Tensor::<CpuRuntime>::from_slice(&[1.0f32, 2.0, 3.0, 4.0], &[2, 2], &device);
    /// let total = client.sum(&a, false)?;
    /// assert_eq!(total.item::<f32>()?, 10.0);
    /// # Ok::<(), numkern::error::Error>(())
    /// ```
    fn sum(&self, a: &Tensor<R>, keepdim: bool) -> Result<Tensor<R>> {
        self.reduce_full(a, ReduceOp::Sum, keepdim, None)
    }

    /// Sum of all elements, written as `dtype`
    fn sum_with_dtype(&self, a: &Tensor<R>, keepdim: bool, dtype: DType) -> Result<Tensor<R>> {
        self.reduce_full(a, ReduceOp::Sum, keepdim, Some(dtype))
    }

    /// Arithmetic mean of all elements
    fn mean(&self, a: &Tensor<R>, keepdim: bool) -> Result<Tensor<R>> {
        self.reduce_full(a, ReduceOp::Mean, keepdim, None)
    }

    /// Arithmetic mean of all elements, written as the float `dtype`
    ///
    /// This is how integer tensors are averaged.
    fn mean_with_dtype(&self, a: &Tensor<R>, keepdim: bool, dtype: DType) -> Result<Tensor<R>> {
        self.reduce_full(a, ReduceOp::Mean, keepdim, Some(dtype))
    }

    /// Flat index of the first maximal element
    ///
    /// NaN counts as greater than every number; the first NaN wins.
    ///
    /// # Example
    ///
    /// ```
    /// # use numkern::prelude::*;
    /// # let device = CpuDevice::new();
    /// # let client = CpuRuntime::default_client(&device);
    /// let a = Tensor::<CpuRuntime>::from_slice(&[3.0f32, 1.0, 3.0, 2.0], &[4], &device);
    /// assert_eq!(client.argmax(&a, false)?.item::<i64>()?, 0);
    /// # Ok::<(), numkern::error::Error>(())
    /// ```
    fn argmax(&self, a: &Tensor<R>, keepdim: bool) -> Result<Tensor<R>> {
        self.reduce_full(a, ReduceOp::ArgMax, keepdim, None)
    }

    /// Sum along `dims`
    fn sum_dims(&self, a: &Tensor<R>, dims: &[isize], keepdim: bool) -> Result<Tensor<R>> {
        self.reduce_axis(a, dims, keepdim, ReduceOp::Sum, None)
    }

    /// Sum along `dims`, written as `dtype`
    fn sum_dims_with_dtype(
        &self,
        a: &Tensor<R>,
        dims: &[isize],
        keepdim: bool,
        dtype: DType,
    ) -> Result<Tensor<R>> {
        self.reduce_axis(a, dims, keepdim, ReduceOp::Sum, Some(dtype))
    }

    /// Mean along `dims`
    ///
    /// # Example
    ///
    /// ```
    /// # use numkern::prelude::*;
    /// # let device = CpuDevice::new();
    /// # let client = CpuRuntime::default_client(&device);
    /// let a = Tensor::<CpuRuntime>::from_slice(&[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3], &device);
    /// let rows = client.mean_dims(&a, &[-1], false)?;
    /// assert_eq!(rows.to_vec::<f32>(), [2.0, 5.0]);
    /// # Ok::<(), numkern::error::Error>(())
    /// ```
    fn mean_dims(&self, a: &Tensor<R>, dims: &[isize], keepdim: bool) -> Result<Tensor<R>> {
        self.reduce_axis(a, dims, keepdim, ReduceOp::Mean, None)
    }

    /// Mean along `dims`, written as the float `dtype`
    fn mean_dims_with_dtype(
        &self,
        a: &Tensor<R>,
        dims: &[isize],
        keepdim: bool,
        dtype: DType,
    ) -> Result<Tensor<R>> {
        self.reduce_axis(a, dims, keepdim, ReduceOp::Mean, Some(dtype))
    }

    /// Index of the first maximum along `dim`, as I64
    fn argmax_dim(&self, a: &Tensor<R>, dim: isize, keepdim: bool) -> Result<Tensor<R>> {
        self.reduce_axis(a, &[dim], keepdim, ReduceOp::ArgMax, None)
    }
}
