//! Core Tensor type

use super::{Layout, Storage};
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::runtime::Runtime;
use std::fmt;

/// N-dimensional array stored on a compute device
///
/// `Tensor` consists of:
/// - **Storage**: Reference-counted device memory
/// - **Layout**: Shape, strides, and offset defining the view into storage
/// - **DType**: Element type (determined at runtime)
///
/// `permute` creates a tensor that shares the same storage with a new layout.
/// Reduction kernels call [`Self::try_contiguous`] (through
/// `ensure_contiguous`) before touching memory.
///
/// # Example
///
/// ```
/// use numkern::prelude::*;
///
/// let device = CpuDevice::new();
/// let a = Tensor::<CpuRuntime>::from_slice(&[1.0f32, 2.0, 3.0, 4.0], &[2, 2], &device);
/// let b = a.permute(&[1, 0]).unwrap(); // shares storage with a
/// assert_eq!(b.contiguous().to_vec::<f32>(), [1.0, 3.0, 2.0, 4.0]);
/// ```
pub struct Tensor<R: Runtime> {
    storage: Storage<R>,
    layout: Layout,
}

impl<R: Runtime> Tensor<R> {
    /// Create a tensor from storage and layout
    pub fn from_parts(storage: Storage<R>, layout: Layout) -> Self {
        Self { storage, layout }
    }

    /// Create a tensor from a slice of data
    ///
    /// # Panics
    ///
    /// Panics if `data.len()` does not equal the product of the `shape` dimensions.
    /// For a fallible alternative, use [`Self::try_from_slice`].
    pub fn from_slice<T: Element>(data: &[T], shape: &[usize], device: &R::Device) -> Self {
        Self::try_from_slice(data, shape, device).expect("Tensor::from_slice failed")
    }

    /// Create a tensor from a slice of data (fallible version)
    pub fn try_from_slice<T: Element>(
        data: &[T],
        shape: &[usize],
        device: &R::Device,
    ) -> Result<Self> {
        let expected_len: usize = shape.iter().product();
        if data.len() != expected_len {
            return Err(Error::ShapeMismatch {
                expected: shape.to_vec(),
                got: vec![data.len()],
            });
        }

        Ok(Self {
            storage: Storage::from_slice(data, device)?,
            layout: Layout::contiguous(shape),
        })
    }

    /// Create a `Bool` tensor, stored as one byte per element
    pub fn try_from_bools(data: &[bool], shape: &[usize], device: &R::Device) -> Result<Self> {
        let expected_len: usize = shape.iter().product();
        if data.len() != expected_len {
            return Err(Error::ShapeMismatch {
                expected: shape.to_vec(),
                got: vec![data.len()],
            });
        }
        let bytes: Vec<u8> = data.iter().map(|&b| u8::from(b)).collect();
        Ok(Self {
            storage: Storage::from_bytes(&bytes, DType::Bool, device)?,
            layout: Layout::contiguous(shape),
        })
    }

    /// Create a zero-initialized tensor
    ///
    /// # Panics
    ///
    /// Panics if allocation fails. See [`Self::try_empty`].
    pub fn empty(shape: &[usize], dtype: DType, device: &R::Device) -> Self {
        Self::try_empty(shape, dtype, device).expect("Tensor::empty failed")
    }

    /// Create a zero-initialized tensor (fallible version)
    pub fn try_empty(shape: &[usize], dtype: DType, device: &R::Device) -> Result<Self> {
        let len: usize = shape.iter().product();
        Ok(Self {
            storage: Storage::new(len, dtype, device)?,
            layout: Layout::contiguous(shape),
        })
    }

    /// Create a tensor filled with a scalar value
    ///
    /// The scalar is converted to the target dtype.
    pub fn full_scalar(shape: &[usize], dtype: DType, value: f64, device: &R::Device) -> Self {
        Self::try_full_scalar(shape, dtype, value, device).expect("Tensor::full_scalar failed")
    }

    /// Create a tensor filled with a scalar value (fallible version)
    ///
    /// F16 and BF16 require the `f16` feature.
    pub fn try_full_scalar(
        shape: &[usize],
        dtype: DType,
        value: f64,
        device: &R::Device,
    ) -> Result<Self> {
        // Allocate with T's alignment, then view as bytes.
        #[inline]
        fn typed_to_bytes<T: bytemuck::NoUninit>(v: Vec<T>) -> Vec<u8> {
            bytemuck::cast_slice::<T, u8>(&v).to_vec()
        }

        let len: usize = shape.iter().product();
        if len == 0 {
            return Self::try_empty(shape, dtype, device);
        }

        let bytes: Vec<u8> = match dtype {
            DType::F64 => typed_to_bytes(vec![value; len]),
            DType::F32 => typed_to_bytes(vec![value as f32; len]),
            #[cfg(feature = "f16")]
            DType::F16 => typed_to_bytes(vec![half::f16::from_f64(value); len]),
            #[cfg(feature = "f16")]
            DType::BF16 => typed_to_bytes(vec![half::bf16::from_f64(value); len]),
            #[cfg(not(feature = "f16"))]
            DType::F16 | DType::BF16 => {
                return Err(Error::FeatureRequired {
                    dtype,
                    feature: "f16",
                });
            }
            DType::I64 => typed_to_bytes(vec![value as i64; len]),
            DType::I32 => typed_to_bytes(vec![value as i32; len]),
            DType::I16 => typed_to_bytes(vec![value as i16; len]),
            DType::I8 => typed_to_bytes(vec![value as i8; len]),
            DType::U64 => typed_to_bytes(vec![value as u64; len]),
            DType::U32 => typed_to_bytes(vec![value as u32; len]),
            DType::U16 => typed_to_bytes(vec![value as u16; len]),
            DType::U8 => vec![value as u8; len],
            DType::Bool => vec![u8::from(value != 0.0); len],
        };

        Ok(Self {
            storage: Storage::from_bytes(&bytes, dtype, device)?,
            layout: Layout::contiguous(shape),
        })
    }

    // ===== Accessors =====

    /// Get the storage
    #[inline]
    pub fn storage(&self) -> &Storage<R> {
        &self.storage
    }

    /// Get the layout
    #[inline]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Get the shape
    #[inline]
    pub fn shape(&self) -> &[usize] {
        self.layout.shape()
    }

    /// Get the strides
    #[inline]
    pub fn strides(&self) -> &[isize] {
        self.layout.strides()
    }

    /// Get the number of dimensions (rank)
    #[inline]
    pub fn ndim(&self) -> usize {
        self.layout.ndim()
    }

    /// Get the total number of elements
    #[inline]
    pub fn numel(&self) -> usize {
        self.layout.elem_count()
    }

    /// Get the element type
    #[inline]
    pub fn dtype(&self) -> DType {
        self.storage.dtype()
    }

    /// Get the device
    #[inline]
    pub fn device(&self) -> &R::Device {
        self.storage.device()
    }

    /// Check if the tensor is contiguous in memory
    #[inline]
    pub fn is_contiguous(&self) -> bool {
        self.layout.is_contiguous()
    }

    /// Check if this is a scalar (0-dimensional tensor)
    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.layout.is_scalar()
    }

    // ===== View Operations (Zero-Copy) =====

    /// Permute dimensions (zero-copy)
    ///
    /// Output dimension `i` is input dimension `dims[i]`. `dims` must be a
    /// permutation of `0..ndim`.
    pub fn permute(&self, dims: &[usize]) -> Result<Self> {
        let layout = self
            .layout
            .permute(dims)
            .ok_or_else(|| Error::InvalidDimension {
                dim: dims.first().copied().unwrap_or(0) as isize,
                ndim: self.ndim(),
            })?;

        Ok(Self {
            storage: self.storage.clone(),
            layout,
        })
    }

    /// Make tensor contiguous (copy if needed)
    ///
    /// # Panics
    ///
    /// Panics if the copy cannot be allocated. See [`Self::try_contiguous`].
    pub fn contiguous(&self) -> Self {
        self.try_contiguous()
            .expect("Tensor::contiguous allocation failed")
    }

    /// Make tensor contiguous (fallible version)
    ///
    /// Contiguous tensors are returned as a view. Otherwise new storage is
    /// allocated and filled with `Runtime::copy_strided`.
    pub fn try_contiguous(&self) -> Result<Self> {
        if self.is_contiguous() {
            return Ok(self.clone());
        }

        let dtype = self.dtype();
        let device = self.storage.device();
        let storage = Storage::new(self.numel(), dtype, device)?;

        let elem_size = dtype.size_in_bytes();
        R::copy_strided(
            self.storage.ptr(),
            self.layout.offset() * elem_size,
            storage.ptr(),
            self.shape(),
            self.strides(),
            elem_size,
            device,
        )?;

        Ok(Self {
            storage,
            layout: Layout::contiguous(self.shape()),
        })
    }

    // ===== Data Access =====

    /// Copy tensor data to a Vec on the host
    ///
    /// # Panics
    ///
    /// Panics if `T` does not match the tensor's element size or the device
    /// copy fails. See [`Self::try_to_vec`].
    pub fn to_vec<T: bytemuck::Pod>(&self) -> Vec<T> {
        self.try_to_vec().expect("Tensor::to_vec failed")
    }

    /// Copy tensor data to a Vec on the host (fallible version)
    ///
    /// Elements are returned in row-major order of the tensor's shape.
    pub fn try_to_vec<T: bytemuck::Pod>(&self) -> Result<Vec<T>> {
        if std::mem::size_of::<T>() != self.dtype().size_in_bytes() {
            return Err(Error::invalid_argument(
                "T",
                format!(
                    "host element is {} bytes, tensor dtype {} is {} bytes",
                    std::mem::size_of::<T>(),
                    self.dtype(),
                    self.dtype().size_in_bytes()
                ),
            ));
        }

        let tensor = self.try_contiguous()?;
        let byte_offset = tensor.layout.offset() * std::mem::size_of::<T>();

        // Allocate with T's alignment, then copy into its bytes.
        let mut result = vec![T::zeroed(); tensor.numel()];
        let bytes: &mut [u8] = bytemuck::cast_slice_mut(&mut result);
        let src_ptr = tensor.storage.ptr() as usize + byte_offset;
        R::copy_from_device(src_ptr as u64, bytes, tensor.storage.device())?;
        Ok(result)
    }

    /// Extract the scalar value from a single-element tensor
    ///
    /// Returns an error if the tensor doesn't contain exactly one element.
    ///
    /// ```ignore
    /// let idx: i64 = client.argmax(&logits)?.item()?;
    /// ```
    pub fn item<T: bytemuck::Pod>(&self) -> Result<T> {
        if self.numel() != 1 {
            return Err(Error::ShapeMismatch {
                expected: vec![1],
                got: self.shape().to_vec(),
            });
        }
        let values = self.try_to_vec::<T>()?;
        Ok(values[0])
    }
}

impl<R: Runtime> Clone for Tensor<R> {
    /// Clone creates a new tensor sharing the same storage (zero-copy)
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            layout: self.layout.clone(),
        }
    }
}

impl<R: Runtime> fmt::Debug for Tensor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("shape", &self.shape())
            .field("dtype", &self.dtype())
            .field("contiguous", &self.is_contiguous())
            .finish()
    }
}

impl<R: Runtime> fmt::Display for Tensor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tensor({:?}, dtype={})", self.shape(), self.dtype())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::cpu::{CpuDevice, CpuRuntime};

    #[test]
    fn test_from_slice() {
        let device = CpuDevice::new();
        let data = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
        let tensor = Tensor::<CpuRuntime>::from_slice(&data, &[2, 3], &device);

        assert_eq!(tensor.shape(), &[2, 3]);
        assert_eq!(tensor.dtype(), DType::F32);
        assert!(tensor.is_contiguous());
        assert_eq!(tensor.numel(), 6);

        let result: Vec<f32> = tensor.to_vec();
        assert_eq!(result, data);
    }

    #[test]
    fn test_from_slice_len_mismatch() {
        let device = CpuDevice::new();
        let err = Tensor::<CpuRuntime>::try_from_slice(&[1.0f32, 2.0], &[3], &device).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_permute_then_contiguous() {
        let device = CpuDevice::new();
        // [[1, 2, 3], [4, 5, 6]]
        let data = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
        let tensor = Tensor::<CpuRuntime>::from_slice(&data, &[2, 3], &device);

        let permuted = tensor.permute(&[1, 0]).unwrap();
        assert!(!permuted.is_contiguous());

        let contiguous = permuted.contiguous();
        assert!(contiguous.is_contiguous());
        assert_eq!(contiguous.shape(), &[3, 2]);
        let result: Vec<f32> = contiguous.to_vec();
        assert_eq!(result, [1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn test_to_vec_of_permuted_view() {
        let device = CpuDevice::new();
        let tensor = Tensor::<CpuRuntime>::from_slice(&[1i32, 2, 3, 4], &[2, 2], &device);
        let view = tensor.permute(&[1, 0]).unwrap();
        assert_eq!(view.to_vec::<i32>(), [1, 3, 2, 4]);
    }

    #[test]
    fn test_to_vec_wrong_width() {
        let device = CpuDevice::new();
        let tensor = Tensor::<CpuRuntime>::from_slice(&[1.0f32, 2.0], &[2], &device);
        assert!(tensor.try_to_vec::<f64>().is_err());
    }

    #[test]
    fn test_full_scalar() {
        let device = CpuDevice::new();
        let tensor = Tensor::<CpuRuntime>::full_scalar(&[2, 2], DType::I32, 42.0, &device);

        assert_eq!(tensor.shape(), &[2, 2]);
        assert_eq!(tensor.dtype(), DType::I32);

        let result: Vec<i32> = tensor.to_vec();
        assert_eq!(result, [42, 42, 42, 42]);

        let nan = Tensor::<CpuRuntime>::full_scalar(&[3], DType::F64, f64::NAN, &device);
        assert!(nan.to_vec::<f64>().iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_empty_shapes() {
        let device = CpuDevice::new();
        let tensor = Tensor::<CpuRuntime>::empty(&[0, 4], DType::F32, &device);
        assert_eq!(tensor.numel(), 0);
        assert!(tensor.to_vec::<f32>().is_empty());
    }

    #[test]
    fn test_item_scalar() {
        let device = CpuDevice::new();

        let tensor = Tensor::<CpuRuntime>::from_slice(&[std::f32::consts::PI], &[], &device);
        let val: f32 = tensor.item().unwrap();
        assert!((val - std::f32::consts::PI).abs() < 1e-6);

        let tensor = Tensor::<CpuRuntime>::from_slice(&[7i64], &[1, 1, 1], &device);
        let val: i64 = tensor.item().unwrap();
        assert_eq!(val, 7);

        let tensor = Tensor::<CpuRuntime>::from_slice(&[1.0f32, 2.0], &[2], &device);
        assert!(tensor.item::<f32>().is_err());
    }
}
