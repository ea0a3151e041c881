//! Common test utilities
#![allow(dead_code)]

use numkern::ops::ReduceConfig;
use numkern::runtime::Runtime;
use numkern::runtime::cpu::{CpuClient, CpuDevice, CpuRuntime};
use numkern::tensor::Tensor;

/// Create a CPU client and device for testing
///
/// Uses the default configuration, not the environment, so tests do not
/// depend on `NUMKERN_*` variables set by the caller.
pub fn create_cpu_client() -> (CpuClient, CpuDevice) {
    let device = CpuRuntime::default_device();
    let client = CpuClient::with_config(device.clone(), ReduceConfig::default());
    (client, device)
}

/// Create a CPU client with an explicit reduction configuration
pub fn create_cpu_client_with(config: ReduceConfig) -> (CpuClient, CpuDevice) {
    let device = CpuDevice::new();
    (CpuClient::with_config(device.clone(), config), device)
}

/// `[0, 1, ..., n - 1]` as f32 with the given shape
pub fn arange_f32(shape: &[usize], device: &CpuDevice) -> Tensor<CpuRuntime> {
    let n: usize = shape.iter().product();
    let data: Vec<f32> = (0..n).map(|i| i as f32).collect();
    Tensor::<CpuRuntime>::from_slice(&data, shape, device)
}

/// Assert two f64 slices are close within tolerance
///
/// Uses the formula: |a - b| <= atol + rtol * |b|
pub fn assert_allclose_f64(a: &[f64], b: &[f64], rtol: f64, atol: f64, msg: &str) {
    assert_eq!(a.len(), b.len(), "{}: length mismatch", msg);
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        let diff = (x - y).abs();
        let tol = atol + rtol * y.abs();
        assert!(
            diff <= tol,
            "{}: element {} differs: {} vs {} (diff={}, tol={})",
            msg,
            i,
            x,
            y,
            diff,
            tol
        );
    }
}

/// Assert two f32 slices are close within tolerance
pub fn assert_allclose_f32(a: &[f32], b: &[f32], rtol: f32, atol: f32, msg: &str) {
    assert_eq!(a.len(), b.len(), "{}: length mismatch", msg);
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        let diff = (x - y).abs();
        let tol = atol + rtol * y.abs();
        assert!(
            diff <= tol,
            "{}: element {} differs: {} vs {} (diff={}, tol={})",
            msg,
            i,
            x,
            y,
            diff,
            tol
        );
    }
}
