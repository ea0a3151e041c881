//! CPU client implementation

use super::device::CpuDevice;
use super::runtime::CpuRuntime;
use crate::ops::reduce::{ReduceConfig, TuneCache};
use crate::runtime::RuntimeClient;
use std::sync::Arc;

/// CPU client for operation dispatch
///
/// Carries the reduction configuration and a handle to the autotune cache.
/// Cloned clients share one cache, so a tuning result found through any
/// clone is reused by all of them.
#[derive(Clone, Debug)]
pub struct CpuClient {
    pub(crate) device: CpuDevice,
    config: ReduceConfig,
    tune_cache: Arc<TuneCache>,
}

impl CpuClient {
    /// Create a new CPU client configured from the environment
    ///
    /// See [`ReduceConfig::from_env`] for the recognized variables.
    pub fn new(device: CpuDevice) -> Self {
        Self::with_config(device, ReduceConfig::from_env())
    }

    /// Create a CPU client with an explicit reduction configuration
    pub fn with_config(device: CpuDevice, config: ReduceConfig) -> Self {
        Self {
            device,
            config,
            tune_cache: Arc::new(TuneCache::new()),
        }
    }

    /// Replace the tune cache with a shared one
    pub fn with_tune_cache(mut self, cache: Arc<TuneCache>) -> Self {
        self.tune_cache = cache;
        self
    }

    /// Reduction configuration in effect for this client
    #[inline]
    pub fn config(&self) -> &ReduceConfig {
        &self.config
    }

    /// Autotune cache used by axis reductions
    #[inline]
    pub fn tune_cache(&self) -> &Arc<TuneCache> {
        &self.tune_cache
    }
}

impl RuntimeClient<CpuRuntime> for CpuClient {
    fn device(&self) -> &CpuDevice {
        &self.device
    }

    fn synchronize(&self) {
        // CPU operations are synchronous, nothing to do
    }
}
