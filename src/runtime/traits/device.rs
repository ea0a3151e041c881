//! Trait for device identification

use std::fmt::Debug;

/// A compute device that owns tensor memory
pub trait Device: Clone + Debug + Send + Sync + 'static {
    /// Unique identifier for this device
    fn id(&self) -> usize;

    /// Human-readable name
    fn name(&self) -> String {
        format!("Device({})", self.id())
    }
}
