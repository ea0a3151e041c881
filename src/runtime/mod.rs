//! Runtime backends for tensor computation
//!
//! ```text
//! Runtime (backend identity)
//! ├── Device (owns memory, addressed by u64 handles)
//! └── Client (dispatches operations, carries reduction config and tune cache)
//! ```

#[cfg(feature = "cpu")]
pub mod cpu;
pub(crate) mod helpers;
mod traits;

pub use traits::{Device, Runtime, RuntimeClient};
