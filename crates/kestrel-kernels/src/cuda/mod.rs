//! CUDA device backend.
//!
//! Provides:
//! - Device context management (lazy singleton per GPU)
//! - A blocking `DeviceQueue` over `cudarc` allocations

pub mod context;
pub mod queue;

pub use context::{get_device, is_cuda_available};
pub use queue::CudaQueue;
