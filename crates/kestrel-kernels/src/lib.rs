//! # kestrel-kernels
//!
//! Device plumbing for kestrel matrices.
//!
//! Provides:
//! - The `DeviceQueue` seam: one blocking, in-order command queue per device
//! - `DeviceContext` handles that identify which device a buffer lives on
//! - `DeviceBuffer`, an exclusively owned f32 allocation freed on drop
//! - Diagnostic and smoothing kernel functions (sum, array dump, lerp)
//! - A host-resident backend (always available) and a CUDA backend
//!   (behind the `cuda` feature flag)

pub mod error;
pub mod context;
pub mod host;
pub mod buffer;
pub mod functions;

#[cfg(feature = "cuda")]
pub mod cuda;

pub use buffer::DeviceBuffer;
pub use context::{DeviceContext, DevicePtr, DeviceQueue};
pub use error::DeviceError;
pub use functions::{output_array, smooth_into, sum_float};
pub use host::HostQueue;

pub type Result<T> = std::result::Result<T, DeviceError>;
