//! # kestrel
//!
//! Accelerator-backed matrices and single-device training for neural
//! machine translation.
//!
//! - [`kernels`]: device queues, contexts, buffers and diagnostic kernels
//! - [`tensor`]: the 4-D `DeviceMatrix`
//! - [`train`]: the single-device training step coordinator

pub use kestrel_core as tensor;
pub use kestrel_kernels as kernels;
pub use kestrel_train as train;

pub use kestrel_core::{DeviceContext, DeviceMatrix, Dims, MatrixError};
