//! Convenience re-exports for pipeline code.

pub use crate::dims::Dims;
pub use crate::error::MatrixError;
pub use crate::matrix::DeviceMatrix;
pub use kestrel_kernels::{DeviceBuffer, DeviceContext, DeviceError};
