//! # kestrel-core
//!
//! Device-resident matrices for the kestrel translation engine.
//!
//! Provides the `DeviceMatrix` type with:
//! - A named 4-D shape (rows, cols, beam, batches)
//! - Explicit control over reallocation (`resize`) versus free
//!   reinterpretation of an existing allocation (`reshape`)
//! - Blocking host↔device transfers and diagnostic dumps
//! - Any device reachable through a `kestrel_kernels::DeviceQueue`

pub mod dims;
pub mod error;
pub mod matrix;
pub mod prelude;

pub use dims::Dims;
pub use error::MatrixError;
pub use matrix::DeviceMatrix;

pub use kestrel_kernels::{DeviceContext, DeviceError};

pub type Result<T> = std::result::Result<T, MatrixError>;
