use kestrel_kernels::DeviceError;

/// Errors returned by `DeviceMatrix` operations.
///
/// Contract violations (swapping across devices, short host slices) are
/// not represented here; they panic.
#[derive(Debug, thiserror::Error)]
pub enum MatrixError {
    /// `reshape` asked for more elements than the buffer holds.
    /// The matrix is left untouched; `resize` first.
    #[error("must reshape to same or smaller size: {requested} elements requested, capacity is {capacity}")]
    Capacity { requested: usize, capacity: usize },

    #[error(transparent)]
    Device(#[from] DeviceError),
}

impl MatrixError {
    /// Whether this is the recoverable capacity error (as opposed to a device failure).
    pub fn is_capacity(&self) -> bool {
        matches!(self, MatrixError::Capacity { .. })
    }
}
