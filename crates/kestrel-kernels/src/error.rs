use crate::context::DevicePtr;

/// Failures reported by a device runtime.
///
/// None of these are retried: a device that fails an allocation or a
/// transfer is assumed to be in a state the caller cannot repair.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("device init failed: {0}")]
    DeviceInit(String),

    #[error("allocation of {requested} elements failed: {msg}")]
    Alloc { requested: usize, msg: String },

    #[error("transfer failed: {0}")]
    Transfer(String),

    #[error("unknown device allocation {0}")]
    InvalidHandle(DevicePtr),

    #[error("kernel failed: {0}")]
    Kernel(String),
}
