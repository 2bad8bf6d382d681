//! CUDA device context management.
//!
//! Provides lazy-initialized singleton `CudaDevice` handles per GPU index.
//! Uses `cudarc` for safe CUDA driver API access.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use cudarc::driver::CudaDevice;
use parking_lot::Mutex;

use crate::DeviceError;

/// Global registry of CUDA device handles (one per GPU index).
static DEVICES: OnceLock<Mutex<HashMap<usize, Arc<CudaDevice>>>> = OnceLock::new();

fn devices() -> &'static Mutex<HashMap<usize, Arc<CudaDevice>>> {
    DEVICES.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Get or create a CUDA device handle for the given GPU index.
///
/// The device is lazily initialized on first access and cached for reuse.
pub fn get_device(device_idx: usize) -> Result<Arc<CudaDevice>, DeviceError> {
    let mut map = devices().lock();
    if let Some(dev) = map.get(&device_idx) {
        return Ok(Arc::clone(dev));
    }
    let dev = CudaDevice::new(device_idx)
        .map_err(|e| DeviceError::DeviceInit(format!("cuda:{}: {}", device_idx, e)))?;
    tracing::debug!(device_idx, "initialized CUDA device");
    map.insert(device_idx, Arc::clone(&dev));
    Ok(dev)
}

/// Check if any CUDA device is available.
pub fn is_cuda_available() -> bool {
    get_device(0).is_ok()
}
