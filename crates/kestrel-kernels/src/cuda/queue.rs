//! Blocking `DeviceQueue` over CUDA device memory.
//!
//! Allocations are `cudarc` slices kept in a handle table so matrices can
//! refer to them through plain `DevicePtr` values.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use cudarc::driver::{CudaDevice, CudaSlice};
use parking_lot::Mutex;

use super::context::get_device;
use crate::context::{DevicePtr, DeviceQueue};
use crate::{DeviceError, Result};

/// One shared queue per GPU index, so contexts for the same index compare equal.
static QUEUES: OnceLock<Mutex<HashMap<usize, Arc<CudaQueue>>>> = OnceLock::new();

fn queues() -> &'static Mutex<HashMap<usize, Arc<CudaQueue>>> {
    QUEUES.get_or_init(|| Mutex::new(HashMap::new()))
}

pub struct CudaQueue {
    device: Arc<CudaDevice>,
    device_idx: usize,
    next_handle: AtomicU64,
    slices: Mutex<HashMap<u64, CudaSlice<f32>>>,
}

impl CudaQueue {
    /// The process-wide queue for GPU `device_idx`.
    pub fn shared(device_idx: usize) -> Result<Arc<CudaQueue>> {
        let mut map = queues().lock();
        if let Some(queue) = map.get(&device_idx) {
            return Ok(Arc::clone(queue));
        }
        let queue = Arc::new(CudaQueue {
            device: get_device(device_idx)?,
            device_idx,
            next_handle: AtomicU64::new(1),
            slices: Mutex::new(HashMap::new()),
        });
        map.insert(device_idx, Arc::clone(&queue));
        Ok(queue)
    }

    pub fn device_idx(&self) -> usize {
        self.device_idx
    }

    fn transfer_err(what: &str, e: impl fmt::Display) -> DeviceError {
        DeviceError::Transfer(format!("{}: {}", what, e))
    }

    fn range_err(ptr: DevicePtr, offset: usize, len: usize) -> DeviceError {
        DeviceError::Transfer(format!(
            "range {}..{} out of bounds for allocation {}",
            offset,
            offset.saturating_add(len),
            ptr
        ))
    }
}

impl fmt::Debug for CudaQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CudaQueue")
            .field("device_idx", &self.device_idx)
            .field("allocations", &self.slices.lock().len())
            .finish()
    }
}

impl DeviceQueue for CudaQueue {
    fn label(&self) -> String {
        format!("cuda:{}", self.device_idx)
    }

    fn alloc(&self, len: usize) -> Result<DevicePtr> {
        // SAFETY: contents are unspecified until filled or written.
        let slice = unsafe { self.device.alloc::<f32>(len) }.map_err(|e| DeviceError::Alloc {
            requested: len,
            msg: e.to_string(),
        })?;
        let handle = self.next_handle.fetch_add(1, Ordering::Relaxed);
        self.slices.lock().insert(handle, slice);
        Ok(DevicePtr(handle))
    }

    fn free(&self, ptr: DevicePtr) {
        self.slices.lock().remove(&ptr.0);
    }

    fn fill(&self, ptr: DevicePtr, len: usize, value: f32) -> Result<()> {
        let mut slices = self.slices.lock();
        let slice = slices
            .get_mut(&ptr.0)
            .ok_or(DeviceError::InvalidHandle(ptr))?;
        let mut view = slice
            .try_slice_mut(0..len)
            .ok_or_else(|| Self::range_err(ptr, 0, len))?;
        if value == 0.0 {
            self.device
                .memset_zeros(&mut view)
                .map_err(|e| Self::transfer_err("memset_zeros", e))
        } else {
            let host = vec![value; len];
            self.device
                .htod_sync_copy_into(&host, &mut view)
                .map_err(|e| Self::transfer_err("htod fill", e))
        }
    }

    fn write(&self, ptr: DevicePtr, offset: usize, src: &[f32]) -> Result<()> {
        let mut slices = self.slices.lock();
        let slice = slices
            .get_mut(&ptr.0)
            .ok_or(DeviceError::InvalidHandle(ptr))?;
        let mut view = slice
            .try_slice_mut(offset..offset.saturating_add(src.len()))
            .ok_or_else(|| Self::range_err(ptr, offset, src.len()))?;
        self.device
            .htod_sync_copy_into(src, &mut view)
            .map_err(|e| Self::transfer_err("htod_sync_copy_into", e))
    }

    fn read(&self, ptr: DevicePtr, offset: usize, dst: &mut [f32]) -> Result<()> {
        let slices = self.slices.lock();
        let slice = slices.get(&ptr.0).ok_or(DeviceError::InvalidHandle(ptr))?;
        let view = slice
            .try_slice(offset..offset.saturating_add(dst.len()))
            .ok_or_else(|| Self::range_err(ptr, offset, dst.len()))?;
        self.device
            .dtoh_sync_copy_into(&view, dst)
            .map_err(|e| Self::transfer_err("dtoh_sync_copy_into", e))
    }

    fn copy(&self, src: DevicePtr, dst: DevicePtr, len: usize) -> Result<()> {
        if src == dst {
            return Ok(());
        }
        let mut slices = self.slices.lock();
        let mut target = slices
            .remove(&dst.0)
            .ok_or(DeviceError::InvalidHandle(dst))?;
        let result = match slices.get(&src.0) {
            Some(source) => match (source.try_slice(0..len), target.try_slice_mut(0..len)) {
                (Some(from), Some(mut to)) => self
                    .device
                    .dtod_copy(&from, &mut to)
                    .and_then(|_| self.device.synchronize())
                    .map_err(|e| Self::transfer_err("dtod_copy", e)),
                (None, _) => Err(Self::range_err(src, 0, len)),
                (_, None) => Err(Self::range_err(dst, 0, len)),
            },
            None => Err(DeviceError::InvalidHandle(src)),
        };
        slices.insert(dst.0, target);
        result
    }
}
