//! Host-resident device backend.
//!
//! Keeps every allocation in process memory behind the same blocking queue
//! interface the accelerator backends implement. Used as the default device
//! and by the test suites.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::context::{DevicePtr, DeviceQueue};
use crate::{DeviceError, Result};

static NEXT_HOST_ID: AtomicUsize = AtomicUsize::new(0);

/// A device whose memory is ordinary host memory.
#[derive(Debug)]
pub struct HostQueue {
    id: usize,
    next_handle: AtomicU64,
    allocations: Mutex<HashMap<u64, Vec<f32>>>,
}

impl HostQueue {
    pub fn new() -> Self {
        Self {
            id: NEXT_HOST_ID.fetch_add(1, Ordering::Relaxed),
            // Handle 0 stays unused so a zeroed handle is never valid.
            next_handle: AtomicU64::new(1),
            allocations: Mutex::new(HashMap::new()),
        }
    }

    /// Number of allocations currently alive on this device.
    pub fn live_allocations(&self) -> usize {
        self.allocations.lock().len()
    }

    /// Total number of elements currently allocated on this device.
    pub fn allocated_elements(&self) -> usize {
        self.allocations.lock().values().map(Vec::len).sum()
    }
}

impl Default for HostQueue {
    fn default() -> Self {
        Self::new()
    }
}

fn check_range(ptr: DevicePtr, offset: usize, len: usize, capacity: usize) -> Result<()> {
    match offset.checked_add(len) {
        Some(end) if end <= capacity => Ok(()),
        _ => Err(DeviceError::Transfer(format!(
            "range {}..{} out of bounds for allocation {} of {} elements",
            offset,
            offset.saturating_add(len),
            ptr,
            capacity
        ))),
    }
}

impl DeviceQueue for HostQueue {
    fn label(&self) -> String {
        format!("host:{}", self.id)
    }

    fn alloc(&self, len: usize) -> Result<DevicePtr> {
        let mut data: Vec<f32> = Vec::new();
        data.try_reserve_exact(len).map_err(|e| DeviceError::Alloc {
            requested: len,
            msg: e.to_string(),
        })?;
        data.resize(len, 0.0);
        let handle = self.next_handle.fetch_add(1, Ordering::Relaxed);
        self.allocations.lock().insert(handle, data);
        Ok(DevicePtr(handle))
    }

    fn free(&self, ptr: DevicePtr) {
        self.allocations.lock().remove(&ptr.0);
    }

    fn fill(&self, ptr: DevicePtr, len: usize, value: f32) -> Result<()> {
        let mut allocations = self.allocations.lock();
        let data = allocations
            .get_mut(&ptr.0)
            .ok_or(DeviceError::InvalidHandle(ptr))?;
        check_range(ptr, 0, len, data.len())?;
        data[..len].fill(value);
        Ok(())
    }

    fn write(&self, ptr: DevicePtr, offset: usize, src: &[f32]) -> Result<()> {
        let mut allocations = self.allocations.lock();
        let data = allocations
            .get_mut(&ptr.0)
            .ok_or(DeviceError::InvalidHandle(ptr))?;
        check_range(ptr, offset, src.len(), data.len())?;
        data[offset..offset + src.len()].copy_from_slice(src);
        Ok(())
    }

    fn read(&self, ptr: DevicePtr, offset: usize, dst: &mut [f32]) -> Result<()> {
        let allocations = self.allocations.lock();
        let data = allocations
            .get(&ptr.0)
            .ok_or(DeviceError::InvalidHandle(ptr))?;
        check_range(ptr, offset, dst.len(), data.len())?;
        dst.copy_from_slice(&data[offset..offset + dst.len()]);
        Ok(())
    }

    fn copy(&self, src: DevicePtr, dst: DevicePtr, len: usize) -> Result<()> {
        if src == dst {
            return Ok(());
        }
        let mut allocations = self.allocations.lock();
        let staged = {
            let source = allocations
                .get(&src.0)
                .ok_or(DeviceError::InvalidHandle(src))?;
            check_range(src, 0, len, source.len())?;
            source[..len].to_vec()
        };
        let target = allocations
            .get_mut(&dst.0)
            .ok_or(DeviceError::InvalidHandle(dst))?;
        check_range(dst, 0, len, target.len())?;
        target[..len].copy_from_slice(&staged);
        Ok(())
    }

    fn sum(&self, ptr: DevicePtr, len: usize) -> Result<f32> {
        let allocations = self.allocations.lock();
        let data = allocations
            .get(&ptr.0)
            .ok_or(DeviceError::InvalidHandle(ptr))?;
        check_range(ptr, 0, len, data.len())?;
        Ok(data[..len].iter().sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_write_read() {
        let q = HostQueue::new();
        let ptr = q.alloc(4).unwrap();
        q.write(ptr, 1, &[2.0, 3.0]).unwrap();
        let mut out = [0.0f32; 4];
        q.read(ptr, 0, &mut out).unwrap();
        assert_eq!(out, [0.0, 2.0, 3.0, 0.0]);
    }

    #[test]
    fn test_out_of_bounds_write() {
        let q = HostQueue::new();
        let ptr = q.alloc(2).unwrap();
        assert!(matches!(
            q.write(ptr, 1, &[1.0, 2.0]),
            Err(DeviceError::Transfer(_))
        ));
    }

    #[test]
    fn test_free_and_invalid_handle() {
        let q = HostQueue::new();
        let ptr = q.alloc(3).unwrap();
        assert_eq!(q.live_allocations(), 1);
        q.free(ptr);
        assert_eq!(q.live_allocations(), 0);
        assert!(matches!(
            q.fill(ptr, 3, 1.0),
            Err(DeviceError::InvalidHandle(p)) if p == ptr
        ));
    }

    #[test]
    fn test_copy_and_sum() {
        let q = HostQueue::new();
        let a = q.alloc(3).unwrap();
        let b = q.alloc(5).unwrap();
        q.write(a, 0, &[1.0, 2.0, 3.0]).unwrap();
        q.fill(b, 5, 10.0).unwrap();
        q.copy(a, b, 3).unwrap();
        assert_eq!(q.sum(b, 5).unwrap(), 26.0);
        assert_eq!(q.allocated_elements(), 8);
    }

    #[test]
    fn test_labels_are_distinct() {
        let a = HostQueue::new();
        let b = HostQueue::new();
        assert_ne!(a.label(), b.label());
        assert!(a.label().starts_with("host:"));
    }
}
