//! Device contexts and the queue every device operation is issued to.
//!
//! A `DeviceContext` is a cheap, clonable handle to one `DeviceQueue`.
//! Two contexts refer to the same device exactly when they share the same
//! queue object, so buffers may only be exchanged between contexts that
//! compare equal under [`DeviceContext::same_device`].

use std::fmt;
use std::sync::Arc;

use crate::host::HostQueue;
use crate::Result;

/// Opaque handle to an allocation owned by a `DeviceQueue`.
///
/// Handles are only meaningful to the queue that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DevicePtr(pub(crate) u64);

impl DevicePtr {
    /// Wrap a backend-specific handle value.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The backend-specific handle value.
    pub fn as_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DevicePtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// A single in-order command queue on one device.
///
/// Every method blocks until the device has finished the requested work.
/// Offsets and lengths are counted in f32 elements, not bytes.
pub trait DeviceQueue: fmt::Debug + Send + Sync {
    /// Short device name, e.g. `host:0` or `cuda:1`.
    fn label(&self) -> String;

    /// Allocate `len` elements. Contents are unspecified.
    fn alloc(&self, len: usize) -> Result<DevicePtr>;

    /// Release an allocation. Unknown handles are ignored.
    fn free(&self, ptr: DevicePtr);

    /// Set the first `len` elements of `ptr` to `value`.
    fn fill(&self, ptr: DevicePtr, len: usize, value: f32) -> Result<()>;

    /// Host-to-device copy of `src` into `ptr[offset..offset + src.len()]`.
    fn write(&self, ptr: DevicePtr, offset: usize, src: &[f32]) -> Result<()>;

    /// Device-to-host copy of `ptr[offset..offset + dst.len()]` into `dst`.
    fn read(&self, ptr: DevicePtr, offset: usize, dst: &mut [f32]) -> Result<()>;

    /// Device-to-device copy of the first `len` elements of `src` into `dst`.
    fn copy(&self, src: DevicePtr, dst: DevicePtr, len: usize) -> Result<()>;

    /// Sum of the first `len` elements of `ptr`.
    ///
    /// The default reads the data back and reduces on the host; backends
    /// with a reduction kernel should override it.
    fn sum(&self, ptr: DevicePtr, len: usize) -> Result<f32> {
        let mut host = vec![0.0f32; len];
        self.read(ptr, 0, &mut host)?;
        Ok(host.iter().sum())
    }
}

/// Handle to the device a matrix or buffer is bound to.
#[derive(Clone)]
pub struct DeviceContext {
    queue: Arc<dyn DeviceQueue>,
}

impl DeviceContext {
    /// Bind a new context to a freshly constructed queue.
    pub fn new(queue: impl DeviceQueue + 'static) -> Self {
        Self {
            queue: Arc::new(queue),
        }
    }

    /// Bind a context to an existing shared queue.
    pub fn from_arc(queue: Arc<dyn DeviceQueue>) -> Self {
        Self { queue }
    }

    /// A new host-resident device with its own allocation table.
    pub fn host() -> Self {
        Self::new(HostQueue::new())
    }

    /// Context for CUDA device `device_idx`.
    ///
    /// Contexts for the same index share one queue and therefore compare
    /// as the same device.
    #[cfg(feature = "cuda")]
    pub fn cuda(device_idx: usize) -> Result<Self> {
        let queue = crate::cuda::queue::CudaQueue::shared(device_idx)?;
        Ok(Self { queue })
    }

    /// The command queue all work for this device is issued to.
    pub fn queue(&self) -> &dyn DeviceQueue {
        self.queue.as_ref()
    }

    /// Whether `self` and `other` are bound to the same device queue.
    pub fn same_device(&self, other: &DeviceContext) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.queue), Arc::as_ptr(&other.queue))
    }

    pub fn label(&self) -> String {
        self.queue.label()
    }
}

impl fmt::Debug for DeviceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceContext({})", self.queue.label())
    }
}

impl fmt::Display for DeviceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.queue.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_device_identity() {
        let a = DeviceContext::host();
        let b = a.clone();
        let c = DeviceContext::host();
        assert!(a.same_device(&b));
        assert!(!a.same_device(&c));
    }

    #[test]
    fn test_shared_queue() {
        let queue: Arc<dyn DeviceQueue> = Arc::new(HostQueue::new());
        let a = DeviceContext::from_arc(Arc::clone(&queue));
        let b = DeviceContext::from_arc(queue);
        assert!(a.same_device(&b));
        assert_eq!(a.label(), b.label());
    }

    #[test]
    fn test_device_ptr_display() {
        assert_eq!(format!("{}", DevicePtr::from_raw(255)), "0xff");
        assert_eq!(DevicePtr::from_raw(7).as_raw(), 7);
    }
}
