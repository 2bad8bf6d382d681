//! Exclusively owned f32 allocations on a device.
//!
//! This is the device counterpart of `Vec<f32>`: one owner, freed on drop,
//! moved between owners only by Rust moves or [`DeviceBuffer::swap`].

use std::fmt;

use tracing::{debug, trace};

use crate::context::{DeviceContext, DevicePtr};
use crate::Result;

/// A contiguous run of f32 elements in device memory.
///
/// A zero-length buffer holds no allocation at all.
pub struct DeviceBuffer {
    ctx: DeviceContext,
    ptr: Option<DevicePtr>,
    len: usize,
}

impl DeviceBuffer {
    /// A buffer with no backing allocation.
    pub fn empty(ctx: &DeviceContext) -> Self {
        Self {
            ctx: ctx.clone(),
            ptr: None,
            len: 0,
        }
    }

    /// Allocate `len` elements. Contents are unspecified.
    pub fn new(ctx: &DeviceContext, len: usize) -> Result<Self> {
        if len == 0 {
            return Ok(Self::empty(ctx));
        }
        let ptr = ctx.queue().alloc(len)?;
        debug!(device = %ctx, %ptr, len, "allocated device buffer");
        Ok(Self {
            ctx: ctx.clone(),
            ptr: Some(ptr),
            len,
        })
    }

    /// Allocate exactly `data.len()` elements and copy `data` in (H2D).
    pub fn from_host(ctx: &DeviceContext, data: &[f32]) -> Result<Self> {
        let mut buf = Self::new(ctx, data.len())?;
        buf.write(data)?;
        Ok(buf)
    }

    /// Deep copy into a new allocation of the same length on the same device.
    pub fn try_clone(&self) -> Result<Self> {
        let copy = Self::new(&self.ctx, self.len)?;
        if let (Some(src), Some(dst)) = (self.ptr, copy.ptr) {
            self.ctx.queue().copy(src, dst, self.len)?;
        }
        Ok(copy)
    }

    /// Reallocate to exactly `len` elements.
    ///
    /// The first `min(old, new)` elements are carried over; anything past
    /// the old length is unspecified. A no-op when the length is unchanged.
    pub fn resize(&mut self, len: usize) -> Result<()> {
        if len == self.len {
            return Ok(());
        }
        let mut fresh = Self::new(&self.ctx, len)?;
        let keep = self.len.min(len);
        if keep > 0 {
            if let (Some(src), Some(dst)) = (self.ptr, fresh.ptr) {
                self.ctx.queue().copy(src, dst, keep)?;
            }
        }
        debug!(device = %self.ctx, from = self.len, to = len, "resized device buffer");
        std::mem::swap(self, &mut fresh);
        Ok(())
    }

    /// Blocking fill of every element with `value`.
    pub fn set(&mut self, value: f32) -> Result<()> {
        match self.ptr {
            Some(ptr) => self.ctx.queue().fill(ptr, self.len, value),
            None => Ok(()),
        }
    }

    /// Exchange allocations with `other` without touching device memory.
    ///
    /// # Panics
    ///
    /// Panics if the two buffers are bound to different devices.
    pub fn swap(&mut self, other: &mut DeviceBuffer) {
        assert!(
            self.ctx.same_device(&other.ctx),
            "cannot swap buffers across devices ({} vs {})",
            self.ctx,
            other.ctx
        );
        trace!(device = %self.ctx, a = self.len, b = other.len, "swapped device buffers");
        std::mem::swap(&mut self.ptr, &mut other.ptr);
        std::mem::swap(&mut self.len, &mut other.len);
    }

    /// Blocking H2D copy of `src` into the start of the buffer.
    ///
    /// # Panics
    ///
    /// Panics if `src` is longer than the buffer.
    pub fn write(&mut self, src: &[f32]) -> Result<()> {
        assert!(
            src.len() <= self.len,
            "host data of {} elements does not fit a buffer of {}",
            src.len(),
            self.len
        );
        match self.ptr {
            Some(ptr) if !src.is_empty() => self.ctx.queue().write(ptr, 0, src),
            _ => Ok(()),
        }
    }

    /// Blocking D2H copy of the first `dst.len()` elements.
    ///
    /// # Panics
    ///
    /// Panics if `dst` is longer than the buffer.
    pub fn read_into(&self, dst: &mut [f32]) -> Result<()> {
        assert!(
            dst.len() <= self.len,
            "cannot read {} elements from a buffer of {}",
            dst.len(),
            self.len
        );
        match self.ptr {
            Some(ptr) if !dst.is_empty() => self.ctx.queue().read(ptr, 0, dst),
            _ => Ok(()),
        }
    }

    /// Copy the whole buffer back to the host (D2H).
    pub fn to_host(&self) -> Result<Vec<f32>> {
        let mut host = vec![0.0f32; self.len];
        self.read_into(&mut host)?;
        Ok(host)
    }

    /// Allocated length in elements.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Raw device handle for kernel calls. `None` for an empty buffer.
    pub fn raw(&self) -> Option<DevicePtr> {
        self.ptr
    }

    /// The device this buffer is bound to.
    pub fn context(&self) -> &DeviceContext {
        &self.ctx
    }

    /// Short description of the allocation. Never touches device memory.
    pub fn describe(&self, verbosity: usize) -> String {
        let ptr = match self.ptr {
            Some(ptr) => ptr.to_string(),
            None => "null".to_string(),
        };
        let mut out = format!("device={} ptr={} len={}", self.ctx, ptr, self.len);
        if verbosity > 0 {
            out.push_str(&format!(" bytes={}", self.len * std::mem::size_of::<f32>()));
        }
        out
    }
}

impl fmt::Debug for DeviceBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceBuffer({})", self.describe(0))
    }
}

impl Drop for DeviceBuffer {
    fn drop(&mut self) {
        if let Some(ptr) = self.ptr.take() {
            trace!(device = %self.ctx, %ptr, len = self.len, "freeing device buffer");
            self.ctx.queue().free(ptr);
        }
    }
}
