use std::fmt;

use kestrel_kernels::{output_array, sum_float, DeviceBuffer, DeviceContext, DeviceError};
use tracing::{debug, trace};

use crate::dims::Dims;
use crate::error::MatrixError;
use crate::Result;

/// A 4-D f32 tensor in device memory.
///
/// The allocation and the logical shape are tracked separately: `resize`
/// is the only operation that changes the allocation, while `reshape`
/// reinterprets the existing one as long as it is large enough. This lets
/// decoder code fold beam and batch axes in and out between kernel
/// dispatches without reallocating.
///
/// The buffer always holds at least `size()` elements.
///
/// # Examples
///
/// ```
/// use kestrel_core::{DeviceContext, DeviceMatrix};
///
/// let ctx = DeviceContext::host();
/// let mut m = DeviceMatrix::with_shape(&ctx, 2, 3, true).unwrap();
/// assert_eq!(m.size(), 6);
///
/// m.resize(4, 5, 1, 2).unwrap();
/// assert!(m.reshape(8, 5, 1, 2).is_err());
/// m.reshape(2, 10, 1, 2).unwrap();
/// assert_eq!(m.size(), 40);
/// ```
pub struct DeviceMatrix {
    dims: Dims,
    buffer: DeviceBuffer,
}

impl DeviceMatrix {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// An empty matrix bound to `ctx`. Nothing is allocated.
    pub fn new(ctx: &DeviceContext) -> Self {
        Self {
            dims: Dims::default(),
            buffer: DeviceBuffer::empty(ctx),
        }
    }

    /// Allocate a `rows x cols` matrix, optionally zero-filled.
    ///
    /// Without `zero` the contents are unspecified.
    pub fn with_shape(ctx: &DeviceContext, rows: usize, cols: usize, zero: bool) -> Result<Self> {
        let dims = Dims::matrix(rows, cols);
        let mut buffer = DeviceBuffer::new(ctx, alloc_size(dims)?)?;
        if zero {
            buffer.set(0.0)?;
        }
        Ok(Self { dims, buffer })
    }

    /// Allocate a `rows x cols` matrix and copy the first `rows * cols`
    /// values of `data` into it.
    ///
    /// # Panics
    ///
    /// Panics if `data` holds fewer than `rows * cols` values.
    pub fn from_host(ctx: &DeviceContext, rows: usize, cols: usize, data: &[f32]) -> Result<Self> {
        let dims = Dims::matrix(rows, cols);
        let size = alloc_size(dims)?;
        assert!(
            data.len() >= size,
            "host data has {} values, {}x{} matrix needs {}",
            data.len(),
            rows,
            cols,
            size
        );
        let buffer = DeviceBuffer::from_host(ctx, &data[..size])?;
        Ok(Self { dims, buffer })
    }

    /// Deep copy: same shape and device, a new allocation of the same
    /// capacity holding the same contents.
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            dims: self.dims,
            buffer: self.buffer.try_clone()?,
        })
    }

    /// Move the contents out, leaving `self` empty but still bound to its device.
    pub fn take(&mut self) -> Self {
        let mut out = Self::new(self.context());
        out.swap(self);
        out
    }

    // =========================================================================
    // Shape
    // =========================================================================

    /// Reallocate to exactly `rows * cols * beam * batches` elements.
    ///
    /// Elements below the old size may survive; anything past it is
    /// unspecified. This is the only operation that can grow the allocation.
    pub fn resize(&mut self, rows: usize, cols: usize, beam: usize, batches: usize) -> Result<()> {
        let dims = Dims::new(rows, cols, beam, batches);
        self.buffer.resize(alloc_size(dims)?)?;
        debug!(from = %self.dims, to = %dims, "resized matrix");
        self.dims = dims;
        Ok(())
    }

    /// Reinterpret the existing allocation with a new shape.
    ///
    /// Fails with [`MatrixError::Capacity`] and leaves the matrix untouched
    /// if the new shape needs more elements than are allocated. A shape
    /// whose size overflows `usize` is reported as requesting `usize::MAX`.
    pub fn reshape(&mut self, rows: usize, cols: usize, beam: usize, batches: usize) -> Result<()> {
        let dims = Dims::new(rows, cols, beam, batches);
        let requested = dims.checked_size().unwrap_or(usize::MAX);
        if requested > self.buffer.len() {
            return Err(MatrixError::Capacity {
                requested,
                capacity: self.buffer.len(),
            });
        }
        trace!(from = %self.dims, to = %dims, "reshaped matrix");
        self.dims = dims;
        Ok(())
    }

    /// Fold beam and batches into rows: `(r, c, b, n)` becomes `(r*b*n, c, 1, 1)`.
    pub fn reshape_2d(&mut self) {
        if !self.dims.is_2d() {
            self.dims = self.dims.flatten_2d();
        }
    }

    // =========================================================================
    // Ownership and transfer
    // =========================================================================

    /// Exchange shape and allocation with `other` in constant time.
    ///
    /// # Panics
    ///
    /// Panics if the matrices are bound to different devices.
    pub fn swap(&mut self, other: &mut DeviceMatrix) {
        self.buffer.swap(&mut other.buffer);
        std::mem::swap(&mut self.dims, &mut other.dims);
    }

    /// Blocking H2D write of `size()` values from `data`.
    ///
    /// # Panics
    ///
    /// Panics if `data` holds fewer than `size()` values.
    pub fn set(&mut self, data: &[f32]) -> Result<()> {
        let size = self.size();
        assert!(
            data.len() >= size,
            "host data has {} values, matrix {} needs {}",
            data.len(),
            self.dims,
            size
        );
        self.buffer.write(&data[..size])?;
        Ok(())
    }

    /// Blocking fill of the whole allocation with `value`.
    pub fn fill(&mut self, value: f32) -> Result<()> {
        self.buffer.set(value)?;
        Ok(())
    }

    /// Blocking D2H read of the `size()` logical elements.
    pub fn to_host(&self) -> Result<Vec<f32>> {
        let mut host = vec![0.0f32; self.size()];
        self.buffer.read_into(&mut host)?;
        Ok(host)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Number of logical elements, independent of the allocated capacity.
    pub fn size(&self) -> usize {
        self.dims.size()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Allocated elements. Never smaller than `size()`.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn dims(&self) -> Dims {
        self.dims
    }

    pub fn rows(&self) -> usize {
        self.dims.rows
    }

    pub fn cols(&self) -> usize {
        self.dims.cols
    }

    pub fn beam(&self) -> usize {
        self.dims.beam
    }

    pub fn batches(&self) -> usize {
        self.dims.batches
    }

    pub fn context(&self) -> &DeviceContext {
        self.buffer.context()
    }

    pub fn buffer(&self) -> &DeviceBuffer {
        &self.buffer
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Human-readable description.
    ///
    /// Verbosity 0 describes shape and buffer only. From 1 a device-side
    /// sum over all elements is appended, and at 2 every element is dumped.
    /// Levels above 0 block on device work and readback.
    pub fn debug(&self, verbosity: usize) -> Result<String> {
        let mut out = self.describe(verbosity);
        if verbosity > 0 {
            let size = self.size();
            let ctx = self.context();
            let sum = match self.buffer.raw() {
                Some(ptr) => sum_float(ctx, ptr, size)?,
                None => 0.0,
            };
            out.push_str(&format!(" sum={}", sum));

            if verbosity == 2 {
                let dump = match self.buffer.raw() {
                    Some(ptr) => output_array(ctx, ptr, size)?,
                    None => "[]".to_string(),
                };
                out.push(' ');
                out.push_str(&dump);
            }
        }
        Ok(out)
    }

    fn describe(&self, verbosity: usize) -> String {
        format!(
            "{} size={} {}",
            self.dims,
            self.size(),
            self.buffer.describe(verbosity)
        )
    }
}

/// Element count of `dims`, or an allocation error if it overflows `usize`.
fn alloc_size(dims: Dims) -> Result<usize> {
    dims.checked_size().ok_or_else(|| {
        MatrixError::Device(DeviceError::Alloc {
            requested: usize::MAX,
            msg: format!("shape {} overflows the address space", dims),
        })
    })
}

impl fmt::Debug for DeviceMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceMatrix({})", self.describe(0))
    }
}
