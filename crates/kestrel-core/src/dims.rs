use std::fmt;

/// Logical shape of a `DeviceMatrix`.
///
/// A matrix is conceptually `rows x cols`, replicated across `beam`
/// hypothesis slots and `batches` sentence batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Dims {
    pub rows: usize,
    pub cols: usize,
    pub beam: usize,
    pub batches: usize,
}

impl Dims {
    pub const fn new(rows: usize, cols: usize, beam: usize, batches: usize) -> Self {
        Self {
            rows,
            cols,
            beam,
            batches,
        }
    }

    /// A plain `rows x cols` shape (beam = batches = 1).
    pub const fn matrix(rows: usize, cols: usize) -> Self {
        Self::new(rows, cols, 1, 1)
    }

    /// Total number of logical elements.
    pub fn size(&self) -> usize {
        self.rows * self.cols * self.beam * self.batches
    }

    /// Total number of logical elements, or `None` if the product (or the
    /// folded row count of `flatten_2d`) does not fit in `usize`.
    pub fn checked_size(&self) -> Option<usize> {
        self.rows
            .checked_mul(self.beam)?
            .checked_mul(self.batches)?
            .checked_mul(self.cols)
    }

    /// Fold beam and batches into the row axis: `(r*b*n, c, 1, 1)`.
    pub fn flatten_2d(&self) -> Self {
        Self::new(self.rows * self.beam * self.batches, self.cols, 1, 1)
    }

    pub fn is_2d(&self) -> bool {
        self.beam == 1 && self.batches == 1
    }

    pub fn as_array(&self) -> [usize; 4] {
        [self.rows, self.cols, self.beam, self.batches]
    }
}

impl fmt::Display for Dims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}x{}", self.rows, self.cols, self.beam, self.batches)
    }
}

impl From<[usize; 4]> for Dims {
    fn from(d: [usize; 4]) -> Self {
        Dims::new(d[0], d[1], d[2], d[3])
    }
}
