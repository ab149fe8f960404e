// layout.rs - File and memory mappings of a worker's tile

use std::ops::Range;

use crate::decomp::Decomposition;
use crate::error::{LifeError, LifeResult};

/// A rectangular window into a row-major 2-D byte array: the full array is
/// `sizes`, the window is `subsizes` starting at `starts` (row, column).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subarray {
    pub sizes: [usize; 2],
    pub subsizes: [usize; 2],
    pub starts: [usize; 2],
}

impl Subarray {
    pub fn new(sizes: [usize; 2], subsizes: [usize; 2], starts: [usize; 2]) -> LifeResult<Self> {
        for dim in 0..2 {
            if subsizes[dim] == 0 || starts[dim] + subsizes[dim] > sizes[dim] {
                return Err(LifeError::Initialization(format!(
                    "subarray {subsizes:?} at {starts:?} does not fit in {sizes:?}"
                )));
            }
        }
        Ok(Self { sizes, subsizes, starts })
    }

    /// Byte range of window row `row` within the full array.
    pub fn row(&self, row: usize) -> Range<usize> {
        let start = (self.starts[0] + row) * self.sizes[1] + self.starts[1];
        start..start + self.subsizes[1]
    }

    pub fn rows(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        (0..self.subsizes[0]).map(|row| self.row(row))
    }

    /// Smallest contiguous byte range covering the whole window.
    pub fn extent(&self) -> Range<usize> {
        let first = self.row(0);
        let last = self.row(self.subsizes[0] - 1);
        first.start..last.end
    }
}

/// Where a tile lives in the grid file (after the header) and where the
/// same cells live in the worker's halo-padded buffer. Built once per
/// worker and reused for every read and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileLayout {
    pub file: Subarray,
    pub memory: Subarray,
}

impl TileLayout {
    pub fn new(decomp: &Decomposition, rank: usize) -> LifeResult<Self> {
        let tile = [decomp.local_rows, decomp.local_cols];
        let (row, col) = decomp.origin(rank);
        let file = Subarray::new([decomp.size, decomp.size], tile, [row, col])?;
        let memory = Subarray::new(
            [decomp.buffer_rows(), decomp.buffer_cols()],
            tile,
            [1, decomp.halo_cols()],
        )?;
        Ok(Self { file, memory })
    }

    /// Pairs of (file range, memory range), one per tile row.
    pub fn row_pairs(&self) -> impl Iterator<Item = (Range<usize>, Range<usize>)> + '_ {
        self.file.rows().zip(self.memory.rows())
    }

    /// Copies the tile out of `span`, the file bytes covering
    /// [`Subarray::extent`] of the file mapping, into `buffer`.
    pub fn scatter(&self, span: &[u8], buffer: &mut [u8]) {
        let base = self.file.extent().start;
        for (file, memory) in self.row_pairs() {
            buffer[memory].copy_from_slice(&span[file.start - base..file.end - base]);
        }
    }

    /// Copies the tile from `buffer` into `grid`, a whole `size x size` grid.
    pub fn gather(&self, buffer: &[u8], grid: &mut [u8]) {
        for (file, memory) in self.row_pairs() {
            grid[file].copy_from_slice(&buffer[memory]);
        }
    }
}
