// tile.rs - The two generation buffers owned by one worker

use crate::decomp::Decomposition;
use crate::error::{LifeError, LifeResult};

/// Cell value written for a live cell. Any nonzero byte reads as alive.
pub const ALIVE: u8 = 255;
pub const DEAD: u8 = 0;

/// Which of the two buffers a caller means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Current,
    Next,
}

/// Current/next buffers of `(local_rows + 2) x stride` cells each.
///
/// The roles live in `current`, an index into `buffers`; swapping flips the
/// index and clears the buffer that becomes "next".
pub struct TileStore {
    rows: usize,
    cols: usize,
    stride: usize,
    halo_cols: usize,
    buffers: [Vec<u8>; 2],
    current: usize,
}

impl TileStore {
    /// Allocates both buffers zero-filled, so every halo starts dead.
    pub fn allocate(decomp: &Decomposition, rank: usize) -> LifeResult<Self> {
        let len = decomp.buffer_len();
        let zeroed = || -> LifeResult<Vec<u8>> {
            let mut buffer = Vec::new();
            buffer
                .try_reserve_exact(len)
                .map_err(|_| LifeError::Allocation { rank, bytes: len })?;
            buffer.resize(len, DEAD);
            Ok(buffer)
        };

        Ok(Self {
            rows: decomp.local_rows,
            cols: decomp.local_cols,
            stride: decomp.buffer_cols(),
            halo_cols: decomp.halo_cols(),
            buffers: [zeroed()?, zeroed()?],
            current: 0,
        })
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    fn slot(&self, role: Role) -> usize {
        match role {
            Role::Current => self.current,
            Role::Next => 1 - self.current,
        }
    }

    pub fn buffer(&self, role: Role) -> &[u8] {
        &self.buffers[self.slot(role)]
    }

    pub fn buffer_mut(&mut self, role: Role) -> &mut [u8] {
        let slot = self.slot(role);
        &mut self.buffers[slot]
    }

    /// Current buffer for reading and next buffer for writing, at once.
    pub fn generation_pair(&mut self) -> (&[u8], &mut [u8]) {
        let (first, second) = self.buffers.split_at_mut(1);
        if self.current == 0 {
            (first[0].as_slice(), second[0].as_mut_slice())
        } else {
            (second[0].as_slice(), first[0].as_mut_slice())
        }
    }

    /// Makes "next" current and clears the new "next", halo included.
    pub fn swap(&mut self) {
        self.current = 1 - self.current;
        let next = 1 - self.current;
        self.buffers[next].fill(DEAD);
    }

    /// Index range of interior row `row` (zero-based) within a buffer.
    pub fn interior_row(&self, row: usize) -> std::ops::Range<usize> {
        let start = (row + 1) * self.stride + self.halo_cols;
        start..start + self.cols
    }

    /// Number of live cells in the interior, halo excluded.
    pub fn live_count(&self, role: Role) -> u64 {
        let buffer = self.buffer(role);
        (0..self.rows)
            .map(|row| buffer[self.interior_row(row)].iter().filter(|&&cell| cell != DEAD).count() as u64)
            .sum()
    }

    /// Copy of the interior in row-major order, `local_rows x local_cols`.
    pub fn interior(&self, role: Role) -> Vec<u8> {
        let buffer = self.buffer(role);
        let mut tile = Vec::with_capacity(self.rows * self.cols);
        for row in 0..self.rows {
            tile.extend_from_slice(&buffer[self.interior_row(row)]);
        }
        tile
    }

    /// Whole buffer as text, halo included, for debugging small grids.
    pub fn render(&self, role: Role) -> String {
        self.buffer(role)
            .chunks(self.stride)
            .map(|row| row.iter().map(|&cell| if cell != DEAD { '#' } else { '.' }).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decomp::Topology;

    #[test]
    fn buffers_sized_with_halo() {
        let rows = Decomposition::plan(2, 8, Topology::Row).unwrap();
        let store = TileStore::allocate(&rows, 0).unwrap();
        assert_eq!(store.buffer(Role::Current).len(), 6 * 8);
        assert_eq!(store.stride(), 8);

        let blocks = Decomposition::plan(4, 8, Topology::Checkerboard).unwrap();
        let store = TileStore::allocate(&blocks, 3).unwrap();
        assert_eq!(store.buffer(Role::Next).len(), 36);
        assert!(store.buffer(Role::Next).iter().all(|&c| c == DEAD));
    }

    #[test]
    fn swap_exchanges_roles_and_clears_next() {
        let d = Decomposition::plan(1, 4, Topology::Checkerboard).unwrap();
        let mut store = TileStore::allocate(&d, 0).unwrap();
        store.buffer_mut(Role::Current).fill(7);
        {
            let (current, next) = store.generation_pair();
            assert_eq!(current[0], 7);
            next[d.interior_index(0, 0)] = ALIVE;
        }

        store.swap();
        assert_eq!(store.buffer(Role::Current)[d.interior_index(0, 0)], ALIVE);
        assert!(store.buffer(Role::Next).iter().all(|&c| c == DEAD));
        assert_eq!(store.live_count(Role::Current), 1);
    }

    #[test]
    fn live_count_skips_halo() {
        let d = Decomposition::plan(4, 8, Topology::Checkerboard).unwrap();
        let mut store = TileStore::allocate(&d, 0).unwrap();
        store.buffer_mut(Role::Current).fill(ALIVE);
        assert_eq!(store.live_count(Role::Current), 16);
        assert_eq!(store.interior(Role::Current).len(), 16);

        let rows = Decomposition::plan(2, 4, Topology::Row).unwrap();
        let mut store = TileStore::allocate(&rows, 1).unwrap();
        store.buffer_mut(Role::Current).fill(1);
        assert_eq!(store.live_count(Role::Current), 8);
    }
}
