// decomp.rs - Splitting the global grid into per-worker tiles

use crate::error::{LifeError, LifeResult};

/// How the global grid is partitioned among workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Topology {
    /// Horizontal bands of `size / P` full-width rows.
    #[default]
    Row,
    /// A `sqrt(P) x sqrt(P)` mesh of square blocks.
    Checkerboard,
}

/// Compass direction of a neighboring tile. Also used to tag halo messages
/// with the direction the data travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

/// Ranks of the adjacent tiles. `None` at the edge of the global domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Neighbors {
    pub north: Option<usize>,
    pub south: Option<usize>,
    pub east: Option<usize>,
    pub west: Option<usize>,
}

/// Tile geometry shared by every worker of a run.
///
/// Workers are laid out on a `mesh_rows x mesh_cols` mesh in row-major rank
/// order: `P x 1` for row bands, `sqrt(P) x sqrt(P)` for checkerboard.
/// Each local buffer carries a one-cell halo: one extra row above and below
/// always, and one extra column left and right in checkerboard mode only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decomposition {
    pub workers: usize,
    pub size: usize,
    pub topology: Topology,
    pub mesh_rows: usize,
    pub mesh_cols: usize,
    pub local_rows: usize,
    pub local_cols: usize,
}

impl Decomposition {
    /// Plans the tiling, rejecting combinations that cannot tile the grid exactly.
    pub fn plan(workers: usize, size: usize, topology: Topology) -> LifeResult<Self> {
        if workers == 0 {
            return Err(LifeError::Argument("worker count must be at least 1".into()));
        }
        if size == 0 {
            return Err(LifeError::Argument("grid size must be at least 1".into()));
        }

        let (mesh_rows, mesh_cols) = match topology {
            Topology::Row => (workers, 1),
            Topology::Checkerboard => {
                let root = workers.isqrt();
                if root * root != workers {
                    return Err(LifeError::Argument(format!(
                        "checkerboard decomposition needs a square worker count, got {workers}"
                    )));
                }
                (root, root)
            }
        };

        if size % mesh_rows != 0 || size % mesh_cols != 0 {
            return Err(LifeError::Argument(format!(
                "grid size {size} does not divide evenly over a {mesh_rows}x{mesh_cols} worker mesh"
            )));
        }

        Ok(Self {
            workers,
            size,
            topology,
            mesh_rows,
            mesh_cols,
            local_rows: size / mesh_rows,
            local_cols: size / mesh_cols,
        })
    }

    /// Width of the halo on the left and right of a local buffer.
    pub fn halo_cols(&self) -> usize {
        match self.topology {
            Topology::Row => 0,
            Topology::Checkerboard => 1,
        }
    }

    pub fn buffer_rows(&self) -> usize {
        self.local_rows + 2
    }

    /// Row stride of a local buffer.
    pub fn buffer_cols(&self) -> usize {
        self.local_cols + 2 * self.halo_cols()
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer_rows() * self.buffer_cols()
    }

    /// (mesh row, mesh column) of a rank.
    pub fn mesh_position(&self, rank: usize) -> (usize, usize) {
        (rank / self.mesh_cols, rank % self.mesh_cols)
    }

    /// Global (row, column) of the first interior cell of a rank's tile.
    pub fn origin(&self, rank: usize) -> (usize, usize) {
        let (mesh_row, mesh_col) = self.mesh_position(rank);
        (mesh_row * self.local_rows, mesh_col * self.local_cols)
    }

    pub fn neighbors(&self, rank: usize) -> Neighbors {
        let (mesh_row, mesh_col) = self.mesh_position(rank);
        Neighbors {
            north: (mesh_row > 0).then(|| rank - self.mesh_cols),
            south: (mesh_row + 1 < self.mesh_rows).then(|| rank + self.mesh_cols),
            west: (mesh_col > 0).then(|| rank - 1),
            east: (mesh_col + 1 < self.mesh_cols).then(|| rank + 1),
        }
    }

    /// Buffer index of interior cell (row, col), both zero-based within the tile.
    pub fn interior_index(&self, row: usize, col: usize) -> usize {
        (row + 1) * self.buffer_cols() + col + self.halo_cols()
    }
}
