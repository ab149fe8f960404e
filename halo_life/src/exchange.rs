// exchange.rs - Filling the halo border from neighboring tiles

use crate::comm::{Communicator, SendRequest, Tag};
use crate::decomp::{Decomposition, Direction, Neighbors};
use crate::error::{LifeError, LifeResult};

/// Per-worker halo exchange plan, derived once from the decomposition.
///
/// Rows go first: top and bottom interior rows are sent north and south and
/// the matching halo rows are received. Only once all of that is complete do
/// columns move east and west. Each column spans the full buffer height, so
/// it carries the corner cells that just arrived with the rows.
#[derive(Debug, Clone)]
pub struct HaloExchange {
    rank: usize,
    neighbors: Neighbors,
    rows: usize,
    cols: usize,
    stride: usize,
    halo_cols: usize,
}

impl HaloExchange {
    pub fn new(decomp: &Decomposition, rank: usize) -> Self {
        Self {
            rank,
            neighbors: decomp.neighbors(rank),
            rows: decomp.local_rows,
            cols: decomp.local_cols,
            stride: decomp.buffer_cols(),
            halo_cols: decomp.halo_cols(),
        }
    }

    pub fn neighbors(&self) -> Neighbors {
        self.neighbors
    }

    /// Refreshes every halo cell that has a neighbor. Halo cells on the
    /// global edge are left untouched.
    pub async fn exchange(&self, comm: &mut Communicator, buffer: &mut [u8]) -> LifeResult<()> {
        self.exchange_rows(comm, buffer).await?;
        if self.halo_cols > 0 {
            self.exchange_columns(comm, buffer).await?;
        }
        Ok(())
    }

    fn row_range(&self, buffer_row: usize) -> std::ops::Range<usize> {
        let start = buffer_row * self.stride + self.halo_cols;
        start..start + self.cols
    }

    async fn exchange_rows(&self, comm: &mut Communicator, buffer: &mut [u8]) -> LifeResult<()> {
        let top = self.row_range(1);
        let bottom = self.row_range(self.rows);
        let top_halo = self.row_range(0);
        let bottom_halo = self.row_range(self.rows + 1);

        let mut sends: Vec<SendRequest> = Vec::with_capacity(2);
        let mut recvs = Vec::with_capacity(2);

        if let Some(north) = self.neighbors.north {
            sends.push(comm.isend(north, Tag::Halo(Direction::North), buffer[top].to_vec()));
            recvs.push((comm.irecv(north, Tag::Halo(Direction::South)), top_halo));
        }
        if let Some(south) = self.neighbors.south {
            sends.push(comm.isend(south, Tag::Halo(Direction::South), buffer[bottom].to_vec()));
            recvs.push((comm.irecv(south, Tag::Halo(Direction::North)), bottom_halo));
        }

        for send in sends {
            send.wait()?;
        }
        for (request, halo) in recvs {
            let row = comm.wait(request).await?;
            self.check_len(row.len(), halo.len(), "recv halo row")?;
            buffer[halo].copy_from_slice(&row);
        }
        Ok(())
    }

    fn column(&self, buffer: &[u8], col: usize) -> Vec<u8> {
        buffer.iter().skip(col).step_by(self.stride).copied().collect()
    }

    fn store_column(&self, buffer: &mut [u8], col: usize, values: &[u8]) {
        for (cell, &value) in buffer.iter_mut().skip(col).step_by(self.stride).zip(values) {
            *cell = value;
        }
    }

    async fn exchange_columns(&self, comm: &mut Communicator, buffer: &mut [u8]) -> LifeResult<()> {
        let height = self.rows + 2;
        let mut sends: Vec<SendRequest> = Vec::with_capacity(2);
        let mut recvs = Vec::with_capacity(2);

        if let Some(west) = self.neighbors.west {
            sends.push(comm.isend(west, Tag::Halo(Direction::West), self.column(buffer, 1)));
            recvs.push((comm.irecv(west, Tag::Halo(Direction::East)), 0));
        }
        if let Some(east) = self.neighbors.east {
            sends.push(comm.isend(east, Tag::Halo(Direction::East), self.column(buffer, self.cols)));
            recvs.push((comm.irecv(east, Tag::Halo(Direction::West)), self.cols + 1));
        }

        for send in sends {
            send.wait()?;
        }
        for (request, col) in recvs {
            let column = comm.wait(request).await?;
            self.check_len(column.len(), height, "recv halo column")?;
            self.store_column(buffer, col, &column);
        }
        Ok(())
    }

    fn check_len(&self, got: usize, expected: usize, operation: &'static str) -> LifeResult<()> {
        if got != expected {
            return Err(LifeError::comm(self.rank, operation, format!("expected {expected} cells, got {got}")));
        }
        Ok(())
    }
}
