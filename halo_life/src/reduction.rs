// reduction.rs - Global live-cell census

use crate::comm::{COORDINATOR, Communicator};
use crate::error::LifeResult;
use crate::tile::{Role, TileStore};

/// Sums every worker's interior live cells. The coordinator gets the
/// total; every other rank gets `None`. Reads the store, never changes it.
pub async fn reduce_live_cells(comm: &mut Communicator, store: &TileStore, role: Role) -> LifeResult<Option<u64>> {
    let local = store.live_count(role);
    tracing::debug!(rank = comm.rank(), local, "local live cells");
    comm.reduce_sum(local, COORDINATOR).await
}
