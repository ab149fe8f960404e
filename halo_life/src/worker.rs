// worker.rs - The per-rank generation loop

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::comm::{COORDINATOR, Communicator};
use crate::config::RunConfig;
use crate::decomp::Decomposition;
use crate::error::LifeResult;
use crate::exchange::HaloExchange;
use crate::io;
use crate::layout::TileLayout;
use crate::reduction::reduce_live_cells;
use crate::tile::{Role, TileStore};
use crate::trace::{self, Phase, PhaseTracer};
use crate::update;

/// Reduced live-cell total after a zero-based generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveCount {
    pub generation: usize,
    pub total: u64,
}

/// What a worker hands back when its last generation is done.
#[derive(Debug)]
pub struct WorkerOutcome {
    pub rank: usize,
    /// Total before the first generation; coordinator with counting only.
    pub initial_live: Option<u64>,
    /// Coordinator only.
    pub live_counts: Vec<LiveCount>,
    /// Coordinator with performance timing only.
    pub elapsed: Option<Duration>,
    /// Final interior, `local_rows x local_cols`, row-major.
    pub tile: Vec<u8>,
}

/// One rank: its communicator, its buffers and the layouts derived once
/// from the decomposition.
pub struct Worker {
    rank: usize,
    config: Arc<RunConfig>,
    decomp: Decomposition,
    comm: Communicator,
    store: TileStore,
    layout: TileLayout,
    halo: HaloExchange,
    tracer: Arc<dyn PhaseTracer>,
}

impl Worker {
    pub fn new(
        comm: Communicator,
        decomp: Decomposition,
        config: Arc<RunConfig>,
        tracer: Arc<dyn PhaseTracer>,
    ) -> LifeResult<Self> {
        let rank = comm.rank();
        let (store, layout) = {
            let _phase = trace::enter(&*tracer, rank, Phase::Init);
            (TileStore::allocate(&decomp, rank)?, TileLayout::new(&decomp, rank)?)
        };
        let halo = HaloExchange::new(&decomp, rank);

        Ok(Self { rank, config, decomp, comm, store, layout, halo, tracer })
    }

    pub async fn run(mut self) -> LifeResult<WorkerOutcome> {
        let rank = self.rank;
        tracing::debug!(rank, neighbors = ?self.halo.neighbors(), "worker started");

        self.load_initial_state().await?;
        let initial_live = if self.config.counting() { self.census(Role::Current).await? } else { None };
        if let Some(total) = initial_live {
            tracing::info!(total, "initial count");
        }

        let started = Instant::now();
        let mut live_counts = Vec::new();
        for generation in 0..self.config.generations {
            {
                let _phase = trace::enter(&*self.tracer, rank, Phase::Exchange);
                self.halo.exchange(&mut self.comm, self.store.buffer_mut(Role::Current)).await?;
            }

            {
                let _phase = trace::enter(&*self.tracer, rank, Phase::Calculate);
                let (current, next) = self.store.generation_pair();
                update::calculate_next(&self.decomp, current, next);
            }
            tokio::task::yield_now().await;

            if self.config.counts_after(generation) {
                if let Some(total) = self.census(Role::Next).await? {
                    tracing::info!(generation, total, "after step");
                    live_counts.push(LiveCount { generation, total });
                }
            }

            if self.config.output {
                let _phase = trace::enter(&*self.tracer, rank, Phase::Write);
                let path = io::write_generation(
                    &mut self.comm,
                    &self.config.output_dir,
                    &self.decomp,
                    &self.layout,
                    generation,
                    self.store.buffer(Role::Next),
                )
                .await?;
                if rank == COORDINATOR {
                    tracing::debug!(generation, path = %path.display(), "wrote generation");
                }
            }

            let _phase = trace::enter(&*self.tracer, rank, Phase::Swap);
            self.store.swap();
        }

        let elapsed = if self.config.performance {
            self.comm.barrier().await?;
            (rank == COORDINATOR).then(|| started.elapsed())
        } else {
            None
        };

        Ok(WorkerOutcome {
            rank,
            initial_live,
            live_counts,
            elapsed,
            tile: self.store.interior(Role::Current),
        })
    }

    async fn load_initial_state(&mut self) -> LifeResult<()> {
        let _phase = trace::enter(&*self.tracer, self.rank, Phase::Ingest);
        let buffer = self.store.buffer_mut(Role::Current);
        match &self.config.input {
            Some(path) => {
                io::read_tile(path, &self.decomp, &self.layout, self.config.read_strategy, self.rank, buffer).await?
            }
            None => self.config.seed.fill_tile(&self.decomp, self.rank, buffer),
        }
        Ok(())
    }

    async fn census(&mut self, role: Role) -> LifeResult<Option<u64>> {
        let _phase = trace::enter(&*self.tracer, self.rank, Phase::Reduce);
        if self.decomp.size < 100 {
            tracing::trace!(rank = self.rank, "tile\n{}", self.store.render(role));
        }
        reduce_live_cells(&mut self.comm, &self.store, role).await
    }
}
