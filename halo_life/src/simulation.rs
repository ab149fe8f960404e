// simulation.rs - Launching the workers and collecting what they report

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;

use crate::comm::{COORDINATOR, World};
use crate::config::RunConfig;
use crate::decomp::{Decomposition, Topology};
use crate::error::{LifeError, LifeResult};
use crate::layout::TileLayout;
use crate::trace::{NoopTracer, PhaseTracer};
use crate::worker::{LiveCount, Worker, WorkerOutcome};

/// A validated run, ready to launch.
pub struct Simulation {
    config: Arc<RunConfig>,
    decomp: Decomposition,
}

impl Simulation {
    /// Validates `config`. Argument errors surface here, before any buffer
    /// is allocated or any worker is started.
    pub fn new(config: RunConfig) -> LifeResult<Self> {
        let decomp = config.plan()?;
        Ok(Self { config: Arc::new(config), decomp })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Runs every generation on every worker without instrumentation.
    pub async fn run(&self) -> LifeResult<RunReport> {
        self.run_traced(Arc::new(NoopTracer)).await
    }

    /// Runs every generation on every worker. The first worker to fail
    /// cancels all the others, and its error is returned.
    pub async fn run_traced(&self, tracer: Arc<dyn PhaseTracer>) -> LifeResult<RunReport> {
        tracing::info!(
            workers = self.decomp.workers,
            size = self.decomp.size,
            topology = ?self.decomp.topology,
            generations = self.config.generations,
            local_rows = self.decomp.local_rows,
            local_cols = self.decomp.local_cols,
            "starting run"
        );

        let mut workers = Vec::with_capacity(self.decomp.workers);
        for comm in World::create(self.decomp.workers) {
            workers.push(Worker::new(comm, self.decomp.clone(), self.config.clone(), tracer.clone())?);
        }

        let mut tasks = JoinSet::new();
        for (rank, worker) in workers.into_iter().enumerate() {
            tasks.spawn(async move { (rank, worker.run().await) });
        }

        let mut outcomes = Vec::with_capacity(self.decomp.workers);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(outcome))) => outcomes.push(outcome),
                Ok((rank, Err(err))) => {
                    tracing::error!(rank, %err, "worker failed, shutting down the run");
                    tasks.abort_all();
                    return Err(err);
                }
                Err(join_err) => {
                    tasks.abort_all();
                    return Err(LifeError::comm(COORDINATOR, "join worker", format!("a worker terminated: {join_err}")));
                }
            }
        }

        outcomes.sort_by_key(|outcome| outcome.rank);
        Ok(RunReport::new(self.decomp.clone(), self.config.generations, outcomes))
    }
}

/// What a finished run produced.
#[derive(Debug)]
pub struct RunReport {
    pub decomposition: Decomposition,
    pub generations: usize,
    pub initial_live: Option<u64>,
    pub live_counts: Vec<LiveCount>,
    pub elapsed: Option<Duration>,
    /// Final interior of every rank, indexed by rank.
    pub tiles: Vec<Vec<u8>>,
}

impl RunReport {
    fn new(decomposition: Decomposition, generations: usize, outcomes: Vec<WorkerOutcome>) -> Self {
        let mut report = Self {
            decomposition,
            generations,
            initial_live: None,
            live_counts: Vec::new(),
            elapsed: None,
            tiles: Vec::with_capacity(outcomes.len()),
        };
        for outcome in outcomes {
            if outcome.rank == COORDINATOR {
                report.initial_live = outcome.initial_live;
                report.live_counts = outcome.live_counts;
                report.elapsed = outcome.elapsed;
            }
            report.tiles.push(outcome.tile);
        }
        report
    }

    /// Stitches the final tiles into one `size x size` grid.
    pub fn assemble(&self) -> LifeResult<Vec<u8>> {
        let d = &self.decomposition;
        let mut grid = vec![0u8; d.size * d.size];
        let interior_cols = d.local_cols;
        for (rank, tile) in self.tiles.iter().enumerate() {
            let layout = TileLayout::new(d, rank)?;
            for ((file, _), chunk) in layout.row_pairs().zip(tile.chunks(interior_cols)) {
                grid[file].copy_from_slice(chunk);
            }
        }
        Ok(grid)
    }

    /// Average wall time per generation, the way the performance line reports it.
    pub fn time_per_generation(&self) -> Option<Duration> {
        let elapsed = self.elapsed?;
        let generations = u32::try_from(self.generations.max(1)).unwrap_or(u32::MAX);
        Some(elapsed / generations)
    }

    /// CSV row `n, p, cb, size, avg time`, optionally preceded by its header.
    pub fn performance_line(&self, header: bool) -> Option<String> {
        let per_generation = self.time_per_generation()?;
        let d = &self.decomposition;
        let checkerboard = u8::from(d.topology == Topology::Checkerboard);
        let row = format!(
            "{}, {}, {}, {}, {:.6}",
            d.workers,
            d.workers,
            checkerboard,
            d.size,
            per_generation.as_secs_f64()
        );
        Some(if header { format!("n, p, cb, size, avg time\n{row}") } else { row })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::Seed;
    use crate::trace::{Phase, PhaseTimer};

    #[tokio::test]
    async fn stripes_count_matches_across_layouts() {
        let mut totals = Vec::new();
        for (workers, topology) in [(1, Topology::Row), (4, Topology::Row), (4, Topology::Checkerboard)] {
            let config = RunConfig {
                size: 8,
                workers,
                topology,
                generations: 3,
                count_interval: 1,
                ..RunConfig::default()
            };
            let report = Simulation::new(config).unwrap().run().await.unwrap();
            assert_eq!(report.initial_live, Some(32));
            totals.push(report.live_counts.iter().map(|c| c.total).collect::<Vec<_>>());
        }
        assert_eq!(totals[0], totals[1]);
        assert_eq!(totals[0], totals[2]);
        assert_eq!(totals[0].len(), 3);
    }

    #[tokio::test]
    async fn missing_input_fails_the_whole_run() {
        let config = RunConfig {
            size: 8,
            workers: 4,
            topology: Topology::Checkerboard,
            generations: 2,
            input: Some(std::env::temp_dir().join("halo_life_missing_input.pgm")),
            ..RunConfig::default()
        };
        let err = Simulation::new(config).unwrap().run().await.unwrap_err();
        assert!(matches!(err, LifeError::Ingest { .. } | LifeError::Communication { .. }));
    }

    #[tokio::test]
    async fn timer_sees_every_phase_of_a_counted_run() {
        let timer = Arc::new(PhaseTimer::new());
        let config = RunConfig {
            size: 16,
            workers: 4,
            generations: 2,
            count_interval: 1,
            performance: true,
            seed: Seed::Random(3),
            ..RunConfig::default()
        };
        let report = Simulation::new(config).unwrap().run_traced(timer.clone()).await.unwrap();
        assert!(report.elapsed.is_some());
        assert!(report.performance_line(true).unwrap().starts_with("n, p, cb, size, avg time\n4, 4, 0, 16, "));
        for phase in [Phase::Init, Phase::Exchange, Phase::Calculate, Phase::Reduce] {
            assert!(timer.total(phase) > Duration::ZERO, "{phase:?}");
        }
        assert!(timer.summary().contains("exchange"));
    }

    #[test]
    fn report_assembles_tiles_in_place() {
        let decomposition = Decomposition::plan(4, 4, Topology::Checkerboard).unwrap();
        let outcomes = (0..4)
            .map(|rank| WorkerOutcome {
                rank,
                initial_live: None,
                live_counts: Vec::new(),
                elapsed: None,
                tile: vec![rank as u8; 4],
            })
            .collect();
        let report = RunReport::new(decomposition, 1, outcomes);
        assert_eq!(report.assemble().unwrap(), vec![0, 0, 1, 1, 0, 0, 1, 1, 2, 2, 3, 3, 2, 2, 3, 3]);
        assert_eq!(report.performance_line(false), None);
    }
}
