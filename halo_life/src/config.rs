// config.rs - Everything a run needs to know up front

use std::path::PathBuf;

use crate::decomp::{Decomposition, Topology};
use crate::error::{LifeError, LifeResult};
use crate::io::ReadStrategy;
use crate::patterns::{Pattern, Seed};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Edge length of the square global grid.
    pub size: usize,
    pub workers: usize,
    pub topology: Topology,
    pub generations: usize,
    pub input: Option<PathBuf>,
    /// Reduce the live-cell count every this many generations; 0 disables.
    pub count_interval: usize,
    pub read_strategy: ReadStrategy,
    pub output: bool,
    pub output_dir: PathBuf,
    pub performance: bool,
    pub performance_header: bool,
    /// Initial state when `input` is `None`.
    pub seed: Seed,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            size: 4,
            workers: 1,
            topology: Topology::Row,
            generations: 1,
            input: None,
            count_interval: 0,
            read_strategy: ReadStrategy::Manual,
            output: false,
            output_dir: PathBuf::from("ann"),
            performance: false,
            performance_header: false,
            seed: Seed::Stripes,
        }
    }
}

impl RunConfig {
    /// Checks the configuration and plans the decomposition. Nothing is
    /// allocated and no worker exists yet when this fails.
    pub fn plan(&self) -> LifeResult<Decomposition> {
        if let Seed::Pattern(name) = self.seed {
            if Pattern::find(name).is_none() {
                return Err(LifeError::Argument(format!("unknown pattern {name:?}")));
            }
        }
        Decomposition::plan(self.workers, self.size, self.topology)
    }

    pub fn counting(&self) -> bool {
        self.count_interval > 0
    }

    /// Whether the live count is reduced after zero-based `generation`.
    pub fn counts_after(&self, generation: usize) -> bool {
        self.counting() && (generation + 1) % self.count_interval == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_plan_a_single_band() {
        let decomp = RunConfig::default().plan().unwrap();
        assert_eq!((decomp.workers, decomp.local_rows, decomp.local_cols), (1, 4, 4));
    }

    #[test]
    fn three_checkerboard_workers_fail_planning() {
        let config = RunConfig { workers: 3, size: 12, topology: Topology::Checkerboard, ..RunConfig::default() };
        assert!(matches!(config.plan(), Err(LifeError::Argument(_))));
    }

    #[test]
    fn unknown_pattern_is_an_argument_error() {
        let config = RunConfig { seed: Seed::Pattern("spaceship"), ..RunConfig::default() };
        assert!(matches!(config.plan(), Err(LifeError::Argument(_))));
    }

    #[test]
    fn count_interval_schedule() {
        let config = RunConfig { count_interval: 3, ..RunConfig::default() };
        let counted: Vec<usize> = (0..9).filter(|&g| config.counts_after(g)).collect();
        assert_eq!(counted, vec![2, 5, 8]);
        assert!(!RunConfig::default().counts_after(0));
    }
}
