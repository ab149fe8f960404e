// main.rs - Command-line front end for a distributed Game of Life run

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use halo_life::patterns::{PATTERNS, Pattern};
use halo_life::trace::{LogTracer, NoopTracer, PhaseTracer};
use halo_life::{LifeError, ReadStrategy, RunConfig, Seed, Simulation, Topology};

/// Game of Life on a square grid split across message-passing workers
#[derive(Parser, Debug)]
#[command(name = "halo_life")]
struct Cli {
    /// Verbose output; repeat for more detail
    #[arg(short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Reduce and print the live-cell count every N generations (0 = never)
    #[arg(short = 'c', long = "count", default_value_t = 0)]
    count: usize,

    /// Use checkerboard (2-D block) decomposition instead of row bands
    #[arg(short = 'k', long)]
    checkerboard: bool,

    /// Edge length of the square grid
    #[arg(short, long, default_value_t = 4)]
    size: usize,

    /// Number of workers
    #[arg(short = 'n', long, default_value_t = 1)]
    workers: usize,

    /// Input PGM file; without one the grid is seeded
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Number of generations to run
    #[arg(short = 't', long = "steps", default_value_t = 1)]
    steps: usize,

    /// Read the input with one collective transfer per worker instead of per-row seeks
    #[arg(short = 'f', long = "file-type")]
    file_type: bool,

    /// Write every generation as out_<workers>_<generation>.pgm
    #[arg(short, long)]
    output: bool,

    /// Directory for generation files
    #[arg(long, default_value = "ann")]
    output_dir: PathBuf,

    /// Print average time per generation
    #[arg(short, long)]
    performance: bool,

    /// Print the CSV header before the performance line
    #[arg(long)]
    header: bool,

    /// Seed with a named pattern centered on the grid
    #[arg(long, conflicts_with = "random")]
    pattern: Option<String>,

    /// Seed with reproducible random cells
    #[arg(long)]
    random: Option<u64>,
}

impl Cli {
    fn seed(&self) -> Result<Seed, LifeError> {
        if let Some(name) = &self.pattern {
            let pattern = Pattern::find(name).ok_or_else(|| {
                let known: Vec<_> = PATTERNS.iter().map(|p| p.name).collect();
                LifeError::Argument(format!("unknown pattern {name:?}, expected one of {}", known.join(", ")))
            })?;
            return Ok(Seed::Pattern(pattern.name));
        }
        Ok(self.random.map_or(Seed::Stripes, Seed::Random))
    }

    fn into_config(self) -> Result<RunConfig, LifeError> {
        let seed = self.seed()?;
        Ok(RunConfig {
            size: self.size,
            workers: self.workers,
            topology: if self.checkerboard { Topology::Checkerboard } else { Topology::Row },
            generations: self.steps,
            input: self.input,
            count_interval: self.count,
            read_strategy: if self.file_type { ReadStrategy::Collective } else { ReadStrategy::Manual },
            output: self.output,
            output_dir: self.output_dir,
            performance: self.performance,
            performance_header: self.header,
            seed,
        })
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn run(cli: Cli) -> Result<(), LifeError> {
    let tracer: Arc<dyn PhaseTracer> = if cli.verbose > 2 { Arc::new(LogTracer::default()) } else { Arc::new(NoopTracer) };
    let simulation = Simulation::new(cli.into_config()?)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| LifeError::Initialization(format!("cannot start runtime: {e}")))?;
    let report = runtime.block_on(simulation.run_traced(tracer))?;

    if let Some(total) = report.initial_live {
        println!("initial count - total {total}");
    }
    for count in &report.live_counts {
        println!("after step: {} total: {}", count.generation, count.total);
    }
    if simulation.config().performance {
        if let Some(line) = report.performance_line(simulation.config().performance_header) {
            println!("{line}");
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("halo_life: {err}");
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
