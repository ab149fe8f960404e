// trace.rs - Pluggable phase instrumentation

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Phases of a run that a tracer can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Init,
    Ingest,
    Exchange,
    Calculate,
    Reduce,
    Write,
    Swap,
}

impl Phase {
    pub const ALL: [Phase; 7] = [
        Phase::Init,
        Phase::Ingest,
        Phase::Exchange,
        Phase::Calculate,
        Phase::Reduce,
        Phase::Write,
        Phase::Swap,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Phase::Init => "init",
            Phase::Ingest => "ingest",
            Phase::Exchange => "exchange",
            Phase::Calculate => "calculate",
            Phase::Reduce => "reduce",
            Phase::Write => "write",
            Phase::Swap => "swap",
        }
    }
}

/// Observer called at every phase boundary of every worker.
pub trait PhaseTracer: Send + Sync {
    fn enter(&self, _rank: usize, _phase: Phase) {}
    fn exit(&self, _rank: usize, _phase: Phase) {}
}

/// Default tracer: does nothing.
pub struct NoopTracer;

impl PhaseTracer for NoopTracer {}

/// Emits a `tracing` event when each phase starts and when it ends, the
/// latter with the time spent in it.
#[derive(Default)]
pub struct LogTracer {
    open: Mutex<HashMap<(usize, Phase), Instant>>,
}

impl PhaseTracer for LogTracer {
    fn enter(&self, rank: usize, phase: Phase) {
        tracing::trace!(rank, phase = phase.name(), "start");
        if let Ok(mut open) = self.open.lock() {
            open.insert((rank, phase), Instant::now());
        }
    }

    fn exit(&self, rank: usize, phase: Phase) {
        let started = self.open.lock().ok().and_then(|mut open| open.remove(&(rank, phase)));
        match started {
            Some(started) => tracing::trace!(rank, phase = phase.name(), elapsed = ?started.elapsed(), "end"),
            None => tracing::trace!(rank, phase = phase.name(), "end"),
        }
    }
}

/// Accumulates wall time spent in each phase, summed over workers.
#[derive(Default)]
pub struct PhaseTimer {
    open: Mutex<HashMap<(usize, Phase), Instant>>,
    totals: Mutex<HashMap<Phase, Duration>>,
}

impl PhaseTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self, phase: Phase) -> Duration {
        self.totals
            .lock()
            .map(|totals| totals.get(&phase).copied().unwrap_or_default())
            .unwrap_or_default()
    }

    /// One line per phase that was observed, e.g. `exchange: 1.2ms`.
    pub fn summary(&self) -> String {
        Phase::ALL
            .iter()
            .filter(|&&phase| !self.total(phase).is_zero())
            .map(|&phase| format!("{}: {:?}", phase.name(), self.total(phase)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl PhaseTracer for PhaseTimer {
    fn enter(&self, rank: usize, phase: Phase) {
        if let Ok(mut open) = self.open.lock() {
            open.insert((rank, phase), Instant::now());
        }
    }

    fn exit(&self, rank: usize, phase: Phase) {
        let started = self.open.lock().ok().and_then(|mut open| open.remove(&(rank, phase)));
        if let (Some(started), Ok(mut totals)) = (started, self.totals.lock()) {
            *totals.entry(phase).or_default() += started.elapsed();
        }
    }
}

/// Calls `exit` when dropped, so a phase ends even on an early `?` return.
pub struct PhaseGuard<'a> {
    tracer: &'a dyn PhaseTracer,
    rank: usize,
    phase: Phase,
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        self.tracer.exit(self.rank, self.phase);
    }
}

pub fn enter(tracer: &dyn PhaseTracer, rank: usize, phase: Phase) -> PhaseGuard<'_> {
    tracer.enter(rank, phase);
    PhaseGuard { tracer, rank, phase }
}
