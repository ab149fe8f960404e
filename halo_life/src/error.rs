// error.rs - Failure taxonomy for a distributed run

use std::io;
use thiserror::Error;

/// Every way a run can fail. None of these are recovered: the first one
/// raised on any worker ends the whole job.
#[derive(Error, Debug)]
pub enum LifeError {
    /// Bad configuration, e.g. a non-square worker count in checkerboard mode.
    #[error("argument error: {0}")]
    Argument(String),

    /// A generation buffer could not be allocated.
    #[error("allocation error on rank {rank}: cannot allocate {bytes} bytes")]
    Allocation { rank: usize, bytes: usize },

    /// Runtime or layout setup failed.
    #[error("initialization error: {0}")]
    Initialization(String),

    /// The input grid file could not be read or does not match the run.
    #[error("ingest error on rank {rank} ({operation}): {detail}")]
    Ingest {
        rank: usize,
        operation: &'static str,
        detail: String,
        #[source]
        source: Option<io::Error>,
    },

    /// A halo exchange, barrier or reduction transfer failed.
    #[error("communication error on rank {rank} ({operation}): {detail}")]
    Communication {
        rank: usize,
        operation: &'static str,
        detail: String,
    },

    /// A generation file could not be written.
    #[error("write error on rank {rank} ({operation}): {detail}")]
    Write {
        rank: usize,
        operation: &'static str,
        detail: String,
        #[source]
        source: Option<io::Error>,
    },
}

pub type LifeResult<T> = Result<T, LifeError>;

impl LifeError {
    /// Process exit status for this failure category.
    pub fn exit_code(&self) -> i32 {
        match self {
            LifeError::Ingest { .. } => 1,
            LifeError::Allocation { .. } => 2,
            LifeError::Argument(_) => 3,
            LifeError::Communication { .. } => 4,
            LifeError::Write { .. } => 10,
            LifeError::Initialization(_) => 12,
        }
    }

    pub(crate) fn ingest(rank: usize, operation: &'static str, detail: impl Into<String>) -> Self {
        LifeError::Ingest { rank, operation, detail: detail.into(), source: None }
    }

    pub(crate) fn ingest_io(rank: usize, operation: &'static str, source: io::Error) -> Self {
        LifeError::Ingest { rank, operation, detail: source.to_string(), source: Some(source) }
    }

    pub(crate) fn comm(rank: usize, operation: &'static str, detail: impl Into<String>) -> Self {
        LifeError::Communication { rank, operation, detail: detail.into() }
    }

    pub(crate) fn write_io(rank: usize, operation: &'static str, source: io::Error) -> Self {
        LifeError::Write { rank, operation, detail: source.to_string(), source: Some(source) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct_per_category() {
        let errors = [
            LifeError::ingest(0, "open", "missing"),
            LifeError::Allocation { rank: 0, bytes: 16 },
            LifeError::Argument("bad".into()),
            LifeError::comm(1, "halo", "closed"),
            LifeError::write_io(0, "create", io::Error::other("disk full")),
            LifeError::Initialization("runtime".into()),
        ];
        let mut codes: Vec<i32> = errors.iter().map(LifeError::exit_code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes, vec![1, 2, 3, 4, 10, 12]);
    }

    #[test]
    fn diagnostic_names_rank_and_operation() {
        let err = LifeError::comm(3, "recv west column", "peer gone");
        let text = err.to_string();
        assert!(text.contains("rank 3"));
        assert!(text.contains("recv west column"));
        assert!(text.contains("peer gone"));
    }
}
