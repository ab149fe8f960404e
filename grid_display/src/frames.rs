// frames.rs - Loading written generations from disk

use std::path::{Path, PathBuf};

use halo_life::pgm::{self, PgmError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: {source}")]
    Pgm {
        path: PathBuf,
        #[source]
        source: PgmError,
    },
    #[error("{path}: grid is {width}x{height}, expected a square")]
    NotSquare { path: PathBuf, width: usize, height: usize },
    #[error("no out_<workers>_<generation>.pgm files in {0}")]
    Empty(PathBuf),
}

/// One decoded generation file.
#[derive(Debug, Clone)]
pub struct Frame {
    pub path: PathBuf,
    /// `(workers, generation)` when the name follows the output convention.
    pub index: Option<(usize, usize)>,
    pub size: usize,
    pub cells: Vec<bool>,
}

impl Frame {
    pub fn load(path: &Path) -> Result<Self, FrameError> {
        let bytes = std::fs::read(path).map_err(|source| FrameError::Io { path: path.to_owned(), source })?;
        let (header, raster) = pgm::decode(&bytes).map_err(|source| FrameError::Pgm { path: path.to_owned(), source })?;
        if header.width != header.height {
            return Err(FrameError::NotSquare { path: path.to_owned(), width: header.width, height: header.height });
        }
        Ok(Self {
            path: path.to_owned(),
            index: parse_name(path),
            size: header.width,
            cells: raster.iter().map(|&v| v != 0).collect(),
        })
    }

    pub fn alive(&self, row: usize, col: usize) -> bool {
        self.cells[row * self.size + col]
    }

    pub fn live_cells(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    pub fn label(&self) -> String {
        match self.index {
            Some((workers, generation)) => format!("generation {generation} ({workers} workers)"),
            None => self.path.display().to_string(),
        }
    }
}

/// `out_4_12.pgm` -> `(4, 12)`
fn parse_name(path: &Path) -> Option<(usize, usize)> {
    let name = path.file_name()?.to_str()?;
    let (workers, generation) = name.strip_prefix("out_")?.strip_suffix(".pgm")?.split_once('_')?;
    Some((workers.parse().ok()?, generation.parse().ok()?))
}

/// Loads one file, or every generation file in a directory ordered by
/// worker count and then generation.
pub fn load(path: &Path) -> Result<Vec<Frame>, FrameError> {
    if !path.is_dir() {
        return Ok(vec![Frame::load(path)?]);
    }

    let entries = std::fs::read_dir(path).map_err(|source| FrameError::Io { path: path.to_owned(), source })?;
    let mut named = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| FrameError::Io { path: path.to_owned(), source })?;
        let file = entry.path();
        if let Some(index) = parse_name(&file) {
            named.push((index, file));
        }
    }
    if named.is_empty() {
        return Err(FrameError::Empty(path.to_owned()));
    }
    named.sort();
    named.iter().map(|(_, file)| Frame::load(file)).collect()
}
