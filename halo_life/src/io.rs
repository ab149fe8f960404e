// io.rs - Reading and writing tiles against a shared grid file
//
// Every worker opens the shared file itself and touches only the bytes its
// TileLayout maps to. Writes are bracketed by barriers so the file exists,
// with its header, before anyone writes cells, and is complete for everyone
// before anyone moves on.

use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};

use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

use crate::comm::{COORDINATOR, Communicator};
use crate::decomp::{Decomposition, Topology};
use crate::error::{LifeError, LifeResult};
use crate::layout::TileLayout;
use crate::pgm::{HEADER_PROBE, PgmHeader};

/// How a worker pulls its tile out of the input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadStrategy {
    /// One seek and read per tile row, offsets computed by hand.
    #[default]
    Manual,
    /// One read of the span covering the tile, scattered through the layout.
    Collective,
}

/// `out_<workers>_<generation>.pgm` inside `dir`.
pub fn output_path(dir: &Path, workers: usize, generation: usize) -> PathBuf {
    dir.join(format!("out_{workers}_{generation}.pgm"))
}

/// Fills the interior of `buffer` with this rank's tile of the grid file.
pub async fn read_tile(
    path: &Path,
    decomp: &Decomposition,
    layout: &TileLayout,
    strategy: ReadStrategy,
    rank: usize,
    buffer: &mut [u8],
) -> LifeResult<()> {
    let mut file = File::open(path)
        .await
        .map_err(|e| LifeError::ingest_io(rank, "open input", e))?;
    let header = read_header(&mut file, decomp, rank).await?;
    tracing::debug!(rank, cols = header.width, rows = header.height, header_bytes = header.len, ?strategy, "reading tile");

    let read = match strategy {
        ReadStrategy::Collective => read_span(&mut file, &header, layout, buffer).await,
        ReadStrategy::Manual => read_rows(&mut file, &header, decomp, rank, buffer).await,
    };
    read.map_err(|e| LifeError::ingest_io(rank, "read tile", e))
}

async fn read_header(file: &mut File, decomp: &Decomposition, rank: usize) -> LifeResult<PgmHeader> {
    let mut probe = Vec::with_capacity(HEADER_PROBE);
    (&mut *file)
        .take(HEADER_PROBE as u64)
        .read_to_end(&mut probe)
        .await
        .map_err(|e| LifeError::ingest_io(rank, "read header", e))?;

    let header = PgmHeader::parse(&probe).map_err(|e| LifeError::ingest(rank, "parse header", e.to_string()))?;
    if header.width != decomp.size || header.height != decomp.size {
        return Err(LifeError::ingest(
            rank,
            "check header",
            format!("file is {}x{}, run expects {}x{}", header.width, header.height, decomp.size, decomp.size),
        ));
    }

    if header.maxval != 255 {
        return Err(LifeError::ingest(rank, "check header", format!("maxval is {}, expected 255", header.maxval)));
    }

    let needed = (header.len + decomp.size * decomp.size) as u64;
    let actual = file
        .metadata()
        .await
        .map_err(|e| LifeError::ingest_io(rank, "stat input", e))?
        .len();
    if actual < needed {
        return Err(LifeError::ingest(rank, "check length", format!("file has {actual} bytes, needs {needed}")));
    }
    Ok(header)
}

async fn read_span(file: &mut File, header: &PgmHeader, layout: &TileLayout, buffer: &mut [u8]) -> io::Result<()> {
    let extent = layout.file.extent();
    let mut span = vec![0u8; extent.len()];
    file.seek(SeekFrom::Start((header.len + extent.start) as u64)).await?;
    file.read_exact(&mut span).await?;
    layout.scatter(&span, buffer);
    Ok(())
}

async fn read_rows(
    file: &mut File,
    header: &PgmHeader,
    decomp: &Decomposition,
    rank: usize,
    buffer: &mut [u8],
) -> io::Result<()> {
    let size = decomp.size;
    let ln = decomp.local_rows;

    match decomp.topology {
        Topology::Checkerboard => {
            let (mesh_row, mesh_col) = decomp.mesh_position(rank);
            let sqrtn = decomp.mesh_rows;
            for i in 1..=ln {
                let row_skip = mesh_row * size * size / sqrtn + (i - 1) * size;
                let col_skip = mesh_col * ln;
                let skip_to = header.len + row_skip + col_skip;
                let read_start = (ln + 2) * i + 1;

                file.seek(SeekFrom::Start(skip_to as u64)).await?;
                file.read_exact(&mut buffer[read_start..read_start + ln]).await?;
            }
        }
        Topology::Row => {
            file.seek(SeekFrom::Start((header.len + ln * rank * size) as u64)).await?;
            file.read_exact(&mut buffer[size..size + ln * size]).await?;
        }
    }
    Ok(())
}

/// Writes this rank's tile of one generation into the shared output file.
/// Every rank must call this for the same generation.
pub async fn write_generation(
    comm: &mut Communicator,
    dir: &Path,
    decomp: &Decomposition,
    layout: &TileLayout,
    generation: usize,
    buffer: &[u8],
) -> LifeResult<PathBuf> {
    let rank = comm.rank();
    let path = output_path(dir, decomp.workers, generation);
    let header = PgmHeader::square(decomp.size);

    if rank == COORDINATOR {
        tracing::debug!(path = %path.display(), "creating output");
        create_with_header(&path, &header, decomp.size)
            .await
            .map_err(|e| LifeError::write_io(rank, "create output", e))?;
    }
    comm.barrier().await?;

    write_rows(&path, &header, layout, buffer)
        .await
        .map_err(|e| LifeError::write_io(rank, "write tile", e))?;
    comm.barrier().await?;

    Ok(path)
}

async fn create_with_header(path: &Path, header: &PgmHeader, size: usize) -> io::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).await?;
    }
    match fs::remove_file(path).await {
        Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e),
        _ => {}
    }

    let mut file = File::create(path).await?;
    file.write_all(header.encode().as_bytes()).await?;
    file.set_len((header.len + size * size) as u64).await?;
    file.flush().await
}

async fn write_rows(path: &Path, header: &PgmHeader, layout: &TileLayout, buffer: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).open(path).await?;
    for (file_range, memory_range) in layout.row_pairs() {
        file.seek(SeekFrom::Start((header.len + file_range.start) as u64)).await?;
        file.write_all(&buffer[memory_range]).await?;
    }
    file.flush().await
}
