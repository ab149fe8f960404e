// lib.rs - Distributed Game of Life over message-passing workers
//
// The global grid is cut into tiles, one per worker. Workers never share
// memory: each generation they trade tile edges with their neighbors, step
// their own tile, and optionally reduce a live count or write their region
// of a shared PGM file.

pub mod comm;
pub mod config;
pub mod decomp;
pub mod error;
pub mod exchange;
pub mod io;
pub mod layout;
pub mod patterns;
pub mod pgm;
pub mod reduction;
pub mod simulation;
pub mod tile;
pub mod trace;
pub mod update;
pub mod worker;

pub use config::RunConfig;
pub use decomp::{Decomposition, Topology};
pub use error::{LifeError, LifeResult};
pub use io::ReadStrategy;
pub use patterns::Seed;
pub use simulation::{RunReport, Simulation};
