// patterns.rs - Starting configurations for runs without an input file

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::decomp::Decomposition;
use crate::tile::{ALIVE, DEAD};

/// A named shape, as (row, col) offsets from its top-left corner.
pub struct Pattern {
    pub name: &'static str,
    pub cells: &'static [(usize, usize)],
}

pub const PATTERNS: &[Pattern] = &[
    Pattern {
        name: "Block",
        cells: &[(0, 0), (0, 1), (1, 0), (1, 1)],
    },
    Pattern {
        name: "Blinker",
        cells: &[(0, 0), (0, 1), (0, 2)],
    },
    Pattern {
        name: "Toad",
        cells: &[(0, 1), (0, 2), (0, 3), (1, 0), (1, 1), (1, 2)],
    },
    Pattern {
        name: "Beacon",
        cells: &[(0, 0), (0, 1), (1, 0), (1, 1), (2, 2), (2, 3), (3, 2), (3, 3)],
    },
    Pattern {
        name: "Glider",
        cells: &[(0, 1), (1, 2), (2, 0), (2, 1), (2, 2)],
    },
    Pattern {
        name: "R-pentomino",
        cells: &[(0, 1), (0, 2), (1, 0), (1, 1), (2, 1)],
    },
    Pattern {
        name: "Pulsar",
        cells: &[
            // Rows 0-5
            (0, 2), (0, 3), (0, 4), (0, 8), (0, 9), (0, 10),
            (2, 0), (2, 5), (2, 7), (2, 12),
            (3, 0), (3, 5), (3, 7), (3, 12),
            (4, 0), (4, 5), (4, 7), (4, 12),
            (5, 2), (5, 3), (5, 4), (5, 8), (5, 9), (5, 10),
            // Rows 7-12, rows 0-5 mirrored across row 6
            (7, 2), (7, 3), (7, 4), (7, 8), (7, 9), (7, 10),
            (8, 0), (8, 5), (8, 7), (8, 12),
            (9, 0), (9, 5), (9, 7), (9, 12),
            (10, 0), (10, 5), (10, 7), (10, 12),
            (12, 2), (12, 3), (12, 4), (12, 8), (12, 9), (12, 10),
        ],
    },
];

impl Pattern {
    /// Looks a pattern up by name, ignoring case.
    pub fn find(name: &str) -> Option<&'static Pattern> {
        PATTERNS.iter().find(|pattern| pattern.name.eq_ignore_ascii_case(name))
    }

    fn extent(&self) -> (usize, usize) {
        let rows = self.cells.iter().map(|&(r, _)| r + 1).max().unwrap_or(0);
        let cols = self.cells.iter().map(|&(_, c)| c + 1).max().unwrap_or(0);
        (rows, cols)
    }

    /// Global cells of the pattern centered on a `size x size` grid.
    /// Cells that would fall off the grid are dropped.
    pub fn centered(&self, size: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        let (rows, cols) = self.extent();
        let top = size.saturating_sub(rows) / 2;
        let left = size.saturating_sub(cols) / 2;
        self.cells
            .iter()
            .map(move |&(r, c)| (r + top, c + left))
            .filter(move |&(r, c)| r < size && c < size)
    }
}

/// Initial state used when no input file is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Seed {
    /// Every other row alive, starting with the first.
    #[default]
    Stripes,
    /// About a third of the cells alive, from a reproducible hash.
    Random(u64),
    /// A named pattern centered on an otherwise dead grid.
    Pattern(&'static str),
}

impl Seed {
    /// State of global cell (row, col). Depends only on global coordinates,
    /// so every decomposition starts from the same grid.
    fn cell(&self, row: usize, col: usize) -> u8 {
        match self {
            Seed::Stripes => if row % 2 == 0 { ALIVE } else { DEAD },
            Seed::Random(seed) => {
                let mut hasher = DefaultHasher::new();
                (seed, row, col).hash(&mut hasher);
                let value = hasher.finish().wrapping_mul(1103515245).wrapping_add(12345);
                if (value >> 16) % 3 == 0 { ALIVE } else { DEAD }
            }
            Seed::Pattern(_) => DEAD,
        }
    }

    /// Writes this rank's share of the initial grid into its buffer interior.
    pub fn fill_tile(&self, decomp: &Decomposition, rank: usize, buffer: &mut [u8]) {
        let (row0, col0) = decomp.origin(rank);
        for r in 0..decomp.local_rows {
            for c in 0..decomp.local_cols {
                buffer[decomp.interior_index(r, c)] = self.cell(row0 + r, col0 + c);
            }
        }

        if let Seed::Pattern(name) = self {
            let Some(pattern) = Pattern::find(name) else { return };
            let rows = row0..row0 + decomp.local_rows;
            let cols = col0..col0 + decomp.local_cols;
            for (row, col) in pattern.centered(decomp.size) {
                if rows.contains(&row) && cols.contains(&col) {
                    buffer[decomp.interior_index(row - row0, col - col0)] = ALIVE;
                }
            }
        }
    }
}
