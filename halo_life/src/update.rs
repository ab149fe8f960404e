// update.rs - One Game of Life step over a local tile

use crate::decomp::{Decomposition, Topology};
use crate::tile::{ALIVE, DEAD};

/// Conway's rule: two's company, three's a crowd, three parents make a birth.
#[inline]
fn next_state(alive: bool, neighbors: u8) -> u8 {
    match (alive, neighbors) {
        (true, 2) | (true, 3) => ALIVE, // Survival
        (false, 3) => ALIVE,            // Birth
        _ => DEAD,                      // Death or stays dead
    }
}

/// Writes the next generation of every interior cell of `current` into
/// `next`. Halo cells of `next` are never written. `current` must already
/// hold this generation's halo.
pub fn calculate_next(decomp: &Decomposition, current: &[u8], next: &mut [u8]) {
    match decomp.topology {
        Topology::Checkerboard => step_blocks(decomp.local_rows, decomp.local_cols, current, next),
        Topology::Row => step_bands(decomp.local_rows, decomp.size, current, next),
    }
}

/// Checkerboard tiles are surrounded by halo on all sides, so every
/// interior cell has eight readable neighbors.
fn step_blocks(rows: usize, cols: usize, current: &[u8], next: &mut [u8]) {
    let stride = cols + 2;
    let alive = |r: usize, c: usize| u8::from(current[r * stride + c] != DEAD);

    for row in 1..=rows {
        for col in 1..=cols {
            let count = alive(row - 1, col - 1)
                + alive(row - 1, col)
                + alive(row - 1, col + 1)
                + alive(row, col - 1)
                + alive(row, col + 1)
                + alive(row + 1, col - 1)
                + alive(row + 1, col)
                + alive(row + 1, col + 1);
            next[row * stride + col] = next_state(current[row * stride + col] != DEAD, count);
        }
    }
}

/// Row bands span the full grid width and have no side halo: the first and
/// last column simply have fewer neighbors.
fn step_bands(rows: usize, size: usize, current: &[u8], next: &mut [u8]) {
    let alive = |r: usize, c: usize| u8::from(current[r * size + c] != DEAD);

    for row in 1..=rows {
        for col in 0..size {
            let has_left = col > 0;
            let has_right = col + 1 < size;
            let mut count = 0;
            for r in [row - 1, row, row + 1] {
                if has_left {
                    count += alive(r, col - 1);
                }
                if r != row {
                    count += alive(r, col);
                }
                if has_right {
                    count += alive(r, col + 1);
                }
            }
            next[row * size + col] = next_state(current[row * size + col] != DEAD, count);
        }
    }
}
