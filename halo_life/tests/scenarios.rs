// scenarios.rs - Whole runs checked against known Game of Life behavior

use std::path::{Path, PathBuf};

use halo_life::io::output_path;
use halo_life::pgm;
use halo_life::{LifeError, ReadStrategy, RunConfig, RunReport, Simulation, Topology};

const ALIVE: u8 = 255;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("halo_life_{}_{name}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn grid_with(size: usize, live: &[(usize, usize)]) -> Vec<u8> {
    let mut grid = vec![0u8; size * size];
    for &(r, c) in live {
        grid[r * size + c] = ALIVE;
    }
    grid
}

fn write_input(dir: &Path, size: usize, grid: &[u8]) -> PathBuf {
    let path = dir.join("input.pgm");
    std::fs::write(&path, pgm::encode(size, grid)).unwrap();
    path
}

fn read_generation(dir: &Path, workers: usize, generation: usize) -> Vec<u8> {
    let bytes = std::fs::read(output_path(dir, workers, generation)).unwrap();
    let (header, cells) = pgm::decode(&bytes).unwrap();
    assert_eq!(header.width, header.height);
    cells.to_vec()
}

/// Plain single-grid step used as the baseline.
fn reference_step(grid: &[u8], size: usize) -> Vec<u8> {
    let mut next = vec![0u8; size * size];
    for r in 0..size {
        for c in 0..size {
            let mut neighbors = 0;
            for dr in [-1i64, 0, 1] {
                for dc in [-1i64, 0, 1] {
                    let (nr, nc) = (r as i64 + dr, c as i64 + dc);
                    if (dr, dc) == (0, 0) || nr < 0 || nc < 0 || nr >= size as i64 || nc >= size as i64 {
                        continue;
                    }
                    if grid[nr as usize * size + nc as usize] != 0 {
                        neighbors += 1;
                    }
                }
            }
            let alive = grid[r * size + c] != 0;
            if (alive && (neighbors == 2 || neighbors == 3)) || (!alive && neighbors == 3) {
                next[r * size + c] = ALIVE;
            }
        }
    }
    next
}

fn scrambled_grid(size: usize) -> Vec<u8> {
    let mut state = 0x2545_f491_u64;
    (0..size * size)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            if (state >> 33) % 3 == 0 { ALIVE } else { 0 }
        })
        .collect()
}

async fn run(config: RunConfig) -> RunReport {
    Simulation::new(config).unwrap().run().await.unwrap()
}

const LAYOUTS_12: [(usize, Topology); 7] = [
    (1, Topology::Row),
    (3, Topology::Row),
    (4, Topology::Row),
    (12, Topology::Row),
    (1, Topology::Checkerboard),
    (4, Topology::Checkerboard),
    (9, Topology::Checkerboard),
];

#[tokio::test]
async fn row_and_checkerboard_produce_identical_grids() {
    let dir = scratch_dir("equivalence");
    let size = 12;
    let generations = 6;
    let input = write_input(&dir, size, &scrambled_grid(size));

    let mut baseline: Option<Vec<Vec<u8>>> = None;
    for (index, (workers, topology)) in LAYOUTS_12.into_iter().enumerate() {
        let out = dir.join(format!("run_{index}"));
        let report = run(RunConfig {
            size,
            workers,
            topology,
            generations,
            input: Some(input.clone()),
            read_strategy: if index % 2 == 0 { ReadStrategy::Manual } else { ReadStrategy::Collective },
            output: true,
            output_dir: out.clone(),
            ..RunConfig::default()
        })
        .await;

        let frames: Vec<Vec<u8>> = (0..generations).map(|g| read_generation(&out, workers, g)).collect();
        assert_eq!(report.assemble().unwrap(), frames[generations - 1]);
        match &baseline {
            None => baseline = Some(frames),
            Some(expected) => assert_eq!(&frames, expected, "{workers} workers, {topology:?}"),
        }
    }
    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn distributed_counts_match_single_grid_baseline() {
    let dir = scratch_dir("counts");
    let size = 12;
    let generations = 8;
    let grid = scrambled_grid(size);
    let input = write_input(&dir, size, &grid);

    let mut expected = Vec::new();
    let mut state = grid.clone();
    for _ in 0..generations {
        state = reference_step(&state, size);
        expected.push(state.iter().filter(|&&c| c != 0).count() as u64);
    }
    let initial = grid.iter().filter(|&&c| c != 0).count() as u64;

    for (workers, topology) in LAYOUTS_12 {
        let report = run(RunConfig {
            size,
            workers,
            topology,
            generations,
            input: Some(input.clone()),
            count_interval: 1,
            ..RunConfig::default()
        })
        .await;

        assert_eq!(report.initial_live, Some(initial));
        let totals: Vec<u64> = report.live_counts.iter().map(|c| c.total).collect();
        assert_eq!(totals, expected, "{workers} workers, {topology:?}");
        assert_eq!(report.assemble().unwrap(), state);
    }
    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn count_interval_skips_generations() {
    let report = run(RunConfig {
        size: 8,
        workers: 2,
        generations: 7,
        count_interval: 3,
        ..RunConfig::default()
    })
    .await;
    let counted: Vec<usize> = report.live_counts.iter().map(|c| c.generation).collect();
    assert_eq!(counted, vec![2, 5]);
}

#[tokio::test]
async fn corners_never_see_the_opposite_edge() {
    let dir = scratch_dir("corners");
    let size = 4;
    // With wraparound each corner would have three live neighbors and survive.
    let grid = grid_with(size, &[(0, 0), (0, 3), (3, 0), (3, 3)]);
    let input = write_input(&dir, size, &grid);

    for (workers, topology) in [(1, Topology::Row), (2, Topology::Row), (4, Topology::Row), (4, Topology::Checkerboard)] {
        let report = run(RunConfig {
            size,
            workers,
            topology,
            generations: 1,
            input: Some(input.clone()),
            ..RunConfig::default()
        })
        .await;
        assert!(report.assemble().unwrap().iter().all(|&c| c == 0), "{workers} workers, {topology:?}");
    }

    // A block in one corner is stable and nothing appears in the far corner.
    let grid = grid_with(size, &[(0, 0), (0, 1), (1, 0), (1, 1)]);
    let input = write_input(&dir, size, &grid);
    let report = run(RunConfig {
        size,
        workers: 4,
        topology: Topology::Checkerboard,
        generations: 1,
        input: Some(input),
        ..RunConfig::default()
    })
    .await;
    assert_eq!(report.assemble().unwrap(), grid);
    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn three_checkerboard_workers_are_rejected_up_front() {
    let err = Simulation::new(RunConfig {
        size: 12,
        workers: 3,
        topology: Topology::Checkerboard,
        output: true,
        output_dir: std::env::temp_dir().join("halo_life_never_created"),
        ..RunConfig::default()
    })
    .err()
    .unwrap();
    assert!(matches!(err, LifeError::Argument(_)));
    assert_eq!(err.exit_code(), 3);
    assert!(!std::env::temp_dir().join("halo_life_never_created").exists());
}

#[tokio::test]
async fn block_is_a_still_life() {
    let dir = scratch_dir("block");
    let size = 8;
    let grid = grid_with(size, &[(3, 3), (3, 4), (4, 3), (4, 4)]);
    let input = write_input(&dir, size, &grid);

    for (workers, topology) in [
        (1, Topology::Row),
        (2, Topology::Row),
        (8, Topology::Row),
        (1, Topology::Checkerboard),
        (4, Topology::Checkerboard),
        (16, Topology::Checkerboard),
    ] {
        let out = dir.join(format!("{workers}_{topology:?}"));
        run(RunConfig {
            size,
            workers,
            topology,
            generations: 10,
            input: Some(input.clone()),
            output: true,
            output_dir: out.clone(),
            ..RunConfig::default()
        })
        .await;
        for generation in 0..10 {
            assert_eq!(read_generation(&out, workers, generation), grid, "{workers} {topology:?} gen {generation}");
        }
    }
    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn blinker_alternates_orientation() {
    let dir = scratch_dir("blinker");
    let size = 6;
    let horizontal = grid_with(size, &[(2, 1), (2, 2), (2, 3)]);
    let vertical = grid_with(size, &[(1, 2), (2, 2), (3, 2)]);
    let input = write_input(&dir, size, &horizontal);

    for (workers, topology) in [
        (1, Topology::Row),
        (2, Topology::Row),
        (3, Topology::Row),
        (6, Topology::Row),
        (4, Topology::Checkerboard),
        (9, Topology::Checkerboard),
        (36, Topology::Checkerboard),
    ] {
        let out = dir.join(format!("{workers}_{topology:?}"));
        run(RunConfig {
            size,
            workers,
            topology,
            generations: 4,
            input: Some(input.clone()),
            read_strategy: ReadStrategy::Collective,
            output: true,
            output_dir: out.clone(),
            ..RunConfig::default()
        })
        .await;
        for generation in 0..4 {
            let expected = if generation % 2 == 0 { &vertical } else { &horizontal };
            assert_eq!(&read_generation(&out, workers, generation), expected, "{workers} {topology:?} gen {generation}");
        }
    }
    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn seeded_pattern_without_input() {
    let report = run(RunConfig {
        size: 6,
        workers: 4,
        topology: Topology::Checkerboard,
        generations: 2,
        seed: halo_life::Seed::Pattern("blinker"),
        ..RunConfig::default()
    })
    .await;
    assert_eq!(report.assemble().unwrap(), grid_with(6, &[(2, 1), (2, 2), (2, 3)]));
}

#[tokio::test]
async fn wrong_sized_input_is_an_ingest_error() {
    let dir = scratch_dir("wrong_size");
    let input = write_input(&dir, 6, &vec![0; 36]);
    let err = Simulation::new(RunConfig {
        size: 8,
        workers: 2,
        input: Some(input),
        ..RunConfig::default()
    })
    .unwrap()
    .run()
    .await
    .unwrap_err();
    assert_eq!(err.exit_code(), 1);
    std::fs::remove_dir_all(&dir).ok();
}
