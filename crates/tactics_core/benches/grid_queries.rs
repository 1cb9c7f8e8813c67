//! Grid generation and query benchmarks for tactics_core.
//!
//! Run with: `cargo bench -p tactics_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tactics_core::battlefield::Battlefield;
use tactics_core::grid::{Grid, GridConfig};
use tactics_core::obstacles::generate_obstacles;
use tactics_core::query::{attack_tiles, movement_tiles, path_to_tile};
use tactics_core::units::{Side, UnitId, UnitKind};

fn generated_grid(seed: u64) -> Grid {
    let mut grid = Grid::generate(GridConfig::default());
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    generate_obstacles(&mut grid, 0.5, &mut rng);
    grid
}

/// Battlefield with a player Brawler on the first free tile and an AI Sniper
/// on the last.
fn duel() -> Option<(Battlefield, UnitId, UnitId)> {
    let grid = generated_grid(42);
    let free: Vec<_> = grid.free_tiles().collect();
    let mut bf = Battlefield::new(grid);
    let brawler = bf.place_unit(Side::Player, UnitKind::Brawler, *free.first()?).ok()?;
    let sniper = bf.place_unit(Side::Ai, UnitKind::Sniper, *free.last()?).ok()?;
    Some((bf, brawler, sniper))
}

/// Obstacle generation on the default 25x25 grid.
pub fn obstacle_benchmark(c: &mut Criterion) {
    c.bench_function("generate_obstacles_25x25", |b| {
        let mut seed = 0u64;
        b.iter(|| {
            seed += 1;
            black_box(generated_grid(seed))
        })
    });
}

/// Movement, attack and path queries on a generated grid.
pub fn query_benchmark(c: &mut Criterion) {
    let Some((bf, brawler, sniper)) = duel() else {
        return;
    };
    let target = bf.unit(sniper).and_then(|u| u.tile());

    c.bench_function("movement_tiles_brawler", |b| {
        b.iter(|| black_box(movement_tiles(&bf, brawler)))
    });
    c.bench_function("attack_tiles_sniper", |b| {
        b.iter(|| black_box(attack_tiles(&bf, sniper)))
    });
    if let Some(target) = target {
        c.bench_function("path_to_tile_across_grid", |b| {
            b.iter(|| black_box(path_to_tile(&bf, brawler, target)))
        });
    }
}

criterion_group!(benches, obstacle_benchmark, query_benchmark);
criterion_main!(benches);
