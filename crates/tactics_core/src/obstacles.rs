//! Connectivity-preserving obstacle generation.
//!
//! The grid starts fully blocked. A randomized depth-first traversal from the
//! top-left tile clears every tile it visits and stops once the number of
//! untouched tiles equals the obstacle target. The cleared set is connected
//! because it is exactly the set of tiles the traversal reached.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::grid::{Grid, TileCoord};

/// Smallest obstacle fraction a match may use.
pub const MIN_OBSTACLE_FRACTION: f32 = 0.3;

/// Largest obstacle fraction a match may use.
pub const MAX_OBSTACLE_FRACTION: f32 = 0.95;

/// Summary of one obstacle generation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObstacleReport {
    /// Tiles in the grid.
    pub total: usize,
    /// Tiles left as obstacles.
    pub obstacles: usize,
    /// Tiles cleared by the traversal.
    pub free: usize,
}

/// Draw a per-match obstacle fraction, uniform in
/// `[MIN_OBSTACLE_FRACTION, MAX_OBSTACLE_FRACTION]`.
pub fn draw_obstacle_fraction<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    rng.gen_range(MIN_OBSTACLE_FRACTION..=MAX_OBSTACLE_FRACTION)
}

/// Number of obstacle tiles for a grid of `total` tiles.
///
/// The fraction is clamped into the allowed range first.
#[must_use]
pub fn target_obstacle_count(total: usize, fraction: f32) -> usize {
    let fraction = fraction.clamp(MIN_OBSTACLE_FRACTION, MAX_OBSTACLE_FRACTION);
    (total as f64 * f64::from(fraction)).round() as usize
}

/// Carve free tiles out of a fully blocked grid.
///
/// Every tile is reset to obstacle first, so calling this twice on the same
/// grid regenerates the layout. Occupancy flags are left untouched.
pub fn generate_obstacles<R: Rng + ?Sized>(
    grid: &mut Grid,
    fraction: f32,
    rng: &mut R,
) -> ObstacleReport {
    let total = grid.len();
    if total == 0 {
        return ObstacleReport {
            total: 0,
            obstacles: 0,
            free: 0,
        };
    }

    let coords: Vec<TileCoord> = grid.tiles().iter().map(|t| t.coord()).collect();
    for coord in &coords {
        grid.set_obstacle(*coord, true);
    }

    let target = target_obstacle_count(total, fraction);
    let mut visited = vec![false; total];
    let mut visited_count = 0usize;

    let start = TileCoord::new(0, 0);
    let mut stack: Vec<(Vec<TileCoord>, usize)> = Vec::new();

    if total - visited_count > target {
        visit(grid, start, &mut visited, &mut visited_count);
        let mut neighbors = grid.neighbors(start);
        neighbors.shuffle(rng);
        stack.push((neighbors, 0));
    }

    while let Some((neighbors, next)) = stack.last_mut() {
        if total - visited_count <= target {
            break;
        }
        let Some(&candidate) = neighbors.get(*next) else {
            stack.pop();
            continue;
        };
        *next += 1;

        let Some(index) = grid.index(candidate) else {
            continue;
        };
        if visited[index] {
            continue;
        }
        visit(grid, candidate, &mut visited, &mut visited_count);
        let mut neighbors = grid.neighbors(candidate);
        neighbors.shuffle(rng);
        stack.push((neighbors, 0));
    }

    let report = ObstacleReport {
        total,
        obstacles: total - visited_count,
        free: visited_count,
    };
    tracing::debug!(
        total = report.total,
        obstacles = report.obstacles,
        free = report.free,
        fraction,
        "Obstacles generated"
    );
    report
}

fn visit(grid: &mut Grid, coord: TileCoord, visited: &mut [bool], visited_count: &mut usize) {
    if let Some(index) = grid.index(coord) {
        visited[index] = true;
        *visited_count += 1;
        grid.set_obstacle(coord, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridConfig;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn generate(width: u32, height: u32, fraction: f32, seed: u64) -> (Grid, ObstacleReport) {
        let mut grid = Grid::generate(GridConfig::default().with_size(width, height));
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let report = generate_obstacles(&mut grid, fraction, &mut rng);
        (grid, report)
    }

    #[test]
    fn test_target_count_rounds() {
        assert_eq!(target_obstacle_count(625, 0.5), 313);
        assert_eq!(target_obstacle_count(100, 0.3), 30);
        // Clamped to the allowed range.
        assert_eq!(target_obstacle_count(100, 0.0), 30);
        assert_eq!(target_obstacle_count(100, 1.0), 95);
    }

    #[test]
    fn test_default_grid_half_obstacles() {
        let (grid, report) = generate(25, 25, 0.5, 42);
        assert_eq!(report.total, 625);
        assert_eq!(report.free, 312);
        assert_eq!(report.obstacles, 313);
        assert_eq!(grid.free_tiles().count(), 312);
        assert!(grid.is_connected());
    }

    #[test]
    fn test_origin_always_free() {
        for seed in 0..20 {
            let (grid, _) = generate(10, 10, 0.95, seed);
            assert!(!grid.is_obstacle(TileCoord::new(0, 0)));
            assert!(grid.is_connected());
        }
    }

    #[test]
    fn test_same_seed_same_layout() {
        let (a, _) = generate(15, 15, 0.6, 7);
        let (b, _) = generate(15, 15, 0.6, 7);
        assert_eq!(a, b);
    }

    #[test]
    fn test_regeneration_resets_layout() {
        let mut grid = Grid::generate(GridConfig::default().with_size(8, 8));
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        generate_obstacles(&mut grid, 0.3, &mut rng);
        let report = generate_obstacles(&mut grid, 0.9, &mut rng);
        assert_eq!(grid.free_tiles().count(), report.free);
        assert_eq!(report.free, 64 - 58);
    }

    #[test]
    fn test_empty_grid_is_noop() {
        let (grid, report) = generate(0, 0, 0.5, 3);
        assert!(grid.is_empty());
        assert_eq!(report.total, 0);
    }

    #[test]
    fn test_draw_fraction_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        for _ in 0..1000 {
            let f = draw_obstacle_fraction(&mut rng);
            assert!((MIN_OBSTACLE_FRACTION..=MAX_OBSTACLE_FRACTION).contains(&f));
        }
    }
}
