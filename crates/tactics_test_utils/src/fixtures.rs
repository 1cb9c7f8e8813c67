//! Test fixtures and helpers.
//!
//! Grids and battlefields built from ASCII layouts, plus small match
//! configurations for consistent testing.
//!
//! Layout characters:
//!
//! | Char | Meaning |
//! |------|---------|
//! | `#`  | obstacle |
//! | `.`  | free tile |
//! | `S` / `B` | player Sniper / Brawler |
//! | `s` / `b` | AI Sniper / Brawler |
//!
//! The first string is row `A`. Units are placed in reading order, so roster
//! order follows the layout.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tactics_core::battlefield::Battlefield;
use tactics_core::config::{MatchConfig, PacingConfig};
use tactics_core::grid::{Grid, GridConfig, TileCoord};
use tactics_core::math::Fixed;
use tactics_core::orchestrator::AiLevel;
use tactics_core::units::{Side, UnitId, UnitKind};

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> Fixed {
    Fixed::from_num(n)
}

/// Seeded RNG matching the one the match uses.
#[must_use]
pub fn rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Grid of `width` x `height` with every tile free.
#[must_use]
pub fn open_grid(width: u32, height: u32) -> Grid {
    let mut grid = Grid::generate(GridConfig::default().with_size(width, height));
    let coords: Vec<TileCoord> = grid.tiles().iter().map(|t| t.coord()).collect();
    for coord in coords {
        grid.set_obstacle(coord, false);
    }
    grid
}

/// Grid from an ASCII layout. Only `#` marks an obstacle.
///
/// Rows shorter than the widest row are padded with obstacles.
#[must_use]
pub fn grid_from_layout(rows: &[&str]) -> Grid {
    let height = rows.len() as u32;
    let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0) as u32;
    let mut grid = Grid::generate(GridConfig::default().with_size(width, height));
    for (row, line) in rows.iter().enumerate() {
        for (column, ch) in line.chars().enumerate() {
            grid.set_obstacle(TileCoord::new(column as u32, row as u32), ch == '#');
        }
    }
    grid
}

/// Battlefield from an ASCII layout, placing the units it marks.
///
/// # Panics
///
/// Panics if a unit marker sits on a tile that cannot hold it.
#[must_use]
pub fn battlefield_from_layout(rows: &[&str]) -> Battlefield {
    let mut battlefield = Battlefield::new(grid_from_layout(rows));
    for (row, line) in rows.iter().enumerate() {
        for (column, ch) in line.chars().enumerate() {
            let Some((side, kind)) = unit_marker(ch) else {
                continue;
            };
            let coord = TileCoord::new(column as u32, row as u32);
            if let Err(err) = battlefield.place_unit(side, kind, coord) {
                panic!("cannot place {side} {kind} at {coord}: {err}");
            }
        }
    }
    battlefield
}

fn unit_marker(ch: char) -> Option<(Side, UnitKind)> {
    match ch {
        'S' => Some((Side::Player, UnitKind::Sniper)),
        'B' => Some((Side::Player, UnitKind::Brawler)),
        's' => Some((Side::Ai, UnitKind::Sniper)),
        'b' => Some((Side::Ai, UnitKind::Brawler)),
        _ => None,
    }
}

/// Id of the unit standing on the tile named `identifier`.
#[must_use]
pub fn unit_at(battlefield: &Battlefield, identifier: &str) -> Option<UnitId> {
    let coord = battlefield.grid().find_identifier(identifier)?;
    battlefield.unit_at(coord).map(|u| u.id())
}

/// Tile named `identifier`.
///
/// # Panics
///
/// Panics if the grid has no such tile.
#[must_use]
pub fn tile(grid: &Grid, identifier: &str) -> TileCoord {
    match grid.find_identifier(identifier) {
        Some(coord) => coord,
        None => panic!("no tile {identifier}"),
    }
}

/// Small match with no pacing delays: 10x10, 40% obstacles, player first.
#[must_use]
pub fn quick_config(seed: u64, level: AiLevel) -> MatchConfig {
    MatchConfig::default()
        .with_seed(seed)
        .with_ai_level(level)
        .with_grid(GridConfig::default().with_size(10, 10))
        .with_obstacle_fraction(0.4)
        .with_starting_side(Side::Player)
        .with_pacing(PacingConfig::instant())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_obstacles_and_units() {
        let bf = battlefield_from_layout(&["S.#", ".#b"]);
        assert_eq!(bf.grid().width(), 3);
        assert_eq!(bf.grid().height(), 2);
        assert!(bf.grid().is_obstacle(TileCoord::new(2, 0)));
        assert!(!bf.grid().is_obstacle(TileCoord::new(0, 0)));
        assert_eq!(bf.roster(Side::Player).len(), 1);
        assert_eq!(bf.roster(Side::Ai).len(), 1);
        assert_eq!(unit_at(&bf, "A1"), Some(bf.roster(Side::Player)[0]));
        assert_eq!(unit_at(&bf, "B3"), Some(bf.roster(Side::Ai)[0]));
        assert_eq!(unit_at(&bf, "A2"), None);
    }

    #[test]
    fn test_open_grid_is_free() {
        let grid = open_grid(4, 3);
        assert_eq!(grid.obstacle_count(), 0);
        assert_eq!(grid.free_tiles().count(), 12);
    }

    #[test]
    fn test_quick_config_is_valid() {
        assert!(quick_config(1, AiLevel::Easy).validate().is_ok());
    }
}
