//! Rectangular battle grid.
//!
//! Tiles are stored in row-major order. Every tile carries a human-readable
//! identifier (`A1` is row 0 column 0, `C7` is row 2 column 6) which is what
//! the status log prints. Adjacency is 4-directional.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::math::{Fixed, Vec2Fixed};

/// Grid coordinates of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    /// Column, 0-based, grows along world X.
    pub column: u32,
    /// Row, 0-based, grows along world Y.
    pub row: u32,
}

impl TileCoord {
    /// Create a coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Identifier of the tile at this coordinate (e.g. `"A3"`).
    #[must_use]
    pub fn identifier(self) -> String {
        format!("{}{}", row_label(self.row), self.column + 1)
    }

    /// Number of orthogonal steps between two coordinates.
    #[must_use]
    pub const fn manhattan(self, other: Self) -> u32 {
        self.column.abs_diff(other.column) + self.row.abs_diff(other.row)
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", row_label(self.row), self.column + 1)
    }
}

/// Letters for a row index: `A`..`Z`, then `AA`, `AB`, ...
#[must_use]
pub fn row_label(row: u32) -> String {
    let mut n = row + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Grid dimensions and world spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Number of columns.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
    /// Tile edge length in world units.
    pub cell_size: u32,
    /// Gap between neighbouring tiles in world units.
    pub spacing: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 25,
            height: 25,
            cell_size: 100,
            spacing: 10,
        }
    }
}

impl GridConfig {
    /// Same spacing, different dimensions.
    #[must_use]
    pub const fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Distance between the centres of two adjacent tiles.
    #[must_use]
    pub fn pitch(&self) -> Fixed {
        Fixed::from_num(self.cell_size) + Fixed::from_num(self.spacing)
    }

    /// Total number of tiles.
    #[must_use]
    pub const fn tile_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }
}

/// A single grid cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    coord: TileCoord,
    identifier: String,
    obstacle: bool,
    occupied: bool,
    position: Vec2Fixed,
}

impl Tile {
    /// Grid coordinates.
    #[must_use]
    pub const fn coord(&self) -> TileCoord {
        self.coord
    }

    /// Human-readable identifier.
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Whether the tile blocks movement.
    #[must_use]
    pub const fn is_obstacle(&self) -> bool {
        self.obstacle
    }

    /// Whether a unit stands on the tile.
    #[must_use]
    pub const fn is_occupied(&self) -> bool {
        self.occupied
    }

    /// Neither obstacle nor occupied.
    #[must_use]
    pub const fn is_free(&self) -> bool {
        !self.obstacle && !self.occupied
    }

    /// World position of the tile centre.
    #[must_use]
    pub const fn position(&self) -> Vec2Fixed {
        self.position
    }
}

/// The battle grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    config: GridConfig,
    tiles: Vec<Tile>,
}

impl Grid {
    /// Allocate a grid with every tile set as obstacle.
    ///
    /// Obstacles are carved away afterwards by
    /// [`generate_obstacles`](crate::obstacles::generate_obstacles).
    #[must_use]
    pub fn generate(config: GridConfig) -> Self {
        let pitch = config.pitch();
        let mut tiles = Vec::with_capacity(config.tile_count());
        for row in 0..config.height {
            for column in 0..config.width {
                let coord = TileCoord::new(column, row);
                tiles.push(Tile {
                    coord,
                    identifier: coord.identifier(),
                    obstacle: true,
                    occupied: false,
                    position: Vec2Fixed::new(
                        Fixed::from_num(column) * pitch,
                        Fixed::from_num(row) * pitch,
                    ),
                });
            }
        }
        tracing::debug!(
            width = config.width,
            height = config.height,
            tiles = tiles.len(),
            "Grid generated"
        );
        Self { config, tiles }
    }

    /// Grid configuration.
    #[must_use]
    pub const fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.config.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.config.height
    }

    /// Distance between adjacent tile centres.
    #[must_use]
    pub fn pitch(&self) -> Fixed {
        self.config.pitch()
    }

    /// Total number of tiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// True for a zero-sized grid.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// All tiles in row-major order.
    #[must_use]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Check if coordinates are within grid bounds.
    #[must_use]
    pub const fn contains(&self, coord: TileCoord) -> bool {
        coord.column < self.config.width && coord.row < self.config.height
    }

    /// Row-major index for in-bounds coordinates.
    #[must_use]
    pub fn index(&self, coord: TileCoord) -> Option<usize> {
        self.contains(coord)
            .then(|| (coord.row as usize) * (self.config.width as usize) + coord.column as usize)
    }

    /// Tile at coordinates, `None` if out of bounds.
    #[must_use]
    pub fn tile(&self, coord: TileCoord) -> Option<&Tile> {
        self.index(coord).map(|i| &self.tiles[i])
    }

    /// Orthogonal neighbours inside the grid.
    ///
    /// Order is fixed (row+1, row-1, column+1, column-1) so that every
    /// traversal is reproducible.
    #[must_use]
    pub fn neighbors(&self, coord: TileCoord) -> Vec<TileCoord> {
        let mut out = Vec::with_capacity(4);
        if !self.contains(coord) {
            return out;
        }
        if coord.row + 1 < self.config.height {
            out.push(TileCoord::new(coord.column, coord.row + 1));
        }
        if coord.row > 0 {
            out.push(TileCoord::new(coord.column, coord.row - 1));
        }
        if coord.column + 1 < self.config.width {
            out.push(TileCoord::new(coord.column + 1, coord.row));
        }
        if coord.column > 0 {
            out.push(TileCoord::new(coord.column - 1, coord.row));
        }
        out
    }

    /// Set the obstacle flag. Returns `false` if out of bounds.
    pub fn set_obstacle(&mut self, coord: TileCoord, obstacle: bool) -> bool {
        match self.index(coord) {
            Some(i) => {
                self.tiles[i].obstacle = obstacle;
                true
            }
            None => false,
        }
    }

    /// Set the occupancy flag. Returns `false` if out of bounds.
    pub fn set_occupied(&mut self, coord: TileCoord, occupied: bool) -> bool {
        match self.index(coord) {
            Some(i) => {
                self.tiles[i].occupied = occupied;
                true
            }
            None => false,
        }
    }

    /// Obstacle check; out-of-bounds counts as blocked.
    #[must_use]
    pub fn is_obstacle(&self, coord: TileCoord) -> bool {
        self.tile(coord).map_or(true, Tile::is_obstacle)
    }

    /// Occupancy check; out-of-bounds counts as unoccupied.
    #[must_use]
    pub fn is_occupied(&self, coord: TileCoord) -> bool {
        self.tile(coord).is_some_and(Tile::is_occupied)
    }

    /// In bounds, not an obstacle and not occupied.
    #[must_use]
    pub fn is_free(&self, coord: TileCoord) -> bool {
        self.tile(coord).is_some_and(Tile::is_free)
    }

    /// World position of a tile centre.
    #[must_use]
    pub fn tile_position(&self, coord: TileCoord) -> Option<Vec2Fixed> {
        self.tile(coord).map(Tile::position)
    }

    /// Tile whose centre lies within half a cell of `pos`.
    #[must_use]
    pub fn tile_at_position(&self, pos: Vec2Fixed) -> Option<TileCoord> {
        if pos.x < Fixed::ZERO || pos.y < Fixed::ZERO {
            return None;
        }
        let pitch = self.pitch();
        let half_pitch = pitch / Fixed::from_num(2);
        let column = ((pos.x + half_pitch) / pitch).to_num::<i64>();
        let row = ((pos.y + half_pitch) / pitch).to_num::<i64>();
        let coord = TileCoord::new(u32::try_from(column).ok()?, u32::try_from(row).ok()?);
        let tile = self.tile(coord)?;
        let tolerance = Fixed::from_num(self.config.cell_size) / Fixed::from_num(2);
        (tile.position.distance_squared(pos) < tolerance * tolerance).then_some(coord)
    }

    /// Look a tile up by its identifier (e.g. `"C7"`).
    #[must_use]
    pub fn find_identifier(&self, identifier: &str) -> Option<TileCoord> {
        self.tiles
            .iter()
            .find(|t| t.identifier.eq_ignore_ascii_case(identifier))
            .map(Tile::coord)
    }

    /// Coordinates of every tile that is neither obstacle nor occupied.
    pub fn free_tiles(&self) -> impl Iterator<Item = TileCoord> + '_ {
        self.tiles.iter().filter(|t| t.is_free()).map(Tile::coord)
    }

    /// Number of obstacle tiles.
    #[must_use]
    pub fn obstacle_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.obstacle).count()
    }

    /// Whether all non-obstacle tiles form one 4-connected component.
    ///
    /// Occupancy is ignored; a grid with no open tile counts as connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        let open: Vec<TileCoord> = self
            .tiles
            .iter()
            .filter(|t| !t.obstacle)
            .map(Tile::coord)
            .collect();
        let Some(&start) = open.first() else {
            return true;
        };

        let mut seen = vec![false; self.tiles.len()];
        let mut queue = VecDeque::from([start]);
        let mut reached = 0usize;
        if let Some(i) = self.index(start) {
            seen[i] = true;
        }
        while let Some(current) = queue.pop_front() {
            reached += 1;
            for next in self.neighbors(current) {
                let Some(i) = self.index(next) else { continue };
                if seen[i] || self.tiles[i].obstacle {
                    continue;
                }
                seen[i] = true;
                queue.push_back(next);
            }
        }
        reached == open.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_grid(width: u32, height: u32) -> Grid {
        let mut grid = Grid::generate(GridConfig::default().with_size(width, height));
        for row in 0..height {
            for column in 0..width {
                grid.set_obstacle(TileCoord::new(column, row), false);
            }
        }
        grid
    }

    #[test]
    fn test_generate_starts_fully_blocked() {
        let grid = Grid::generate(GridConfig::default().with_size(4, 3));
        assert_eq!(grid.len(), 12);
        assert_eq!(grid.obstacle_count(), 12);
        assert_eq!(grid.free_tiles().count(), 0);
    }

    #[test]
    fn test_identifiers() {
        let grid = Grid::generate(GridConfig::default().with_size(10, 3));
        assert_eq!(grid.tile(TileCoord::new(0, 0)).unwrap().identifier(), "A1");
        assert_eq!(grid.tile(TileCoord::new(2, 0)).unwrap().identifier(), "A3");
        assert_eq!(grid.tile(TileCoord::new(6, 2)).unwrap().identifier(), "C7");
        assert_eq!(TileCoord::new(0, 26).identifier(), "AA1");
        assert_eq!(TileCoord::new(4, 27).to_string(), "AB5");
    }

    #[test]
    fn test_identifiers_unique() {
        let grid = Grid::generate(GridConfig::default().with_size(30, 30));
        let mut ids: Vec<&str> = grid.tiles().iter().map(Tile::identifier).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 900);
    }

    #[test]
    fn test_find_identifier() {
        let grid = Grid::generate(GridConfig::default().with_size(10, 10));
        assert_eq!(grid.find_identifier("C7"), Some(TileCoord::new(6, 2)));
        assert_eq!(grid.find_identifier("c7"), Some(TileCoord::new(6, 2)));
        assert_eq!(grid.find_identifier("Z1"), None);
    }

    #[test]
    fn test_neighbors_order_and_bounds() {
        let grid = Grid::generate(GridConfig::default().with_size(3, 3));
        assert_eq!(
            grid.neighbors(TileCoord::new(1, 1)),
            vec![
                TileCoord::new(1, 2),
                TileCoord::new(1, 0),
                TileCoord::new(2, 1),
                TileCoord::new(0, 1),
            ]
        );
        assert_eq!(grid.neighbors(TileCoord::new(0, 0)).len(), 2);
        assert!(grid.neighbors(TileCoord::new(5, 5)).is_empty());
    }

    #[test]
    fn test_positions_and_lookup() {
        let grid = Grid::generate(GridConfig::default().with_size(5, 5));
        let pos = grid.tile_position(TileCoord::new(2, 3)).unwrap();
        assert_eq!(pos, Vec2Fixed::from_ints(220, 330));
        assert_eq!(grid.tile_at_position(pos), Some(TileCoord::new(2, 3)));
        assert_eq!(
            grid.tile_at_position(Vec2Fixed::from_ints(230, 320)),
            Some(TileCoord::new(2, 3))
        );
        // In the gap between tiles.
        assert_eq!(grid.tile_at_position(Vec2Fixed::from_ints(275, 330)), None);
        assert_eq!(grid.tile_at_position(Vec2Fixed::from_ints(-5, 0)), None);
        assert_eq!(grid.tile_at_position(Vec2Fixed::from_ints(5000, 0)), None);
    }

    #[test]
    fn test_flags() {
        let mut grid = open_grid(3, 3);
        let c = TileCoord::new(1, 1);
        assert!(grid.is_free(c));
        assert!(grid.set_occupied(c, true));
        assert!(grid.is_occupied(c));
        assert!(!grid.is_free(c));
        assert!(!grid.set_obstacle(TileCoord::new(3, 0), true));
        assert!(grid.is_obstacle(TileCoord::new(3, 0)));
    }

    #[test]
    fn test_connectivity() {
        let mut grid = open_grid(3, 3);
        assert!(grid.is_connected());
        // Wall off the right column.
        for row in 0..3 {
            grid.set_obstacle(TileCoord::new(1, row), true);
        }
        assert!(!grid.is_connected());
    }

    #[test]
    fn test_empty_grid() {
        let grid = Grid::generate(GridConfig::default().with_size(0, 7));
        assert!(grid.is_empty());
        assert!(grid.is_connected());
        assert_eq!(grid.tile(TileCoord::new(0, 0)), None);
    }
}
