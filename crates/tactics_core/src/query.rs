//! Grid queries: reachable tiles, attackable tiles and shortest paths.
//!
//! Movement and paths use breadth-first search over 4-adjacency. Attack
//! range is a Euclidean radius in world units (`attack_range * pitch`), so a
//! unit can hit diagonally placed enemies that movement would count as two
//! steps away.
//!
//! Queries never fail. A missing unit, or a unit without a tile, produces an
//! empty result and a warning.

use std::collections::VecDeque;

use crate::battlefield::Battlefield;
use crate::error::Result;
use crate::grid::{Grid, TileCoord};
use crate::math::Fixed;
use crate::units::{Unit, UnitId};

fn locate<'a>(
    battlefield: &'a Battlefield,
    unit_id: UnitId,
    query: &'static str,
) -> Option<(&'a Unit, TileCoord)> {
    let Some(unit) = battlefield.unit(unit_id) else {
        tracing::warn!(unit = unit_id, query, "Query for unknown unit");
        return None;
    };
    let Some(tile) = unit.tile() else {
        tracing::warn!(unit = unit_id, query, "Query for unit without a tile");
        return None;
    };
    Some((unit, tile))
}

/// Tiles the unit can move to this turn.
///
/// Breadth-first from the unit's tile through tiles that are neither
/// obstacle nor occupied. A tile is included when its step distance is in
/// `1..=movement_range`. Results are in discovery order.
#[must_use]
pub fn movement_tiles(battlefield: &Battlefield, unit_id: UnitId) -> Vec<TileCoord> {
    let Some((unit, start)) = locate(battlefield, unit_id, "movement_tiles") else {
        return Vec::new();
    };
    let range = unit.stats().movement_range;
    let grid = battlefield.grid();

    let mut distance: Vec<Option<u32>> = vec![None; grid.len()];
    let mut queue = VecDeque::new();
    let mut reachable = Vec::new();

    if let Some(i) = grid.index(start) {
        distance[i] = Some(0);
        queue.push_back((start, 0u32));
    }

    while let Some((current, steps)) = queue.pop_front() {
        if steps >= range {
            continue;
        }
        for next in grid.neighbors(current) {
            let Some(i) = grid.index(next) else { continue };
            if distance[i].is_some() || !grid.is_free(next) {
                continue;
            }
            distance[i] = Some(steps + 1);
            queue.push_back((next, steps + 1));
            reachable.push(next);
        }
    }
    reachable
}

/// Tiles holding an enemy the unit can attack from where it stands.
///
/// A tile qualifies when its centre lies within `attack_range * pitch` of the
/// unit's tile centre, melee units are not aiming at an obstacle tile, and an
/// enemy occupies it. Results are in grid order.
#[must_use]
pub fn attack_tiles(battlefield: &Battlefield, unit_id: UnitId) -> Vec<TileCoord> {
    let Some((unit, origin)) = locate(battlefield, unit_id, "attack_tiles") else {
        return Vec::new();
    };
    let grid = battlefield.grid();
    let Some(origin_pos) = grid.tile_position(origin) else {
        return Vec::new();
    };
    let radius = Fixed::from_num(unit.stats().attack_range) * grid.pitch();
    let ranged = unit.stats().ranged;

    grid.tiles()
        .iter()
        .filter(|tile| tile.is_occupied())
        .filter(|tile| ranged || !tile.is_obstacle())
        .filter(|tile| origin_pos.within(tile.position(), radius))
        .filter(|tile| {
            battlefield
                .unit_at(tile.coord())
                .is_some_and(|target| target.is_enemy_of(unit))
        })
        .map(|tile| tile.coord())
        .collect()
}

/// Shortest path from the unit's tile to `destination`.
///
/// A tile may be stepped on when it is not an obstacle and is either
/// unoccupied or the destination itself. The returned path excludes the
/// start and ends at the destination; it is empty when no path exists or
/// the unit already stands there.
#[must_use]
pub fn path_to_tile(battlefield: &Battlefield, unit_id: UnitId, destination: TileCoord) -> Vec<TileCoord> {
    let Some((_, start)) = locate(battlefield, unit_id, "path_to_tile") else {
        return Vec::new();
    };
    let grid = battlefield.grid();
    if start == destination || !grid.contains(destination) {
        return Vec::new();
    }
    shortest_path(grid, start, destination)
}

fn shortest_path(grid: &Grid, start: TileCoord, destination: TileCoord) -> Vec<TileCoord> {
    let mut came_from: Vec<Option<TileCoord>> = vec![None; grid.len()];
    let mut visited = vec![false; grid.len()];
    let mut queue = VecDeque::new();

    if let Some(i) = grid.index(start) {
        visited[i] = true;
        queue.push_back(start);
    }

    let mut found = false;
    while let Some(current) = queue.pop_front() {
        if current == destination {
            found = true;
            break;
        }
        for next in grid.neighbors(current) {
            let Some(i) = grid.index(next) else { continue };
            let admissible =
                !grid.is_obstacle(next) && (!grid.is_occupied(next) || next == destination);
            if visited[i] || !admissible {
                continue;
            }
            visited[i] = true;
            came_from[i] = Some(current);
            queue.push_back(next);
        }
    }

    if !found {
        tracing::debug!(from = %start, to = %destination, "No path found");
        return Vec::new();
    }

    let mut path = Vec::new();
    let mut current = destination;
    while let Some(previous) = grid.index(current).and_then(|i| came_from[i]) {
        path.push(current);
        current = previous;
    }
    path.reverse();
    path
}

/// Commit a finished move: free the old tile, relocate the unit and occupy
/// the destination.
///
/// Call exactly once per move, after the movement itself has played out.
/// Returns the tile the unit left.
pub fn finalize_unit_movement(
    battlefield: &mut Battlefield,
    unit_id: UnitId,
    destination: TileCoord,
) -> Result<TileCoord> {
    let origin = battlefield.relocate_unit(unit_id, destination)?;
    tracing::debug!(unit = unit_id, from = %origin, to = %destination, "Movement finalized");
    Ok(origin)
}
