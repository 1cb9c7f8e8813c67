//! Battlefield state: the grid, every live unit and the two rosters.
//!
//! The battlefield keeps tile occupancy and unit positions in step. All
//! relocations go through [`Battlefield::relocate_unit`] and all removals
//! through [`Battlefield::remove_unit`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::grid::{Grid, TileCoord};
use crate::units::{ActionState, Side, Unit, UnitId, UnitKind, UnitStats};

/// Grid plus units, keyed by id, and per-side rosters in placement order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Battlefield {
    grid: Grid,
    units: BTreeMap<UnitId, Unit>,
    player_roster: Vec<UnitId>,
    ai_roster: Vec<UnitId>,
    next_id: UnitId,
}

impl Battlefield {
    /// Battlefield over an existing grid, with no units.
    #[must_use]
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            units: BTreeMap::new(),
            player_roster: Vec::new(),
            ai_roster: Vec::new(),
            next_id: 1,
        }
    }

    /// The grid.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Mutable grid access, for obstacle generation and fixtures.
    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    /// Live unit by id.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    pub(crate) fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    /// All live units in id order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// Number of live units.
    #[must_use]
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Live unit ids of one side, in placement order.
    #[must_use]
    pub fn roster(&self, side: Side) -> &[UnitId] {
        match side {
            Side::Player => &self.player_roster,
            Side::Ai => &self.ai_roster,
        }
    }

    fn roster_mut(&mut self, side: Side) -> &mut Vec<UnitId> {
        match side {
            Side::Player => &mut self.player_roster,
            Side::Ai => &mut self.ai_roster,
        }
    }

    /// Live units of one side, in placement order.
    pub fn roster_units(&self, side: Side) -> impl Iterator<Item = &Unit> {
        self.roster(side).iter().filter_map(|id| self.units.get(id))
    }

    /// Unit standing on `coord`, if any.
    #[must_use]
    pub fn unit_at(&self, coord: TileCoord) -> Option<&Unit> {
        if !self.grid.is_occupied(coord) {
            return None;
        }
        self.units.values().find(|u| u.tile() == Some(coord))
    }

    /// Place a new unit of `kind` with its default stats.
    pub fn place_unit(&mut self, side: Side, kind: UnitKind, coord: TileCoord) -> Result<UnitId> {
        self.place_unit_with_stats(side, kind, kind.stats(), coord)
    }

    /// Place a new unit with explicit stats.
    ///
    /// The tile must exist and be neither obstacle nor occupied. The unit is
    /// appended to its side's roster.
    pub fn place_unit_with_stats(
        &mut self,
        side: Side,
        kind: UnitKind,
        stats: UnitStats,
        coord: TileCoord,
    ) -> Result<UnitId> {
        let tile = self
            .grid
            .tile(coord)
            .ok_or(GameError::out_of_bounds(coord))?;
        if !tile.is_free() {
            return Err(GameError::TileUnavailable(coord.identifier()));
        }

        let id = self.next_id;
        self.next_id += 1;

        let mut unit = Unit::with_stats(id, side, kind, stats);
        unit.set_tile(Some(coord));
        self.units.insert(id, unit);
        self.grid.set_occupied(coord, true);
        self.roster_mut(side).push(id);

        tracing::debug!(unit = id, %side, %kind, tile = %coord, "Unit placed");
        Ok(id)
    }

    /// Move a unit to `destination`, keeping occupancy consistent.
    ///
    /// Returns the tile the unit left.
    pub(crate) fn relocate_unit(&mut self, id: UnitId, destination: TileCoord) -> Result<TileCoord> {
        let unit = self.units.get(&id).ok_or(GameError::UnitNotFound(id))?;
        let origin = unit.tile().ok_or(GameError::UnitNotOnGrid(id))?;
        let tile = self
            .grid
            .tile(destination)
            .ok_or(GameError::out_of_bounds(destination))?;
        if !tile.is_free() {
            return Err(GameError::TileUnavailable(destination.identifier()));
        }

        self.grid.set_occupied(origin, false);
        self.grid.set_occupied(destination, true);
        if let Some(unit) = self.units.get_mut(&id) {
            unit.set_tile(Some(destination));
        }
        Ok(origin)
    }

    /// Remove a unit: free its tile and drop it from its roster.
    ///
    /// Returns `None` if the unit was already gone, so a unit can only be
    /// removed once.
    pub fn remove_unit(&mut self, id: UnitId) -> Option<Unit> {
        let mut unit = self.units.remove(&id)?;
        if let Some(tile) = unit.tile() {
            self.grid.set_occupied(tile, false);
        }
        unit.set_tile(None);
        self.roster_mut(unit.side()).retain(|&r| r != id);
        tracing::debug!(unit = id, side = %unit.side(), "Unit removed");
        Some(unit)
    }

    /// Set a unit's action state. Returns `false` for an unknown unit.
    pub(crate) fn set_action(&mut self, id: UnitId, action: ActionState) -> bool {
        match self.units.get_mut(&id) {
            Some(unit) => {
                unit.set_action(action);
                true
            }
            None => false,
        }
    }

    /// Reset every unit of `side` to [`ActionState::Idle`].
    pub(crate) fn reset_actions(&mut self, side: Side) {
        for unit in self.units.values_mut().filter(|u| u.side() == side) {
            unit.set_action(ActionState::Idle);
        }
    }

    /// Whether a side has no live units left.
    #[must_use]
    pub fn is_defeated(&self, side: Side) -> bool {
        self.roster(side).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridConfig;

    fn open_battlefield(width: u32, height: u32) -> Battlefield {
        let mut grid = Grid::generate(GridConfig::default().with_size(width, height));
        for row in 0..height {
            for column in 0..width {
                grid.set_obstacle(TileCoord::new(column, row), false);
            }
        }
        Battlefield::new(grid)
    }

    #[test]
    fn test_place_marks_occupied() {
        let mut bf = open_battlefield(4, 4);
        let c = TileCoord::new(1, 2);
        let id = bf.place_unit(Side::Player, UnitKind::Sniper, c).unwrap();
        assert!(bf.grid().is_occupied(c));
        assert_eq!(bf.unit_at(c).map(Unit::id), Some(id));
        assert_eq!(bf.roster(Side::Player), &[id]);
        assert!(bf.roster(Side::Ai).is_empty());
    }

    #[test]
    fn test_place_rejects_taken_tiles() {
        let mut bf = open_battlefield(3, 3);
        let c = TileCoord::new(0, 0);
        bf.place_unit(Side::Player, UnitKind::Sniper, c).unwrap();
        assert_eq!(
            bf.place_unit(Side::Ai, UnitKind::Brawler, c),
            Err(GameError::TileUnavailable("A1".to_string()))
        );
        bf.grid_mut().set_obstacle(TileCoord::new(1, 0), true);
        assert!(bf
            .place_unit(Side::Ai, UnitKind::Brawler, TileCoord::new(1, 0))
            .is_err());
        assert_eq!(
            bf.place_unit(Side::Ai, UnitKind::Brawler, TileCoord::new(9, 0)),
            Err(GameError::TileOutOfBounds { column: 9, row: 0 })
        );
        assert_eq!(bf.unit_count(), 1);
    }

    #[test]
    fn test_relocate_moves_occupancy() {
        let mut bf = open_battlefield(3, 3);
        let from = TileCoord::new(0, 0);
        let to = TileCoord::new(2, 2);
        let id = bf.place_unit(Side::Ai, UnitKind::Brawler, from).unwrap();
        assert_eq!(bf.relocate_unit(id, to), Ok(from));
        assert!(!bf.grid().is_occupied(from));
        assert!(bf.grid().is_occupied(to));
        assert_eq!(bf.unit(id).and_then(Unit::tile), Some(to));
    }

    #[test]
    fn test_remove_exactly_once() {
        let mut bf = open_battlefield(3, 3);
        let c = TileCoord::new(1, 1);
        let id = bf.place_unit(Side::Ai, UnitKind::Sniper, c).unwrap();
        assert!(bf.remove_unit(id).is_some());
        assert!(!bf.grid().is_occupied(c));
        assert!(bf.is_defeated(Side::Ai));
        assert!(bf.remove_unit(id).is_none());
    }

    #[test]
    fn test_reset_actions_only_touches_one_side() {
        let mut bf = open_battlefield(3, 3);
        let a = bf
            .place_unit(Side::Player, UnitKind::Sniper, TileCoord::new(0, 0))
            .unwrap();
        let b = bf
            .place_unit(Side::Ai, UnitKind::Sniper, TileCoord::new(2, 2))
            .unwrap();
        bf.set_action(a, ActionState::Attacked);
        bf.set_action(b, ActionState::Moved);
        bf.reset_actions(Side::Player);
        assert_eq!(bf.unit(a).map(Unit::action), Some(ActionState::Idle));
        assert_eq!(bf.unit(b).map(Unit::action), Some(ActionState::Moved));
    }
}
