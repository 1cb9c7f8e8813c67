//! Placement plans and automated AI placement.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::grid::{Grid, TileCoord};
use crate::units::UnitKind;

/// Default placement order for both sides.
pub const DEFAULT_PLAN: [UnitKind; 2] = [UnitKind::Sniper, UnitKind::Brawler];

/// Unit kinds a side still has to place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementPlan {
    remaining: Vec<UnitKind>,
}

impl PlacementPlan {
    /// Plan placing `kinds` in order.
    #[must_use]
    pub fn new(kinds: impl Into<Vec<UnitKind>>) -> Self {
        Self {
            remaining: kinds.into(),
        }
    }

    /// Kinds not yet placed, in plan order.
    #[must_use]
    pub fn remaining(&self) -> &[UnitKind] {
        &self.remaining
    }

    /// Whether `kind` is still available.
    #[must_use]
    pub fn can_place(&self, kind: UnitKind) -> bool {
        self.remaining.contains(&kind)
    }

    /// Next kind in plan order.
    #[must_use]
    pub fn next_kind(&self) -> Option<UnitKind> {
        self.remaining.first().copied()
    }

    /// Consume one `kind`. Returns `false` if none was left.
    pub fn take(&mut self, kind: UnitKind) -> bool {
        match self.remaining.iter().position(|&k| k == kind) {
            Some(i) => {
                self.remaining.remove(i);
                true
            }
            None => false,
        }
    }

    /// Nothing left to place.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.remaining.is_empty()
    }
}

impl Default for PlacementPlan {
    fn default() -> Self {
        Self::new(DEFAULT_PLAN)
    }
}

/// Uniformly random free tile.
pub fn random_free_tile<R: Rng + ?Sized>(grid: &Grid, rng: &mut R) -> Option<TileCoord> {
    let free: Vec<TileCoord> = grid.free_tiles().collect();
    if free.is_empty() {
        return None;
    }
    Some(free[rng.gen_range(0..free.len())])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridConfig;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_plan_each_kind_once() {
        let mut plan = PlacementPlan::default();
        assert_eq!(plan.next_kind(), Some(UnitKind::Sniper));
        assert!(plan.take(UnitKind::Brawler));
        assert!(!plan.can_place(UnitKind::Brawler));
        assert!(!plan.take(UnitKind::Brawler));
        assert_eq!(plan.next_kind(), Some(UnitKind::Sniper));
        assert!(plan.take(UnitKind::Sniper));
        assert!(plan.is_exhausted());
    }

    #[test]
    fn test_random_free_tile() {
        let mut grid = Grid::generate(GridConfig::default().with_size(3, 3));
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        assert_eq!(random_free_tile(&grid, &mut rng), None);
        grid.set_obstacle(TileCoord::new(2, 1), false);
        assert_eq!(random_free_tile(&grid, &mut rng), Some(TileCoord::new(2, 1)));
        grid.set_occupied(TileCoord::new(2, 1), true);
        assert_eq!(random_free_tile(&grid, &mut rng), None);
    }
}
