//! Units, sides and per-turn action state.
//!
//! Unit kinds differ only in their [`UnitStats`]; there is a single [`Unit`]
//! record for every kind.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::grid::TileCoord;

/// Unique identifier for a unit within one match.
pub type UnitId = u32;

/// Which side a unit fights for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    /// The human (or autopilot) side.
    Player,
    /// The computer opponent.
    Ai,
}

impl Side {
    /// Both sides, player first.
    pub const ALL: [Self; 2] = [Self::Player, Self::Ai];

    /// The other side.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Player => Self::Ai,
            Self::Ai => Self::Player,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player => write!(f, "Player"),
            Self::Ai => write!(f, "AI"),
        }
    }
}

/// Combat statistics of a unit kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStats {
    /// Maximum BFS steps per move.
    pub movement_range: u32,
    /// Attack reach in tiles (multiplied by the grid pitch).
    pub attack_range: u32,
    /// Minimum damage per hit.
    pub min_damage: u32,
    /// Maximum damage per hit.
    pub max_damage: u32,
    /// Starting and maximum health.
    pub max_health: u32,
    /// Ranged units shoot over obstacles and provoke counter-attacks.
    pub ranged: bool,
}

impl UnitStats {
    /// Long-range, fragile shooter.
    pub const SNIPER: Self = Self {
        movement_range: 3,
        attack_range: 10,
        min_damage: 4,
        max_damage: 8,
        max_health: 20,
        ranged: true,
    };

    /// Mobile, sturdy melee fighter.
    pub const BRAWLER: Self = Self {
        movement_range: 6,
        attack_range: 1,
        min_damage: 1,
        max_damage: 6,
        max_health: 40,
        ranged: false,
    };
}

/// Unit kind, used as a display label and to pick stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitKind {
    /// Ranged unit.
    Sniper,
    /// Melee unit.
    Brawler,
}

impl UnitKind {
    /// Default stats for this kind.
    #[must_use]
    pub const fn stats(self) -> UnitStats {
        match self {
            Self::Sniper => UnitStats::SNIPER,
            Self::Brawler => UnitStats::BRAWLER,
        }
    }

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sniper => "Sniper",
            Self::Brawler => "Brawler",
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a unit has done during the current turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ActionState {
    /// Nothing yet.
    #[default]
    Idle,
    /// Moved, may still attack.
    Moved,
    /// Attacked; done for the turn.
    Attacked,
    /// Moved and attacked; done for the turn.
    MoveAttack,
}

impl ActionState {
    /// The unit may still move or attack.
    #[must_use]
    pub const fn can_act(self) -> bool {
        matches!(self, Self::Idle | Self::Moved)
    }

    /// The unit may still move.
    #[must_use]
    pub const fn can_move(self) -> bool {
        matches!(self, Self::Idle)
    }

    /// The unit may still attack.
    #[must_use]
    pub const fn can_attack(self) -> bool {
        self.can_act()
    }

    /// State after a completed move.
    #[must_use]
    pub const fn after_move(self) -> Self {
        match self {
            Self::Idle | Self::Moved => Self::Moved,
            Self::Attacked | Self::MoveAttack => Self::MoveAttack,
        }
    }

    /// State after an attack.
    #[must_use]
    pub const fn after_attack(self) -> Self {
        match self {
            Self::Idle | Self::Attacked => Self::Attacked,
            Self::Moved | Self::MoveAttack => Self::MoveAttack,
        }
    }

    /// Attacked this turn, with or without moving.
    #[must_use]
    pub const fn has_attacked(self) -> bool {
        matches!(self, Self::Attacked | Self::MoveAttack)
    }
}

/// A unit on the battlefield.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    id: UnitId,
    side: Side,
    kind: UnitKind,
    stats: UnitStats,
    tile: Option<TileCoord>,
    health: u32,
    action: ActionState,
}

impl Unit {
    /// Create a unit with the default stats of its kind.
    #[must_use]
    pub const fn new(id: UnitId, side: Side, kind: UnitKind) -> Self {
        Self::with_stats(id, side, kind, kind.stats())
    }

    /// Create a unit with custom stats.
    #[must_use]
    pub const fn with_stats(id: UnitId, side: Side, kind: UnitKind, stats: UnitStats) -> Self {
        Self {
            id,
            side,
            kind,
            stats,
            tile: None,
            health: stats.max_health,
            action: ActionState::Idle,
        }
    }

    /// Unit id.
    #[must_use]
    pub const fn id(&self) -> UnitId {
        self.id
    }

    /// Owning side.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Kind label.
    #[must_use]
    pub const fn kind(&self) -> UnitKind {
        self.kind
    }

    /// Combat stats.
    #[must_use]
    pub const fn stats(&self) -> &UnitStats {
        &self.stats
    }

    /// Tile the unit stands on.
    #[must_use]
    pub const fn tile(&self) -> Option<TileCoord> {
        self.tile
    }

    pub(crate) fn set_tile(&mut self, tile: Option<TileCoord>) {
        self.tile = tile;
    }

    /// Current health.
    #[must_use]
    pub const fn health(&self) -> u32 {
        self.health
    }

    /// Health as a fraction of maximum, in `[0, 1]`.
    #[must_use]
    pub fn health_percent(&self) -> f32 {
        if self.stats.max_health == 0 {
            return 0.0;
        }
        self.health as f32 / self.stats.max_health as f32
    }

    /// Health has reached zero.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.health == 0
    }

    /// Subtract damage, saturating at zero. Returns the remaining health.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        self.health = self.health.saturating_sub(amount);
        self.health
    }

    /// Action state for the current turn.
    #[must_use]
    pub const fn action(&self) -> ActionState {
        self.action
    }

    pub(crate) fn set_action(&mut self, action: ActionState) {
        self.action = action;
    }

    /// Whether `other` fights for the opposing side.
    #[must_use]
    pub fn is_enemy_of(&self, other: &Self) -> bool {
        self.side != other.side
    }
}
