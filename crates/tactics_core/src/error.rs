//! Error types for the battle core.
//!
//! Commands (placing, moving, attacking, ending a turn) return [`Result`] and
//! are validated before anything is mutated. Queries never fail: they return
//! empty results and log a warning instead.

use thiserror::Error;

use crate::grid::TileCoord;
use crate::units::{Side, UnitId, UnitKind};

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all battle core errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// No unit with this identifier is alive.
    #[error("Unit not found: {0}")]
    UnitNotFound(UnitId),

    /// The unit exists but does not stand on any tile.
    #[error("Unit {0} is not on the grid")]
    UnitNotOnGrid(UnitId),

    /// Coordinates outside the grid.
    #[error("Tile ({column}, {row}) is outside the grid")]
    TileOutOfBounds {
        /// Column of the rejected tile.
        column: u32,
        /// Row of the rejected tile.
        row: u32,
    },

    /// No tile carries this identifier.
    #[error("Unknown tile identifier: {0}")]
    UnknownTile(String),

    /// The tile is an obstacle or already occupied.
    #[error("Tile {0} is not available")]
    TileUnavailable(String),

    /// The action does not belong to the current phase.
    #[error("Action not allowed during {0}")]
    WrongPhase(&'static str),

    /// The acting unit belongs to the side that is not active.
    #[error("It is not {0}'s turn")]
    NotYourTurn(Side),

    /// The unit already spent the actions this request needs.
    #[error("Unit {0} cannot perform this action anymore this turn")]
    UnitExhausted(UnitId),

    /// The destination is not among the unit's reachable tiles.
    #[error("Tile {0} is outside the unit's movement range")]
    OutOfMovementRange(String),

    /// The target is not among the unit's attackable tiles.
    #[error("Tile {0} is outside the unit's attack range")]
    TargetOutOfRange(String),

    /// Another unit is still moving.
    #[error("Unit {0} is still moving")]
    MovementInProgress(UnitId),

    /// The movement ticket does not match the unit currently moving.
    #[error("No movement in progress for this ticket")]
    StaleMoveTicket,

    /// No path connects the unit to the destination.
    #[error("No path from the unit's tile to {0}")]
    NoPath(String),

    /// The side has no placement left for this unit kind.
    #[error("{side} cannot place another {kind}")]
    PlacementKindUnavailable {
        /// Side attempting the placement.
        side: Side,
        /// Unit kind requested.
        kind: UnitKind,
    },

    /// The player asked to end the turn while units are still idle.
    #[error("Turn cannot end yet")]
    EndTurnUnavailable,

    /// The match configuration cannot produce a playable match.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl GameError {
    /// Convenience constructor for out-of-bounds coordinates.
    #[must_use]
    pub const fn out_of_bounds(coord: TileCoord) -> Self {
        Self::TileOutOfBounds {
            column: coord.column,
            row: coord.row,
        }
    }
}
