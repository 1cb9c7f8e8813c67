//! # Tactics Core
//!
//! Turn-based tactical grid battle core.
//!
//! This crate contains **only** battle logic:
//! - No rendering
//! - No IO
//! - No system randomness (every draw comes from the match seed)
//!
//! A presentation layer drives a [`game::Match`] with commands and elapsed
//! time, and renders the [`events::BattleEvent`]s it emits.
//!
//! ## Crate Structure
//!
//! - [`grid`] - Tiles, identifiers, positions and neighbors
//! - [`obstacles`] - Connectivity-preserving obstacle generation
//! - [`query`] - Movement, attack and path queries
//! - [`turn`] - Phases, active side and end-turn rules
//! - [`orchestrator`] - Easy and Hard AI turns
//! - [`game`] - The match facade tying everything together

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod actions;
pub mod battlefield;
pub mod combat;
pub mod config;
pub mod error;
pub mod events;
pub mod game;
pub mod grid;
pub mod math;
pub mod movement;
pub mod obstacles;
pub mod orchestrator;
pub mod placement;
pub mod query;
pub mod schedule;
pub mod turn;
pub mod units;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::actions::{AttackReport, BattleContext};
    pub use crate::battlefield::Battlefield;
    pub use crate::combat::{AttackOutcome, CounterAttack};
    pub use crate::config::{MatchConfig, PacingConfig};
    pub use crate::error::{GameError, Result};
    pub use crate::events::{BattleEvent, EventLog};
    pub use crate::game::{Match, PendingAction, Selection};
    pub use crate::grid::{Grid, GridConfig, Tile, TileCoord};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::movement::{MoveTicket, MovementLock};
    pub use crate::obstacles::{generate_obstacles, ObstacleReport};
    pub use crate::orchestrator::{AiDirective, AiLevel, AiStep, Orchestrator};
    pub use crate::placement::PlacementPlan;
    pub use crate::query::{attack_tiles, finalize_unit_movement, movement_tiles, path_to_tile};
    pub use crate::turn::{EndTurnCheck, Phase, TurnState};
    pub use crate::units::{ActionState, Side, Unit, UnitId, UnitKind, UnitStats};
}
