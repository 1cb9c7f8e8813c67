//! Match configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::grid::GridConfig;
use crate::obstacles::{MAX_OBSTACLE_FRACTION, MIN_OBSTACLE_FRACTION};
use crate::orchestrator::AiLevel;
use crate::placement::DEFAULT_PLAN;
use crate::turn::DEFAULT_UNITS_PER_SIDE;
use crate::units::{Side, UnitKind};

/// Cosmetic delays, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Pause between AI steps.
    pub step_delay_ms: u64,
    /// Pause between the end of a turn and the start of the next.
    pub turn_start_delay_ms: u64,
    /// Pause before the AI places a unit.
    pub placement_delay_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            step_delay_ms: 3000,
            turn_start_delay_ms: 1000,
            placement_delay_ms: 3000,
        }
    }
}

impl PacingConfig {
    /// No delays at all.
    #[must_use]
    pub const fn instant() -> Self {
        Self {
            step_delay_ms: 0,
            turn_start_delay_ms: 0,
            placement_delay_ms: 0,
        }
    }

    /// Pause between AI steps.
    #[must_use]
    pub const fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    /// Pause before a new turn starts.
    #[must_use]
    pub const fn turn_start_delay(&self) -> Duration {
        Duration::from_millis(self.turn_start_delay_ms)
    }

    /// Pause before an AI placement.
    #[must_use]
    pub const fn placement_delay(&self) -> Duration {
        Duration::from_millis(self.placement_delay_ms)
    }
}

/// Everything needed to set up a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Grid dimensions.
    pub grid: GridConfig,
    /// Fixed obstacle fraction; drawn at random when `None`.
    pub obstacle_fraction: Option<f32>,
    /// Seed for every random decision in the match.
    pub seed: u64,
    /// AI difficulty.
    pub ai_level: AiLevel,
    /// Side acting first; decided by a coin flip when `None`.
    pub starting_side: Option<Side>,
    /// Units each side places before battle.
    pub units_per_side: usize,
    /// Kinds the player may place.
    pub player_plan: Vec<UnitKind>,
    /// Kinds the AI places, in order.
    pub ai_plan: Vec<UnitKind>,
    /// Cosmetic delays.
    pub pacing: PacingConfig,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            obstacle_fraction: None,
            seed: 0,
            ai_level: AiLevel::Hard,
            starting_side: None,
            units_per_side: DEFAULT_UNITS_PER_SIDE,
            player_plan: DEFAULT_PLAN.to_vec(),
            ai_plan: DEFAULT_PLAN.to_vec(),
            pacing: PacingConfig::default(),
        }
    }
}

impl MatchConfig {
    /// Set the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the AI difficulty.
    pub fn with_ai_level(mut self, level: AiLevel) -> Self {
        self.ai_level = level;
        self
    }

    /// Set the pacing.
    pub fn with_pacing(mut self, pacing: PacingConfig) -> Self {
        self.pacing = pacing;
        self
    }

    /// Set the grid.
    pub fn with_grid(mut self, grid: GridConfig) -> Self {
        self.grid = grid;
        self
    }

    /// Fix the obstacle fraction.
    pub fn with_obstacle_fraction(mut self, fraction: f32) -> Self {
        self.obstacle_fraction = Some(fraction);
        self
    }

    /// Fix the starting side.
    pub fn with_starting_side(mut self, side: Side) -> Self {
        self.starting_side = Some(side);
        self
    }

    /// Check that the configuration can produce a playable match.
    pub fn validate(&self) -> Result<()> {
        if self.grid.tile_count() == 0 {
            return Err(GameError::InvalidConfig("grid has no tiles".into()));
        }
        if self.grid.cell_size == 0 {
            return Err(GameError::InvalidConfig("cell size must be positive".into()));
        }
        if self.units_per_side == 0 {
            return Err(GameError::InvalidConfig("units per side must be positive".into()));
        }
        if self.player_plan.len() < self.units_per_side || self.ai_plan.len() < self.units_per_side {
            return Err(GameError::InvalidConfig(format!(
                "placement plans must list at least {} units",
                self.units_per_side
            )));
        }
        if let Some(fraction) = self.obstacle_fraction {
            if !(MIN_OBSTACLE_FRACTION..=MAX_OBSTACLE_FRACTION).contains(&fraction) {
                return Err(GameError::InvalidConfig(format!(
                    "obstacle fraction {fraction} outside [{MIN_OBSTACLE_FRACTION}, {MAX_OBSTACLE_FRACTION}]"
                )));
            }
        }
        Ok(())
    }
}
