//! Player-side autopilot.
//!
//! Plays the human side of a match so the AI can be exercised without a
//! presentation layer. The autopilot only issues the commands a human could
//! issue through [`Match`], one per call to [`Autopilot::act`].

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use tactics_core::error::Result;
use tactics_core::game::Match;
use tactics_core::grid::TileCoord;
use tactics_core::movement::MoveTicket;
use tactics_core::orchestrator::approach_tile;
use tactics_core::turn::Phase;
use tactics_core::units::{Side, UnitId, UnitKind};

/// Mixed into the match seed so the autopilot never shares a stream with it.
const AUTOPILOT_SEED_SALT: u64 = 0x5EED_A070_B11D;

/// Player policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AutopilotKind {
    /// Places near the centre, focuses the weakest target, closes in.
    #[default]
    Aggressive,
    /// Places and moves at random, attacks whenever something is in range.
    Wanderer,
}

/// One command the autopilot issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerAction {
    /// A unit was placed.
    Placed {
        /// Kind placed.
        kind: UnitKind,
        /// Where.
        tile: TileCoord,
    },
    /// A move started; complete the ticket before the next command.
    Moved {
        /// Moving unit.
        unit: UnitId,
        /// Outstanding move.
        ticket: MoveTicket,
    },
    /// An attack was made.
    Attacked {
        /// Attacker.
        unit: UnitId,
        /// Target tile.
        target: TileCoord,
    },
    /// The turn was handed over.
    EndedTurn,
}

/// Stateful player controller.
#[derive(Debug, Clone)]
pub struct Autopilot {
    kind: AutopilotKind,
    rng: ChaCha8Rng,
}

impl Autopilot {
    /// Create an autopilot for a match seeded with `seed`.
    #[must_use]
    pub fn new(kind: AutopilotKind, seed: u64) -> Self {
        Self {
            kind,
            rng: ChaCha8Rng::seed_from_u64(seed ^ AUTOPILOT_SEED_SALT),
        }
    }

    /// Policy in use.
    #[must_use]
    pub const fn kind(&self) -> AutopilotKind {
        self.kind
    }

    /// Issue one command. `None` means the player has nothing left to do.
    pub fn act(&mut self, game: &mut Match) -> Result<Option<PlayerAction>> {
        let action = match game.phase() {
            Phase::Placement => self.place(game)?,
            Phase::Battle => self.fight(game)?,
            Phase::GameOver { .. } => None,
        };
        if let Some(action) = &action {
            debug!(policy = ?self.kind, ?action, "Autopilot command");
        }
        Ok(action)
    }

    fn place(&mut self, game: &mut Match) -> Result<Option<PlayerAction>> {
        let Some(kind) = game.player_plan().next_kind() else {
            return Ok(None);
        };
        let free: Vec<TileCoord> = game.battlefield().grid().free_tiles().collect();
        if free.is_empty() {
            return Ok(None);
        }
        let tile = match self.kind {
            AutopilotKind::Aggressive => {
                let grid = game.battlefield().grid();
                let centre = TileCoord::new(grid.width() / 2, grid.height() / 2);
                // min_by_key keeps the first of equal keys, so ties go to reading order.
                free.iter()
                    .copied()
                    .min_by_key(|t| t.manhattan(centre))
                    .unwrap_or(free[0])
            }
            AutopilotKind::Wanderer => free[self.rng.gen_range(0..free.len())],
        };
        game.place_player_unit(kind, tile)?;
        Ok(Some(PlayerAction::Placed { kind, tile }))
    }

    fn fight(&mut self, game: &mut Match) -> Result<Option<PlayerAction>> {
        let roster = game.battlefield().roster(Side::Player).to_vec();
        for unit in roster {
            let selection = game.select_unit(unit)?;
            if let Some(target) = self.pick_target(game, &selection.attack) {
                game.player_attack(unit, target)?;
                return Ok(Some(PlayerAction::Attacked { unit, target }));
            }
            if let Some(destination) = self.pick_destination(game, unit, &selection.movement) {
                let ticket = game.player_move(unit, destination)?;
                return Ok(Some(PlayerAction::Moved { unit, ticket }));
            }
        }
        if game.turn_state().end_turn_available() {
            game.player_end_turn()?;
            return Ok(Some(PlayerAction::EndedTurn));
        }
        Ok(None)
    }

    fn pick_target(&mut self, game: &Match, targets: &[TileCoord]) -> Option<TileCoord> {
        match self.kind {
            AutopilotKind::Aggressive => targets.iter().copied().min_by_key(|&tile| {
                game.battlefield()
                    .unit_at(tile)
                    .map_or(u32::MAX, |u| u.health())
            }),
            AutopilotKind::Wanderer => {
                if targets.is_empty() {
                    None
                } else {
                    Some(targets[self.rng.gen_range(0..targets.len())])
                }
            }
        }
    }

    fn pick_destination(
        &mut self,
        game: &Match,
        unit: UnitId,
        reachable: &[TileCoord],
    ) -> Option<TileCoord> {
        if reachable.is_empty() {
            return None;
        }
        match self.kind {
            AutopilotKind::Aggressive => {
                approach_tile(game.battlefield(), unit).or_else(|| reachable.first().copied())
            }
            AutopilotKind::Wanderer => Some(reachable[self.rng.gen_range(0..reachable.len())]),
        }
    }
}
