//! Turn state machine.
//!
//! A match goes through three phases:
//!
//! 1. **Placement**: sides alternate placing one unit each until both
//!    rosters hold [`TurnState::units_per_side`] units.
//! 2. **Battle**: sides alternate turns. Every unit may move once and attack
//!    once per turn.
//! 3. **GameOver**: one roster is empty.
//!
//! The state machine decides what happens at turn entry and when the player
//! side's turn may end. It does not schedule anything itself; the
//! [`Match`](crate::game::Match) acts on the values it returns.

use serde::{Deserialize, Serialize};

use crate::battlefield::Battlefield;
use crate::error::{GameError, Result};
use crate::units::{ActionState, Side, UnitId};

/// Units each side places before the battle starts.
pub const DEFAULT_UNITS_PER_SIDE: usize = 2;

/// Match phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Sides take turns placing units.
    Placement,
    /// Sides take turns acting with their units.
    Battle,
    /// A roster is empty.
    GameOver {
        /// The side with units left.
        winner: Side,
    },
}

impl Phase {
    /// Short name, used in error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Placement => "placement",
            Self::Battle => "battle",
            Self::GameOver { .. } => "game over",
        }
    }
}

/// What should happen when a turn begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnEntry {
    /// Wait for the player to place a unit.
    AwaitPlayerPlacement,
    /// Place an AI unit after the placement delay.
    ScheduleAiPlacement,
    /// Accept player commands.
    UnlockPlayerInput,
    /// Hand control to the AI orchestrator.
    BeginAiTurn,
    /// The match is over.
    Finished,
}

/// Verdict of the player end-turn check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndTurnCheck {
    /// A player unit is still idle.
    Blocked,
    /// No idle units, but some only moved; the player may end the turn.
    EndTurnAvailable,
    /// Every unit attacked; the turn ends now.
    AutoEnd,
    /// AI units are not gated.
    NotChecked,
}

/// Result of registering a placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementProgress {
    /// Another placement turn, for `next`.
    Continue {
        /// Side placing next.
        next: Side,
    },
    /// Both rosters are full; the battle starts with `first`.
    BattleBegins {
        /// Side taking the first battle turn.
        first: Side,
    },
}

/// Active side, phase and turn counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnState {
    phase: Phase,
    active: Side,
    starting_side: Side,
    turn: u32,
    end_turn_available: bool,
    units_per_side: usize,
}

impl TurnState {
    /// Placement phase with `starting_side` to act first.
    #[must_use]
    pub const fn new(starting_side: Side, units_per_side: usize) -> Self {
        Self {
            phase: Phase::Placement,
            active: starting_side,
            starting_side,
            turn: 0,
            end_turn_available: false,
            units_per_side,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Side whose turn it is.
    #[must_use]
    pub const fn active(&self) -> Side {
        self.active
    }

    /// Side that placed first and acts first in battle.
    #[must_use]
    pub const fn starting_side(&self) -> Side {
        self.starting_side
    }

    /// Battle turns completed so far.
    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    /// The player may end the turn by choice.
    #[must_use]
    pub const fn end_turn_available(&self) -> bool {
        self.end_turn_available
    }

    /// Roster size at which placement ends.
    #[must_use]
    pub const fn units_per_side(&self) -> usize {
        self.units_per_side
    }

    /// Winner, once the match is over.
    #[must_use]
    pub const fn winner(&self) -> Option<Side> {
        match self.phase {
            Phase::GameOver { winner } => Some(winner),
            _ => None,
        }
    }

    /// Entry action for the current phase and side.
    #[must_use]
    pub fn start_turn(&self) -> TurnEntry {
        let entry = match (self.phase, self.active) {
            (Phase::Placement, Side::Player) => TurnEntry::AwaitPlayerPlacement,
            (Phase::Placement, Side::Ai) => TurnEntry::ScheduleAiPlacement,
            (Phase::Battle, Side::Player) => TurnEntry::UnlockPlayerInput,
            (Phase::Battle, Side::Ai) => TurnEntry::BeginAiTurn,
            (Phase::GameOver { .. }, _) => TurnEntry::Finished,
        };
        tracing::info!(phase = self.phase.name(), side = %self.active, turn = self.turn, "Turn started");
        entry
    }

    /// Finish the active side's turn.
    ///
    /// Resets the finishing side's units to idle and hands the turn to the
    /// other side. Returns the new active side.
    pub fn end_turn(&mut self, battlefield: &mut Battlefield) -> Side {
        battlefield.reset_actions(self.active);
        let finished = self.active;
        self.active = finished.opponent();
        self.turn += 1;
        self.end_turn_available = false;
        tracing::info!(finished = %finished, next = %self.active, turn = self.turn, "Turn ended");
        self.active
    }

    /// Record a completed move.
    pub fn register_move(&mut self, battlefield: &mut Battlefield, unit: UnitId) -> Result<EndTurnCheck> {
        self.register_action(battlefield, unit, ActionState::after_move)
    }

    /// Record an attack.
    pub fn register_attack(&mut self, battlefield: &mut Battlefield, unit: UnitId) -> Result<EndTurnCheck> {
        self.register_action(battlefield, unit, ActionState::after_attack)
    }

    fn register_action(
        &mut self,
        battlefield: &mut Battlefield,
        unit: UnitId,
        next: fn(ActionState) -> ActionState,
    ) -> Result<EndTurnCheck> {
        let current = battlefield.unit(unit).ok_or(GameError::UnitNotFound(unit))?;
        let side = current.side();
        let action = next(current.action());
        battlefield.set_action(unit, action);
        tracing::debug!(unit, %side, ?action, "Action registered");

        if side == Side::Player {
            Ok(self.check_player_end_turn(battlefield))
        } else {
            Ok(EndTurnCheck::NotChecked)
        }
    }

    /// Decide whether the player's turn can or must end.
    ///
    /// Records [`EndTurnCheck::EndTurnAvailable`] so that
    /// [`take_end_turn`](Self::take_end_turn) will accept the request.
    pub fn check_player_end_turn(&mut self, battlefield: &Battlefield) -> EndTurnCheck {
        let mut moved = false;
        for unit in battlefield.roster_units(Side::Player) {
            match unit.action() {
                ActionState::Idle => return EndTurnCheck::Blocked,
                ActionState::Moved => moved = true,
                ActionState::Attacked | ActionState::MoveAttack => {}
            }
        }
        if moved {
            self.end_turn_available = true;
            EndTurnCheck::EndTurnAvailable
        } else {
            EndTurnCheck::AutoEnd
        }
    }

    /// Consume the player's end-turn option.
    pub fn take_end_turn(&mut self) -> Result<()> {
        if self.phase != Phase::Battle || self.active != Side::Player || !self.end_turn_available {
            return Err(GameError::EndTurnUnavailable);
        }
        self.end_turn_available = false;
        Ok(())
    }

    /// Advance placement after a unit has been added to a roster.
    ///
    /// When both rosters reach the threshold the battle begins with the
    /// starting side. Otherwise the turn goes to the other side, unless that
    /// side has already placed all its units.
    pub fn register_placement(&mut self, battlefield: &Battlefield) -> PlacementProgress {
        let threshold = self.units_per_side;
        let full = |side: Side| battlefield.roster(side).len() >= threshold;
        if full(Side::Player) && full(Side::Ai) {
            self.phase = Phase::Battle;
            self.active = self.starting_side;
            tracing::info!(first = %self.active, "Placement complete, battle begins");
            return PlacementProgress::BattleBegins { first: self.active };
        }

        let opponent = self.active.opponent();
        if !full(opponent) {
            self.active = opponent;
        }
        PlacementProgress::Continue { next: self.active }
    }

    /// End the match.
    pub fn declare_game_over(&mut self, winner: Side) {
        self.phase = Phase::GameOver { winner };
        self.end_turn_available = false;
        tracing::info!(%winner, turn = self.turn, "Game over");
    }

    /// Fail unless the match is in `phase`.
    pub fn ensure_phase(&self, phase: Phase) -> Result<()> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(GameError::WrongPhase(self.phase.name()))
        }
    }

    /// Fail unless `side` is active.
    pub fn ensure_active(&self, side: Side) -> Result<()> {
        if self.active == side {
            Ok(())
        } else {
            Err(GameError::NotYourTurn(side))
        }
    }
}
