//! Battle actions shared by player commands and the AI.
//!
//! [`BattleContext`] bundles mutable handles to the battlefield, the turn
//! state, the movement lock, the match RNG and the event log. Every action
//! validates first and mutates only once all checks pass.

use rand::Rng;

use crate::battlefield::Battlefield;
use crate::combat::{resolve_attack, AttackOutcome};
use crate::error::{GameError, Result};
use crate::events::{attack_line, move_line, BattleEvent, EventLog};
use crate::grid::TileCoord;
use crate::movement::{MoveTicket, MovementLock};
use crate::query::{attack_tiles, finalize_unit_movement, movement_tiles, path_to_tile};
use crate::turn::{EndTurnCheck, Phase, TurnState};
use crate::units::{Side, Unit, UnitId};

/// Mutable handles an action needs.
pub struct BattleContext<'a, R: Rng + ?Sized> {
    /// Grid, units and rosters.
    pub battlefield: &'a mut Battlefield,
    /// Turn state machine.
    pub turn: &'a mut TurnState,
    /// Global movement lock.
    pub movement: &'a mut MovementLock,
    /// Match RNG.
    pub rng: &'a mut R,
    /// Outbound events.
    pub events: &'a mut EventLog,
}

/// An attack and the end-turn verdict that followed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackReport {
    /// What the attack did.
    pub outcome: AttackOutcome,
    /// Player end-turn verdict after registering the attack.
    pub end_turn: EndTurnCheck,
}

impl<R: Rng + ?Sized> BattleContext<'_, R> {
    fn acting_unit(&self, unit_id: UnitId) -> Result<&Unit> {
        self.movement.ensure_unlocked()?;
        self.turn.ensure_phase(Phase::Battle)?;
        let unit = self
            .battlefield
            .unit(unit_id)
            .ok_or(GameError::UnitNotFound(unit_id))?;
        if unit.side() != self.turn.active() {
            return Err(GameError::NotYourTurn(unit.side()));
        }
        Ok(unit)
    }

    /// Start moving `unit_id` to `destination`.
    ///
    /// The destination must be among the unit's reachable tiles. Occupancy
    /// is not updated until [`complete_move`](Self::complete_move).
    pub fn begin_move(&mut self, unit_id: UnitId, destination: TileCoord) -> Result<MoveTicket> {
        let unit = self.acting_unit(unit_id)?;
        if !unit.action().can_move() {
            return Err(GameError::UnitExhausted(unit_id));
        }
        let (side, kind) = (unit.side(), unit.kind());
        let origin = unit.tile().ok_or(GameError::UnitNotOnGrid(unit_id))?;

        if !movement_tiles(self.battlefield, unit_id).contains(&destination) {
            return Err(GameError::OutOfMovementRange(destination.identifier()));
        }
        let path = path_to_tile(self.battlefield, unit_id, destination);
        if path.is_empty() {
            return Err(GameError::NoPath(destination.identifier()));
        }

        let ticket = self.movement.begin(unit_id, origin, path)?;
        self.events.push(BattleEvent::MovementStarted {
            unit: unit_id,
            path: ticket.path().to_vec(),
        });
        self.events
            .history_line(move_line(side, kind, origin, destination));
        tracing::debug!(unit = unit_id, from = %origin, to = %destination, "Movement started");
        Ok(ticket)
    }

    /// Finish a move: finalize occupancy and register the move.
    pub fn complete_move(&mut self, ticket: &MoveTicket) -> Result<EndTurnCheck> {
        let ticket = self.movement.complete(ticket)?;
        let unit_id = ticket.unit();
        let from = finalize_unit_movement(self.battlefield, unit_id, ticket.destination())?;
        self.events.push(BattleEvent::UnitMoved {
            unit: unit_id,
            from,
            to: ticket.destination(),
        });
        let check = self.turn.register_move(self.battlefield, unit_id)?;
        self.announce(check);
        Ok(check)
    }

    /// Attack the enemy standing on `target`.
    ///
    /// The target must be among the unit's attackable tiles. Resolves the
    /// hit, any counter-attack and deaths, and ends the match when a roster
    /// empties.
    pub fn attack(&mut self, unit_id: UnitId, target: TileCoord) -> Result<AttackReport> {
        let unit = self.acting_unit(unit_id)?;
        if !unit.action().can_attack() {
            return Err(GameError::UnitExhausted(unit_id));
        }
        let (side, kind) = (unit.side(), unit.kind());
        let origin = unit.tile().ok_or(GameError::UnitNotOnGrid(unit_id))?;
        if !attack_tiles(self.battlefield, unit_id).contains(&target) {
            return Err(GameError::TargetOutOfRange(target.identifier()));
        }
        let (defender_id, defender_side, defender_kind) = self
            .battlefield
            .unit_at(target)
            .map(|d| (d.id(), d.side(), d.kind()))
            .ok_or_else(|| GameError::TargetOutOfRange(target.identifier()))?;

        let outcome = resolve_attack(self.battlefield, unit_id, defender_id, self.rng)?;

        self.events.push(BattleEvent::AttackResolved(outcome));
        self.events
            .history_line(attack_line(side, kind, target, outcome.damage));
        self.report_health(defender_id, defender_side, outcome.defender_died);
        if let Some(counter) = outcome.counter {
            self.events
                .history_line(attack_line(defender_side, defender_kind, origin, counter.damage));
            self.report_health(unit_id, side, counter.attacker_died);
        }

        let end_turn = if self.battlefield.unit(unit_id).is_some() {
            self.turn.register_attack(self.battlefield, unit_id)?
        } else if side == Side::Player {
            self.turn.check_player_end_turn(self.battlefield)
        } else {
            EndTurnCheck::NotChecked
        };

        if let Some(winner) = outcome.winner {
            self.turn.declare_game_over(winner);
            self.movement.clear();
            self.events.push(BattleEvent::ClearHighlights);
            self.events.push(BattleEvent::GameOver { winner });
        } else {
            self.announce(end_turn);
        }

        Ok(AttackReport { outcome, end_turn })
    }

    fn report_health(&mut self, unit_id: UnitId, side: Side, died: bool) {
        if died {
            self.events.push(BattleEvent::UnitDied { unit: unit_id, side });
            return;
        }
        if let Some(unit) = self.battlefield.unit(unit_id) {
            self.events.push(BattleEvent::HealthChanged {
                unit: unit_id,
                health: unit.health(),
                percent: unit.health_percent(),
            });
        }
    }

    fn announce(&mut self, check: EndTurnCheck) {
        if check == EndTurnCheck::EndTurnAvailable {
            self.events.push(BattleEvent::EndTurnAvailable);
        }
    }
}
