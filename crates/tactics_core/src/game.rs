//! The match facade.
//!
//! [`Match`] owns every piece of battle state and wires them together:
//! placement, the turn state machine, the AI orchestrator, the movement lock
//! and the pacing scheduler. A presentation layer drives it with:
//!
//! - player commands ([`Match::place_player_unit`], [`Match::player_move`],
//!   [`Match::player_attack`], [`Match::player_end_turn`]),
//! - [`Match::complete_movement`] once a move animation finishes,
//! - [`Match::tick`] with elapsed time (or [`Match::run_pending`] to skip
//!   pacing delays),
//!
//! and reads back [`BattleEvent`]s through [`Match::drain_events`].

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::actions::BattleContext;
use crate::battlefield::Battlefield;
use crate::combat::AttackOutcome;
use crate::config::MatchConfig;
use crate::error::{GameError, Result};
use crate::events::{BattleEvent, EventLog};
use crate::grid::{Grid, TileCoord};
use crate::movement::{MoveTicket, MovementLock};
use crate::obstacles::{draw_obstacle_fraction, generate_obstacles, ObstacleReport};
use crate::orchestrator::{AiDirective, AiStep, Orchestrator};
use crate::placement::{random_free_tile, PlacementPlan};
use crate::query::{attack_tiles, movement_tiles};
use crate::schedule::Scheduler;
use crate::turn::{EndTurnCheck, Phase, PlacementProgress, TurnEntry, TurnState};
use crate::units::{Side, UnitId, UnitKind};

/// Deferred work held by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    /// Run the turn entry action.
    StartTurn,
    /// Place the next AI unit.
    PlaceAiUnit,
    /// Run an AI step.
    Ai(AiStep),
}

/// Tiles the selected unit can act on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Reachable tiles, empty if the unit already moved.
    pub movement: Vec<TileCoord>,
    /// Attackable tiles, empty if the unit already attacked.
    pub attack: Vec<TileCoord>,
}

/// One battle from placement to game over.
#[derive(Debug, Clone)]
pub struct Match {
    config: MatchConfig,
    battlefield: Battlefield,
    turn: TurnState,
    orchestrator: Orchestrator,
    movement: MovementLock,
    scheduler: Scheduler<PendingAction>,
    rng: ChaCha8Rng,
    events: EventLog,
    player_plan: PlacementPlan,
    ai_plan: PlacementPlan,
    obstacle_fraction: f32,
    obstacle_report: ObstacleReport,
    ai_after_move: Option<(MoveTicket, AiStep)>,
    started: bool,
}

impl Match {
    /// Generate the grid and obstacles and decide the starting side.
    ///
    /// Fails if the configuration is invalid or the generated grid has too
    /// few free tiles for every unit.
    pub fn new(config: MatchConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

        let obstacle_fraction = config
            .obstacle_fraction
            .unwrap_or_else(|| draw_obstacle_fraction(&mut rng));
        let mut grid = Grid::generate(config.grid);
        let obstacle_report = generate_obstacles(&mut grid, obstacle_fraction, &mut rng);

        let needed = config.units_per_side * 2;
        if obstacle_report.free < needed {
            return Err(GameError::InvalidConfig(format!(
                "only {} free tiles for {needed} units",
                obstacle_report.free
            )));
        }

        let starting_side = config.starting_side.unwrap_or_else(|| {
            if rng.gen_bool(0.5) {
                Side::Player
            } else {
                Side::Ai
            }
        });

        tracing::info!(
            seed = config.seed,
            obstacle_fraction,
            free = obstacle_report.free,
            starting = %starting_side,
            ai = ?config.ai_level,
            "Match created"
        );

        Ok(Self {
            battlefield: Battlefield::new(grid),
            turn: TurnState::new(starting_side, config.units_per_side),
            orchestrator: Orchestrator::new(config.ai_level),
            movement: MovementLock::new(),
            scheduler: Scheduler::new(),
            rng,
            events: EventLog::new(),
            player_plan: PlacementPlan::new(config.player_plan.clone()),
            ai_plan: PlacementPlan::new(config.ai_plan.clone()),
            obstacle_fraction,
            obstacle_report,
            ai_after_move: None,
            started: false,
            config,
        })
    }

    /// Run the first turn entry. Calling it again does nothing.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        self.begin_turn();
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Configuration the match was created with.
    #[must_use]
    pub const fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Grid, units and rosters.
    #[must_use]
    pub const fn battlefield(&self) -> &Battlefield {
        &self.battlefield
    }

    /// Turn state.
    #[must_use]
    pub const fn turn_state(&self) -> &TurnState {
        &self.turn
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.turn.phase()
    }

    /// Active side.
    #[must_use]
    pub const fn active_side(&self) -> Side {
        self.turn.active()
    }

    /// Winner, once the match is over.
    #[must_use]
    pub const fn winner(&self) -> Option<Side> {
        self.turn.winner()
    }

    /// The AI orchestrator.
    #[must_use]
    pub const fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Obstacle fraction used for this match.
    #[must_use]
    pub const fn obstacle_fraction(&self) -> f32 {
        self.obstacle_fraction
    }

    /// Result of obstacle generation.
    #[must_use]
    pub const fn obstacle_report(&self) -> ObstacleReport {
        self.obstacle_report
    }

    /// Kinds the player may still place.
    #[must_use]
    pub fn player_plan(&self) -> &PlacementPlan {
        &self.player_plan
    }

    /// The move in flight, if any.
    #[must_use]
    pub const fn pending_movement(&self) -> Option<&MoveTicket> {
        self.movement.active()
    }

    /// Deferred work waiting in the scheduler.
    #[must_use]
    pub fn pending_action(&self) -> Option<&PendingAction> {
        self.scheduler.pending()
    }

    /// The player may act: battle phase, player turn, nothing moving and
    /// nothing scheduled.
    #[must_use]
    pub fn awaiting_player(&self) -> bool {
        match self.turn.phase() {
            Phase::Placement | Phase::Battle => {
                self.turn.active() == Side::Player
                    && !self.movement.is_locked()
                    && self.scheduler.is_idle()
            }
            Phase::GameOver { .. } => false,
        }
    }

    /// Take every event recorded since the last call.
    pub fn drain_events(&mut self) -> Vec<BattleEvent> {
        self.events.drain()
    }

    /// Every history line so far.
    #[must_use]
    pub fn history(&self) -> &[String] {
        self.events.history()
    }

    // ------------------------------------------------------------------
    // Time
    // ------------------------------------------------------------------

    /// Advance pacing timers. Returns whether deferred work ran.
    pub fn tick(&mut self, elapsed: Duration) -> bool {
        match self.scheduler.tick(elapsed) {
            Some(action) => {
                self.dispatch(action);
                true
            }
            None => false,
        }
    }

    /// Run the deferred work now, ignoring its delay. Returns whether
    /// anything ran.
    pub fn run_pending(&mut self) -> bool {
        match self.scheduler.fire_now() {
            Some(action) => {
                self.dispatch(action);
                true
            }
            None => false,
        }
    }

    fn dispatch(&mut self, action: PendingAction) {
        tracing::debug!(?action, "Dispatching");
        match action {
            PendingAction::StartTurn => self.begin_turn(),
            PendingAction::PlaceAiUnit => self.place_ai_unit(),
            PendingAction::Ai(step) => self.run_ai_step(step),
        }
    }

    // ------------------------------------------------------------------
    // Turn flow
    // ------------------------------------------------------------------

    fn begin_turn(&mut self) {
        let entry = self.turn.start_turn();
        self.events.push(BattleEvent::TurnStarted {
            side: self.turn.active(),
            phase: self.turn.phase(),
            turn: self.turn.turn(),
        });
        match entry {
            TurnEntry::AwaitPlayerPlacement | TurnEntry::UnlockPlayerInput | TurnEntry::Finished => {}
            TurnEntry::ScheduleAiPlacement => {
                self.scheduler
                    .schedule(self.config.pacing.placement_delay(), PendingAction::PlaceAiUnit);
            }
            TurnEntry::BeginAiTurn => {
                let step = self.orchestrator.begin_turn(&self.battlefield);
                self.run_ai_step(step);
            }
        }
    }

    fn end_turn(&mut self) {
        let finished = self.turn.active();
        self.turn.end_turn(&mut self.battlefield);
        self.events.push(BattleEvent::ClearHighlights);
        self.events.push(BattleEvent::TurnEnded { side: finished });
        self.scheduler
            .schedule(self.config.pacing.turn_start_delay(), PendingAction::StartTurn);
    }

    fn after_action(&mut self, check: EndTurnCheck) {
        if let Phase::GameOver { .. } = self.turn.phase() {
            self.scheduler.cancel();
            self.ai_after_move = None;
            return;
        }
        if check == EndTurnCheck::AutoEnd {
            self.end_turn();
        }
    }

    fn run_ai_step(&mut self, step: AiStep) {
        if self.turn.phase() != Phase::Battle || self.turn.active() != Side::Ai {
            tracing::warn!(?step, "AI step outside the AI battle turn");
            return;
        }
        let mut ctx = BattleContext {
            battlefield: &mut self.battlefield,
            turn: &mut self.turn,
            movement: &mut self.movement,
            rng: &mut self.rng,
            events: &mut self.events,
        };
        match self.orchestrator.step(step, &mut ctx) {
            AiDirective::Schedule(next) => {
                self.scheduler
                    .schedule(self.config.pacing.step_delay(), PendingAction::Ai(next));
            }
            AiDirective::AwaitMovement { ticket, then } => {
                self.ai_after_move = Some((ticket, then));
            }
            AiDirective::EndTurn => self.end_turn(),
            AiDirective::Halt => self.after_action(EndTurnCheck::NotChecked),
        }
    }

    // ------------------------------------------------------------------
    // Placement
    // ------------------------------------------------------------------

    /// Place a player unit of `kind` on `tile`.
    pub fn place_player_unit(&mut self, kind: UnitKind, tile: TileCoord) -> Result<UnitId> {
        self.turn.ensure_phase(Phase::Placement)?;
        self.turn.ensure_active(Side::Player)?;
        if !self.player_plan.can_place(kind) {
            return Err(GameError::PlacementKindUnavailable {
                side: Side::Player,
                kind,
            });
        }
        let id = self.battlefield.place_unit(Side::Player, kind, tile)?;
        self.player_plan.take(kind);
        self.placed(id, Side::Player, kind, tile);
        Ok(id)
    }

    /// Place a player unit on the tile named `identifier` (e.g. `"C7"`).
    pub fn place_player_unit_at(&mut self, kind: UnitKind, identifier: &str) -> Result<UnitId> {
        let tile = self
            .battlefield
            .grid()
            .find_identifier(identifier)
            .ok_or_else(|| GameError::UnknownTile(identifier.to_string()))?;
        self.place_player_unit(kind, tile)
    }

    fn place_ai_unit(&mut self) {
        if self.turn.phase() != Phase::Placement || self.turn.active() != Side::Ai {
            tracing::warn!("AI placement outside the AI placement turn");
            return;
        }
        let Some(kind) = self.ai_plan.next_kind() else {
            tracing::warn!("AI has nothing left to place");
            return;
        };
        let Some(tile) = random_free_tile(self.battlefield.grid(), &mut self.rng) else {
            tracing::warn!("No free tile for AI placement");
            return;
        };
        match self.battlefield.place_unit(Side::Ai, kind, tile) {
            Ok(id) => {
                self.ai_plan.take(kind);
                self.placed(id, Side::Ai, kind, tile);
            }
            Err(err) => tracing::warn!(%err, "AI placement failed"),
        }
    }

    fn placed(&mut self, unit: UnitId, side: Side, kind: UnitKind, tile: TileCoord) {
        self.events.push(BattleEvent::UnitPlaced {
            unit,
            side,
            kind,
            tile,
        });
        if let PlacementProgress::BattleBegins { first } = self.turn.register_placement(&self.battlefield) {
            self.events.push(BattleEvent::BattleStarted { first });
        }
        self.begin_turn();
    }

    // ------------------------------------------------------------------
    // Battle queries and commands
    // ------------------------------------------------------------------

    /// Tiles `unit` can move to.
    #[must_use]
    pub fn movement_tiles(&self, unit: UnitId) -> Vec<TileCoord> {
        movement_tiles(&self.battlefield, unit)
    }

    /// Tiles holding enemies `unit` can attack.
    #[must_use]
    pub fn attack_tiles(&self, unit: UnitId) -> Vec<TileCoord> {
        attack_tiles(&self.battlefield, unit)
    }

    fn ensure_player_unit(&self, unit: UnitId) -> Result<()> {
        self.turn.ensure_phase(Phase::Battle)?;
        self.turn.ensure_active(Side::Player)?;
        let owner = self
            .battlefield
            .unit(unit)
            .ok_or(GameError::UnitNotFound(unit))?
            .side();
        if owner == Side::Player {
            Ok(())
        } else {
            Err(GameError::NotYourTurn(owner))
        }
    }

    /// Select a player unit and highlight what it can do.
    pub fn select_unit(&mut self, unit: UnitId) -> Result<Selection> {
        self.ensure_player_unit(unit)?;
        self.movement.ensure_unlocked()?;
        let state = self
            .battlefield
            .unit(unit)
            .ok_or(GameError::UnitNotFound(unit))?;
        let action = state.action();
        let tile = state.tile();

        let selection = Selection {
            movement: if action.can_move() {
                self.movement_tiles(unit)
            } else {
                Vec::new()
            },
            attack: if action.can_attack() {
                self.attack_tiles(unit)
            } else {
                Vec::new()
            },
        };

        self.events.push(BattleEvent::ClearHighlights);
        if let Some(tile) = tile {
            self.events.push(BattleEvent::HighlightUnitTile { unit, tile });
        }
        self.events.push(BattleEvent::HighlightMovement {
            unit,
            tiles: selection.movement.clone(),
        });
        self.events.push(BattleEvent::HighlightAttack {
            unit,
            tiles: selection.attack.clone(),
        });
        Ok(selection)
    }

    /// Start moving a player unit. Hand the ticket back through
    /// [`complete_movement`](Self::complete_movement) when the move is done.
    pub fn player_move(&mut self, unit: UnitId, destination: TileCoord) -> Result<MoveTicket> {
        self.ensure_player_unit(unit)?;
        let ticket = self.context().begin_move(unit, destination)?;
        self.events.push(BattleEvent::ClearHighlights);
        Ok(ticket)
    }

    /// Finalize a move after its animation. Works for player and AI moves.
    pub fn complete_movement(&mut self, ticket: &MoveTicket) -> Result<()> {
        let check = self.context().complete_move(ticket)?;
        if let Some((pending, then)) = self.ai_after_move.take() {
            if pending == *ticket {
                self.scheduler
                    .schedule(self.config.pacing.step_delay(), PendingAction::Ai(then));
            } else {
                self.ai_after_move = Some((pending, then));
            }
        }
        self.after_action(check);
        Ok(())
    }

    /// Attack with a player unit.
    pub fn player_attack(&mut self, unit: UnitId, target: TileCoord) -> Result<AttackOutcome> {
        self.ensure_player_unit(unit)?;
        let report = self.context().attack(unit, target)?;
        self.events.push(BattleEvent::ClearHighlights);
        self.after_action(report.end_turn);
        Ok(report.outcome)
    }

    /// End the player's turn. Only allowed once no player unit is idle.
    pub fn player_end_turn(&mut self) -> Result<()> {
        self.movement.ensure_unlocked()?;
        self.turn.take_end_turn()?;
        self.end_turn();
        Ok(())
    }

    fn context(&mut self) -> BattleContext<'_, ChaCha8Rng> {
        BattleContext {
            battlefield: &mut self.battlefield,
            turn: &mut self.turn,
            movement: &mut self.movement,
            rng: &mut self.rng,
            events: &mut self.events,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PacingConfig;
    use crate::grid::GridConfig;
    use crate::orchestrator::AiLevel;

    fn config(starting: Side) -> MatchConfig {
        MatchConfig::default()
            .with_seed(3)
            .with_grid(GridConfig::default().with_size(8, 8))
            .with_obstacle_fraction(0.3)
            .with_starting_side(starting)
            .with_pacing(PacingConfig::instant())
    }

    fn free_tiles(m: &Match) -> Vec<TileCoord> {
        m.battlefield().grid().free_tiles().collect()
    }

    #[test]
    fn test_new_generates_connected_grid() {
        let m = Match::new(config(Side::Player)).unwrap();
        assert_eq!(m.obstacle_report().obstacles, 19);
        assert!(m.battlefield().grid().is_connected());
        assert_eq!(m.phase(), Phase::Placement);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let bad = config(Side::Player).with_grid(GridConfig::default().with_size(2, 1));
        assert!(matches!(Match::new(bad), Err(GameError::InvalidConfig(_))));
    }

    #[test]
    fn test_placement_flow() {
        let mut m = Match::new(config(Side::Player)).unwrap();
        m.start();
        assert!(m.awaiting_player());

        let tile = free_tiles(&m)[0];
        m.place_player_unit(UnitKind::Sniper, tile).unwrap();
        assert_eq!(m.active_side(), Side::Ai);
        assert_eq!(m.pending_action(), Some(&PendingAction::PlaceAiUnit));
        assert_eq!(
            m.place_player_unit(UnitKind::Brawler, free_tiles(&m)[0]),
            Err(GameError::NotYourTurn(Side::Player))
        );

        assert!(m.run_pending());
        assert_eq!(m.battlefield().roster(Side::Ai).len(), 1);
        assert_eq!(m.active_side(), Side::Player);

        assert_eq!(
            m.place_player_unit(UnitKind::Sniper, free_tiles(&m)[0]),
            Err(GameError::PlacementKindUnavailable {
                side: Side::Player,
                kind: UnitKind::Sniper
            })
        );
        m.place_player_unit(UnitKind::Brawler, free_tiles(&m)[0]).unwrap();
        assert!(m.run_pending());
        assert_eq!(m.phase(), Phase::Battle);
        assert_eq!(m.active_side(), Side::Player);
        assert!(m
            .drain_events()
            .iter()
            .any(|e| matches!(e, BattleEvent::BattleStarted { first: Side::Player })));
    }

    #[test]
    fn test_place_by_identifier() {
        let mut m = Match::new(config(Side::Player)).unwrap();
        m.start();
        assert_eq!(
            m.place_player_unit_at(UnitKind::Sniper, "Z99"),
            Err(GameError::UnknownTile("Z99".to_string()))
        );
        assert!(m.battlefield().roster(Side::Player).is_empty());

        let tile = free_tiles(&m)[0];
        let id = m
            .place_player_unit_at(UnitKind::Sniper, &tile.identifier().to_lowercase())
            .unwrap();
        assert_eq!(m.battlefield().unit(id).and_then(|u| u.tile()), Some(tile));
    }

    #[test]
    fn test_ai_first_places_after_delay() {
        let cfg = config(Side::Ai).with_pacing(PacingConfig::default());
        let mut m = Match::new(cfg).unwrap();
        m.start();
        assert!(!m.tick(Duration::from_millis(2999)));
        assert!(m.tick(Duration::from_millis(1)));
        assert_eq!(m.battlefield().roster(Side::Ai).len(), 1);
        assert!(m.awaiting_player());
    }

    #[test]
    fn test_commands_rejected_while_moving() {
        let mut m = Match::new(config(Side::Player).with_ai_level(AiLevel::Hard)).unwrap();
        m.start();
        for kind in [UnitKind::Sniper, UnitKind::Brawler] {
            m.place_player_unit(kind, free_tiles(&m)[0]).unwrap();
            m.run_pending();
        }
        assert_eq!(m.phase(), Phase::Battle);

        let unit = m.battlefield().roster(Side::Player)[0];
        let Some(&dest) = m.movement_tiles(unit).first() else {
            return;
        };
        let ticket = m.player_move(unit, dest).unwrap();
        let other = m.battlefield().roster(Side::Player)[1];
        let other_dest = m.movement_tiles(other);
        if let Some(&d) = other_dest.first() {
            assert_eq!(m.player_move(other, d), Err(GameError::MovementInProgress(unit)));
        }
        assert_eq!(m.player_end_turn(), Err(GameError::MovementInProgress(unit)));
        m.complete_movement(&ticket).unwrap();
        assert_eq!(
            m.battlefield().unit(unit).and_then(|u| u.tile()),
            Some(dest)
        );
        assert_eq!(
            m.player_move(unit, dest),
            Err(GameError::UnitExhausted(unit))
        );
    }
}
