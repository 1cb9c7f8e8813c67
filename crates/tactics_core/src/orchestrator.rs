//! AI turn orchestration.
//!
//! The orchestrator walks a snapshot of the AI roster one unit at a time.
//! Each unit goes through a fixed sequence of steps:
//!
//! ```text
//! Select -> RevealAttack -> Decide -> [movement] -> FollowUp -> Select ...
//! ```
//!
//! The owner runs one step per call to [`Orchestrator::step`] and schedules
//! the next one from the returned [`AiDirective`]. Pacing between steps is
//! the owner's business; zero delays are fine.
//!
//! Two policies are available:
//!
//! - **Easy** flips a coin for attack intent, then moves to a random
//!   reachable tile and only attacks afterwards if the coin said so. A unit
//!   that cannot move tries an attack in place instead.
//! - **Hard** attacks in place when it can. Otherwise it walks toward the
//!   nearest enemy as far as its movement allows and attacks from there.

use std::collections::HashSet;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::actions::BattleContext;
use crate::battlefield::Battlefield;
use crate::events::BattleEvent;
use crate::grid::TileCoord;
use crate::movement::MoveTicket;
use crate::query::{attack_tiles, movement_tiles, path_to_tile};
use crate::turn::Phase;
use crate::units::{Side, UnitId};

/// AI difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AiLevel {
    /// Random movement, coin-flip attacks.
    Easy,
    /// Attack first, otherwise close in on the nearest enemy.
    #[default]
    Hard,
}

/// One step of the AI turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiStep {
    /// Pick the next unit that can still act.
    Select,
    /// Show the selected unit's attack range.
    RevealAttack(UnitId),
    /// Apply the difficulty policy.
    Decide(UnitId),
    /// After moving (or deciding not to), optionally attack, then advance.
    FollowUp {
        /// Unit being processed.
        unit: UnitId,
        /// Whether to attempt an attack.
        attack: bool,
    },
}

/// What the owner should do after a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiDirective {
    /// Run `step` after the pacing delay.
    Schedule(AiStep),
    /// A unit is moving. Run `then` once the ticket is completed.
    AwaitMovement {
        /// Outstanding move.
        ticket: MoveTicket,
        /// Step to run after the move.
        then: AiStep,
    },
    /// Every unit has been processed; end the AI turn.
    EndTurn,
    /// The match ended during the step.
    Halt,
}

/// Drives one AI battle turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Orchestrator {
    level: AiLevel,
    queue: Vec<UnitId>,
    index: usize,
}

impl Orchestrator {
    /// Orchestrator for the given difficulty.
    #[must_use]
    pub const fn new(level: AiLevel) -> Self {
        Self {
            level,
            queue: Vec::new(),
            index: 0,
        }
    }

    /// Difficulty.
    #[must_use]
    pub const fn level(&self) -> AiLevel {
        self.level
    }

    /// Position in the current turn's unit queue.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Units snapshotted for the current turn.
    #[must_use]
    pub fn queue(&self) -> &[UnitId] {
        &self.queue
    }

    /// Snapshot the AI roster and return the first step.
    pub fn begin_turn(&mut self, battlefield: &Battlefield) -> AiStep {
        self.queue = battlefield.roster(Side::Ai).to_vec();
        self.index = 0;
        tracing::info!(units = self.queue.len(), level = ?self.level, "AI turn started");
        AiStep::Select
    }

    /// Run one step.
    pub fn step<R: Rng + ?Sized>(&mut self, step: AiStep, ctx: &mut BattleContext<'_, R>) -> AiDirective {
        if ctx.turn.phase() != Phase::Battle {
            return AiDirective::Halt;
        }
        let directive = match step {
            AiStep::Select => self.select(ctx),
            AiStep::RevealAttack(unit) => Self::reveal_attack(unit, ctx),
            AiStep::Decide(unit) => self.decide(unit, ctx),
            AiStep::FollowUp { unit, attack } => self.follow_up(unit, attack, ctx),
        };
        if ctx.turn.phase() == Phase::Battle {
            directive
        } else {
            AiDirective::Halt
        }
    }

    fn select<R: Rng + ?Sized>(&mut self, ctx: &mut BattleContext<'_, R>) -> AiDirective {
        while let Some(&unit_id) = self.queue.get(self.index) {
            let ready = ctx
                .battlefield
                .unit(unit_id)
                .is_some_and(|u| u.action().can_act() && !u.action().has_attacked());
            if !ready {
                tracing::debug!(unit = unit_id, "AI unit skipped");
                self.index += 1;
                continue;
            }

            if let Some(tile) = ctx.battlefield.unit(unit_id).and_then(|u| u.tile()) {
                ctx.events.push(BattleEvent::HighlightUnitTile { unit: unit_id, tile });
            }
            ctx.events.push(BattleEvent::HighlightMovement {
                unit: unit_id,
                tiles: movement_tiles(ctx.battlefield, unit_id),
            });
            return AiDirective::Schedule(AiStep::RevealAttack(unit_id));
        }

        tracing::info!("All AI units processed");
        AiDirective::EndTurn
    }

    fn reveal_attack<R: Rng + ?Sized>(unit_id: UnitId, ctx: &mut BattleContext<'_, R>) -> AiDirective {
        ctx.events.push(BattleEvent::ClearHighlights);
        ctx.events.push(BattleEvent::HighlightAttack {
            unit: unit_id,
            tiles: attack_tiles(ctx.battlefield, unit_id),
        });
        AiDirective::Schedule(AiStep::Decide(unit_id))
    }

    fn decide<R: Rng + ?Sized>(&mut self, unit_id: UnitId, ctx: &mut BattleContext<'_, R>) -> AiDirective {
        ctx.events.push(BattleEvent::ClearHighlights);
        if ctx.battlefield.unit(unit_id).is_none() {
            return self.advance();
        }
        match self.level {
            AiLevel::Easy => self.decide_easy(unit_id, ctx),
            AiLevel::Hard => self.decide_hard(unit_id, ctx),
        }
    }

    fn decide_easy<R: Rng + ?Sized>(&mut self, unit_id: UnitId, ctx: &mut BattleContext<'_, R>) -> AiDirective {
        // Attack intent is drawn before anything else happens to this unit.
        let attack_after_move = ctx.rng.gen_bool(0.5);

        let reachable = movement_tiles(ctx.battlefield, unit_id);
        // A single reachable tile is still a move.
        if reachable.is_empty() {
            tracing::debug!(unit = unit_id, "Easy AI: no tile to move to");
            try_attack(unit_id, ctx);
            return self.advance();
        }

        let destination = reachable[ctx.rng.gen_range(0..reachable.len())];
        match ctx.begin_move(unit_id, destination) {
            Ok(ticket) => AiDirective::AwaitMovement {
                ticket,
                then: AiStep::FollowUp {
                    unit: unit_id,
                    attack: attack_after_move,
                },
            },
            Err(err) => {
                tracing::warn!(unit = unit_id, %err, "Easy AI move rejected");
                self.advance()
            }
        }
    }

    fn decide_hard<R: Rng + ?Sized>(&mut self, unit_id: UnitId, ctx: &mut BattleContext<'_, R>) -> AiDirective {
        if try_attack(unit_id, ctx) {
            return self.advance();
        }

        let follow_up = AiStep::FollowUp {
            unit: unit_id,
            attack: true,
        };
        let Some(destination) = approach_tile(ctx.battlefield, unit_id) else {
            tracing::debug!(unit = unit_id, "Hard AI: no tile toward an enemy");
            return AiDirective::Schedule(follow_up);
        };
        match ctx.begin_move(unit_id, destination) {
            Ok(ticket) => AiDirective::AwaitMovement {
                ticket,
                then: follow_up,
            },
            Err(err) => {
                tracing::warn!(unit = unit_id, %err, "Hard AI move rejected");
                AiDirective::Schedule(follow_up)
            }
        }
    }

    fn follow_up<R: Rng + ?Sized>(
        &mut self,
        unit_id: UnitId,
        attack: bool,
        ctx: &mut BattleContext<'_, R>,
    ) -> AiDirective {
        if attack {
            try_attack(unit_id, ctx);
        }
        ctx.events.push(BattleEvent::ClearHighlights);
        self.advance()
    }

    fn advance(&mut self) -> AiDirective {
        self.index += 1;
        AiDirective::Schedule(AiStep::Select)
    }
}

/// Attack the first enemy, in roster order, that stands on an attackable
/// tile. Returns whether an attack happened.
fn try_attack<R: Rng + ?Sized>(unit_id: UnitId, ctx: &mut BattleContext<'_, R>) -> bool {
    let Some(unit) = ctx.battlefield.unit(unit_id) else {
        return false;
    };
    if !unit.action().can_attack() {
        return false;
    }
    let targets = attack_tiles(ctx.battlefield, unit_id);
    let enemy_side = unit.side().opponent();
    let Some(target) = ctx
        .battlefield
        .roster_units(enemy_side)
        .filter_map(|enemy| enemy.tile())
        .find(|tile| targets.contains(tile))
    else {
        return false;
    };

    match ctx.attack(unit_id, target) {
        Ok(_) => true,
        Err(err) => {
            tracing::warn!(unit = unit_id, %err, "AI attack rejected");
            false
        }
    }
}

/// Nearest enemy by straight-line distance. Ties go to the first enemy in
/// roster order.
#[must_use]
pub fn nearest_enemy(battlefield: &Battlefield, unit_id: UnitId) -> Option<(UnitId, TileCoord)> {
    let unit = battlefield.unit(unit_id)?;
    let origin = battlefield.grid().tile_position(unit.tile()?)?;

    let mut best = None;
    for enemy in battlefield.roster_units(unit.side().opponent()) {
        let Some(tile) = enemy.tile() else { continue };
        let Some(pos) = battlefield.grid().tile_position(tile) else {
            continue;
        };
        let distance = origin.distance_squared(pos);
        if best.map_or(true, |(_, _, d)| distance < d) {
            best = Some((enemy.id(), tile, distance));
        }
    }
    best.map(|(id, tile, _)| (id, tile))
}

/// Furthest tile along the path to the nearest enemy that the unit can reach
/// this turn.
#[must_use]
pub fn approach_tile(battlefield: &Battlefield, unit_id: UnitId) -> Option<TileCoord> {
    let (_, enemy_tile) = nearest_enemy(battlefield, unit_id)?;
    let path = path_to_tile(battlefield, unit_id, enemy_tile);
    let reachable: HashSet<TileCoord> = movement_tiles(battlefield, unit_id).into_iter().collect();
    let range = battlefield.unit(unit_id)?.stats().movement_range as usize;

    path.iter()
        .take(range)
        .rev()
        .find(|tile| reachable.contains(tile))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventLog;
    use crate::grid::{Grid, GridConfig};
    use crate::movement::MovementLock;
    use crate::turn::{PlacementProgress, TurnState};
    use crate::units::{UnitKind, UnitStats};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    struct Harness {
        battlefield: Battlefield,
        turn: TurnState,
        movement: MovementLock,
        rng: ChaCha8Rng,
        events: EventLog,
    }

    impl Harness {
        fn new(rows: &[&str]) -> Self {
            let height = rows.len() as u32;
            let width = rows[0].len() as u32;
            let mut grid = Grid::generate(GridConfig::default().with_size(width, height));
            for (row, line) in rows.iter().enumerate() {
                for (column, ch) in line.chars().enumerate() {
                    grid.set_obstacle(TileCoord::new(column as u32, row as u32), ch == '#');
                }
            }
            Self {
                battlefield: Battlefield::new(grid),
                turn: TurnState::new(Side::Ai, 1),
                movement: MovementLock::new(),
                rng: ChaCha8Rng::seed_from_u64(11),
                events: EventLog::new(),
            }
        }

        fn place(&mut self, side: Side, kind: UnitKind, column: u32, row: u32) -> UnitId {
            self.battlefield
                .place_unit(side, kind, TileCoord::new(column, row))
                .unwrap()
        }

        fn start_battle(&mut self) {
            assert_eq!(
                self.turn.register_placement(&self.battlefield),
                PlacementProgress::BattleBegins { first: Side::Ai }
            );
        }

        /// Run a whole AI turn, completing moves immediately.
        fn run_turn(&mut self, orchestrator: &mut Orchestrator) -> (usize, AiDirective) {
            let mut step = orchestrator.begin_turn(&self.battlefield);
            let mut steps = 0;
            loop {
                steps += 1;
                assert!(steps < 100, "AI turn did not terminate");
                let mut ctx = BattleContext {
                    battlefield: &mut self.battlefield,
                    turn: &mut self.turn,
                    movement: &mut self.movement,
                    rng: &mut self.rng,
                    events: &mut self.events,
                };
                match orchestrator.step(step, &mut ctx) {
                    AiDirective::Schedule(next) => step = next,
                    AiDirective::AwaitMovement { ticket, then } => {
                        ctx.complete_move(&ticket).unwrap();
                        step = then;
                    }
                    other => return (steps, other),
                }
            }
        }

        fn moved(&self) -> bool {
            self.events
                .pending()
                .iter()
                .any(|e| matches!(e, BattleEvent::MovementStarted { .. }))
        }

        fn attacked(&self) -> bool {
            self.events
                .pending()
                .iter()
                .any(|e| matches!(e, BattleEvent::AttackResolved(_)))
        }
    }

    #[test]
    fn test_hard_adjacent_attacks_without_moving() {
        let mut h = Harness::new(&[".....", "....."]);
        h.place(Side::Ai, UnitKind::Brawler, 1, 0);
        h.place(Side::Player, UnitKind::Brawler, 2, 0);
        h.start_battle();
        let mut orch = Orchestrator::new(AiLevel::Hard);
        let (_, end) = h.run_turn(&mut orch);
        assert_eq!(end, AiDirective::EndTurn);
        assert!(h.attacked());
        assert!(!h.moved());
    }

    #[test]
    fn test_hard_closes_distance() {
        let mut h = Harness::new(&["............"]);
        let ai = h.place(Side::Ai, UnitKind::Brawler, 0, 0);
        h.place(Side::Player, UnitKind::Brawler, 11, 0);
        h.start_battle();
        let mut orch = Orchestrator::new(AiLevel::Hard);
        h.run_turn(&mut orch);
        // Brawler moves six tiles toward the enemy.
        assert_eq!(h.battlefield.unit(ai).and_then(|u| u.tile()), Some(TileCoord::new(6, 0)));
        assert!(!h.attacked());
    }

    #[test]
    fn test_hard_moves_then_attacks() {
        let mut h = Harness::new(&["........"]);
        let ai = h.place(Side::Ai, UnitKind::Brawler, 0, 0);
        h.place(Side::Player, UnitKind::Brawler, 5, 0);
        h.start_battle();
        let mut orch = Orchestrator::new(AiLevel::Hard);
        h.run_turn(&mut orch);
        assert_eq!(h.battlefield.unit(ai).and_then(|u| u.tile()), Some(TileCoord::new(4, 0)));
        assert!(h.attacked());
    }

    #[test]
    fn test_easy_boxed_in_is_skipped() {
        let mut h = Harness::new(&[".#....", "#....."]);
        let ai = h.place(Side::Ai, UnitKind::Brawler, 0, 0);
        h.place(Side::Player, UnitKind::Brawler, 5, 1);
        h.start_battle();
        let mut orch = Orchestrator::new(AiLevel::Easy);
        let (_, end) = h.run_turn(&mut orch);
        assert_eq!(end, AiDirective::EndTurn);
        assert_eq!(orch.index(), 1);
        assert!(!h.moved());
        assert!(!h.attacked());
        assert_eq!(h.battlefield.unit(ai).and_then(|u| u.tile()), Some(TileCoord::new(0, 0)));
    }

    #[test]
    fn test_easy_moves_within_range() {
        let mut h = Harness::new(&["..........", "..........", ".........."]);
        let ai = h.place(Side::Ai, UnitKind::Sniper, 0, 0);
        h.place(Side::Player, UnitKind::Brawler, 9, 2);
        h.start_battle();
        let mut orch = Orchestrator::new(AiLevel::Easy);
        h.run_turn(&mut orch);
        let tile = h.battlefield.unit(ai).and_then(|u| u.tile()).unwrap();
        assert!(h.moved());
        assert!(tile.manhattan(TileCoord::new(0, 0)) <= 3);
        assert_ne!(tile, TileCoord::new(0, 0));
    }

    #[test]
    fn test_nearest_enemy_prefers_first_on_tie() {
        let mut h = Harness::new(&["....."]);
        let ai = h.place(Side::Ai, UnitKind::Brawler, 2, 0);
        let left = h.place(Side::Player, UnitKind::Sniper, 0, 0);
        h.place(Side::Player, UnitKind::Sniper, 4, 0);
        assert_eq!(nearest_enemy(&h.battlefield, ai), Some((left, TileCoord::new(0, 0))));
    }

    #[test]
    fn test_approach_tile_none_when_blocked() {
        let mut h = Harness::new(&["..#.."]);
        let ai = h.place(Side::Ai, UnitKind::Brawler, 0, 0);
        h.place(Side::Player, UnitKind::Brawler, 4, 0);
        assert_eq!(approach_tile(&h.battlefield, ai), None);
    }

    #[test]
    fn test_turn_ends_within_unit_count() {
        let mut h = Harness::new(&["#.........", "..........", "........#."]);
        h.turn = TurnState::new(Side::Ai, 3);
        let tough = UnitStats {
            max_health: 500,
            ..UnitStats::BRAWLER
        };
        for column in 1..4 {
            h.place(Side::Ai, UnitKind::Sniper, column, 0);
        }
        for column in 5..8 {
            h.battlefield
                .place_unit_with_stats(Side::Player, UnitKind::Brawler, tough, TileCoord::new(column, 2))
                .unwrap();
        }
        h.start_battle();
        for level in [AiLevel::Easy, AiLevel::Hard] {
            let mut orch = Orchestrator::new(level);
            let (_, end) = h.run_turn(&mut orch);
            assert_eq!(end, AiDirective::EndTurn);
            assert_eq!(orch.index(), 3);
            h.turn.end_turn(&mut h.battlefield);
            h.turn.end_turn(&mut h.battlefield);
        }
    }

    #[test]
    fn test_dead_units_are_skipped() {
        let mut h = Harness::new(&["......"]);
        h.turn = TurnState::new(Side::Ai, 2);
        let doomed = h.place(Side::Ai, UnitKind::Brawler, 0, 0);
        h.place(Side::Ai, UnitKind::Brawler, 5, 0);
        h.place(Side::Player, UnitKind::Sniper, 2, 0);
        h.place(Side::Player, UnitKind::Sniper, 3, 0);
        h.start_battle();
        let mut orch = Orchestrator::new(AiLevel::Hard);
        orch.begin_turn(&h.battlefield);
        h.battlefield.remove_unit(doomed);
        let mut ctx = BattleContext {
            battlefield: &mut h.battlefield,
            turn: &mut h.turn,
            movement: &mut h.movement,
            rng: &mut h.rng,
            events: &mut h.events,
        };
        let directive = orch.step(AiStep::Select, &mut ctx);
        assert_eq!(orch.index(), 1);
        assert!(matches!(directive, AiDirective::Schedule(AiStep::RevealAttack(_))));
    }
}
