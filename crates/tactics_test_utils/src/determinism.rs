//! Determinism testing utilities.
//!
//! Provides a harness that plays whole matches from a [`MatchConfig`] and
//! verifies that identical configurations produce identical matches.
//!
//! # Testing Strategy
//!
//! Every random decision in a match comes from the single seeded RNG the
//! match owns. Sources of non-determinism to watch for:
//!
//! - **System randomness**: no `thread_rng()` anywhere in the core.
//! - **HashMap iteration order**: units live in a `BTreeMap` and rosters are
//!   ordered vectors, so iteration follows unit ids.
//! - **Floating-point math**: positions and distances use fixed-point
//!   arithmetic via [`tactics_core::math::Fixed`].
//!
//! The player side is driven by [`drive_player`], a plain aggressive policy
//! that needs no randomness of its own.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use tactics_core::config::MatchConfig;
use tactics_core::error::Result;
use tactics_core::game::Match;
use tactics_core::orchestrator::approach_tile;
use tactics_core::turn::Phase;
use tactics_core::units::Side;

/// How a driven match stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchEnd {
    /// A side won.
    Winner(Side),
    /// The turn limit was reached first.
    TurnLimit,
    /// Nobody could act and nothing was scheduled.
    Stalled,
}

/// Summary of one driven match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    /// How the match stopped.
    pub end: MatchEnd,
    /// Turn counter when it stopped.
    pub turns: u32,
    /// Every history line.
    pub history: Vec<String>,
    /// Hash over history and surviving units.
    pub hash: u64,
}

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic match).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the match was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Match is non-deterministic!\n\
                 Runs: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Take one player action. Returns `false` if the player has nothing to do.
///
/// Placement: the next kind of the plan on the first free tile. Battle:
/// attack the first target in range, otherwise walk toward the nearest
/// enemy, otherwise end the turn if allowed.
///
/// A trimmed copy of the `tactics_headless` Aggressive autopilot, which this
/// crate cannot depend on. Keep the two policies in step.
pub fn drive_player(game: &mut Match) -> Result<bool> {
    match game.phase() {
        Phase::Placement => {
            let Some(kind) = game.player_plan().next_kind() else {
                return Ok(false);
            };
            let Some(tile) = game.battlefield().grid().free_tiles().next() else {
                return Ok(false);
            };
            game.place_player_unit(kind, tile)?;
            Ok(true)
        }
        Phase::Battle => {
            let roster = game.battlefield().roster(Side::Player).to_vec();
            for unit_id in roster {
                let Some(action) = game.battlefield().unit(unit_id).map(|u| u.action()) else {
                    continue;
                };
                if action.can_attack() {
                    if let Some(&target) = game.attack_tiles(unit_id).first() {
                        game.player_attack(unit_id, target)?;
                        return Ok(true);
                    }
                }
                if action.can_move() {
                    let destination = approach_tile(game.battlefield(), unit_id)
                        .or_else(|| game.movement_tiles(unit_id).first().copied());
                    if let Some(destination) = destination {
                        game.player_move(unit_id, destination)?;
                        return Ok(true);
                    }
                }
            }
            if game.turn_state().end_turn_available() {
                game.player_end_turn()?;
                return Ok(true);
            }
            Ok(false)
        }
        Phase::GameOver { .. } => Ok(false),
    }
}

/// Play a match to the end, completing moves at once and skipping pacing.
pub fn play_match(config: MatchConfig, max_turns: u32) -> Result<MatchRecord> {
    let mut game = Match::new(config)?;
    game.start();

    let end = loop {
        if let Some(winner) = game.winner() {
            break MatchEnd::Winner(winner);
        }
        if game.turn_state().turn() > max_turns {
            break MatchEnd::TurnLimit;
        }
        if let Some(ticket) = game.pending_movement().cloned() {
            game.complete_movement(&ticket)?;
            continue;
        }
        if game.awaiting_player() {
            if drive_player(&mut game)? {
                continue;
            }
            break MatchEnd::Stalled;
        }
        if !game.run_pending() {
            break MatchEnd::Stalled;
        }
    };

    Ok(record(&game, end))
}

fn record(game: &Match, end: MatchEnd) -> MatchRecord {
    let history = game.history().to_vec();
    let units: Vec<_> = game
        .battlefield()
        .units()
        .map(|u| (u.id(), u.side(), u.tile(), u.health()))
        .collect();
    MatchRecord {
        end,
        turns: game.turn_state().turn(),
        hash: compute_hash(&(&history, &units, end)),
        history,
    }
}

/// Play the same configuration `runs` times and compare the results.
///
/// # Example
///
/// ```ignore
/// use tactics_test_utils::determinism::verify_match_determinism;
/// use tactics_test_utils::fixtures::quick_config;
///
/// let result = verify_match_determinism(&quick_config(7, AiLevel::Hard), 3, 200);
/// result.assert_deterministic();
/// ```
#[must_use]
pub fn verify_match_determinism(config: &MatchConfig, runs: usize, max_turns: u32) -> DeterminismResult {
    let hashes: Vec<u64> = (0..runs)
        .map(|_| play_match(config.clone(), max_turns).map_or(0, |r| r.hash))
        .collect();
    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    DeterminismResult {
        is_deterministic,
        hashes,
    }
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for grid and match testing.
pub mod strategies {
    use proptest::prelude::*;
    use tactics_core::config::{MatchConfig, PacingConfig};
    use tactics_core::grid::GridConfig;
    use tactics_core::obstacles::{MAX_OBSTACLE_FRACTION, MIN_OBSTACLE_FRACTION};
    use tactics_core::orchestrator::AiLevel;
    use tactics_core::units::Side;

    /// Grid side length (3-30).
    pub fn arb_grid_side() -> impl Strategy<Value = u32> {
        3u32..30u32
    }

    /// Obstacle fraction within the allowed range.
    pub fn arb_obstacle_fraction() -> impl Strategy<Value = f32> {
        MIN_OBSTACLE_FRACTION..=MAX_OBSTACLE_FRACTION
    }

    /// Match seed.
    pub fn arb_seed() -> impl Strategy<Value = u64> {
        any::<u64>()
    }

    /// AI difficulty.
    pub fn arb_ai_level() -> impl Strategy<Value = AiLevel> {
        prop_oneof![Just(AiLevel::Easy), Just(AiLevel::Hard)]
    }

    /// Starting side.
    pub fn arb_side() -> impl Strategy<Value = Side> {
        prop_oneof![Just(Side::Player), Just(Side::Ai)]
    }

    /// Small playable match with no pacing delays.
    ///
    /// Obstacles stay at or below 60% so there is room for four units.
    pub fn arb_match_config() -> impl Strategy<Value = MatchConfig> {
        (
            6u32..14u32,
            6u32..14u32,
            MIN_OBSTACLE_FRACTION..0.6f32,
            arb_seed(),
            arb_ai_level(),
            arb_side(),
        )
            .prop_map(|(width, height, fraction, seed, level, side)| {
                MatchConfig::default()
                    .with_grid(GridConfig::default().with_size(width, height))
                    .with_obstacle_fraction(fraction)
                    .with_seed(seed)
                    .with_ai_level(level)
                    .with_starting_side(side)
                    .with_pacing(PacingConfig::instant())
            })
    }

    /// Random ASCII layout of `#` and `.` with the given bounds.
    pub fn arb_layout(max_side: usize) -> impl Strategy<Value = Vec<String>> {
        (2..max_side, 2..max_side).prop_flat_map(|(width, height)| {
            proptest::collection::vec(
                proptest::collection::vec(prop_oneof![3 => Just('.'), 1 => Just('#')], width)
                    .prop_map(|row| row.into_iter().collect::<String>()),
                height,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::strategies::*;
    use super::*;
    use crate::fixtures::{battlefield_from_layout, quick_config, rng};
    use proptest::prelude::*;
    use std::collections::{HashSet, VecDeque};
    use tactics_core::actions::BattleContext;
    use tactics_core::battlefield::Battlefield;
    use tactics_core::events::EventLog;
    use tactics_core::grid::{Grid, GridConfig, TileCoord};
    use tactics_core::movement::MovementLock;
    use tactics_core::obstacles::{generate_obstacles, target_obstacle_count};
    use tactics_core::orchestrator::{AiDirective, AiLevel, Orchestrator};
    use tactics_core::query::{movement_tiles, path_to_tile};
    use tactics_core::turn::TurnState;
    use tactics_core::units::UnitKind;

    fn step_distances(grid: &Grid, start: TileCoord) -> Vec<Option<u32>> {
        let mut distance = vec![None; grid.len()];
        let mut queue = VecDeque::new();
        if let Some(i) = grid.index(start) {
            distance[i] = Some(0);
            queue.push_back(start);
        }
        while let Some(current) = queue.pop_front() {
            let d = grid.index(current).and_then(|i| distance[i]).unwrap_or(0);
            for next in grid.neighbors(current) {
                let i = grid.index(next).unwrap();
                if distance[i].is_none() && grid.is_free(next) {
                    distance[i] = Some(d + 1);
                    queue.push_back(next);
                }
            }
        }
        distance
    }

    #[test]
    fn test_quick_match_is_deterministic() {
        for level in [AiLevel::Easy, AiLevel::Hard] {
            verify_match_determinism(&quick_config(7, level), 3, 200).assert_deterministic();
        }
    }

    #[test]
    fn test_quick_match_ends() {
        let record = play_match(quick_config(21, AiLevel::Hard), 400).unwrap();
        assert!(record.turns > 0);
        assert!(!record.history.is_empty());
        assert!(record.turns <= 401);
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = play_match(quick_config(1, AiLevel::Easy), 100).unwrap();
        let b = play_match(quick_config(2, AiLevel::Easy), 100).unwrap();
        assert_ne!(a.hash, b.hash);
    }

    proptest! {
        /// Free tiles form one component with the exact target count.
        #[test]
        fn prop_obstacles_keep_free_tiles_connected(
            width in arb_grid_side(),
            height in arb_grid_side(),
            fraction in arb_obstacle_fraction(),
            seed in arb_seed(),
        ) {
            let mut grid = Grid::generate(GridConfig::default().with_size(width, height));
            let report = generate_obstacles(&mut grid, fraction, &mut rng(seed));
            let total = grid.len();
            prop_assert_eq!(report.free, total - target_obstacle_count(total, fraction));
            prop_assert_eq!(grid.free_tiles().count(), report.free);
            prop_assert!(grid.is_connected());
        }

        /// Reachable tiles are free and 1..=range steps away.
        #[test]
        fn prop_movement_tiles_within_range(layout in arb_layout(10), range in 1u32..8) {
            let rows: Vec<&str> = layout.iter().map(String::as_str).collect();
            let mut bf = battlefield_from_layout(&rows);
            let Some(start) = bf.grid().free_tiles().next() else { return Ok(()) };
            let mut stats = UnitKind::Brawler.stats();
            stats.movement_range = range;
            let unit = bf.place_unit_with_stats(Side::Player, UnitKind::Brawler, stats, start).unwrap();

            let distances = step_distances(bf.grid(), start);
            let tiles = movement_tiles(&bf, unit);
            let unique: HashSet<_> = tiles.iter().collect();
            prop_assert_eq!(unique.len(), tiles.len());
            for tile in &tiles {
                prop_assert!(bf.grid().is_free(*tile));
                let d = distances[bf.grid().index(*tile).unwrap()];
                prop_assert!(matches!(d, Some(d) if (1..=range).contains(&d)));
            }
            let expected = distances
                .iter()
                .filter(|d| matches!(d, Some(d) if (1..=range).contains(d)))
                .count();
            prop_assert_eq!(tiles.len(), expected);
        }

        /// Paths are empty or chains of adjacent admissible tiles.
        #[test]
        fn prop_paths_are_valid(layout in arb_layout(10), pick in any::<prop::sample::Index>()) {
            let rows: Vec<&str> = layout.iter().map(String::as_str).collect();
            let mut bf = battlefield_from_layout(&rows);
            let free: Vec<TileCoord> = bf.grid().free_tiles().collect();
            if free.len() < 2 {
                return Ok(());
            }
            let start = free[0];
            let destination = free[1 + pick.index(free.len() - 1)];
            let unit = bf.place_unit(Side::Player, UnitKind::Brawler, start).unwrap();

            let path = path_to_tile(&bf, unit, destination);
            let reachable = step_distances(bf.grid(), start)[bf.grid().index(destination).unwrap()].is_some();
            prop_assert_eq!(path.is_empty(), !reachable);
            let mut previous = start;
            for tile in &path {
                prop_assert_eq!(previous.manhattan(*tile), 1);
                prop_assert!(!bf.grid().is_obstacle(*tile));
                prop_assert!(!bf.grid().is_occupied(*tile) || *tile == destination);
                previous = *tile;
            }
            if let Some(last) = path.last() {
                prop_assert_eq!(*last, destination);
            }
        }

        /// An AI turn over N units ends within a bounded number of steps.
        #[test]
        fn prop_ai_turn_terminates(
            layout in arb_layout(9),
            seed in arb_seed(),
            level in arb_ai_level(),
        ) {
            let rows: Vec<&str> = layout.iter().map(String::as_str).collect();
            let mut bf: Battlefield = battlefield_from_layout(&rows);
            let free: Vec<TileCoord> = bf.grid().free_tiles().collect();
            if free.len() < 4 {
                return Ok(());
            }
            bf.place_unit(Side::Ai, UnitKind::Sniper, free[0]).unwrap();
            bf.place_unit(Side::Ai, UnitKind::Brawler, free[1]).unwrap();
            bf.place_unit(Side::Player, UnitKind::Brawler, free[free.len() - 1]).unwrap();
            bf.place_unit(Side::Player, UnitKind::Sniper, free[free.len() - 2]).unwrap();

            let mut turn = TurnState::new(Side::Ai, 2);
            turn.register_placement(&bf);
            let mut movement = MovementLock::new();
            let mut rng = rng(seed);
            let mut events = EventLog::new();
            let mut orchestrator = Orchestrator::new(level);

            let units = bf.roster(Side::Ai).len();
            let mut step = orchestrator.begin_turn(&bf);
            let mut selections = 0;
            let mut finished = false;
            for _ in 0..(units * 5 + 1) {
                if step == tactics_core::orchestrator::AiStep::Select {
                    selections += 1;
                }
                let mut ctx = BattleContext {
                    battlefield: &mut bf,
                    turn: &mut turn,
                    movement: &mut movement,
                    rng: &mut rng,
                    events: &mut events,
                };
                match orchestrator.step(step, &mut ctx) {
                    AiDirective::Schedule(next) => step = next,
                    AiDirective::AwaitMovement { ticket, then } => {
                        ctx.complete_move(&ticket).unwrap();
                        step = then;
                    }
                    AiDirective::EndTurn | AiDirective::Halt => {
                        finished = true;
                        break;
                    }
                }
            }
            prop_assert!(finished);
            prop_assert!(selections <= units + 1);
        }
    }
}
