//! Match metrics collection.
//!
//! Per-match numbers are gathered from the [`BattleEvent`] stream, then
//! aggregated over a batch into a [`BatchSummary`]. Maps are ordered so that
//! JSON output is stable across runs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use tactics_core::events::BattleEvent;
use tactics_core::units::{Side, UnitId};

/// How a match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MatchOutcome {
    /// A side eliminated the other.
    Victory(Side),
    /// The turn limit was reached first.
    Stalemate,
    /// Nobody could act and nothing was scheduled.
    #[default]
    Stalled,
}

impl MatchOutcome {
    /// The winning side, if any.
    #[must_use]
    pub const fn winner(self) -> Option<Side> {
        match self {
            Self::Victory(side) => Some(side),
            Self::Stalemate | Self::Stalled => None,
        }
    }
}

/// Per-side statistics for one match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideMetrics {
    /// Units placed.
    pub units_placed: u32,
    /// Units killed by the opponent.
    pub units_lost: u32,
    /// Moves started.
    pub moves: u32,
    /// Attacks made.
    pub attacks: u32,
    /// Damage dealt by attacks.
    pub damage_dealt: u32,
    /// Damage dealt by counter-attacks.
    pub counter_damage: u32,
    /// Battle turn of the first attack.
    pub first_attack_turn: Option<u32>,
}

/// Complete metrics for a single match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameMetrics {
    /// Unique game identifier.
    pub game_id: String,
    /// Scenario name.
    pub scenario: String,
    /// Random seed used.
    pub seed: u64,
    /// Obstacle fraction the match was generated with.
    pub obstacle_fraction: f32,
    /// Battle turn counter at the end.
    pub turns: u32,
    /// Winning side (None = no winner).
    pub winner: Option<String>,
    /// How the match ended.
    pub outcome: MatchOutcome,
    /// Per-side metrics, keyed by side name.
    pub sides: BTreeMap<String, SideMetrics>,
    /// Move history.
    pub history: Vec<String>,
    /// Hash over the history and surviving units (for determinism checks).
    pub final_state_hash: u64,
}

impl GameMetrics {
    /// Create a new game metrics instance.
    #[must_use]
    pub fn new(game_id: impl Into<String>, scenario: impl Into<String>, seed: u64) -> Self {
        Self {
            game_id: game_id.into(),
            scenario: scenario.into(),
            seed,
            ..Default::default()
        }
    }

    /// Get or create side metrics.
    pub fn side_mut(&mut self, side: Side) -> &mut SideMetrics {
        self.sides.entry(side.to_string()).or_default()
    }

    /// Side metrics, if the side did anything.
    #[must_use]
    pub fn side(&self, side: Side) -> Option<&SideMetrics> {
        self.sides.get(&side.to_string())
    }

    /// Record the outcome.
    pub fn finalize(&mut self, outcome: MatchOutcome, turns: u32) {
        self.outcome = outcome;
        self.turns = turns;
        self.winner = outcome.winner().map(|s| s.to_string());
    }
}

/// Feeds events into a [`GameMetrics`].
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    metrics: GameMetrics,
    owners: BTreeMap<UnitId, Side>,
    turn: u32,
}

impl MetricsCollector {
    /// Start collecting for `metrics`.
    #[must_use]
    pub fn new(metrics: GameMetrics) -> Self {
        Self {
            metrics,
            owners: BTreeMap::new(),
            turn: 0,
        }
    }

    /// Account for one event.
    pub fn record(&mut self, event: &BattleEvent) {
        match event {
            BattleEvent::TurnStarted { turn, .. } => self.turn = *turn,
            BattleEvent::UnitPlaced { unit, side, .. } => {
                self.owners.insert(*unit, *side);
                self.metrics.side_mut(*side).units_placed += 1;
            }
            BattleEvent::MovementStarted { unit, .. } => {
                if let Some(&side) = self.owners.get(unit) {
                    self.metrics.side_mut(side).moves += 1;
                }
            }
            BattleEvent::AttackResolved(outcome) => {
                let turn = self.turn;
                let attacker = self.metrics.side_mut(outcome.attacker_side);
                attacker.attacks += 1;
                attacker.damage_dealt += outcome.damage;
                attacker.first_attack_turn.get_or_insert(turn);
                if let Some(counter) = outcome.counter {
                    self.metrics
                        .side_mut(outcome.attacker_side.opponent())
                        .counter_damage += counter.damage;
                }
            }
            BattleEvent::UnitDied { side, .. } => {
                self.metrics.side_mut(*side).units_lost += 1;
            }
            _ => {}
        }
    }

    /// Account for a batch of events.
    pub fn record_all(&mut self, events: &[BattleEvent]) {
        for event in events {
            self.record(event);
        }
    }

    /// Metrics gathered so far.
    #[must_use]
    pub const fn metrics(&self) -> &GameMetrics {
        &self.metrics
    }

    /// Stop collecting.
    #[must_use]
    pub fn into_metrics(self) -> GameMetrics {
        self.metrics
    }
}

/// Aggregated results over many matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Matches summarized.
    pub total_games: u32,
    /// Wins per side.
    pub wins_by_side: BTreeMap<String, u32>,
    /// Win rate per side, in `[0, 1]`.
    pub win_rates: BTreeMap<String, f64>,
    /// Matches that hit the turn limit.
    pub stalemates: u32,
    /// Matches where nobody could act.
    pub stalls: u32,
    /// Average battle turns.
    pub avg_turns: f64,
    /// Shortest match in turns.
    pub min_turns: u32,
    /// Longest match in turns.
    pub max_turns: u32,
    /// Average damage dealt per side (attacks and counters).
    pub avg_damage_by_side: BTreeMap<String, f64>,
}

impl BatchSummary {
    /// Calculate summary from a list of game metrics.
    #[must_use]
    pub fn from_games(games: &[GameMetrics]) -> Self {
        if games.is_empty() {
            return Self::default();
        }

        let mut summary = Self {
            total_games: games.len() as u32,
            min_turns: u32::MAX,
            ..Default::default()
        };
        let mut turn_sum = 0u64;
        let mut damage: BTreeMap<String, u64> = BTreeMap::new();

        for game in games {
            turn_sum += u64::from(game.turns);
            summary.min_turns = summary.min_turns.min(game.turns);
            summary.max_turns = summary.max_turns.max(game.turns);

            match game.outcome {
                MatchOutcome::Victory(side) => {
                    *summary.wins_by_side.entry(side.to_string()).or_default() += 1;
                }
                MatchOutcome::Stalemate => summary.stalemates += 1,
                MatchOutcome::Stalled => summary.stalls += 1,
            }

            for (side, metrics) in &game.sides {
                *damage.entry(side.clone()).or_default() +=
                    u64::from(metrics.damage_dealt + metrics.counter_damage);
            }
        }

        let count = games.len() as f64;
        summary.avg_turns = turn_sum as f64 / count;
        for side in Side::ALL {
            let name = side.to_string();
            let wins = summary.wins_by_side.get(&name).copied().unwrap_or(0);
            summary.win_rates.insert(name.clone(), f64::from(wins) / count);
            let dealt = damage.get(&name).copied().unwrap_or(0);
            summary.avg_damage_by_side.insert(name, dealt as f64 / count);
        }
        summary
    }
}
