//! Single-match execution.
//!
//! Plays one [`Scenario`] to completion: the autopilot drives the player
//! side, the scheduler drives the AI, and every move is completed as soon as
//! it starts since there is nothing to animate. All loops are bounded; a
//! match that outlives its turn limit is reported as a stalemate.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use tracing::{debug, info, warn};

use tactics_core::error::Result;
use tactics_core::game::Match;

use crate::autopilot::Autopilot;
use crate::metrics::{GameMetrics, MatchOutcome, MetricsCollector};
use crate::scenario::Scenario;

/// Upper bound on runner steps per battle turn before the match is
/// considered stuck.
const STEPS_PER_TURN: u64 = 64;

/// Drives one match.
#[derive(Debug, Clone)]
pub struct MatchRunner {
    scenario: Scenario,
    game: Match,
    autopilot: Autopilot,
    collector: MetricsCollector,
    steps: u64,
    turn: u32,
}

impl MatchRunner {
    /// Set up the scenario's match. Fails if the grid cannot hold both rosters.
    pub fn new(scenario: Scenario, game_id: impl Into<String>) -> Result<Self> {
        let seed = scenario.config.seed;
        let game = Match::new(scenario.config.clone())?;
        let mut metrics = GameMetrics::new(game_id, scenario.name.clone(), seed);
        metrics.obstacle_fraction = game.obstacle_fraction();
        Ok(Self {
            autopilot: Autopilot::new(scenario.player_autopilot, seed),
            collector: MetricsCollector::new(metrics),
            scenario,
            game,
            steps: 0,
            turn: 0,
        })
    }

    /// The match being played.
    #[must_use]
    pub const fn game(&self) -> &Match {
        &self.game
    }

    /// Scenario being played.
    #[must_use]
    pub const fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    /// Advance by one command or scheduled action. Returns the outcome once
    /// the match is over.
    pub fn step(&mut self) -> Result<Option<MatchOutcome>> {
        self.game.start();
        if let Some(outcome) = self.outcome() {
            return Ok(Some(outcome));
        }
        self.steps += 1;

        if let Some(ticket) = self.game.pending_movement().cloned() {
            self.game.complete_movement(&ticket)?;
        } else if self.game.awaiting_player() {
            if self.autopilot.act(&mut self.game)?.is_none() {
                warn!(
                    seed = self.scenario.config.seed,
                    turn = self.game.turn_state().turn(),
                    "Player has no legal command"
                );
                return Ok(Some(MatchOutcome::Stalled));
            }
        } else if !self.game.run_pending() {
            warn!(seed = self.scenario.config.seed, "Nothing scheduled");
            return Ok(Some(MatchOutcome::Stalled));
        }

        let events = self.game.drain_events();
        self.collector.record_all(&events);

        let turn = self.game.turn_state().turn();
        if turn != self.turn {
            self.turn = turn;
            debug!(turn, active = %self.game.active_side(), "Turn advanced");
        }
        Ok(None)
    }

    fn outcome(&self) -> Option<MatchOutcome> {
        if let Some(winner) = self.game.winner() {
            return Some(MatchOutcome::Victory(winner));
        }
        if self.game.turn_state().turn() > self.scenario.max_turns {
            return Some(MatchOutcome::Stalemate);
        }
        let limit = (u64::from(self.scenario.max_turns) + 1) * STEPS_PER_TURN;
        if self.steps >= limit {
            warn!(steps = self.steps, "Step limit reached");
            return Some(MatchOutcome::Stalled);
        }
        None
    }

    /// Play until the match is over and return its metrics.
    pub fn run(&mut self) -> Result<GameMetrics> {
        info!(
            scenario = %self.scenario.name,
            seed = self.scenario.config.seed,
            ai = ?self.scenario.config.ai_level,
            autopilot = ?self.autopilot.kind(),
            "Starting match"
        );
        let outcome = loop {
            if let Some(outcome) = self.step()? {
                break outcome;
            }
        };

        let mut metrics = self.collector.metrics().clone();
        metrics.finalize(outcome, self.game.turn_state().turn());
        metrics.history = self.game.history().to_vec();
        metrics.final_state_hash = state_hash(&self.game);
        info!(
            outcome = ?metrics.outcome,
            turns = metrics.turns,
            steps = self.steps,
            "Match finished"
        );
        Ok(metrics)
    }
}

/// Play `scenario` once.
pub fn run_scenario(scenario: &Scenario, game_id: impl Into<String>) -> Result<GameMetrics> {
    MatchRunner::new(scenario.clone(), game_id)?.run()
}

/// Hash over the move history and every surviving unit.
#[must_use]
pub fn state_hash(game: &Match) -> u64 {
    let mut hasher = DefaultHasher::new();
    game.history().hash(&mut hasher);
    for unit in game.battlefield().units() {
        (unit.id(), unit.side(), unit.tile(), unit.health()).hash(&mut hasher);
    }
    hasher.finish()
}
