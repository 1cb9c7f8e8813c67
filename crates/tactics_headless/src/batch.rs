//! Batch match runner.
//!
//! Runs many independent matches in parallel with rayon. Each match gets
//! its own seed (`seed_start + index`), so a batch is fully reproducible:
//! the same configuration always yields the same summary.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use tactics_core::error::GameError;

use crate::metrics::{BatchSummary, GameMetrics};
use crate::runner::run_scenario;
use crate::scenario::{Scenario, ScenarioError};

/// Configuration for a batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Scenario preset name or RON path
    pub scenario: String,
    /// Number of matches to run
    pub game_count: u32,
    /// Worker threads (0 = use rayon default)
    pub parallel_games: u32,
    /// Output directory for results
    pub output_dir: PathBuf,
    /// Starting seed for deterministic runs
    pub seed_start: u64,
    /// Turn limit override
    pub max_turns: Option<u32>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            scenario: "skirmish".to_string(),
            game_count: 100,
            parallel_games: 0,
            output_dir: PathBuf::from("results"),
            seed_start: 0,
            max_turns: None,
        }
    }
}

impl BatchConfig {
    /// Create config for a specific scenario
    pub fn new(scenario: &str, game_count: u32) -> Self {
        Self {
            scenario: scenario.to_string(),
            game_count,
            ..Default::default()
        }
    }

    /// Set output directory
    pub fn with_output(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }

    /// Set seed start
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set worker thread count
    pub fn with_parallelism(mut self, threads: u32) -> Self {
        self.parallel_games = threads;
        self
    }

    /// Override the scenario's turn limit
    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = Some(max_turns);
        self
    }
}

/// Results from a batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used
    pub config: BatchConfig,
    /// Individual match metrics, in seed order
    pub games: Vec<GameMetrics>,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Total runtime
    pub duration_seconds: f64,
    /// Errors encountered
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to JSON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Error during batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    /// Match index
    pub game_index: u32,
    /// Seed used
    pub seed: u64,
    /// Error message
    pub message: String,
}

/// Run a batch of matches.
///
/// Fails only if the scenario cannot be loaded; per-match failures are
/// collected in [`BatchResults::errors`].
pub fn run_batch(config: BatchConfig) -> Result<BatchResults, ScenarioError> {
    let start = Instant::now();
    let mut scenario = Scenario::resolve(&config.scenario)?;
    if let Some(max_turns) = config.max_turns {
        scenario.max_turns = max_turns;
    }

    info!(
        "Starting batch run: {} matches of '{}'",
        config.game_count, scenario.name
    );

    let completed = AtomicU32::new(0);
    let play = |i: u32| -> Result<GameMetrics, BatchError> {
        let seed = config.seed_start.wrapping_add(u64::from(i));
        let game_id = format!("game_{i:05}");
        let result = run_scenario(&scenario.clone().with_seed(seed), game_id);
        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
        if done % 10 == 0 {
            debug!("Progress: {}/{}", done, config.game_count);
        }
        result.map_err(|e: GameError| {
            warn!("Match {} failed: {}", i, e);
            BatchError {
                game_index: i,
                seed,
                message: e.to_string(),
            }
        })
    };
    let run_all = || -> Vec<Result<GameMetrics, BatchError>> {
        (0..config.game_count).into_par_iter().map(play).collect()
    };

    let results = if config.parallel_games > 0 {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_games as usize)
            .build()
        {
            Ok(pool) => pool.install(run_all),
            Err(e) => {
                warn!("Failed to build thread pool: {}, using default", e);
                run_all()
            }
        }
    } else {
        run_all()
    };

    let mut games = Vec::with_capacity(results.len());
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(metrics) => games.push(metrics),
            Err(e) => errors.push(e),
        }
    }

    let summary = BatchSummary::from_games(&games);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        "Batch complete: {} matches in {:.1}s ({:.1} matches/sec)",
        games.len(),
        duration_seconds,
        games.len() as f64 / duration_seconds.max(f64::EPSILON)
    );

    Ok(BatchResults {
        config,
        games,
        summary,
        duration_seconds,
        errors,
    })
}

/// Outcome of a determinism check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeterminismReport {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Final state hash of each run.
    pub hashes: Vec<u64>,
}

/// Play `scenario` `runs` times and compare history and final state.
pub fn verify_determinism(scenario: &Scenario, runs: u32) -> Result<DeterminismReport, GameError> {
    let mut hashes = Vec::with_capacity(runs as usize);
    let mut histories = Vec::with_capacity(runs as usize);
    for run in 0..runs {
        let metrics = run_scenario(scenario, format!("verify_{run}"))?;
        hashes.push(metrics.final_state_hash);
        histories.push(metrics.history);
    }
    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1])
        && histories.windows(2).all(|w| w[0] == w[1]);
    Ok(DeterminismReport {
        is_deterministic,
        hashes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_config_default() {
        let config = BatchConfig::default();
        assert_eq!(config.game_count, 100);
        assert_eq!(config.scenario, "skirmish");
        assert_eq!(config.max_turns, None);
    }

    #[test]
    fn test_batch_config_builder() {
        let config = BatchConfig::new("open_field", 500)
            .with_output(PathBuf::from("/tmp/results"))
            .with_seed(12345)
            .with_parallelism(2)
            .with_max_turns(40);

        assert_eq!(config.scenario, "open_field");
        assert_eq!(config.game_count, 500);
        assert_eq!(config.seed_start, 12345);
        assert_eq!(config.parallel_games, 2);
        assert_eq!(config.max_turns, Some(40));
    }

    #[test]
    fn test_small_batch_is_reproducible() {
        let config = BatchConfig::new("open_field", 4).with_seed(100).with_parallelism(2);
        let a = run_batch(config.clone()).unwrap();
        let b = run_batch(config).unwrap();
        assert_eq!(a.games.len(), 4);
        assert!(a.errors.is_empty());
        assert_eq!(a.summary, b.summary);
        let seeds: Vec<u64> = a.games.iter().map(|g| g.seed).collect();
        assert_eq!(seeds, vec![100, 101, 102, 103]);
    }

    #[test]
    fn test_unknown_scenario_fails() {
        let config = BatchConfig::new("no_such_scenario.ron", 1);
        assert!(matches!(
            run_batch(config),
            Err(ScenarioError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_verify_determinism() {
        let report = verify_determinism(&Scenario::open_field().with_seed(7), 3).unwrap();
        assert!(report.is_deterministic);
        assert_eq!(report.hashes.len(), 3);
    }
}
