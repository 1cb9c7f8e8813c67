//! Headless match runner for AI playtesting and CI verification.
//!
//! Plays complete matches without a presentation layer. An [`Autopilot`]
//! stands in for the human player while the core's AI plays its side, which
//! enables:
//!
//! - **AI testing**: Easy and Hard AI against scripted opponents
//! - **Batch statistics**: win rates and match lengths over many seeds
//! - **CI verification**: the same seed always produces the same match
//!
//! # Example
//!
//! ```bash
//! # Play one match and print the final board
//! cargo run -p tactics_headless -- run --scenario skirmish --show-grid
//!
//! # Run a scenario file
//! cargo run -p tactics_headless -- run --scenario scenarios/skirmish.ron
//!
//! # Batch statistics
//! cargo run -p tactics_headless -- batch --scenario easy_skirmish --count 200
//!
//! # Verify determinism
//! cargo run -p tactics_headless -- verify --scenario open_field --seed 7
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod ascii;
pub mod autopilot;
pub mod batch;
pub mod metrics;
pub mod runner;
pub mod scenario;

pub use ascii::{render_battlefield, render_match, AsciiConfig};
pub use autopilot::{Autopilot, AutopilotKind, PlayerAction};
pub use batch::{run_batch, verify_determinism, BatchConfig, BatchResults, DeterminismReport};
pub use metrics::{BatchSummary, GameMetrics, MatchOutcome, MetricsCollector};
pub use runner::{run_scenario, MatchRunner};
pub use scenario::{Scenario, ScenarioError};
