//! Headless grid tactics runner.
//!
//! Plays matches without graphics: the autopilot controls the player side,
//! the built-in AI controls the other. Designed for AI playtesting and CI.
//!
//! # Usage
//!
//! ```bash
//! # Play a single match
//! cargo run -p tactics_headless -- run --scenario skirmish --seed 3 --show-grid
//!
//! # Run a batch and write results/batch.json
//! cargo run -p tactics_headless -- batch --scenario skirmish --count 500 --output results/
//!
//! # Preview a generated grid
//! cargo run -p tactics_headless -- grid --width 12 --height 12 --fraction 0.3
//!
//! # Verify determinism
//! cargo run -p tactics_headless -- verify --scenario skirmish --seed 12345 --runs 5
//! ```
//!
//! Logs go to stderr. `RUST_LOG` overrides the level picked by `--verbose`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tactics_core::config::{MatchConfig, PacingConfig};
use tactics_core::game::Match;
use tactics_core::grid::GridConfig;
use tactics_headless::{
    ascii::{render_match, AsciiConfig},
    batch::{run_batch, verify_determinism, BatchConfig},
    runner::MatchRunner,
    scenario::Scenario,
};

#[derive(Parser)]
#[command(name = "tactics_headless")]
#[command(about = "Headless grid tactics runner for AI testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single match
    Run {
        /// Scenario preset or RON file
        #[arg(short, long, default_value = "skirmish")]
        scenario: String,

        /// Override the scenario seed
        #[arg(long)]
        seed: Option<u64>,

        /// Print the board when the match ends
        #[arg(long)]
        show_grid: bool,

        /// Write match metrics as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run a batch of matches for statistics
    Batch {
        /// Scenario preset or RON file
        #[arg(short, long, default_value = "skirmish")]
        scenario: String,

        /// Number of matches to run
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Maximum parallel matches (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Starting random seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Override the scenario turn limit
        #[arg(long)]
        max_turns: Option<u32>,
    },

    /// Generate a grid and print it
    Grid {
        /// Columns
        #[arg(long, default_value = "25")]
        width: u32,

        /// Rows
        #[arg(long, default_value = "25")]
        height: u32,

        /// Obstacle fraction (drawn at random if omitted)
        #[arg(long)]
        fraction: Option<f32>,

        /// Random seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Verify determinism by running the same seed multiple times
    Verify {
        /// Scenario to test
        #[arg(short, long, default_value = "skirmish")]
        scenario: String,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::from_level(log_level).into())
                .from_env_lossy(),
        )
        .init();

    match cli.command {
        Some(Commands::Run {
            scenario,
            seed,
            show_grid,
            output,
        }) => {
            cmd_run(&scenario, seed, show_grid, output);
        }
        Some(Commands::Batch {
            scenario,
            count,
            parallel,
            output,
            seed,
            max_turns,
        }) => {
            cmd_batch(scenario, count, parallel, output, seed, max_turns);
        }
        Some(Commands::Grid {
            width,
            height,
            fraction,
            seed,
            no_color,
        }) => {
            cmd_grid(width, height, fraction, seed, no_color);
        }
        Some(Commands::Verify {
            scenario,
            seed,
            runs,
        }) => {
            cmd_verify(&scenario, seed, runs);
        }
        None => {
            cmd_run("skirmish", None, true, None);
        }
    }
}

fn load_scenario(name: &str) -> Scenario {
    match Scenario::resolve(name) {
        Ok(scenario) => scenario,
        Err(e) => {
            eprintln!("Failed to load scenario '{}': {}", name, e);
            eprintln!("Presets: {}", Scenario::PRESETS.join(", "));
            std::process::exit(1);
        }
    }
}

/// Play a single match
fn cmd_run(scenario: &str, seed: Option<u64>, show_grid: bool, output: Option<PathBuf>) {
    let mut scenario = load_scenario(scenario);
    if let Some(seed) = seed {
        scenario = scenario.with_seed(seed);
    }

    let mut runner = match MatchRunner::new(scenario, "run") {
        Ok(runner) => runner,
        Err(e) => {
            eprintln!("Failed to set up match: {}", e);
            std::process::exit(1);
        }
    };
    let metrics = match runner.run() {
        Ok(metrics) => metrics,
        Err(e) => {
            eprintln!("Match aborted: {}", e);
            std::process::exit(1);
        }
    };

    if show_grid {
        eprintln!("{}", render_match(runner.game(), &AsciiConfig::default()));
    }
    for line in &metrics.history {
        eprintln!("  {}", line);
    }
    eprintln!(
        "Result: {:?} after {} turns (seed {}, hash {:016x})",
        metrics.outcome, metrics.turns, metrics.seed, metrics.final_state_hash
    );

    if let Some(path) = output {
        let json = match serde_json::to_string_pretty(&metrics) {
            Ok(json) => json,
            Err(e) => {
                eprintln!("Failed to serialize metrics: {}", e);
                std::process::exit(1);
            }
        };
        if let Err(e) = std::fs::write(&path, json) {
            eprintln!("Failed to write '{}': {}", path.display(), e);
            std::process::exit(1);
        }
        tracing::info!(path = %path.display(), "Metrics written");
    }
}

/// Run a batch of matches
fn cmd_batch(
    scenario: String,
    count: u32,
    parallel: u32,
    output: PathBuf,
    seed: u64,
    max_turns: Option<u32>,
) {
    let num_cpus = std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1);
    tracing::info!(
        scenario = %scenario,
        count = count,
        parallel = parallel,
        seed = seed,
        output = %output.display(),
        cpus_available = num_cpus,
        "Batch configuration"
    );

    if let Err(e) = std::fs::create_dir_all(&output) {
        eprintln!(
            "FATAL: Cannot create output directory '{}': {}",
            output.display(),
            e
        );
        std::process::exit(1);
    }

    let mut config = BatchConfig::new(&scenario, count)
        .with_output(output.clone())
        .with_seed(seed)
        .with_parallelism(parallel);
    if let Some(max_turns) = max_turns {
        config = config.with_max_turns(max_turns);
    }

    let results = match run_batch(config) {
        Ok(results) => results,
        Err(e) => {
            eprintln!("Batch failed: {}", e);
            std::process::exit(1);
        }
    };

    let path = output.join("batch.json");
    if let Err(e) = results.save(&path) {
        eprintln!("Failed to save results to '{}': {}", path.display(), e);
        std::process::exit(1);
    }

    let summary = &results.summary;
    eprintln!("Batch complete: {} matches", summary.total_games);
    for (side, rate) in &summary.win_rates {
        eprintln!("  {:<7} win rate {:5.1}%", side, rate * 100.0);
    }
    eprintln!(
        "  turns avg {:.1} (min {}, max {}), stalemates {}, stalls {}",
        summary.avg_turns, summary.min_turns, summary.max_turns, summary.stalemates, summary.stalls
    );
    if !results.errors.is_empty() {
        eprintln!("  {} matches failed", results.errors.len());
    }
    eprintln!("Results written to {}", path.display());
}

/// Generate and print a grid
fn cmd_grid(width: u32, height: u32, fraction: Option<f32>, seed: u64, no_color: bool) {
    let mut config = MatchConfig::default()
        .with_seed(seed)
        .with_grid(GridConfig::default().with_size(width, height))
        .with_pacing(PacingConfig::instant());
    if let Some(fraction) = fraction {
        config = config.with_obstacle_fraction(fraction);
    }

    let game = match Match::new(config) {
        Ok(game) => game,
        Err(e) => {
            eprintln!("Cannot generate grid: {}", e);
            std::process::exit(1);
        }
    };
    let report = game.obstacle_report();
    let ascii = AsciiConfig {
        show_legend: false,
        use_color: !no_color,
        ..AsciiConfig::default()
    };
    println!("{}", render_match(&game, &ascii));
    println!(
        "fraction {:.2}: {} of {} tiles free, {} obstacles, connected: {}",
        game.obstacle_fraction(),
        report.free,
        report.total,
        report.obstacles,
        game.battlefield().grid().is_connected()
    );
}

/// Verify determinism
fn cmd_verify(scenario: &str, seed: u64, runs: u32) {
    tracing::info!(
        "Verifying determinism: {} with seed {} ({} runs)",
        scenario,
        seed,
        runs
    );

    let scenario = load_scenario(scenario).with_seed(seed);
    match verify_determinism(&scenario, runs) {
        Ok(report) if report.is_deterministic => {
            eprintln!("PASS: All {} runs produced identical results", runs);
        }
        Ok(report) => {
            eprintln!("FAIL: Non-determinism detected!");
            eprintln!("  Hashes: {:016x?}", report.hashes);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("FAIL: Match could not be played: {}", e);
            std::process::exit(1);
        }
    }
}
