//! Scenario loading and configuration.
//!
//! A scenario wraps a [`MatchConfig`] with the autopilot policy that plays
//! the player side and a turn limit for the headless runner.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tactics_core::config::{MatchConfig, PacingConfig};
use tactics_core::error::GameError;
use tactics_core::grid::GridConfig;
use tactics_core::orchestrator::AiLevel;
use tactics_core::units::Side;

use crate::autopilot::AutopilotKind;

/// Turn limit used when a scenario does not set one.
pub const DEFAULT_MAX_TURNS: u32 = 200;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Failed to write RON.
    #[error("Failed to serialize scenario: {0}")]
    SerializeError(#[from] ron::Error),
    /// The match configuration is not playable.
    #[error("Invalid scenario: {0}")]
    Invalid(#[from] GameError),
}

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Match setup.
    pub config: MatchConfig,
    /// Policy playing the player side.
    pub player_autopilot: AutopilotKind,
    /// Battle turns before the match is called a stalemate.
    pub max_turns: u32,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::skirmish()
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        scenario.config.validate()?;
        Ok(scenario)
    }

    /// Write the scenario as pretty RON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ScenarioError> {
        let contents = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// A preset by name, or a RON file when no preset matches.
    pub fn resolve(name_or_path: &str) -> Result<Self, ScenarioError> {
        match Self::preset(name_or_path) {
            Some(scenario) => Ok(scenario),
            None => Self::load(name_or_path),
        }
    }

    /// Built-in preset by name.
    #[must_use]
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "skirmish" => Some(Self::skirmish()),
            "easy_skirmish" => Some(Self::easy_skirmish()),
            "open_field" => Some(Self::open_field()),
            _ => None,
        }
    }

    /// Names accepted by [`preset`](Self::preset).
    pub const PRESETS: [&'static str; 3] = ["skirmish", "easy_skirmish", "open_field"];

    /// Default 25x25 grid against the Hard AI.
    #[must_use]
    pub fn skirmish() -> Self {
        Self {
            name: "Skirmish".to_string(),
            description: "Default grid with random obstacles against the Hard AI".to_string(),
            config: MatchConfig::default()
                .with_ai_level(AiLevel::Hard)
                .with_pacing(PacingConfig::instant()),
            player_autopilot: AutopilotKind::Aggressive,
            max_turns: DEFAULT_MAX_TURNS,
        }
    }

    /// Default grid against the Easy AI.
    #[must_use]
    pub fn easy_skirmish() -> Self {
        Self {
            name: "Easy Skirmish".to_string(),
            description: "Default grid with random obstacles against the Easy AI".to_string(),
            config: MatchConfig::default()
                .with_ai_level(AiLevel::Easy)
                .with_pacing(PacingConfig::instant()),
            ..Self::skirmish()
        }
    }

    /// Small board with few obstacles, player moving first.
    #[must_use]
    pub fn open_field() -> Self {
        Self {
            name: "Open Field".to_string(),
            description: "12x12 grid at the minimum 30% obstacles, player first".to_string(),
            config: MatchConfig::default()
                .with_grid(GridConfig::default().with_size(12, 12))
                .with_obstacle_fraction(0.3)
                .with_starting_side(Side::Player)
                .with_pacing(PacingConfig::instant()),
            player_autopilot: AutopilotKind::Aggressive,
            max_turns: 100,
        }
    }

    /// Same scenario with a different seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config = self.config.with_seed(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactics_core::game::Match;

    #[test]
    fn test_presets_are_valid() {
        for name in Scenario::PRESETS {
            let scenario = Scenario::preset(name).unwrap();
            assert!(scenario.config.validate().is_ok(), "{name}");
            assert!(scenario.max_turns > 0);
            assert!(Match::new(scenario.config).is_ok(), "{name}");
        }
        assert!(Scenario::preset("nope").is_none());
    }

    #[test]
    fn test_easy_skirmish_differs_only_in_ai() {
        let hard = Scenario::skirmish();
        let easy = Scenario::easy_skirmish();
        assert_eq!(easy.config.ai_level, AiLevel::Easy);
        assert_eq!(easy.config.grid, hard.config.grid);
        assert_eq!(easy.max_turns, hard.max_turns);
    }

    #[test]
    fn test_parse_from_ron() {
        let ron = r#"
            Scenario(
                name: "Test",
                description: "Tiny board",
                config: MatchConfig(
                    grid: GridConfig(width: 6, height: 6, cell_size: 100, spacing: 10),
                    obstacle_fraction: Some(0.4),
                    seed: 42,
                    ai_level: Easy,
                    starting_side: Some(Ai),
                ),
                player_autopilot: Wanderer,
                max_turns: 50,
            )
        "#;
        let scenario = Scenario::from_ron_str(ron).unwrap();
        assert_eq!(scenario.name, "Test");
        assert_eq!(scenario.config.grid.width, 6);
        assert_eq!(scenario.config.seed, 42);
        assert_eq!(scenario.config.obstacle_fraction, Some(0.4));
        assert_eq!(scenario.config.starting_side, Some(Side::Ai));
        assert_eq!(scenario.player_autopilot, AutopilotKind::Wanderer);
        // Omitted fields fall back to defaults.
        assert_eq!(scenario.config.units_per_side, 2);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let ron = r#"
            Scenario(
                config: MatchConfig(
                    grid: GridConfig(width: 0, height: 0, cell_size: 100, spacing: 10),
                ),
            )
        "#;
        assert!(matches!(
            Scenario::from_ron_str(ron),
            Err(ScenarioError::Invalid(GameError::InvalidConfig(_)))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Scenario::load("does/not/exist.ron"),
            Err(ScenarioError::FileNotFound(_))
        ));
    }
}
