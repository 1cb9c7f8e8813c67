//! ASCII grid renderer.
//!
//! Draws the battlefield for terminal review:
//!
//! ```text
//!    1 2 3 4
//! A  S . # .
//! B  . # . b
//! ```
//!
//! Upper-case letters are player units, lower-case letters AI units.

use std::fmt::Write;

use tactics_core::battlefield::Battlefield;
use tactics_core::game::Match;
use tactics_core::grid::{row_label, TileCoord};
use tactics_core::turn::Phase;
use tactics_core::units::{Side, Unit, UnitKind};

/// ASCII rendering configuration.
#[derive(Debug, Clone)]
pub struct AsciiConfig {
    /// Show unit health next to the legend.
    pub show_health: bool,
    /// Show the symbol legend.
    pub show_legend: bool,
    /// Use colored output (ANSI).
    pub use_color: bool,
}

impl Default for AsciiConfig {
    fn default() -> Self {
        Self {
            show_health: true,
            show_legend: true,
            use_color: true,
        }
    }
}

impl AsciiConfig {
    /// Plain output, suitable for files and tests.
    #[must_use]
    pub fn plain() -> Self {
        Self {
            use_color: false,
            ..Self::default()
        }
    }
}

mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const BLUE: &str = "\x1b[34m";
    pub const RED: &str = "\x1b[31m";
    pub const GRAY: &str = "\x1b[90m";
}

fn side_color(side: Side) -> &'static str {
    match side {
        Side::Player => colors::BLUE,
        Side::Ai => colors::RED,
    }
}

/// Symbol for a unit: `S`/`B` for the player, `s`/`b` for the AI.
#[must_use]
pub fn unit_symbol(unit: &Unit) -> char {
    let symbol = match unit.kind() {
        UnitKind::Sniper => 'S',
        UnitKind::Brawler => 'B',
    };
    match unit.side() {
        Side::Player => symbol,
        Side::Ai => symbol.to_ascii_lowercase(),
    }
}

fn paint(out: &mut String, text: char, color: Option<&str>) {
    match color {
        Some(color) => {
            let _ = write!(out, "{color}{text}{}", colors::RESET);
        }
        None => out.push(text),
    }
}

/// Render the grid with units and obstacles.
#[must_use]
pub fn render_battlefield(battlefield: &Battlefield, config: &AsciiConfig) -> String {
    let grid = battlefield.grid();
    let label_width = row_label(grid.height().saturating_sub(1)).len();
    let mut out = String::new();

    let _ = write!(out, "{:width$}  ", "", width = label_width);
    for column in 0..grid.width() {
        // Only the last digit keeps columns aligned on wide grids.
        let _ = write!(out, "{} ", (column + 1) % 10);
    }
    out.truncate(out.trim_end().len());
    out.push('\n');

    for row in 0..grid.height() {
        let _ = write!(out, "{:>width$}  ", row_label(row), width = label_width);
        for column in 0..grid.width() {
            let coord = TileCoord::new(column, row);
            if let Some(unit) = battlefield.unit_at(coord) {
                let color = config.use_color.then(|| side_color(unit.side()));
                paint(&mut out, unit_symbol(unit), color);
            } else if grid.is_obstacle(coord) {
                let color = config.use_color.then_some(colors::GRAY);
                paint(&mut out, '#', color);
            } else {
                out.push('.');
            }
            out.push(' ');
        }
        out.truncate(out.trim_end().len());
        out.push('\n');
    }

    if config.show_legend {
        out.push_str("\nS/B player sniper/brawler, s/b AI sniper/brawler, # obstacle\n");
        if config.show_health {
            for unit in battlefield.units() {
                let tile = unit.tile().map_or_else(|| "-".to_string(), TileCoord::identifier);
                let _ = writeln!(
                    out,
                    "  {} {} {} at {}: {}/{} hp",
                    unit_symbol(unit),
                    unit.side(),
                    unit.kind(),
                    tile,
                    unit.health(),
                    unit.stats().max_health
                );
            }
        }
    }
    out
}

/// Render a status line followed by the grid.
#[must_use]
pub fn render_match(game: &Match, config: &AsciiConfig) -> String {
    let status = match game.phase() {
        Phase::GameOver { winner } => format!("Game over: {winner} wins"),
        phase => format!(
            "{} | turn {} | {} to act",
            phase.name(),
            game.turn_state().turn(),
            game.active_side()
        ),
    };
    let mut out = String::new();
    if config.use_color {
        let _ = writeln!(out, "{}{status}{}", colors::BOLD, colors::RESET);
    } else {
        let _ = writeln!(out, "{status}");
    }
    out.push_str(&render_battlefield(game.battlefield(), config));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactics_core::grid::{Grid, GridConfig};

    fn board() -> Battlefield {
        let mut grid = Grid::generate(GridConfig::default().with_size(4, 2));
        for column in 0..4 {
            for row in 0..2 {
                grid.set_obstacle(TileCoord::new(column, row), false);
            }
        }
        grid.set_obstacle(TileCoord::new(2, 0), true);
        grid.set_obstacle(TileCoord::new(1, 1), true);
        let mut battlefield = Battlefield::new(grid);
        battlefield
            .place_unit(Side::Player, UnitKind::Sniper, TileCoord::new(0, 0))
            .unwrap();
        battlefield
            .place_unit(Side::Ai, UnitKind::Brawler, TileCoord::new(3, 1))
            .unwrap();
        battlefield
    }

    #[test]
    fn test_plain_render() {
        let config = AsciiConfig {
            show_legend: false,
            ..AsciiConfig::plain()
        };
        let rendered = render_battlefield(&board(), &config);
        assert_eq!(rendered, "   1 2 3 4\nA  S . # .\nB  . # . b\n");
    }

    #[test]
    fn test_legend_lists_units() {
        let rendered = render_battlefield(&board(), &AsciiConfig::plain());
        assert!(rendered.contains("S Player Sniper at A1: 20/20 hp"));
        assert!(rendered.contains("b AI Brawler at B4: 40/40 hp"));
    }

    #[test]
    fn test_color_wraps_symbols() {
        let config = AsciiConfig {
            show_legend: false,
            ..AsciiConfig::default()
        };
        let rendered = render_battlefield(&board(), &config);
        assert!(rendered.contains(&format!("{}S{}", colors::BLUE, colors::RESET)));
        assert!(rendered.contains(&format!("{}b{}", colors::RED, colors::RESET)));
    }
}
