//! Outbound events for the presentation layer.
//!
//! The core never renders anything. It records what happened as
//! [`BattleEvent`]s which a UI (or the headless runner) drains after each
//! call into the [`Match`](crate::game::Match).

use serde::{Deserialize, Serialize};

use crate::combat::AttackOutcome;
use crate::grid::TileCoord;
use crate::turn::Phase;
use crate::units::{Side, UnitId, UnitKind};

/// Something the presentation layer may want to show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BattleEvent {
    /// A placement or battle turn began.
    TurnStarted {
        /// Active side.
        side: Side,
        /// Phase the turn belongs to.
        phase: Phase,
        /// Battle turn counter.
        turn: u32,
    },
    /// A side finished its battle turn.
    TurnEnded {
        /// Side that finished.
        side: Side,
    },
    /// A unit was placed.
    UnitPlaced {
        /// New unit.
        unit: UnitId,
        /// Owning side.
        side: Side,
        /// Unit kind.
        kind: UnitKind,
        /// Placement tile.
        tile: TileCoord,
    },
    /// Placement finished.
    BattleStarted {
        /// Side taking the first battle turn.
        first: Side,
    },
    /// Highlight the tiles a unit can move to.
    HighlightMovement {
        /// Selected unit.
        unit: UnitId,
        /// Reachable tiles.
        tiles: Vec<TileCoord>,
    },
    /// Highlight the tiles a unit can attack.
    HighlightAttack {
        /// Selected unit.
        unit: UnitId,
        /// Tiles holding attackable enemies.
        tiles: Vec<TileCoord>,
    },
    /// Highlight the tile under the selected unit.
    HighlightUnitTile {
        /// Selected unit.
        unit: UnitId,
        /// Its tile.
        tile: TileCoord,
    },
    /// Remove every highlight.
    ClearHighlights,
    /// A unit started travelling; animate it along `path`.
    MovementStarted {
        /// Moving unit.
        unit: UnitId,
        /// Tiles to traverse, ending at the destination.
        path: Vec<TileCoord>,
    },
    /// A move was finalized.
    UnitMoved {
        /// Moved unit.
        unit: UnitId,
        /// Tile left.
        from: TileCoord,
        /// Tile now occupied.
        to: TileCoord,
    },
    /// An attack was resolved.
    AttackResolved(AttackOutcome),
    /// A unit's health changed.
    HealthChanged {
        /// Damaged unit.
        unit: UnitId,
        /// Health left.
        health: u32,
        /// Health as a fraction of maximum.
        percent: f32,
    },
    /// A unit died and was removed.
    UnitDied {
        /// Dead unit.
        unit: UnitId,
        /// Its side.
        side: Side,
    },
    /// The player may now end the turn.
    EndTurnAvailable,
    /// The match is over.
    GameOver {
        /// Surviving side.
        winner: Side,
    },
    /// A line for the move history panel.
    History(String),
}

/// History line for a move.
#[must_use]
pub fn move_line(side: Side, kind: UnitKind, from: TileCoord, to: TileCoord) -> String {
    format!("{side}: {kind} moves from {from} to {to}")
}

/// History line for an attack.
#[must_use]
pub fn attack_line(side: Side, kind: UnitKind, target: TileCoord, damage: u32) -> String {
    format!("{side}: {kind} attacks {target} damage {damage}")
}

/// Pending events plus the full move history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventLog {
    pending: Vec<BattleEvent>,
    history: Vec<String>,
}

impl EventLog {
    /// Empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event.
    pub fn push(&mut self, event: BattleEvent) {
        self.pending.push(event);
    }

    /// Record a history line and queue it as an event.
    pub fn history_line(&mut self, line: String) {
        tracing::info!(target: "history", "{line}");
        self.history.push(line.clone());
        self.pending.push(BattleEvent::History(line));
    }

    /// Take every queued event.
    pub fn drain(&mut self) -> Vec<BattleEvent> {
        std::mem::take(&mut self.pending)
    }

    /// Queued events, not yet drained.
    #[must_use]
    pub fn pending(&self) -> &[BattleEvent] {
        &self.pending
    }

    /// Every history line so far.
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_formats() {
        assert_eq!(
            move_line(Side::Ai, UnitKind::Brawler, TileCoord::new(0, 0), TileCoord::new(2, 1)),
            "AI: Brawler moves from A1 to B3"
        );
        assert_eq!(
            attack_line(Side::Player, UnitKind::Sniper, TileCoord::new(6, 2), 7),
            "Player: Sniper attacks C7 damage 7"
        );
    }

    #[test]
    fn test_drain_keeps_history() {
        let mut log = EventLog::new();
        log.push(BattleEvent::ClearHighlights);
        log.history_line("Player: Sniper attacks A2 damage 5".to_string());
        let drained = log.drain();
        assert_eq!(drained.len(), 2);
        assert!(log.pending().is_empty());
        assert_eq!(log.history().len(), 1);
    }
}
