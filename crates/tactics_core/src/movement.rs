//! Global movement lock.
//!
//! A move is split in two: [`MovementLock::begin`] hands out a [`MoveTicket`]
//! when the unit starts travelling, and [`MovementLock::complete`] takes it
//! back once the travel has played out. Only one ticket may be outstanding,
//! and tile occupancy is not touched until the ticket is completed.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::grid::TileCoord;
use crate::units::UnitId;

/// Token for one in-flight move.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveTicket {
    serial: u64,
    unit: UnitId,
    origin: TileCoord,
    destination: TileCoord,
    path: Vec<TileCoord>,
}

impl MoveTicket {
    /// Unit being moved.
    #[must_use]
    pub const fn unit(&self) -> UnitId {
        self.unit
    }

    /// Tile the unit is leaving.
    #[must_use]
    pub const fn origin(&self) -> TileCoord {
        self.origin
    }

    /// Tile the unit will occupy.
    #[must_use]
    pub const fn destination(&self) -> TileCoord {
        self.destination
    }

    /// Tiles traversed, excluding the origin.
    #[must_use]
    pub fn path(&self) -> &[TileCoord] {
        &self.path
    }
}

/// At most one unit moving at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementLock {
    active: Option<MoveTicket>,
    issued: u64,
}

impl MovementLock {
    /// Unlocked.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A move is in flight.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.active.is_some()
    }

    /// The outstanding ticket, if any.
    #[must_use]
    pub const fn active(&self) -> Option<&MoveTicket> {
        self.active.as_ref()
    }

    /// Fail with [`GameError::MovementInProgress`] while a move is in flight.
    pub fn ensure_unlocked(&self) -> Result<()> {
        match &self.active {
            Some(ticket) => Err(GameError::MovementInProgress(ticket.unit)),
            None => Ok(()),
        }
    }

    /// Start a move along `path`, which must end at the destination.
    pub fn begin(&mut self, unit: UnitId, origin: TileCoord, path: Vec<TileCoord>) -> Result<MoveTicket> {
        self.ensure_unlocked()?;
        let destination = *path
            .last()
            .ok_or_else(|| GameError::NoPath(origin.identifier()))?;
        self.issued += 1;
        let ticket = MoveTicket {
            serial: self.issued,
            unit,
            origin,
            destination,
            path,
        };
        self.active = Some(ticket.clone());
        Ok(ticket)
    }

    /// Release the lock for `ticket`.
    ///
    /// A ticket that is not the outstanding one is rejected and leaves the
    /// lock as it was.
    pub fn complete(&mut self, ticket: &MoveTicket) -> Result<MoveTicket> {
        let outstanding = self
            .active
            .as_ref()
            .is_some_and(|active| active.serial == ticket.serial);
        if !outstanding {
            return Err(GameError::StaleMoveTicket);
        }
        self.active.take().ok_or(GameError::StaleMoveTicket)
    }

    /// Drop any in-flight move without completing it.
    pub fn clear(&mut self) -> Option<MoveTicket> {
        self.active.take()
    }
}
