//! Attack resolution with counter-attacks and unit death.
//!
//! Resolution does not check ranges or action states; callers validate those
//! against [`attack_tiles`](crate::query::attack_tiles) before resolving.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::battlefield::Battlefield;
use crate::error::{GameError, Result};
use crate::grid::TileCoord;
use crate::units::{Side, UnitId};

/// Damage range of a counter-attack.
pub const COUNTER_DAMAGE: (u32, u32) = (1, 3);

/// The defender's reply to a ranged attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterAttack {
    /// Damage dealt back to the attacker.
    pub damage: u32,
    /// Attacker health after the counter.
    pub attacker_health: u32,
    /// The counter killed the attacker.
    pub attacker_died: bool,
}

/// Everything that happened during one attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackOutcome {
    /// Attacking unit.
    pub attacker: UnitId,
    /// Side of the attacking unit.
    pub attacker_side: Side,
    /// Defending unit.
    pub defender: UnitId,
    /// Tile the defender stood on.
    pub target_tile: TileCoord,
    /// Damage rolled against the defender.
    pub damage: u32,
    /// Defender health after the hit.
    pub defender_health: u32,
    /// The hit killed the defender.
    pub defender_died: bool,
    /// Counter-attack, if one was triggered.
    pub counter: Option<CounterAttack>,
    /// Set when a roster became empty.
    pub winner: Option<Side>,
}

/// Roll an inclusive damage range. A reversed range rolls the minimum.
pub fn roll_damage<R: Rng + ?Sized>(min: u32, max: u32, rng: &mut R) -> u32 {
    if max <= min {
        return min;
    }
    rng.gen_range(min..=max)
}

/// Resolve `attacker` hitting `defender`.
///
/// A ranged attacker draws a counter-attack from a surviving defender that
/// is ranged too, or that is a melee unit standing within one tile pitch.
/// Dead units are removed from the battlefield immediately.
pub fn resolve_attack<R: Rng + ?Sized>(
    battlefield: &mut Battlefield,
    attacker_id: UnitId,
    defender_id: UnitId,
    rng: &mut R,
) -> Result<AttackOutcome> {
    let attacker = battlefield
        .unit(attacker_id)
        .ok_or(GameError::UnitNotFound(attacker_id))?;
    let defender = battlefield
        .unit(defender_id)
        .ok_or(GameError::UnitNotFound(defender_id))?;
    let attacker_tile = attacker.tile().ok_or(GameError::UnitNotOnGrid(attacker_id))?;
    let target_tile = defender.tile().ok_or(GameError::UnitNotOnGrid(defender_id))?;

    let attacker_side = attacker.side();
    let attacker_stats = *attacker.stats();
    let defender_ranged = defender.stats().ranged;

    let grid = battlefield.grid();
    let adjacent = match (grid.tile_position(attacker_tile), grid.tile_position(target_tile)) {
        (Some(a), Some(d)) => a.within(d, grid.pitch()),
        _ => false,
    };

    let damage = roll_damage(attacker_stats.min_damage, attacker_stats.max_damage, rng);
    let defender_health = battlefield
        .unit_mut(defender_id)
        .map_or(0, |d| d.take_damage(damage));
    let defender_died = defender_health == 0;

    tracing::debug!(
        attacker = attacker_id,
        defender = defender_id,
        damage,
        defender_health,
        "Attack resolved"
    );

    let mut counter = None;
    if defender_died {
        battlefield.remove_unit(defender_id);
    } else if attacker_stats.ranged && (defender_ranged || adjacent) {
        let damage = roll_damage(COUNTER_DAMAGE.0, COUNTER_DAMAGE.1, rng);
        let attacker_health = battlefield
            .unit_mut(attacker_id)
            .map_or(0, |a| a.take_damage(damage));
        let attacker_died = attacker_health == 0;
        tracing::debug!(unit = attacker_id, damage, attacker_health, "Counter-attack");
        if attacker_died {
            battlefield.remove_unit(attacker_id);
        }
        counter = Some(CounterAttack {
            damage,
            attacker_health,
            attacker_died,
        });
    }

    Ok(AttackOutcome {
        attacker: attacker_id,
        attacker_side,
        defender: defender_id,
        target_tile,
        damage,
        defender_health,
        defender_died,
        counter,
        winner: winner(battlefield),
    })
}

/// Winning side once a roster is empty.
#[must_use]
pub fn winner(battlefield: &Battlefield) -> Option<Side> {
    if battlefield.is_defeated(Side::Player) {
        Some(Side::Ai)
    } else if battlefield.is_defeated(Side::Ai) {
        Some(Side::Player)
    } else {
        None
    }
}
