//! Attack resolution
//!
//! One attacker, one attack: roll to hit, classify the result, and roll damage
//! when the attack lands.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::dice::{is_critical, is_fumble, roll_d20, DiceError, DiceOutcome, DieSource};
use crate::bestiary::ActionSpec;

/// How the to-hit die is rolled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttackMode {
    /// One d20
    #[default]
    Standard,
    /// Two d20s, keep the higher
    Advantage,
    /// Two d20s, keep the lower
    Disadvantage,
}

impl AttackMode {
    pub fn all() -> &'static [AttackMode] {
        &[
            AttackMode::Standard,
            AttackMode::Advantage,
            AttackMode::Disadvantage,
        ]
    }
}

impl FromStr for AttackMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" | "normal" => Ok(AttackMode::Standard),
            "advantage" | "adv" => Ok(AttackMode::Advantage),
            "disadvantage" | "dis" => Ok(AttackMode::Disadvantage),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for AttackMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AttackMode::Standard => "Standard",
            AttackMode::Advantage => "Advantage",
            AttackMode::Disadvantage => "Disadvantage",
        };
        write!(f, "{}", s)
    }
}

/// Result of one attacker's attack
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttackOutcome {
    /// Every d20 rolled (two for advantage/disadvantage)
    pub raw_rolls: Vec<u32>,
    /// The d20 the attack mode kept
    pub chosen_roll: u32,
    /// Chosen roll plus attack bonus
    pub total_to_hit: i32,
    pub is_critical_hit: bool,
    pub is_critical_miss: bool,
    pub is_hit: bool,
    /// Damage dice, present only on a hit
    pub damage: Option<DiceOutcome>,
    /// Damage dealt; zero on a miss
    pub total_damage: i32,
}

impl AttackOutcome {
    /// Flat damage bonus applied, zero on a miss
    pub fn damage_bonus(&self) -> i32 {
        self.damage.as_ref().map_or(0, |d| d.bonus)
    }

    /// Individual damage dice, empty on a miss
    pub fn damage_rolls(&self) -> &[u32] {
        self.damage
            .as_ref()
            .map(|d| d.rolls.as_slice())
            .unwrap_or(&[])
    }
}

/// Resolve a single attack against `target_ac`.
///
/// A natural 20 always hits and doubles the damage dice (the flat bonus is
/// added once). A natural 1 always misses, whatever the bonus and AC.
pub fn resolve_attack<S: DieSource + ?Sized>(
    source: &mut S,
    action: &ActionSpec,
    mode: AttackMode,
    target_ac: i32,
) -> Result<AttackOutcome, DiceError> {
    let d20 = roll_d20(source, mode);
    let chosen = d20.chosen;

    let is_critical_hit = is_critical(chosen);
    let is_critical_miss = is_fumble(chosen);
    let total_to_hit = action.attack_bonus.saturating_add(chosen as i32);
    let is_hit = !is_critical_miss && (is_critical_hit || total_to_hit >= target_ac);

    let damage = if is_hit {
        let dice = if is_critical_hit {
            action.damage.doubled()
        } else {
            action.damage
        };
        Some(dice.roll(source)?)
    } else {
        None
    };
    let total_damage = damage.as_ref().map_or(0, |d| d.total);

    Ok(AttackOutcome {
        raw_rolls: d20.rolls,
        chosen_roll: chosen,
        total_to_hit,
        is_critical_hit,
        is_critical_miss,
        is_hit,
        damage,
        total_damage,
    })
}
