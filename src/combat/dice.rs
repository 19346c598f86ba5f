//! Dice rolling system
//!
//! Parses dice notation like "2d6+3", "1d20", "4d6-2" and rolls it against an
//! injectable [`DieSource`], so callers can swap the process RNG for a seeded
//! or scripted one.

use std::collections::VecDeque;
use std::str::FromStr;

use rand::rngs::ThreadRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::AttackMode;

/// Faces on the to-hit die
pub const D20_SIDES: u32 = 20;

/// Errors from dice parsing and rolling
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceError {
    #[error("invalid die: a die needs at least one side (got {sides})")]
    InvalidDie { sides: u32 },

    #[error("invalid dice notation: {0}")]
    InvalidNotation(String),
}

/// A source of die faces.
///
/// Implementations return a value in `[1, sides]`. [`ScriptedDice`] is the
/// exception: it replays its script verbatim.
pub trait DieSource {
    fn face(&mut self, sides: u32) -> u32;
}

/// Die source backed by any `rand` generator
#[derive(Debug, Clone)]
pub struct RandomDice<R> {
    rng: R,
}

impl<R: Rng> RandomDice<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomDice<ThreadRng> {
    /// Dice backed by the thread-local RNG
    pub fn thread() -> Self {
        Self::new(rand::rng())
    }
}

impl<R: Rng> DieSource for RandomDice<R> {
    fn face(&mut self, sides: u32) -> u32 {
        self.rng.random_range(1..=sides)
    }
}

/// Die source that replays a fixed sequence of faces, cycling when exhausted.
///
/// Faces are returned as-is regardless of the die being rolled.
///
/// # Panics
///
/// `new` panics if the script is empty.
#[derive(Debug, Clone)]
pub struct ScriptedDice {
    script: VecDeque<u32>,
}

impl ScriptedDice {
    pub fn new(faces: impl IntoIterator<Item = u32>) -> Self {
        let script: VecDeque<u32> = faces.into_iter().collect();
        assert!(!script.is_empty(), "ScriptedDice needs at least one face");
        Self { script }
    }
}

impl DieSource for ScriptedDice {
    fn face(&mut self, _sides: u32) -> u32 {
        // Non-empty by construction
        let face = self.script.pop_front().unwrap_or(1);
        self.script.push_back(face);
        face
    }
}

/// Individual dice plus the total after the flat bonus
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiceOutcome {
    pub rolls: Vec<u32>,
    pub bonus: i32,
    pub total: i32,
}

/// One or two d20s and the value the attack mode selected
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct D20Roll {
    pub rolls: Vec<u32>,
    pub chosen: u32,
}

/// Roll a single die with the given number of sides
pub fn roll_die<S: DieSource + ?Sized>(source: &mut S, sides: u32) -> Result<u32, DiceError> {
    if sides < 1 {
        return Err(DiceError::InvalidDie { sides });
    }
    Ok(source.face(sides))
}

/// Roll `count` dice of `sides` sides and add `bonus` once
pub fn roll_dice<S: DieSource + ?Sized>(
    source: &mut S,
    count: u32,
    sides: u32,
    bonus: i32,
) -> Result<DiceOutcome, DiceError> {
    if sides < 1 {
        return Err(DiceError::InvalidDie { sides });
    }

    let mut rolls = Vec::with_capacity(count as usize);
    for _ in 0..count {
        rolls.push(source.face(sides));
    }

    let sum: i64 = rolls.iter().map(|&r| i64::from(r)).sum();
    let total = (sum + i64::from(bonus)).clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;

    Ok(DiceOutcome { rolls, bonus, total })
}

/// Roll the to-hit die for an attack mode.
///
/// Standard rolls a single d20. Advantage and disadvantage roll two and keep
/// the higher or lower respectively.
pub fn roll_d20<S: DieSource + ?Sized>(source: &mut S, mode: AttackMode) -> D20Roll {
    let first = source.face(D20_SIDES);
    if mode == AttackMode::Standard {
        return D20Roll {
            rolls: vec![first],
            chosen: first,
        };
    }

    let second = source.face(D20_SIDES);
    let chosen = match mode {
        AttackMode::Advantage => first.max(second),
        _ => first.min(second),
    };

    D20Roll {
        rolls: vec![first, second],
        chosen,
    }
}

/// Check if a d20 roll is a natural 20 (critical hit)
pub fn is_critical(roll: u32) -> bool {
    roll == 20
}

/// Check if a d20 roll is a natural 1 (critical fail)
pub fn is_fumble(roll: u32) -> bool {
    roll == 1
}

/// A parsed dice specification: `count` dice of `sides` sides plus `modifier`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceSpec {
    /// Number of dice to roll
    pub count: u32,
    /// Number of sides per die
    pub sides: u32,
    /// Modifier to add/subtract
    pub modifier: i32,
}

impl DiceSpec {
    pub fn new(count: u32, sides: u32, modifier: i32) -> Self {
        Self {
            count,
            sides,
            modifier,
        }
    }

    /// Roll and return individual die results plus total
    pub fn roll<S: DieSource + ?Sized>(&self, source: &mut S) -> Result<DiceOutcome, DiceError> {
        roll_dice(source, self.count, self.sides, self.modifier)
    }

    /// Same dice with the count doubled, as rolled on a critical hit
    pub fn doubled(&self) -> Self {
        Self {
            count: self.count.saturating_mul(2),
            ..*self
        }
    }
}

impl FromStr for DiceSpec {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_dice(s)
    }
}

impl std::fmt::Display for DiceSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.modifier > 0 {
            write!(f, "{}d{}+{}", self.count, self.sides, self.modifier)
        } else if self.modifier < 0 {
            write!(f, "{}d{}{}", self.count, self.sides, self.modifier)
        } else {
            write!(f, "{}d{}", self.count, self.sides)
        }
    }
}

/// Parse a dice notation string like "2d6+3"
pub fn parse_dice(notation: &str) -> Result<DiceSpec, DiceError> {
    let notation = notation.trim().to_lowercase();
    let invalid = |msg: String| DiceError::InvalidNotation(msg);

    let d_pos = notation
        .find('d')
        .ok_or_else(|| invalid(format!("missing 'd' in '{}'", notation)))?;

    // "d6" means "1d6"
    let count_str = &notation[..d_pos];
    let count: u32 = if count_str.is_empty() {
        1
    } else {
        count_str
            .parse()
            .map_err(|_| invalid(format!("invalid dice count: {}", count_str)))?
    };

    if count == 0 {
        return Err(invalid("dice count must be at least 1".to_string()));
    }

    let rest = &notation[d_pos + 1..];
    let (sides_str, modifier) = if let Some(plus_pos) = rest.find('+') {
        let mod_str = &rest[plus_pos + 1..];
        let modifier: i32 = mod_str
            .parse()
            .map_err(|_| invalid(format!("invalid modifier: {}", mod_str)))?;
        (&rest[..plus_pos], modifier)
    } else if let Some(minus_pos) = rest.rfind('-').filter(|&p| p > 0) {
        // Keep the sign with the modifier
        let mod_str = &rest[minus_pos..];
        let modifier: i32 = mod_str
            .parse()
            .map_err(|_| invalid(format!("invalid modifier: {}", mod_str)))?;
        (&rest[..minus_pos], modifier)
    } else {
        (rest, 0)
    };

    let sides: u32 = sides_str
        .parse()
        .map_err(|_| invalid(format!("invalid die sides: {}", sides_str)))?;

    if sides == 0 {
        return Err(DiceError::InvalidDie { sides });
    }

    Ok(DiceSpec {
        count,
        sides,
        modifier,
    })
}
