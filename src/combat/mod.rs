//! Attack resolution engine
//!
//! Implements D&D 5e-style attack rolls with:
//! - Dice rolling (e.g., "2d6+3") against an injectable die source
//! - Standard, advantage and disadvantage to-hit rolls
//! - Critical hits (natural 20, doubled damage dice) and fumbles (natural 1)
//! - Batch resolution for groups of identical attackers

mod attack;
mod batch;
mod dice;

use thiserror::Error;

pub use attack::{resolve_attack, AttackMode, AttackOutcome};
pub use batch::{check_count, resolve_batch, BatchResult};
pub use dice::{
    is_critical, is_fumble, parse_dice, roll_d20, roll_die, roll_dice, D20Roll, DiceError,
    DiceOutcome, DiceSpec, DieSource, RandomDice, ScriptedDice, D20_SIDES,
};

/// Errors from resolving attacks
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CombatError {
    #[error("unknown action '{action}' for {creature}. Available: {}", available.join(", "))]
    UnknownAction {
        creature: String,
        action: String,
        available: Vec<String>,
    },

    #[error("invalid attacker count {count}: must be at least 1")]
    InvalidCount { count: i64 },

    #[error("too many attackers ({count}): the limit is {max}")]
    TooManyAttackers { count: i64, max: u32 },

    #[error(transparent)]
    Dice(#[from] DiceError),
}
