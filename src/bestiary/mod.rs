//! Bestiary - the creature table the bot attacks with
//!
//! Loaded once at startup from a JSON file of the shape:
//!
//! ```json
//! {
//!   "wolf": {
//!     "default_action": "bite",
//!     "actions": {
//!       "bite": { "attack_bonus": 4, "damage": { "count": 2, "sides": 4, "bonus": 2 } }
//!     }
//!   }
//! }
//! ```
//!
//! Shape and semantic problems are reported as a single [`BestiaryError`]
//! before the engine ever sees the data.

mod creature;
mod registry;

use std::path::PathBuf;

use thiserror::Error;

pub use creature::{
    ActionSpec, CreatureSpec, DamageSpec, MAX_DAMAGE_DICE, MAX_DIE_SIDES, MAX_MODIFIER,
};
pub use registry::Bestiary;

/// Errors from loading or validating a creature table
#[derive(Debug, Error)]
pub enum BestiaryError {
    #[error("failed to read creature file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed creature file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid creature '{creature}': {reason}")]
    Invalid { creature: String, reason: String },
}

impl BestiaryError {
    pub(crate) fn invalid(creature: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            creature: creature.to_string(),
            reason: reason.into(),
        }
    }
}
