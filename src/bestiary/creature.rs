//! Creature and action definitions

use std::collections::BTreeMap;

use serde::Serialize;

use super::BestiaryError;
use crate::combat::{CombatError, DiceSpec};

/// Damage dealt by an action: dice count, die size and flat bonus
pub type DamageSpec = DiceSpec;

/// Largest attack or damage bonus, in either direction
pub const MAX_MODIFIER: i32 = 1000;
/// Most damage dice a single action may roll
pub const MAX_DAMAGE_DICE: u32 = 100;
/// Largest die an action may roll
pub const MAX_DIE_SIDES: u32 = 1000;

/// One attack a creature can make
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionSpec {
    /// Action name (e.g. "bite")
    pub name: String,
    /// Flat modifier added to the to-hit roll
    pub attack_bonus: i32,
    /// Damage rolled on a hit
    pub damage: DamageSpec,
}

impl ActionSpec {
    pub fn new(name: impl Into<String>, attack_bonus: i32, damage: DamageSpec) -> Self {
        Self {
            name: name.into(),
            attack_bonus,
            damage,
        }
    }
}

/// A creature with its attacks
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatureSpec {
    /// Display name
    pub name: String,
    default_action: String,
    actions: BTreeMap<String, ActionSpec>,
}

impl CreatureSpec {
    /// Build a creature, checking that `default_action` names one of `actions`
    pub fn new(
        name: impl Into<String>,
        default_action: impl Into<String>,
        actions: impl IntoIterator<Item = ActionSpec>,
    ) -> Result<Self, BestiaryError> {
        let name = name.into();
        let default_action = default_action.into();

        let mut table = BTreeMap::new();
        for action in actions {
            if action.attack_bonus.unsigned_abs() > MAX_MODIFIER.unsigned_abs() {
                return Err(BestiaryError::invalid(
                    &name,
                    format!(
                        "action '{}' attack_bonus {} is outside ±{}",
                        action.name, action.attack_bonus, MAX_MODIFIER
                    ),
                ));
            }
            if action.damage.modifier.unsigned_abs() > MAX_MODIFIER.unsigned_abs() {
                return Err(BestiaryError::invalid(
                    &name,
                    format!(
                        "action '{}' damage bonus {} is outside ±{}",
                        action.name, action.damage.modifier, MAX_MODIFIER
                    ),
                ));
            }
            if action.damage.count > MAX_DAMAGE_DICE || action.damage.sides > MAX_DIE_SIDES {
                return Err(BestiaryError::invalid(
                    &name,
                    format!(
                        "action '{}' damage {} exceeds {}d{}",
                        action.name, action.damage, MAX_DAMAGE_DICE, MAX_DIE_SIDES
                    ),
                ));
            }
            if action.damage.sides < 1 {
                return Err(BestiaryError::invalid(
                    &name,
                    format!("action '{}' has a die with no sides", action.name),
                ));
            }
            if action.damage.count < 1 {
                return Err(BestiaryError::invalid(
                    &name,
                    format!("action '{}' rolls no damage dice", action.name),
                ));
            }
            if table.insert(action.name.clone(), action).is_some() {
                return Err(BestiaryError::invalid(&name, "duplicate action name"));
            }
        }

        if table.is_empty() {
            return Err(BestiaryError::invalid(&name, "no actions defined"));
        }
        if !table.contains_key(&default_action) {
            return Err(BestiaryError::invalid(
                &name,
                format!("default action '{}' is not one of its actions", default_action),
            ));
        }

        Ok(Self {
            name,
            default_action,
            actions: table,
        })
    }

    pub fn default_action_name(&self) -> &str {
        &self.default_action
    }

    /// All actions, sorted by name
    pub fn actions(&self) -> impl Iterator<Item = &ActionSpec> {
        self.actions.values()
    }

    pub fn action_names(&self) -> Vec<String> {
        self.actions.keys().cloned().collect()
    }

    /// Pick the named action, or the default when `name` is `None`.
    ///
    /// Names match exactly first, then ignoring case.
    pub fn resolve_action(&self, name: Option<&str>) -> Result<&ActionSpec, CombatError> {
        let wanted = name.unwrap_or(&self.default_action);

        self.actions
            .get(wanted)
            .or_else(|| {
                self.actions
                    .values()
                    .find(|a| a.name.eq_ignore_ascii_case(wanted))
            })
            .ok_or_else(|| CombatError::UnknownAction {
                creature: self.name.clone(),
                action: wanted.to_string(),
                available: self.action_names(),
            })
    }
}
