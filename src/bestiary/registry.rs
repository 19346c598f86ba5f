//! Creature registry and its JSON file format

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{ActionSpec, BestiaryError, CreatureSpec, DamageSpec};

/// Damage block as written in the file
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct DamageEntry {
    count: i64,
    sides: i64,
    #[serde(default)]
    bonus: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ActionEntry {
    attack_bonus: i64,
    damage: DamageEntry,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct CreatureEntry {
    default_action: String,
    actions: BTreeMap<String, ActionEntry>,
}

impl CreatureEntry {
    fn into_spec(self, name: &str) -> Result<CreatureSpec, BestiaryError> {
        let mut actions = Vec::with_capacity(self.actions.len());
        for (action_name, entry) in self.actions {
            let field = |what: &str, value: i64| {
                BestiaryError::invalid(
                    name,
                    format!("action '{}' has out-of-range {} ({})", action_name, what, value),
                )
            };

            let attack_bonus = i32::try_from(entry.attack_bonus)
                .map_err(|_| field("attack_bonus", entry.attack_bonus))?;
            let count = u32::try_from(entry.damage.count)
                .map_err(|_| field("damage count", entry.damage.count))?;
            let sides = u32::try_from(entry.damage.sides)
                .map_err(|_| field("damage sides", entry.damage.sides))?;
            let bonus = i32::try_from(entry.damage.bonus)
                .map_err(|_| field("damage bonus", entry.damage.bonus))?;

            actions.push(ActionSpec::new(
                action_name.clone(),
                attack_bonus,
                DamageSpec::new(count, sides, bonus),
            ));
        }

        CreatureSpec::new(name, self.default_action, actions)
    }

    fn from_spec(spec: &CreatureSpec) -> Self {
        let actions = spec
            .actions()
            .map(|a| {
                let entry = ActionEntry {
                    attack_bonus: i64::from(a.attack_bonus),
                    damage: DamageEntry {
                        count: i64::from(a.damage.count),
                        sides: i64::from(a.damage.sides),
                        bonus: i64::from(a.damage.modifier),
                    },
                };
                (a.name.clone(), entry)
            })
            .collect();

        Self {
            default_action: spec.default_action_name().to_string(),
            actions,
        }
    }
}

/// Immutable table of creatures, looked up case-insensitively
#[derive(Debug, Clone, Default)]
pub struct Bestiary {
    creatures: HashMap<String, CreatureSpec>,
}

impl Bestiary {
    /// Create an empty bestiary
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from already-validated creatures
    pub fn from_creatures(
        creatures: impl IntoIterator<Item = CreatureSpec>,
    ) -> Result<Self, BestiaryError> {
        let mut bestiary = Self::new();
        for creature in creatures {
            let key = creature.name.to_lowercase();
            if bestiary.creatures.contains_key(&key) {
                return Err(BestiaryError::invalid(
                    &creature.name,
                    "defined more than once (names are case-insensitive)",
                ));
            }
            bestiary.creatures.insert(key, creature);
        }
        Ok(bestiary)
    }

    /// Parse and validate a creature table from JSON text
    pub fn from_json_str(json: &str) -> Result<Self, BestiaryError> {
        let raw: BTreeMap<String, CreatureEntry> = serde_json::from_str(json)?;
        let creatures = raw
            .into_iter()
            .map(|(name, entry)| entry.into_spec(&name))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_creatures(creatures)
    }

    /// Load a creature table from a JSON file
    pub fn load(path: &Path) -> Result<Self, BestiaryError> {
        let json = std::fs::read_to_string(path).map_err(|source| BestiaryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let bestiary = Self::from_json_str(&json)?;
        info!(
            "Loaded {} creatures from {}",
            bestiary.len(),
            path.display()
        );
        Ok(bestiary)
    }

    /// Look up a creature by name, ignoring case
    pub fn get(&self, name: &str) -> Option<&CreatureSpec> {
        self.creatures.get(&name.to_lowercase())
    }

    /// All creatures, sorted by name
    pub fn creatures(&self) -> Vec<&CreatureSpec> {
        let mut all: Vec<&CreatureSpec> = self.creatures.values().collect();
        all.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        all
    }

    /// Creature display names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.creatures().into_iter().map(|c| c.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.creatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.creatures.is_empty()
    }

    /// Serialize back into the file format
    pub fn to_json_value(&self) -> serde_json::Value {
        let table: BTreeMap<&str, CreatureEntry> = self
            .creatures()
            .into_iter()
            .map(|c| (c.name.as_str(), CreatureEntry::from_spec(c)))
            .collect();
        serde_json::to_value(table).unwrap_or(serde_json::Value::Null)
    }
}
