//! Batch resolution for a group of identical attackers

use serde::Serialize;
use tracing::debug;

use super::attack::{resolve_attack, AttackMode, AttackOutcome};
use super::dice::DieSource;
use super::CombatError;
use crate::bestiary::CreatureSpec;

/// Outcomes for every attacker plus the aggregate totals
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    /// In attacker order, starting with attacker #1
    pub outcomes: Vec<AttackOutcome>,
    pub total_hits: u32,
    pub total_damage: i64,
    pub total_crits: u32,
    pub total_fumbles: u32,
}

impl BatchResult {
    /// Reduce a list of outcomes into totals
    pub fn from_outcomes(outcomes: Vec<AttackOutcome>) -> Self {
        let mut total_hits = 0;
        let mut total_damage = 0i64;
        let mut total_crits = 0;
        let mut total_fumbles = 0;

        for outcome in &outcomes {
            if outcome.is_hit {
                total_hits += 1;
            }
            if outcome.is_critical_hit {
                total_crits += 1;
            }
            if outcome.is_critical_miss {
                total_fumbles += 1;
            }
            total_damage += i64::from(outcome.total_damage);
        }

        Self {
            outcomes,
            total_hits,
            total_damage,
            total_crits,
            total_fumbles,
        }
    }

    /// Number of attackers
    pub fn count(&self) -> u32 {
        self.outcomes.len() as u32
    }

    pub fn total_misses(&self) -> u32 {
        self.count() - self.total_hits
    }
}

/// Check a requested attacker count against `max`, returning it as a batch size
pub fn check_count(count: i64, max: u32) -> Result<u32, CombatError> {
    if count < 1 {
        return Err(CombatError::InvalidCount { count });
    }
    if count > i64::from(max) {
        return Err(CombatError::TooManyAttackers { count, max });
    }
    Ok(count as u32)
}

/// Resolve `count` identical attacks by `creature`.
///
/// Callers bound `count` with [`check_count`]; outcomes are kept for every
/// attacker.
///
/// `action_name` selects one of the creature's actions; `None` uses its
/// default action.
pub fn resolve_batch<S: DieSource + ?Sized>(
    source: &mut S,
    creature: &CreatureSpec,
    action_name: Option<&str>,
    mode: AttackMode,
    target_ac: i32,
    count: u32,
) -> Result<BatchResult, CombatError> {
    let action = creature.resolve_action(action_name)?;

    if count < 1 {
        return Err(CombatError::InvalidCount {
            count: i64::from(count),
        });
    }

    let outcomes = (0..count)
        .map(|_| resolve_attack(source, action, mode, target_ac))
        .collect::<Result<Vec<_>, _>>()?;

    let result = BatchResult::from_outcomes(outcomes);
    debug!(
        creature = %creature.name,
        action = %action.name,
        %mode,
        target_ac,
        count,
        hits = result.total_hits,
        damage = result.total_damage,
        "resolved attack batch"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bestiary::{ActionSpec, DamageSpec};
    use crate::combat::{RandomDice, ScriptedDice};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn wolf() -> CreatureSpec {
        CreatureSpec::new(
            "Wolf",
            "bite",
            vec![
                ActionSpec::new("bite", 4, DamageSpec::new(2, 4, 2)),
                ActionSpec::new("pounce", 2, DamageSpec::new(1, 6, 0)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_batch_count_and_order() {
        // Attacker faces: 16 hit (dmg 1,2), 3 miss, 20 crit (dmg 1,1,1,1), 1 fumble, 12 miss
        let mut dice = ScriptedDice::new([16, 1, 2, 3, 20, 1, 1, 1, 1, 1, 12]);
        let result =
            resolve_batch(&mut dice, &wolf(), None, AttackMode::Standard, 17, 5).unwrap();

        assert_eq!(result.outcomes.len(), 5);
        let chosen: Vec<u32> = result.outcomes.iter().map(|o| o.chosen_roll).collect();
        assert_eq!(chosen, vec![16, 3, 20, 1, 12]);

        assert_eq!(result.total_hits, 2);
        assert_eq!(result.total_misses(), 3);
        assert_eq!(result.total_hits + result.total_misses(), 5);
        assert_eq!(result.total_crits, 1);
        assert_eq!(result.total_fumbles, 1);
        assert_eq!(result.total_damage, (1 + 2 + 2) + (1 + 1 + 1 + 1 + 2));
    }

    #[test]
    fn test_batch_with_random_source() {
        let mut dice = RandomDice::new(StdRng::seed_from_u64(99));
        let result =
            resolve_batch(&mut dice, &wolf(), None, AttackMode::Standard, 13, 5).unwrap();
        assert_eq!(result.outcomes.len(), 5);
        assert_eq!(result.total_hits + result.total_misses(), 5);
        let hits = result.outcomes.iter().filter(|o| o.is_hit).count() as u32;
        assert_eq!(hits, result.total_hits);
    }

    #[test]
    fn test_batch_is_reproducible_with_fixed_seed() {
        let creature = wolf();
        let run = |seed| {
            let mut dice = RandomDice::new(StdRng::seed_from_u64(seed));
            resolve_batch(&mut dice, &creature, None, AttackMode::Advantage, 14, 8).unwrap()
        };
        assert_eq!(run(5), run(5));
    }

    #[test]
    fn test_batch_zero_count() {
        let mut dice = ScriptedDice::new([10]);
        let err = resolve_batch(&mut dice, &wolf(), None, AttackMode::Standard, 15, 0).unwrap_err();
        assert!(matches!(err, CombatError::InvalidCount { count: 0 }));
    }

    #[test]
    fn test_check_count_bounds() {
        assert_eq!(check_count(1, 100), Ok(1));
        assert_eq!(check_count(100, 100), Ok(100));
        assert_eq!(check_count(0, 100), Err(CombatError::InvalidCount { count: 0 }));
        assert_eq!(check_count(-4, 100), Err(CombatError::InvalidCount { count: -4 }));
        assert_eq!(
            check_count(4_000_000_000, 100),
            Err(CombatError::TooManyAttackers {
                count: 4_000_000_000,
                max: 100
            })
        );
    }

    #[test]
    fn test_batch_unknown_action() {
        let mut dice = ScriptedDice::new([10]);
        let err = resolve_batch(
            &mut dice,
            &wolf(),
            Some("howl"),
            AttackMode::Standard,
            15,
            3,
        )
        .unwrap_err();
        match err {
            CombatError::UnknownAction {
                creature,
                action,
                available,
            } => {
                assert_eq!(creature, "Wolf");
                assert_eq!(action, "howl");
                assert_eq!(available, vec!["bite".to_string(), "pounce".to_string()]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_batch_named_action() {
        // pounce: +2 to hit, 1d6
        let mut dice = ScriptedDice::new([13, 6]);
        let result = resolve_batch(
            &mut dice,
            &wolf(),
            Some("pounce"),
            AttackMode::Standard,
            15,
            1,
        )
        .unwrap();
        assert_eq!(result.outcomes[0].total_to_hit, 15);
        assert_eq!(result.total_damage, 6);
    }

    #[test]
    fn test_totals_recomputable_from_outcomes() {
        let mut dice = RandomDice::new(StdRng::seed_from_u64(11));
        let result =
            resolve_batch(&mut dice, &wolf(), None, AttackMode::Disadvantage, 12, 20).unwrap();
        let recomputed = BatchResult::from_outcomes(result.outcomes.clone());
        assert_eq!(recomputed, result);
    }
}
