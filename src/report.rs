//! Attack reports - turns a batch result into a chat message

use serde::Serialize;

use crate::bestiary::{ActionSpec, CreatureSpec};
use crate::combat::{AttackMode, AttackOutcome, BatchResult, DiceOutcome};

/// A titled entry in a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportField {
    pub name: String,
    pub value: String,
}

/// Embed-style summary of one attack command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttackReport {
    pub title: String,
    pub description: String,
    pub fields: Vec<ReportField>,
}

/// Everything a report needs besides the batch itself
#[derive(Debug, Clone, Copy)]
pub struct ReportContext<'a> {
    pub creature: &'a CreatureSpec,
    pub action: &'a ActionSpec,
    pub mode: AttackMode,
    pub target_ac: i32,
    pub display_limit: usize,
}

impl AttackReport {
    pub fn build(ctx: ReportContext<'_>, result: &BatchResult) -> Self {
        let count = result.count();
        let creature = &ctx.creature.name;

        let mut fields: Vec<ReportField> = result
            .outcomes
            .iter()
            .take(ctx.display_limit)
            .enumerate()
            .map(|(i, outcome)| attacker_field(creature, i + 1, ctx.action, outcome))
            .collect();

        if result.outcomes.len() > ctx.display_limit {
            fields.push(ReportField {
                name: "⚠️ Results Truncated".to_string(),
                value: format!(
                    "Showing {} of {} attacks. See summary below.",
                    ctx.display_limit, count
                ),
            });
        }

        fields.push(ReportField {
            name: "📊 Summary".to_string(),
            value: format!(
                "Hits: {}/{}\nTotal Damage: {}\nCritical Hits: {} | Critical Fails: {}",
                result.total_hits,
                count,
                result.total_damage,
                result.total_crits,
                result.total_fumbles
            ),
        });

        Self {
            title: format!("⚔️ {}x {} Attack Rolls", count, creature),
            description: format!(
                "Action: {} | Target AC: {} | Attack Type: {}",
                ctx.action.name, ctx.target_ac, ctx.mode
            ),
            fields,
        }
    }

    /// Flatten into a plain-text message
    pub fn render_text(&self) -> String {
        let mut out = format!("{}\n{}\n", self.title, self.description);
        for field in &self.fields {
            out.push('\n');
            out.push_str(&field.name);
            out.push('\n');
            out.push_str(&field.value);
            out.push('\n');
        }
        out
    }
}

fn attacker_field(
    creature: &str,
    number: usize,
    action: &ActionSpec,
    outcome: &AttackOutcome,
) -> ReportField {
    let (color, status) = if outcome.is_critical_hit {
        ("🟡", "🎯 CRITICAL HIT!")
    } else if outcome.is_critical_miss {
        ("🔴", "💥 CRITICAL FAIL!")
    } else if outcome.is_hit {
        ("🟢", "✅ Hit")
    } else {
        ("⚪", "❌ Miss")
    };

    let dice = if outcome.raw_rolls.len() > 1 {
        format!("[{}]", join_rolls(&outcome.raw_rolls, ", "))
    } else {
        outcome.chosen_roll.to_string()
    };

    let mut value = format!(
        "🎲 {}{} = {}",
        dice,
        signed(action.attack_bonus),
        outcome.total_to_hit
    );
    if let Some(damage) = &outcome.damage {
        value.push_str(&format!(
            "\n💥 Damage: {} ({})",
            outcome.total_damage,
            damage_breakdown(damage)
        ));
    }

    ReportField {
        name: format!("{} {} #{} - {}", color, creature, number, status),
        value,
    }
}

/// "3+1+2" for rolls [3, 1] with bonus 2
pub fn damage_breakdown(damage: &DiceOutcome) -> String {
    let mut out = join_rolls(&damage.rolls, "+");
    if damage.bonus > 0 {
        out.push_str(&format!("+{}", damage.bonus));
    } else if damage.bonus < 0 {
        out.push_str(&damage.bonus.to_string());
    }
    out
}

fn join_rolls(rolls: &[u32], sep: &str) -> String {
    rolls
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(sep)
}

/// " + 4", " - 2", or nothing for zero
fn signed(value: i32) -> String {
    match value {
        0 => String::new(),
        v if v > 0 => format!(" + {}", v),
        v => format!(" - {}", v.unsigned_abs()),
    }
}
