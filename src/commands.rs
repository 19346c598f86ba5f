//! Chat command parsing and dispatch
//!
//! Commands look like `!attack "Brown Bear" 3 15 advantage Bite`. The prefix
//! and verbs come from [`Config`]; messages without the prefix are ignored.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use thiserror::Error;
use tracing::{debug, info};

use crate::bestiary::Bestiary;
use crate::combat::{
    check_count, parse_dice, resolve_batch, AttackMode, CombatError, DiceError, DieSource,
    RandomDice,
};
use crate::config::{AttackKeywords, CommandNames, Config, Limits};
use crate::report::{damage_breakdown, AttackReport, ReportContext};

/// Double-quoted argument or a bare word
static TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]*)"|(\S+)"#).unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Creature '{0}' not found. Use {1} to see available creatures.")]
    UnknownCreature(String, String),

    #[error("Attack type must be: {0}.")]
    InvalidMode(String),

    #[error("{name} must be {expected} (got '{value}').")]
    InvalidArgument {
        name: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("Usage: {0}")]
    Usage(String),

    #[error("Unterminated quote in command.")]
    UnbalancedQuotes,

    #[error("Unknown command '{0}'. Try {1}.")]
    UnknownCommand(String, String),

    #[error("{0}")]
    Combat(#[from] CombatError),

    #[error("{0}")]
    Dice(#[from] DiceError),
}

/// Successful command output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Report(AttackReport),
    Text(String),
}

/// Split a command line into arguments, keeping quoted phrases together
pub fn tokenize(text: &str) -> Result<Vec<String>, CommandError> {
    if text.matches('"').count() % 2 != 0 {
        return Err(CommandError::UnbalancedQuotes);
    }

    Ok(TOKEN_REGEX
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .collect())
}

/// Routes chat commands to the attack engine
#[derive(Debug, Clone)]
pub struct Dispatcher {
    bestiary: Arc<Bestiary>,
    commands: CommandNames,
    attacks: AttackKeywords,
    limits: Limits,
}

impl Dispatcher {
    pub fn new(bestiary: Arc<Bestiary>, config: &Config) -> Self {
        Self {
            bestiary,
            commands: config.commands.clone(),
            attacks: config.attacks.clone(),
            limits: config.limits.clone(),
        }
    }

    pub fn bestiary(&self) -> &Bestiary {
        &self.bestiary
    }

    /// Handle a chat message with the thread-local RNG.
    ///
    /// Returns `None` when the message is not a command.
    pub fn dispatch(&self, text: &str) -> Option<Result<Reply, CommandError>> {
        self.dispatch_with(&mut RandomDice::thread(), text)
    }

    /// Handle a chat message, rolling dice from `source`
    pub fn dispatch_with<S: DieSource + ?Sized>(
        &self,
        source: &mut S,
        text: &str,
    ) -> Option<Result<Reply, CommandError>> {
        let body = text.trim().strip_prefix(self.commands.prefix.as_str())?;
        if body.trim().is_empty() {
            return None;
        }

        Some(self.execute(source, body))
    }

    fn execute<S: DieSource + ?Sized>(
        &self,
        source: &mut S,
        body: &str,
    ) -> Result<Reply, CommandError> {
        let args = tokenize(body)?;
        let Some((verb, rest)) = args.split_first() else {
            return Err(CommandError::Usage(self.help_text()));
        };

        let verb = verb.to_lowercase();
        debug!(%verb, args = ?rest, "dispatching command");

        if verb == self.commands.attack.to_lowercase() {
            self.attack(source, rest)
        } else if verb == self.commands.roll.to_lowercase() {
            self.roll(source, rest)
        } else if verb == self.commands.creatures.to_lowercase() {
            Ok(Reply::Text(self.creature_list()))
        } else if verb == self.commands.help.to_lowercase() {
            Ok(Reply::Text(self.help_text()))
        } else {
            Err(CommandError::UnknownCommand(
                verb,
                self.command(&self.commands.help),
            ))
        }
    }

    fn attack<S: DieSource + ?Sized>(
        &self,
        source: &mut S,
        args: &[String],
    ) -> Result<Reply, CommandError> {
        if args.len() < 3 || args.len() > 5 {
            return Err(CommandError::Usage(self.attack_usage()));
        }

        let creature_name = &args[0];
        let creature = self.bestiary.get(creature_name).ok_or_else(|| {
            CommandError::UnknownCreature(
                creature_name.clone(),
                self.command(&self.commands.creatures),
            )
        })?;

        let count: i64 = args[1].parse().map_err(|_| CommandError::InvalidArgument {
            name: "Count",
            expected: "a whole number",
            value: args[1].clone(),
        })?;
        let count = check_count(count, self.limits.max_attackers)?;

        let target_ac: i32 = args[2]
            .parse()
            .ok()
            .filter(|&ac| ac > 0)
            .ok_or_else(|| CommandError::InvalidArgument {
                name: "Target AC",
                expected: "a positive whole number",
                value: args[2].clone(),
            })?;

        let mode = match args.get(3) {
            Some(word) => self
                .attacks
                .parse(word)
                .ok_or_else(|| CommandError::InvalidMode(self.mode_list()))?,
            None => Default::default(),
        };

        let action_name = args.get(4).map(String::as_str);
        let action = creature.resolve_action(action_name)?;

        let result = resolve_batch(
            source,
            creature,
            Some(action.name.as_str()),
            mode,
            target_ac,
            count,
        )?;

        info!(
            creature = %creature.name,
            action = %action.name,
            %mode,
            target_ac,
            count,
            hits = result.total_hits,
            damage = result.total_damage,
            "attack resolved"
        );

        Ok(Reply::Report(AttackReport::build(
            ReportContext {
                creature,
                action,
                mode,
                target_ac,
                display_limit: self.limits.display_limit,
            },
            &result,
        )))
    }

    fn roll<S: DieSource + ?Sized>(
        &self,
        source: &mut S,
        args: &[String],
    ) -> Result<Reply, CommandError> {
        if args.is_empty() {
            return Err(CommandError::Usage(format!(
                "{} <dice>, e.g. {} 2d6+3",
                self.command(&self.commands.roll),
                self.command(&self.commands.roll)
            )));
        }

        // Allow "2d6 + 3" as well as "2d6+3"
        let notation = args.concat();
        let spec = parse_dice(&notation)?;
        if spec.count > self.limits.max_attackers {
            return Err(CommandError::InvalidArgument {
                name: "Dice count",
                expected: "at most the attacker limit",
                value: spec.count.to_string(),
            });
        }

        let outcome = spec.roll(source)?;
        Ok(Reply::Text(format!(
            "🎲 {}: {} = {}",
            spec,
            damage_breakdown(&outcome),
            outcome.total
        )))
    }

    /// Creatures with their actions; the default action is starred
    pub fn creature_list(&self) -> String {
        if self.bestiary.is_empty() {
            return "No creatures are configured.".to_string();
        }

        let mut out = String::from("Available creatures:");
        for creature in self.bestiary.creatures() {
            out.push_str(&format!("\n{}:", creature.name));
            for action in creature.actions() {
                let marker = if action.name == creature.default_action_name() {
                    "*"
                } else {
                    ""
                };
                out.push_str(&format!(
                    " {}{} ({:+}, {})",
                    action.name, marker, action.attack_bonus, action.damage
                ));
            }
        }
        out.push_str("\n(* = default action)");
        out
    }

    pub fn help_text(&self) -> String {
        format!(
            "Commands:\n{}\n{} <dice>\n{}\n{}",
            self.attack_usage(),
            self.command(&self.commands.roll),
            self.command(&self.commands.creatures),
            self.command(&self.commands.help)
        )
    }

    fn attack_usage(&self) -> String {
        format!(
            "{} <creature> <count> <target_ac> [{}] [action]",
            self.command(&self.commands.attack),
            AttackMode::all()
                .iter()
                .map(|&mode| self.attacks.keyword(mode))
                .collect::<Vec<_>>()
                .join("|")
        )
    }

    fn mode_list(&self) -> String {
        format!(
            "{}, {}, or {}",
            self.attacks.standard, self.attacks.advantage, self.attacks.disadvantage
        )
    }

    fn command(&self, verb: &str) -> String {
        format!("{}{}", self.commands.prefix, verb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bestiary::{ActionSpec, CreatureSpec, DamageSpec};
    use crate::combat::ScriptedDice;

    fn dispatcher() -> Dispatcher {
        let bestiary = Bestiary::from_creatures(vec![
            CreatureSpec::new(
                "Wolf",
                "bite",
                vec![ActionSpec::new("bite", 4, DamageSpec::new(2, 4, 2))],
            )
            .unwrap(),
            CreatureSpec::new(
                "Brown Bear",
                "Claws",
                vec![
                    ActionSpec::new("Bite", 5, DamageSpec::new(1, 8, 4)),
                    ActionSpec::new("Claws", 5, DamageSpec::new(2, 6, 4)),
                ],
            )
            .unwrap(),
        ])
        .unwrap();

        let mut config = Config::default();
        config.limits.max_attackers = 20;
        Dispatcher::new(Arc::new(bestiary), &config)
    }

    fn run(text: &str, faces: Vec<u32>) -> Result<Reply, CommandError> {
        let mut dice = ScriptedDice::new(faces);
        dispatcher()
            .dispatch_with(&mut dice, text)
            .expect("message should be a command")
    }

    fn report(reply: Reply) -> AttackReport {
        match reply {
            Reply::Report(report) => report,
            other => panic!("expected report, got {:?}", other),
        }
    }

    #[test]
    fn test_tokenize_quotes() {
        assert_eq!(
            tokenize(r#"attack "Brown Bear" 2 16 standard Claws"#).unwrap(),
            vec!["attack", "Brown Bear", "2", "16", "standard", "Claws"]
        );
        assert_eq!(tokenize("  roll   2d6  ").unwrap(), vec!["roll", "2d6"]);
        assert_eq!(
            tokenize(r#"attack "Brown Bear 2"#),
            Err(CommandError::UnbalancedQuotes)
        );
    }

    #[test]
    fn test_non_commands_ignored() {
        let d = dispatcher();
        assert!(d.dispatch("hello there").is_none());
        assert!(d.dispatch("!").is_none());
        assert!(d.dispatch("   ").is_none());
    }

    #[test]
    fn test_attack_wolf_hits() {
        let report = report(run("!attack wolf 1 15", vec![16, 3, 2]).unwrap());
        assert_eq!(report.title, "⚔️ 1x Wolf Attack Rolls");
        assert!(report.fields[0].value.contains("Damage: 7 (3+2+2)"));
    }

    #[test]
    fn test_attack_quoted_name_mode_and_action() {
        let report = report(
            run(
                r#"!attack "brown bear" 2 16 advantage bite"#,
                vec![3, 11, 8, 2, 9],
            )
            .unwrap(),
        );
        assert_eq!(report.title, "⚔️ 2x Brown Bear Attack Rolls");
        assert_eq!(
            report.description,
            "Action: Bite | Target AC: 16 | Attack Type: Advantage"
        );
        // [3, 11] -> 16 hits for 8+4; [2, 9] -> 14 misses
        assert!(report.fields[0].value.contains("Damage: 12 (8+4)"));
        assert!(report.fields[1].name.contains("Miss"));
    }

    #[test]
    fn test_attack_unknown_creature() {
        let err = run("!attack dragon 1 15", vec![10]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Creature 'dragon' not found. Use !creatures to see available creatures."
        );
    }

    #[test]
    fn test_attack_unknown_action() {
        let err = run("!attack wolf 1 15 standard howl", vec![10]).unwrap_err();
        assert!(matches!(
            err,
            CommandError::Combat(CombatError::UnknownAction { .. })
        ));
        assert!(err.to_string().contains("Available: bite"));
    }

    #[test]
    fn test_attack_count_validation() {
        assert_eq!(
            run("!attack wolf 0 15", vec![10]).unwrap_err(),
            CommandError::Combat(CombatError::InvalidCount { count: 0 })
        );
        assert_eq!(
            run("!attack wolf -3 15", vec![10]).unwrap_err(),
            CommandError::Combat(CombatError::InvalidCount { count: -3 })
        );
        assert_eq!(
            run("!attack wolf 21 15", vec![10]).unwrap_err(),
            CommandError::Combat(CombatError::TooManyAttackers { count: 21, max: 20 })
        );
        assert_eq!(
            run("!attack wolf 4000000000 15", vec![10]).unwrap_err(),
            CommandError::Combat(CombatError::TooManyAttackers {
                count: 4_000_000_000,
                max: 20
            })
        );
        assert!(matches!(
            run("!attack wolf many 15", vec![10]).unwrap_err(),
            CommandError::InvalidArgument { name: "Count", .. }
        ));
    }

    #[test]
    fn test_attack_ac_and_mode_validation() {
        assert!(matches!(
            run("!attack wolf 1 0", vec![10]).unwrap_err(),
            CommandError::InvalidArgument { name: "Target AC", .. }
        ));
        assert_eq!(
            run("!attack wolf 1 15 sideways", vec![10]).unwrap_err().to_string(),
            "Attack type must be: standard, advantage, or disadvantage."
        );
        assert!(matches!(
            run("!attack wolf 1", vec![10]).unwrap_err(),
            CommandError::Usage(_)
        ));
    }

    #[test]
    fn test_roll_command() {
        let reply = run("!roll 2d6+3", vec![4, 5]).unwrap();
        assert_eq!(reply, Reply::Text("🎲 2d6+3: 4+5+3 = 12".to_string()));

        let reply = run("!roll 1d20 - 1", vec![7]).unwrap();
        assert_eq!(reply, Reply::Text("🎲 1d20-1: 7-1 = 6".to_string()));

        assert!(matches!(
            run("!roll banana", vec![1]).unwrap_err(),
            CommandError::Dice(DiceError::InvalidNotation(_))
        ));
    }

    #[test]
    fn test_creatures_and_help() {
        let Reply::Text(list) = run("!creatures", vec![1]).unwrap() else {
            panic!("expected text");
        };
        assert!(list.contains("Brown Bear: Bite (+5, 1d8+4) Claws* (+5, 2d6+4)"));
        assert!(list.contains("Wolf: bite* (+4, 2d4+2)"));

        let Reply::Text(help) = run("!HELP", vec![1]).unwrap() else {
            panic!("expected text");
        };
        assert!(help.contains("!attack <creature> <count> <target_ac>"));
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            run("!dance", vec![1]).unwrap_err().to_string(),
            "Unknown command 'dance'. Try !help."
        );
    }
}
