//! dnd-attack - resolve one attack command from the terminal
//!
//! Uses the same creature table and report as the bot, without a server.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use clap::Parser;
use dnd_roller::bestiary::Bestiary;
use dnd_roller::combat::{check_count, resolve_batch, AttackMode, DieSource, RandomDice};
use dnd_roller::config::Limits;
use dnd_roller::report::{AttackReport, ReportContext};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Offline attack roller
#[derive(Parser, Debug)]
#[command(
    name = "dnd-attack",
    version,
    about = "Roll attacks for a group of creatures against a target AC",
    allow_negative_numbers = true
)]
struct Args {
    /// Creature table JSON
    #[arg(long, default_value = "config/creatures.json")]
    creatures: PathBuf,

    /// Seed for reproducible rolls
    #[arg(long)]
    seed: Option<u64>,

    /// Rows to show before truncating
    #[arg(long, default_value_t = Limits::default().display_limit)]
    display_limit: usize,

    /// Largest number of attackers allowed
    #[arg(long, default_value_t = Limits::default().max_attackers)]
    max_attackers: u32,

    /// Creature name (case-insensitive)
    creature: String,

    /// Number of attackers
    count: i64,

    /// Target armor class
    target_ac: i32,

    /// standard, advantage or disadvantage
    #[arg(default_value = "standard")]
    mode: String,

    /// Action to use instead of the creature's default
    action: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dnd_roller=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    run(&args, &mut std::io::stdout().lock())
}

/// Resolve the requested batch and write the text report to `out`
fn run(args: &Args, out: &mut impl Write) -> Result<()> {
    let count = check_count(args.count, args.max_attackers)?;
    if args.target_ac <= 0 {
        bail!("target AC must be positive");
    }
    let mode: AttackMode = args
        .mode
        .parse()
        .map_err(|_| anyhow!("attack type must be standard, advantage, or disadvantage"))?;

    let bestiary = Bestiary::load(&args.creatures)?;
    let creature = bestiary.get(&args.creature).ok_or_else(|| {
        anyhow!(
            "creature '{}' not found. Available: {}",
            args.creature,
            bestiary.names().join(", ")
        )
    })?;

    let mut dice: Box<dyn DieSource> = match args.seed {
        Some(seed) => Box::new(RandomDice::new(StdRng::seed_from_u64(seed))),
        None => Box::new(RandomDice::thread()),
    };

    let action = creature.resolve_action(args.action.as_deref())?;
    let result = resolve_batch(
        dice.as_mut(),
        creature,
        Some(action.name.as_str()),
        mode,
        args.target_ac,
        count,
    )?;

    let report = AttackReport::build(
        ReportContext {
            creature,
            action,
            mode,
            target_ac: args.target_ac,
            display_limit: args.display_limit,
        },
        &result,
    );
    write!(out, "{}", report.render_text())?;

    Ok(())
}
