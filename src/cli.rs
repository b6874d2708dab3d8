//! CLI interface for Armada.
//!
//! Every subcommand is non-interactive: arguments in, plain text out.
//!
//! - `armada planet new|show|list|stock`: seed and inspect the universe.
//! - `armada fleet check|send|recall|list`: fly missions.
//! - `armada tick`: land every fleet that has arrived.
//! - `armada messages`: read the acting player's inbox.
//!
//! Commands that act for a player resolve it through `--player`,
//! `ARMADA_PLAYER`, or the config file. `--at` pins "now" to a fixed
//! instant so scripted sessions can fast-forward through flight times.

mod fleet;
mod format;
mod planet;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use jiff::Timestamp;

use armada::config::Config;
use armada::identity::resolve_player;
use armada::mission::MissionControl;
use armada::model::{PlayerId, Resources, UnitCollection, UnitKind};
use armada::storage::Storage;

use fleet::FleetCommand;
use planet::PlanetCommand;

/// Armada: dispatch fleets across a persistent universe.
#[derive(Debug, Parser)]
#[command(name = "armada", after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    /// Config file. Defaults to `~/.armada/config.toml`.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Acting player id.
    #[arg(long, global = true)]
    player: Option<i64>,

    /// Treat this instant as "now" (e.g. `2026-01-01T12:00:00Z`).
    #[arg(long, global = true)]
    at: Option<Timestamp>,

    #[command(subcommand)]
    pub command: Command,
}

const WORKFLOW_HELP: &str = r"Workflow: a transport run
  1. armada --player 1 planet new 1:1:1 --metal 1000 --deuterium 50 --unit small_cargo=5
  2. armada --player 1 planet new 1:1:2
  3. armada --player 1 fleet send --from 1 --to 1:1:2 --mission transport \
       --unit small_cargo=1 --metal 500
  4. armada --player 1 --at 2030-01-01T00:00:00Z tick
  5. armada --player 1 messages";

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create and inspect planets.
    Planet {
        #[command(subcommand)]
        command: PlanetCommand,
    },

    /// Check, send, recall, and list fleet missions.
    Fleet {
        #[command(subcommand)]
        command: FleetCommand,
    },

    /// Process every mission concerning the player that has arrived.
    Tick,

    /// Show the player's messages, oldest first.
    Messages {
        /// Mark everything shown as read.
        #[arg(long)]
        mark_read: bool,
    },
}

/// Cargo flags shared by commands that load or stock resources.
#[derive(Debug, Clone, Copy, Default, clap::Args)]
pub struct CargoArgs {
    #[arg(long, default_value_t = 0)]
    metal: u64,
    #[arg(long, default_value_t = 0)]
    crystal: u64,
    #[arg(long, default_value_t = 0)]
    deuterium: u64,
}

impl CargoArgs {
    fn to_domain(self) -> Resources {
        Resources::cargo(self.metal, self.crystal, self.deuterium)
    }
}

/// Parses `small_cargo=5`; a bare name means one unit.
fn parse_unit_stack(s: &str) -> Result<(UnitKind, u64), String> {
    let (name, amount) = s.split_once('=').unwrap_or((s, "1"));
    let unit: UnitKind = name.trim().parse()?;
    let amount = amount
        .trim()
        .parse()
        .map_err(|e| format!("invalid amount in '{s}': {e}"))?;
    Ok((unit, amount))
}

fn units_from(stacks: &[(UnitKind, u64)]) -> UnitCollection {
    stacks.iter().copied().collect()
}

/// Shared state for one invocation.
struct Session<'a> {
    config: &'a Config,
    storage: &'a Storage,
    player: Option<i64>,
    now: Timestamp,
}

impl Session<'_> {
    fn player(&self) -> Result<PlayerId, String> {
        resolve_player(self.player, self.config)
    }

    fn control(&self) -> MissionControl<'_> {
        MissionControl::new(self.storage, self.config.universe.clone())
    }
}

pub fn run(cli: Cli, config: &Config, storage: &Storage) -> Result<(), String> {
    let session = Session {
        config,
        storage,
        player: cli.player,
        now: cli.at.unwrap_or_else(Timestamp::now),
    };

    match cli.command {
        Command::Planet { command } => planet::run(&session, command),
        Command::Fleet { command } => fleet::run(&session, command),
        Command::Tick => cmd_tick(&session),
        Command::Messages { mark_read } => cmd_messages(&session, mark_read),
    }
}

fn cmd_tick(session: &Session<'_>) -> Result<(), String> {
    let player = session.player()?;
    let report = session
        .control()
        .process_due_missions(player, session.now)
        .map_err(|e| format!("tick failed: {e}"))?;

    if report.processed.is_empty() && report.failed.is_empty() {
        println!("Nothing due");
    }
    for id in &report.processed {
        println!("processed mission {id}");
    }
    for (id, reason) in &report.failed {
        println!("failed mission {id}: {reason}");
    }
    Ok(())
}

fn cmd_messages(session: &Session<'_>, mark_read: bool) -> Result<(), String> {
    let player = session.player()?;
    let messages = session
        .storage
        .messages_for_player(player)
        .map_err(|e| format!("failed to read messages: {e}"))?;

    if messages.is_empty() {
        println!("No messages");
    }
    for message in &messages {
        println!("{}", format::format_message(message));
    }

    if mark_read {
        session
            .storage
            .mark_messages_viewed(player)
            .map_err(|e| format!("failed to mark messages read: {e}"))?;
    }
    Ok(())
}
