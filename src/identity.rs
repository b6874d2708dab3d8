//! Player resolution for Armada commands.
//!
//! Every command that dispatches fleets, ticks, or reads messages acts as
//! some player. Rather than requiring `--player` on every invocation, the
//! player is resolved through a chain:
//!
//! 1. `--player <id>`: explicit per-command override
//! 2. `ARMADA_PLAYER` env var: session level
//! 3. `player = ...` in `~/.armada/config.toml`: default for a single player

use std::env;

use crate::config::Config;
use crate::model::PlayerId;

/// Error message shown when no player can be resolved.
pub const PLAYER_REQUIRED: &str = "player required: pass --player <id>, \
    set ARMADA_PLAYER, or add `player = ...` to ~/.armada/config.toml";

/// Resolve the acting player from the tiered resolution chain.
pub fn resolve_player(explicit: Option<i64>, config: &Config) -> Result<PlayerId, String> {
    resolve_from(explicit, env::var("ARMADA_PLAYER").ok(), config)
}

fn resolve_from(
    explicit: Option<i64>,
    from_env: Option<String>,
    config: &Config,
) -> Result<PlayerId, String> {
    if let Some(id) = explicit {
        return Ok(PlayerId(id));
    }

    if let Some(raw) = from_env.filter(|s| !s.trim().is_empty()) {
        return raw
            .trim()
            .parse()
            .map(PlayerId)
            .map_err(|e| format!("invalid ARMADA_PLAYER '{raw}': {e}"));
    }

    config
        .player
        .map(PlayerId)
        .ok_or_else(|| PLAYER_REQUIRED.to_string())
}
