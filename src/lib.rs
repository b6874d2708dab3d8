//! Armada: the fleet mission lifecycle of a space strategy game.
//!
//! Fleets are checked for feasibility, dispatched with their cargo and fuel
//! debited, landed lazily when a player's view is refreshed, and brought
//! home on a spawned return leg. Everything persists in `SQLite`.

pub mod combat;
pub mod config;
pub mod identity;
pub mod mission;
pub mod model;
pub mod storage;
pub mod travel;
