//! Core data model for Armada.
//!
//! Coordinates, resources, units, planets, fleet missions, and the
//! system messages players receive about them.

mod coordinate;
mod message;
mod mission;
mod planet;
mod resources;
mod units;

pub use coordinate::{BodyType, Coordinate};
pub use message::{Message, MessageKind, MessageParams, params, with_resources};
pub use mission::{FleetMission, MissionId, MissionState, MissionType, NewMission};
pub use planet::{DebrisField, NewPlanet, Planet, PlanetId, PlayerId};
pub use resources::{InsufficientResources, Resources};
pub use units::{InsufficientUnits, UnitCollection, UnitKind, UnitStack, UnitStats};
