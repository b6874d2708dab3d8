//! Planets, moons, players, and debris fields.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{BodyType, Coordinate, Resources, UnitCollection};

pub type PlanetId = i64;

/// A player account. Equality is the same-owner check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub i64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A planet or moon and everything stationed on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Planet {
    pub id: PlanetId,
    pub player_id: PlayerId,
    pub name: String,
    pub coordinate: Coordinate,
    pub body_type: BodyType,
    pub diameter: u64,
    pub resources: Resources,
    pub units: UnitCollection,
}

impl Planet {
    pub fn is_owned_by(&self, player: PlayerId) -> bool {
        self.player_id == player
    }
}

/// What is needed to found a planet. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPlanet {
    pub player_id: PlayerId,
    pub name: String,
    pub coordinate: Coordinate,
    pub body_type: BodyType,
    pub diameter: u64,
    pub resources: Resources,
    pub units: UnitCollection,
}

/// Wreckage floating at a coordinate, left behind by battles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebrisField {
    pub coordinate: Coordinate,
    pub resources: Resources,
}
