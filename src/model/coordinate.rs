//! Galaxy coordinates and the kinds of bodies found at them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A slot in the universe: `galaxy:system:position`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    pub galaxy: u32,
    pub system: u32,
    pub position: u32,
}

impl Coordinate {
    pub const fn new(galaxy: u32, system: u32, position: u32) -> Self {
        Self {
            galaxy,
            system,
            position,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.galaxy, self.system, self.position)
    }
}

impl FromStr for Coordinate {
    type Err = String;

    /// Parses `1:2:3`, optionally wrapped in brackets (`[1:2:3]`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('[').trim_end_matches(']');
        let parts: Vec<&str> = trimmed.split(':').collect();
        let [galaxy, system, position] = parts.as_slice() else {
            return Err(format!("expected galaxy:system:position, got '{s}'"));
        };
        let parse = |label: &str, value: &str| {
            value
                .parse::<u32>()
                .map_err(|e| format!("invalid {label} in '{s}': {e}"))
        };
        Ok(Self {
            galaxy: parse("galaxy", galaxy)?,
            system: parse("system", system)?,
            position: parse("position", position)?,
        })
    }
}

/// What occupies a coordinate. The numeric ids are the persisted form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyType {
    Planet,
    DebrisField,
    Moon,
}

impl BodyType {
    pub const fn id(self) -> i64 {
        match self {
            Self::Planet => 1,
            Self::DebrisField => 2,
            Self::Moon => 3,
        }
    }

    pub const fn from_id(id: i64) -> Option<Self> {
        match id {
            1 => Some(Self::Planet),
            2 => Some(Self::DebrisField),
            3 => Some(Self::Moon),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Planet => "planet",
            Self::DebrisField => "debris",
            Self::Moon => "moon",
        }
    }
}

impl fmt::Display for BodyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BodyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planet" => Ok(Self::Planet),
            "debris" | "debris_field" => Ok(Self::DebrisField),
            "moon" => Ok(Self::Moon),
            other => Err(format!("unknown body type: {other}")),
        }
    }
}
