//! Whether a fleet may fly a given mission to a given target.
//!
//! Infeasibility is an answer, not an error: every check yields a
//! [`MissionPossibleStatus`] carrying the first reason that failed.

use crate::config::UniverseConfig;
use crate::model::{BodyType, Coordinate, DebrisField, Planet, UnitCollection, UnitKind};

/// Outcome of a feasibility check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissionPossibleStatus {
    pub possible: bool,
    pub reason: Option<String>,
    /// The refusal was because nothing lies at the target.
    pub target_missing: bool,
}

impl MissionPossibleStatus {
    pub fn possible() -> Self {
        Self {
            possible: true,
            reason: None,
            target_missing: false,
        }
    }

    pub fn refused(reason: impl Into<String>) -> Self {
        Self {
            possible: false,
            reason: Some(reason.into()),
            target_missing: false,
        }
    }

    fn missing(reason: impl Into<String>) -> Self {
        Self {
            target_missing: true,
            ..Self::refused(reason)
        }
    }
}

/// Everything a strategy needs to judge a dispatch.
#[derive(Debug, Clone, Copy)]
pub struct FeasibilityCheck<'a> {
    pub origin: &'a Planet,
    pub target: Coordinate,
    pub target_body: BodyType,
    /// The body currently at `target`, if any.
    pub target_planet: Option<&'a Planet>,
    pub debris: Option<&'a DebrisField>,
    pub units: &'a UnitCollection,
    /// Planets (not moons) the origin's owner holds.
    pub planet_count: u32,
    pub universe: &'a UniverseConfig,
}

/// Result of a single check; `Err` carries the refusal.
pub type Check = Result<(), MissionPossibleStatus>;

/// Checks shared by every mission type.
pub fn common(check: &FeasibilityCheck<'_>) -> Check {
    if check.units.is_empty() {
        return Err(MissionPossibleStatus::refused("no ships selected"));
    }
    if !check.units.only_mobile() {
        return Err(MissionPossibleStatus::refused(
            "only ships can leave a planet",
        ));
    }
    let u = check.universe;
    let t = check.target;
    let position_ok =
        (1..=u.positions).contains(&t.position) || t.position == u.expedition_position;
    if !(1..=u.galaxies).contains(&t.galaxy) || !(1..=u.systems).contains(&t.system) || !position_ok
    {
        return Err(MissionPossibleStatus::refused(format!(
            "{t} lies outside the universe"
        )));
    }
    if t == check.origin.coordinate && check.target_body == check.origin.body_type {
        return Err(MissionPossibleStatus::refused(
            "the fleet is already there",
        ));
    }
    Ok(())
}

/// Target must be a planet or moon.
pub fn body_is_planet_or_moon(check: &FeasibilityCheck<'_>) -> Check {
    match check.target_body {
        BodyType::Planet | BodyType::Moon => Ok(()),
        BodyType::DebrisField => Err(MissionPossibleStatus::refused(
            "this mission needs a planet or moon as target",
        )),
    }
}

/// Target body must exist; returns it.
pub fn existing_target<'a>(
    check: &FeasibilityCheck<'a>,
) -> Result<&'a Planet, MissionPossibleStatus> {
    check.target_planet.ok_or_else(|| {
        MissionPossibleStatus::missing(format!(
            "there is no {} at {}",
            check.target_body, check.target
        ))
    })
}

pub fn same_owner(check: &FeasibilityCheck<'_>, target: &Planet) -> Check {
    if target.player_id == check.origin.player_id {
        Ok(())
    } else {
        Err(MissionPossibleStatus::refused(
            "fleets can only be stationed on your own planets",
        ))
    }
}

pub fn foreign_owner(check: &FeasibilityCheck<'_>, target: &Planet) -> Check {
    if target.player_id == check.origin.player_id {
        Err(MissionPossibleStatus::refused("the target is one of your own planets"))
    } else {
        Ok(())
    }
}

pub fn carries(check: &FeasibilityCheck<'_>, unit: UnitKind) -> Check {
    if check.units.amount(unit) == 0 {
        Err(MissionPossibleStatus::refused(format!("the fleet needs at least one {unit}")))
    } else {
        Ok(())
    }
}

/// Collapses a chain of checks into a status.
pub fn verdict(result: Check) -> MissionPossibleStatus {
    result.err().unwrap_or_else(MissionPossibleStatus::possible)
}
