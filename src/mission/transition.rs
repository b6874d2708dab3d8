//! Pure state transitions for fleet missions.
//!
//! A transition takes a mission row and what is known about its
//! surroundings, and returns the next row, the side effects to apply, and
//! any return leg to schedule. Nothing here touches the store or the clock;
//! the engine applies the result inside one transaction.

use jiff::{SignedDuration, Timestamp};
use rand::RngCore;

use crate::config::UniverseConfig;
use crate::model::{
    Coordinate, DebrisField, FleetMission, Message, MessageKind, NewMission, NewPlanet, Planet,
    PlanetId, Resources, UnitCollection, params,
};

use super::FleetError;
use super::strategy::{self, Payload};

/// A single change to the world, applied by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    AddResources {
        planet: PlanetId,
        resources: Resources,
    },
    SubtractResources {
        planet: PlanetId,
        resources: Resources,
    },
    AddUnits {
        planet: PlanetId,
        units: UnitCollection,
    },
    RemoveUnits {
        planet: PlanetId,
        units: UnitCollection,
    },
    Message(Message),
    AddDebris {
        coordinate: Coordinate,
        resources: Resources,
    },
    RemoveDebris {
        coordinate: Coordinate,
        resources: Resources,
    },
    CreatePlanet(NewPlanet),
    DestroyPlanet(PlanetId),
}

impl Effect {
    /// Credits a planet with a fleet's payload, skipping empty parts.
    pub fn deliver(planet: PlanetId, payload: &Payload) -> Vec<Self> {
        let mut effects = Vec::with_capacity(2);
        if !payload.units.is_empty() {
            effects.push(Self::AddUnits {
                planet,
                units: payload.units.clone(),
            });
        }
        if payload.resources.sum() > 0 {
            effects.push(Self::AddResources {
                planet,
                resources: payload.resources,
            });
        }
        effects
    }
}

/// The world around a mission when it lands.
#[derive(Debug, Clone, Copy)]
pub struct ArrivalContext<'a> {
    /// The body at the mission's destination, as it is now.
    pub target: Option<&'a Planet>,
    /// The planet the mission set out from, if it still stands.
    pub origin: Option<&'a Planet>,
    pub debris: Option<&'a DebrisField>,
    /// Planets (not moons) the mission's owner holds.
    pub planet_count: u32,
    pub universe: &'a UniverseConfig,
    pub now: Timestamp,
}

/// What a transition produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// The mission row after the transition.
    pub mission: FleetMission,
    pub effects: Vec<Effect>,
    /// Return leg to schedule, if any.
    pub spawn: Option<NewMission>,
}

/// Lands `mission`: an outbound leg runs its strategy's arrival, a return
/// leg brings the fleet home.
pub fn process(
    mission: &FleetMission,
    ctx: &ArrivalContext<'_>,
    rng: &mut dyn RngCore,
) -> Result<Transition, FleetError> {
    if mission.processed || mission.canceled {
        return Err(FleetError::InvalidMissionState(format!(
            "mission {} has already been completed",
            mission.id
        )));
    }
    let strategy = strategy::strategy_for(mission.mission_type);
    let next = FleetMission {
        processed: true,
        ..mission.clone()
    };

    if mission.is_return() {
        return Ok(Transition {
            mission: next,
            effects: (strategy.process_return)(mission, ctx),
            spawn: None,
        });
    }

    let arrival = (strategy.process_arrival)(mission, ctx, rng);
    let spawn = match arrival.returning {
        Some(payload) if strategy.has_return_mission && !payload.units.is_empty() => {
            let departure = mission.time_arrival;
            let arrival = later(departure, mission.duration_secs())?;
            Some(NewMission::return_of(
                mission,
                payload.units,
                payload.resources,
                departure,
                arrival,
            ))
        }
        _ => None,
    };

    Ok(Transition {
        mission: next,
        effects: arrival.effects,
        spawn,
    })
}

/// Turns an outbound flight around at `now`. The way back takes as long as
/// the fleet has been flying.
pub fn recall(mission: &FleetMission, now: Timestamp) -> Result<Transition, FleetError> {
    if mission.is_return() {
        return Err(FleetError::InvalidMissionState(format!(
            "mission {} is already on its way home",
            mission.id
        )));
    }
    if mission.canceled {
        return Err(FleetError::InvalidMissionState(format!(
            "mission {} has already been recalled",
            mission.id
        )));
    }
    if mission.processed || now >= mission.time_arrival {
        return Err(FleetError::InvalidMissionState(format!(
            "mission {} has already arrived",
            mission.id
        )));
    }

    let flown = now.min(mission.time_arrival).as_second() - mission.time_departure.as_second();
    let back = NewMission::return_of(
        mission,
        mission.units.clone(),
        mission.resources,
        now,
        later(now, flown.max(0))?,
    );
    let notice = Message::new(
        mission.player_id,
        MessageKind::FleetRecalled,
        params([
            ("mission", mission.mission_type.name().to_string()),
            ("from", format!("[{}]", mission.origin)),
            ("to", format!("[{}]", mission.destination)),
        ]),
        now,
    );

    Ok(Transition {
        mission: FleetMission {
            processed: true,
            canceled: true,
            ..mission.clone()
        },
        effects: vec![Effect::Message(notice)],
        spawn: Some(back),
    })
}

fn later(t: Timestamp, seconds: i64) -> Result<Timestamp, FleetError> {
    Ok(t.checked_add(SignedDuration::from_secs(seconds))?)
}
