//! Colonization: a colony ship settles an empty planet slot.

use rand::{Rng, RngCore};

use crate::mission::feasibility::{Check, FeasibilityCheck, MissionPossibleStatus, carries, verdict};
use crate::mission::transition::{ArrivalContext, Effect};
use crate::model::{
    BodyType, FleetMission, MessageKind, MissionType, NewPlanet, Resources, UnitCollection,
    UnitKind,
};

use super::{Arrival, MissionStrategy, Payload, notify, return_home, route};

pub static STRATEGY: MissionStrategy = MissionStrategy {
    mission_type: MissionType::Colonization,
    has_return_mission: true,
    is_mission_possible,
    process_arrival,
    process_return: return_home,
};

/// Diameter range of freshly settled planets.
const COLONY_DIAMETER: std::ops::RangeInclusive<u64> = 8_000..=16_000;

fn is_mission_possible(check: &FeasibilityCheck<'_>) -> MissionPossibleStatus {
    verdict(checks(check))
}

fn checks(check: &FeasibilityCheck<'_>) -> Check {
    if check.target_body != BodyType::Planet {
        return Err(MissionPossibleStatus::refused("only planets can be colonised"));
    }
    if check.target.position > check.universe.positions {
        return Err(MissionPossibleStatus::refused(format!(
            "{} is not a planet slot",
            check.target
        )));
    }
    if check.target_planet.is_some() {
        return Err(MissionPossibleStatus::refused(format!(
            "{} is already colonised",
            check.target
        )));
    }
    if check.units.amount(UnitKind::ColonyShip) > 1 {
        return Err(MissionPossibleStatus::refused("send exactly one colony ship"));
    }
    carries(check, UnitKind::ColonyShip)?;
    if check.planet_count >= check.universe.max_planets {
        return Err(MissionPossibleStatus::refused("the planet limit has been reached"));
    }
    Ok(())
}

/// Why a colony cannot be founded right now, if it cannot.
fn obstacle(mission: &FleetMission, ctx: &ArrivalContext<'_>) -> Option<&'static str> {
    if ctx.target.is_some() {
        Some("the planet has been colonised in the meantime")
    } else if ctx.planet_count >= ctx.universe.max_planets {
        Some("the planet limit has been reached")
    } else if mission.units.amount(UnitKind::ColonyShip) == 0 {
        Some("the fleet carries no colony ship")
    } else {
        None
    }
}

fn process_arrival(
    mission: &FleetMission,
    ctx: &ArrivalContext<'_>,
    rng: &mut dyn RngCore,
) -> Arrival {
    if let Some(reason) = obstacle(mission, ctx) {
        let mut params = route(mission);
        params.insert("reason".into(), reason.into());
        return Arrival {
            effects: vec![notify(mission.player_id, MessageKind::ColonyFailed, params, ctx)],
            returning: Some(Payload::of(mission)),
        };
    }

    let colony = NewPlanet {
        player_id: mission.player_id,
        name: "Colony".into(),
        coordinate: mission.destination,
        body_type: BodyType::Planet,
        diameter: rng.gen_range(COLONY_DIAMETER),
        resources: mission.resources,
        units: UnitCollection::new(),
    };
    let remaining = mission
        .units
        .subtract(&UnitCollection::new().with(UnitKind::ColonyShip, 1))
        .unwrap_or_default();

    Arrival {
        effects: vec![
            Effect::CreatePlanet(colony),
            notify(
                mission.player_id,
                MessageKind::ColonyEstablished,
                route(mission),
                ctx,
            ),
        ],
        returning: Some(Payload {
            units: remaining,
            resources: Resources::ZERO,
        }),
    }
}
