//! Recycle: recyclers scoop up a debris field and haul it home.

use rand::RngCore;

use crate::mission::feasibility::{Check, FeasibilityCheck, MissionPossibleStatus, carries, verdict};
use crate::mission::transition::{ArrivalContext, Effect};
use crate::model::{
    BodyType, FleetMission, MessageKind, MissionType, Resources, UnitKind, with_resources,
};

use super::{Arrival, MissionStrategy, Payload, notify, return_home, route};

pub static STRATEGY: MissionStrategy = MissionStrategy {
    mission_type: MissionType::Recycle,
    has_return_mission: true,
    is_mission_possible,
    process_arrival,
    process_return: return_home,
};

fn is_mission_possible(check: &FeasibilityCheck<'_>) -> MissionPossibleStatus {
    verdict(checks(check))
}

fn checks(check: &FeasibilityCheck<'_>) -> Check {
    if check.target_body != BodyType::DebrisField {
        return Err(MissionPossibleStatus::refused(
            "recyclers can only be sent to debris fields",
        ));
    }
    if check.debris.is_none_or(|d| d.resources.sum() == 0) {
        return Err(MissionPossibleStatus::refused(format!(
            "there is no debris at {}",
            check.target
        )));
    }
    carries(check, UnitKind::Recycler)
}

fn process_arrival(
    mission: &FleetMission,
    ctx: &ArrivalContext<'_>,
    _rng: &mut dyn RngCore,
) -> Arrival {
    // Only recyclers collect; other ships' holds stay as they are.
    let free = mission
        .units
        .only(UnitKind::Recycler)
        .cargo_capacity()
        .saturating_sub(mission.resources.sum());
    let harvested = ctx
        .debris
        .map_or(Resources::ZERO, |d| d.resources.fit_into(free));

    let mut effects = Vec::with_capacity(2);
    if harvested.sum() > 0 {
        effects.push(Effect::RemoveDebris {
            coordinate: mission.destination,
            resources: harvested,
        });
    }
    effects.push(notify(
        mission.player_id,
        MessageKind::DebrisHarvested,
        with_resources(route(mission), &harvested),
        ctx,
    ));

    Arrival {
        effects,
        returning: Some(Payload {
            units: mission.units.clone(),
            resources: mission.resources.add(&harvested),
        }),
    }
}
