//! Transport: carry goods to any planet and fly the empty fleet home.

use rand::RngCore;

use crate::mission::feasibility::{
    Check, FeasibilityCheck, MissionPossibleStatus, body_is_planet_or_moon, existing_target,
    verdict,
};
use crate::mission::transition::{ArrivalContext, Effect};
use crate::model::{FleetMission, MessageKind, MissionType, Resources, with_resources};

use super::{Arrival, MissionStrategy, Payload, notify, return_home, route};

pub static STRATEGY: MissionStrategy = MissionStrategy {
    mission_type: MissionType::Transport,
    has_return_mission: true,
    is_mission_possible,
    process_arrival,
    process_return: return_home,
};

fn is_mission_possible(check: &FeasibilityCheck<'_>) -> MissionPossibleStatus {
    verdict(checks(check))
}

fn checks(check: &FeasibilityCheck<'_>) -> Check {
    body_is_planet_or_moon(check)?;
    existing_target(check).map(|_| ())
}

fn process_arrival(
    mission: &FleetMission,
    ctx: &ArrivalContext<'_>,
    _rng: &mut dyn RngCore,
) -> Arrival {
    // Goods are only handed over if the planet still has the owner it had
    // when the fleet left.
    let recipient = ctx
        .target
        .filter(|p| Some(p.player_id) == mission.target_owner_id);

    let Some(target) = recipient else {
        return Arrival {
            effects: vec![notify(
                mission.player_id,
                MessageKind::TransportRejected,
                route(mission),
                ctx,
            )],
            returning: Some(Payload::of(mission)),
        };
    };

    let delivered = with_resources(route(mission), &mission.resources);
    let mut effects = Vec::with_capacity(3);
    if mission.resources.sum() > 0 {
        effects.push(Effect::AddResources {
            planet: target.id,
            resources: mission.resources,
        });
    }
    effects.push(notify(
        mission.player_id,
        MessageKind::TransportArrived,
        delivered.clone(),
        ctx,
    ));
    if target.player_id != mission.player_id {
        effects.push(notify(
            target.player_id,
            MessageKind::TransportReceived,
            delivered,
            ctx,
        ));
    }

    Arrival {
        effects,
        returning: Some(Payload {
            units: mission.units.clone(),
            resources: Resources::ZERO,
        }),
    }
}
