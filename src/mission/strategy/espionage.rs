//! Espionage: probes report on a foreign planet and fly home.

use rand::RngCore;

use crate::mission::feasibility::{
    Check, FeasibilityCheck, MissionPossibleStatus, body_is_planet_or_moon, carries,
    existing_target, foreign_owner, verdict,
};
use crate::mission::transition::ArrivalContext;
use crate::model::{FleetMission, MessageKind, MissionType, UnitKind, with_resources};

use super::{Arrival, MissionStrategy, Payload, notify, return_home, route, turn_back};

pub static STRATEGY: MissionStrategy = MissionStrategy {
    mission_type: MissionType::Espionage,
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
    let target = existing_target(check)?;
    foreign_owner(check, target)?;
    carries(check, UnitKind::EspionageProbe)
}

fn process_arrival(
    mission: &FleetMission,
    ctx: &ArrivalContext<'_>,
    _rng: &mut dyn RngCore,
) -> Arrival {
    let Some(target) = ctx.target else {
        return turn_back(mission);
    };

    let mut report = with_resources(route(mission), &target.resources);
    report.insert("units".into(), target.units.to_string());

    Arrival {
        effects: vec![
            notify(mission.player_id, MessageKind::EspionageReport, report, ctx),
            notify(
                target.player_id,
                MessageKind::EspionageDetected,
                route(mission),
                ctx,
            ),
        ],
        returning: Some(Payload::of(mission)),
    }
}
