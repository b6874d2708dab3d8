//! Deployment: station a fleet and its cargo on another of the owner's bodies.
//! One way only.

use rand::RngCore;
use tracing::warn;

use crate::mission::feasibility::{
    Check, FeasibilityCheck, MissionPossibleStatus, body_is_planet_or_moon, existing_target,
    same_owner, verdict,
};
use crate::mission::transition::{ArrivalContext, Effect};
use crate::model::{FleetMission, MessageKind, MissionType, with_resources};

use super::{Arrival, MissionStrategy, Payload, return_home, route};

pub static STRATEGY: MissionStrategy = MissionStrategy {
    mission_type: MissionType::Deployment,
    has_return_mission: false,
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
    same_owner(check, target)
}

fn process_arrival(
    mission: &FleetMission,
    ctx: &ArrivalContext<'_>,
    _rng: &mut dyn RngCore,
) -> Arrival {
    let payload = Payload::of(mission);

    if let Some(target) = ctx.target.filter(|p| p.is_owned_by(mission.player_id)) {
        let mut effects = Effect::deliver(target.id, &payload);
        let (kind, params) = if mission.resources.sum() == 0 {
            (MessageKind::FleetDeployment, route(mission))
        } else {
            (
                MessageKind::FleetDeploymentWithResources,
                with_resources(route(mission), &mission.resources),
            )
        };
        effects.push(super::notify(mission.player_id, kind, params, ctx));
        return Arrival {
            effects,
            returning: None,
        };
    }

    // Nowhere to station: the fleet is put back where it came from.
    let Some(home) = ctx.origin.filter(|p| p.is_owned_by(mission.player_id)) else {
        warn!(
            mission = mission.id,
            from = %mission.origin,
            to = %mission.destination,
            "deployment failed with no home to fall back to"
        );
        return Arrival {
            effects: vec![super::notify(
                mission.player_id,
                MessageKind::DeploymentLost,
                route(mission),
                ctx,
            )],
            returning: None,
        };
    };

    let mut effects = Effect::deliver(home.id, &payload);
    effects.push(super::notify(
        mission.player_id,
        MessageKind::DeploymentFailed,
        route(mission),
        ctx,
    ));
    Arrival {
        effects,
        returning: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::UniverseConfig;
    use crate::mission::feasibility::tests::{check, planet};
    use crate::mission::strategy::tests::messages;
    use crate::mission::transition::tests::{context, fleet_mission, rng};
    use crate::model::{BodyType, Coordinate, PlayerId, Resources, UnitCollection, UnitKind};

    #[test]
    fn delivers_to_own_planet() {
        let u = UniverseConfig::default();
        let target = planet(20, 1, Coordinate::new(1, 1, 2), BodyType::Planet);
        let mission = fleet_mission(MissionType::Deployment);

        let arrival = process_arrival(&mission, &context(Some(&target), None, &u), &mut rng());

        assert!(arrival.returning.is_none());
        assert!(arrival.effects.contains(&Effect::AddResources {
            planet: 20,
            resources: Resources::cargo(100, 0, 0)
        }));
        assert_eq!(
            messages(&arrival.effects),
            vec![(MessageKind::FleetDeploymentWithResources, PlayerId(1))]
        );
    }

    #[test]
    fn empty_hold_sends_plain_notice() {
        let u = UniverseConfig::default();
        let target = planet(20, 1, Coordinate::new(1, 1, 2), BodyType::Planet);
        let mission = FleetMission {
            resources: Resources::ZERO,
            ..fleet_mission(MissionType::Deployment)
        };

        let arrival = process_arrival(&mission, &context(Some(&target), None, &u), &mut rng());

        assert_eq!(
            messages(&arrival.effects),
            vec![(MessageKind::FleetDeployment, PlayerId(1))]
        );
    }

    #[test]
    fn lost_target_puts_fleet_back_home() {
        let u = UniverseConfig::default();
        let origin = planet(10, 1, Coordinate::new(1, 1, 1), BodyType::Planet);
        let conquered = planet(20, 2, Coordinate::new(1, 1, 2), BodyType::Planet);
        let mission = fleet_mission(MissionType::Deployment);

        let arrival = process_arrival(
            &mission,
            &context(Some(&conquered), Some(&origin), &u),
            &mut rng(),
        );

        assert!(arrival.returning.is_none());
        assert!(arrival.effects.contains(&Effect::AddUnits {
            planet: 10,
            units: mission.units.clone()
        }));
        assert!(arrival.effects.iter().all(|e| !matches!(
            e,
            Effect::AddUnits { planet: 20, .. } | Effect::AddResources { planet: 20, .. }
        )));
        assert_eq!(
            messages(&arrival.effects),
            vec![(MessageKind::DeploymentFailed, PlayerId(1))]
        );
    }

    #[test]
    fn lost_target_and_lost_home_drops_the_fleet() {
        let u = UniverseConfig::default();
        let mission = fleet_mission(MissionType::Deployment);

        let arrival = process_arrival(&mission, &context(None, None, &u), &mut rng());

        assert!(arrival.returning.is_none());
        assert!(!arrival.effects.iter().any(|e| matches!(
            e,
            Effect::AddUnits { .. } | Effect::AddResources { .. }
        )));
        assert_eq!(
            messages(&arrival.effects),
            vec![(MessageKind::DeploymentLost, PlayerId(1))]
        );
        let Effect::Message(lost) = &arrival.effects[0] else {
            panic!("expected a message, got {:?}", arrival.effects);
        };
        assert!(lost.body().contains("were lost"));
    }

    #[test]
    fn foreign_target_is_not_possible() {
        let u = UniverseConfig::default();
        let home = planet(10, 1, Coordinate::new(1, 1, 1), BodyType::Planet);
        let foreign = planet(20, 2, Coordinate::new(1, 1, 2), BodyType::Planet);
        let units = UnitCollection::new().with(UnitKind::SmallCargo, 1);

        let c = check(&home, foreign.coordinate, BodyType::Planet, Some(&foreign), &units, &u);
        assert!(!is_mission_possible(&c).possible);

        let c = check(&home, foreign.coordinate, BodyType::Planet, None, &units, &u);
        assert!(is_mission_possible(&c).target_missing);
    }
}
