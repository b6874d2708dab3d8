//! Expedition: fly into uncharted space past the last planet and see what
//! turns up.

use rand::{Rng, RngCore};

use crate::combat;
use crate::mission::feasibility::{Check, FeasibilityCheck, MissionPossibleStatus, verdict};
use crate::mission::transition::ArrivalContext;
use crate::model::{FleetMission, MessageKind, MissionType, Resources, UnitCollection, UnitKind};

use super::{Arrival, MissionStrategy, Payload, notify, return_home, route};

pub static STRATEGY: MissionStrategy = MissionStrategy {
    mission_type: MissionType::Expedition,
    has_return_mission: true,
    is_mission_possible,
    process_arrival,
    process_return: return_home,
};

/// Hulls that drift in deep space waiting to be picked up.
const DERELICTS: [UnitKind; 4] = [
    UnitKind::SmallCargo,
    UnitKind::LargeCargo,
    UnitKind::LightFighter,
    UnitKind::HeavyFighter,
];

/// What an expedition ran into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discovery {
    Resources(Resources),
    Ships(UnitCollection),
    Pirates,
    Lost,
    Nothing,
}

fn is_mission_possible(check: &FeasibilityCheck<'_>) -> MissionPossibleStatus {
    verdict(checks(check))
}

fn checks(check: &FeasibilityCheck<'_>) -> Check {
    if check.target.position != check.universe.expedition_position {
        return Err(MissionPossibleStatus::refused(format!(
            "expeditions head for position {}",
            check.universe.expedition_position
        )));
    }
    if check.target_planet.is_some() {
        return Err(MissionPossibleStatus::refused("the target is not empty space"));
    }
    Ok(())
}

/// Rolls what the fleet finds. `free` is the spare cargo space.
pub fn discover(units: &UnitCollection, free: u64, rng: &mut dyn RngCore) -> Discovery {
    match rng.gen_range(0..100) {
        0..30 if free > 0 => {
            let haul = rng.gen_range(free / 10..=free / 2).max(1);
            Discovery::Resources(Resources::cargo(
                haul * 6 / 10,
                haul * 3 / 10,
                haul / 10,
            ))
        }
        30..50 => {
            let kind = DERELICTS[rng.gen_range(0..DERELICTS.len())];
            let found = rng.gen_range(1..=(units.total() / 10).max(1));
            Discovery::Ships(UnitCollection::new().with(kind, found))
        }
        50..60 => Discovery::Pirates,
        60..62 => Discovery::Lost,
        _ => Discovery::Nothing,
    }
}

fn process_arrival(
    mission: &FleetMission,
    ctx: &ArrivalContext<'_>,
    rng: &mut dyn RngCore,
) -> Arrival {
    let free = mission
        .units
        .cargo_capacity()
        .saturating_sub(mission.resources.sum());

    let (outcome, units, resources) = match discover(&mission.units, free, rng) {
        Discovery::Resources(found) => (
            format!("the fleet found a derelict hoard: {found}"),
            mission.units.clone(),
            mission.resources.add(&found),
        ),
        Discovery::Ships(found) => (
            format!("the fleet found abandoned ships: {found}"),
            mission.units.merged(&found),
            mission.resources,
        ),
        Discovery::Pirates => {
            let raiders = UnitCollection::new().with(
                UnitKind::LightFighter,
                rng.gen_range(1..=(mission.units.total() / 2).max(1)),
            );
            let battle = combat::resolve(&mission.units, &raiders, 0);
            (
                format!(
                    "pirates attacked the fleet, {}; lost {}",
                    battle.outcome.describe(),
                    battle.attacker_losses
                ),
                battle.attacker_survivors,
                mission.resources,
            )
        }
        Discovery::Lost => (
            "the fleet was swallowed by a black hole".to_string(),
            UnitCollection::new(),
            Resources::ZERO,
        ),
        Discovery::Nothing => (
            "the fleet found nothing but empty space".to_string(),
            mission.units.clone(),
            mission.resources,
        ),
    };

    let mut params = route(mission);
    params.insert("outcome".into(), outcome);

    Arrival {
        effects: vec![notify(
            mission.player_id,
            MessageKind::ExpeditionResult,
            params,
            ctx,
        )],
        returning: Some(Payload { units, resources }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use crate::config::UniverseConfig;
    use crate::mission::feasibility::tests::{check, planet};
    use crate::mission::transition::tests::{context, fleet_mission};
    use crate::model::{BodyType, Coordinate};

    fn explorers() -> FleetMission {
        FleetMission {
            planet_id_to: None,
            target_owner_id: None,
            destination: Coordinate::new(1, 1, 16),
            units: UnitCollection::new()
                .with(UnitKind::LargeCargo, 10)
                .with(UnitKind::Cruiser, 10),
            resources: Resources::ZERO,
            ..fleet_mission(MissionType::Expedition)
        }
    }

    #[test]
    fn same_seed_same_outcome() {
        let u = UniverseConfig::default();
        let mission = explorers();
        let ctx = context(None, None, &u);

        let a = process_arrival(&mission, &ctx, &mut ChaCha8Rng::seed_from_u64(42));
        let b = process_arrival(&mission, &ctx, &mut ChaCha8Rng::seed_from_u64(42));

        assert_eq!(a.returning, b.returning);
    }

    #[test]
    fn every_discovery_is_bounded() {
        let units = explorers().units;
        let free = units.cargo_capacity();
        let mut seen_resources = false;
        for seed in 0..200 {
            match discover(&units, free, &mut ChaCha8Rng::seed_from_u64(seed)) {
                Discovery::Resources(found) => {
                    seen_resources = true;
                    assert!(found.sum() <= free);
                }
                Discovery::Ships(found) => {
                    assert!((1..=2).contains(&found.total()));
                }
                Discovery::Pirates | Discovery::Lost | Discovery::Nothing => {}
            }
        }
        assert!(seen_resources);
    }

    #[test]
    fn full_hold_finds_no_resources() {
        let units = explorers().units;
        for seed in 0..100 {
            let found = discover(&units, 0, &mut ChaCha8Rng::seed_from_u64(seed));
            assert!(!matches!(found, Discovery::Resources(_)));
        }
    }

    #[test]
    fn must_head_for_deep_space() {
        let u = UniverseConfig::default();
        let home = planet(10, 1, Coordinate::new(1, 1, 1), BodyType::Planet);
        let units = explorers().units;

        let c = check(&home, Coordinate::new(1, 1, 16), BodyType::Planet, None, &units, &u);
        assert!(is_mission_possible(&c).possible);

        let c = check(&home, Coordinate::new(1, 1, 9), BodyType::Planet, None, &units, &u);
        assert!(!is_mission_possible(&c).possible);
    }
}
