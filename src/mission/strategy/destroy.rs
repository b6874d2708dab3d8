//! Moon destruction: beat the moon's garrison, then let the deathstars try.

use rand::{Rng, RngCore};

use crate::combat::{self, BattleOutcome};
use crate::mission::feasibility::{
    Check, FeasibilityCheck, MissionPossibleStatus, carries, existing_target, foreign_owner,
    verdict,
};
use crate::mission::transition::{ArrivalContext, Effect};
use crate::model::{BodyType, FleetMission, MessageKind, MissionType, UnitKind};

use super::attack::{battle_effects, battle_params};
use super::{Arrival, MissionStrategy, Payload, notify, return_home, turn_back};

pub static STRATEGY: MissionStrategy = MissionStrategy {
    mission_type: MissionType::Destroy,
    has_return_mission: true,
    is_mission_possible,
    process_arrival,
    process_return: return_home,
};

fn is_mission_possible(check: &FeasibilityCheck<'_>) -> MissionPossibleStatus {
    verdict(checks(check))
}

fn checks(check: &FeasibilityCheck<'_>) -> Check {
    if check.target_body != BodyType::Moon {
        return Err(MissionPossibleStatus::refused("only moons can be destroyed"));
    }
    let target = existing_target(check)?;
    foreign_owner(check, target)?;
    carries(check, UnitKind::Deathstar)
}

/// Percent chances `(moon destroyed, deathstars lost)` for a moon of
/// `diameter` attacked by `deathstars`.
pub fn destruction_odds(diameter: u64, deathstars: u64) -> (f64, f64) {
    let d = (diameter as f64).sqrt();
    let moon = ((100.0 - d) * (deathstars as f64).sqrt()).clamp(0.0, 100.0);
    let fleet = (d / 2.0).clamp(0.0, 100.0);
    (moon, fleet)
}

fn process_arrival(
    mission: &FleetMission,
    ctx: &ArrivalContext<'_>,
    rng: &mut dyn RngCore,
) -> Arrival {
    let Some(moon) = ctx
        .target
        .filter(|p| p.body_type == BodyType::Moon && !p.is_owned_by(mission.player_id))
    else {
        return turn_back(mission);
    };

    let battle = combat::resolve(&mission.units, &moon.units, ctx.universe.debris_percent);
    let mut effects = battle_effects(mission, moon, &battle);
    let mut survivors = battle.attacker_survivors.clone();
    let mut params = battle_params(mission, &battle);

    let deathstars = survivors.amount(UnitKind::Deathstar);
    let kind = if battle.outcome == BattleOutcome::AttackerWins && deathstars > 0 {
        let (moon_chance, fleet_chance) = destruction_odds(moon.diameter, deathstars);
        let destroyed = rng.gen_bool(moon_chance / 100.0);
        let lost = rng.gen_bool(fleet_chance / 100.0);
        if lost {
            survivors = survivors.without(UnitKind::Deathstar);
        }
        params.insert(
            "fleet".into(),
            if lost {
                "The deathstars were torn apart by the gravitational shock.".into()
            } else {
                String::new()
            },
        );
        if destroyed {
            effects.push(Effect::DestroyPlanet(moon.id));
            MessageKind::MoonDestroyed
        } else {
            MessageKind::MoonDestructionFailed
        }
    } else {
        params.insert("fleet".into(), "No deathstar survived the battle.".into());
        MessageKind::MoonDestructionFailed
    };

    effects.push(notify(mission.player_id, MessageKind::BattleReport, params.clone(), ctx));
    effects.push(notify(mission.player_id, kind, params.clone(), ctx));
    effects.push(notify(moon.player_id, kind, params, ctx));

    Arrival {
        effects,
        returning: Some(Payload {
            units: survivors,
            resources: mission.resources,
        }),
    }
}
