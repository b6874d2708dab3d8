//! Attack: fight the target's garrison, plunder it on victory, fly home.

use rand::RngCore;

use crate::combat::{self, Battle, BattleOutcome};
use crate::mission::feasibility::{
    Check, FeasibilityCheck, MissionPossibleStatus, body_is_planet_or_moon, existing_target,
    foreign_owner, verdict,
};
use crate::mission::transition::{ArrivalContext, Effect};
use crate::model::{
    FleetMission, MessageKind, MessageParams, MissionType, Planet, Resources, with_resources,
};

use super::{Arrival, MissionStrategy, Payload, notify, return_home, route, turn_back};

pub static STRATEGY: MissionStrategy = MissionStrategy {
    mission_type: MissionType::Attack,
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
    foreign_owner(check, target)
}

fn process_arrival(
    mission: &FleetMission,
    ctx: &ArrivalContext<'_>,
    _rng: &mut dyn RngCore,
) -> Arrival {
    let Some(target) = ctx.target.filter(|p| !p.is_owned_by(mission.player_id)) else {
        return turn_back(mission);
    };
    let u = ctx.universe;
    let battle = combat::resolve(&mission.units, &target.units, u.debris_percent);

    let loot = if battle.outcome == BattleOutcome::AttackerWins {
        let free = battle
            .attacker_survivors
            .cargo_capacity()
            .saturating_sub(mission.resources.sum());
        combat::plunder(&target.resources, free, u.loot_percent)
    } else {
        Resources::ZERO
    };

    let mut effects = battle_effects(mission, target, &battle);
    if loot.sum() > 0 {
        effects.push(Effect::SubtractResources {
            planet: target.id,
            resources: loot,
        });
    }
    let report = with_resources(battle_params(mission, &battle), &loot);
    effects.push(notify(
        mission.player_id,
        MessageKind::BattleReport,
        report.clone(),
        ctx,
    ));
    effects.push(notify(target.player_id, MessageKind::BattleReport, report, ctx));

    Arrival {
        effects,
        returning: Some(Payload {
            units: battle.attacker_survivors,
            resources: mission.resources.add(&loot),
        }),
    }
}

/// Garrison losses and wreckage, shared with moon destruction.
pub(super) fn battle_effects(
    mission: &FleetMission,
    target: &Planet,
    battle: &Battle,
) -> Vec<Effect> {
    let mut effects = Vec::new();
    if !battle.defender_losses.is_empty() {
        effects.push(Effect::RemoveUnits {
            planet: target.id,
            units: battle.defender_losses.clone(),
        });
    }
    if battle.debris.sum() > 0 {
        effects.push(Effect::AddDebris {
            coordinate: mission.destination,
            resources: battle.debris,
        });
    }
    effects
}

pub(super) fn battle_params(mission: &FleetMission, battle: &Battle) -> MessageParams {
    let mut params = route(mission);
    params.insert("outcome".into(), battle.outcome.describe().into());
    params.insert("attacker_losses".into(), battle.attacker_losses.to_string());
    params.insert("defender_losses".into(), battle.defender_losses.to_string());
    params.insert("debris".into(), battle.debris.to_string());
    params
}
