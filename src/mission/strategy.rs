//! Per-mission-type behaviour, looked up through a table keyed by
//! [`MissionType`].
//!
//! Each strategy is a plain struct of function pointers. Adding a mission
//! type means one new module and one new arm in [`strategy_for`].

mod attack;
mod colonization;
mod deployment;
mod destroy;
mod espionage;
mod expedition;
mod recycle;
mod transport;

use rand::RngCore;

use crate::model::{
    FleetMission, Message, MessageKind, MessageParams, MissionType, PlayerId, Resources,
    UnitCollection, params, with_resources,
};

use super::feasibility::{FeasibilityCheck, MissionPossibleStatus};
use super::transition::{ArrivalContext, Effect};

/// Ships and goods a fleet carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub units: UnitCollection,
    pub resources: Resources,
}

impl Payload {
    pub fn of(mission: &FleetMission) -> Self {
        Self {
            units: mission.units.clone(),
            resources: mission.resources,
        }
    }
}

/// What happened when an outbound leg landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arrival {
    pub effects: Vec<Effect>,
    /// What flies home. Ignored for strategies without a return mission.
    pub returning: Option<Payload>,
}

pub type ArrivalFn = fn(&FleetMission, &ArrivalContext<'_>, &mut dyn RngCore) -> Arrival;
pub type ReturnFn = fn(&FleetMission, &ArrivalContext<'_>) -> Vec<Effect>;
pub type PossibleFn = fn(&FeasibilityCheck<'_>) -> MissionPossibleStatus;

pub struct MissionStrategy {
    pub mission_type: MissionType,
    pub has_return_mission: bool,
    /// Type-specific checks, run after the common ones pass.
    pub is_mission_possible: PossibleFn,
    pub process_arrival: ArrivalFn,
    pub process_return: ReturnFn,
}

pub fn strategy_for(mission_type: MissionType) -> &'static MissionStrategy {
    match mission_type {
        MissionType::Attack => &attack::STRATEGY,
        MissionType::Transport => &transport::STRATEGY,
        MissionType::Deployment => &deployment::STRATEGY,
        MissionType::Espionage => &espionage::STRATEGY,
        MissionType::Colonization => &colonization::STRATEGY,
        MissionType::Recycle => &recycle::STRATEGY,
        MissionType::Destroy => &destroy::STRATEGY,
        MissionType::Expedition => &expedition::STRATEGY,
    }
}

/// Shared return handling: the fleet lands on its home body and the owner
/// is told what it brought back.
pub fn return_home(mission: &FleetMission, ctx: &ArrivalContext<'_>) -> Vec<Effect> {
    let Some(home) = ctx.target.filter(|p| p.is_owned_by(mission.player_id)) else {
        return Vec::new();
    };
    let mut effects = Effect::deliver(home.id, &Payload::of(mission));
    effects.push(notify(
        mission.player_id,
        MessageKind::ReturnOfFleet,
        with_resources(route(mission), &mission.resources),
        ctx,
    ));
    effects
}

/// `from` and `to` params for a mission's endpoints.
pub(crate) fn route(mission: &FleetMission) -> MessageParams {
    params([
        ("from", format!("[{}]", mission.origin)),
        ("to", format!("[{}]", mission.destination)),
    ])
}

pub(crate) fn notify(
    player: PlayerId,
    kind: MessageKind,
    params: MessageParams,
    ctx: &ArrivalContext<'_>,
) -> Effect {
    Effect::Message(Message::new(player, kind, params, ctx.now))
}

/// Payload with nothing delivered: everything that left comes back.
pub(crate) fn turn_back(mission: &FleetMission) -> Arrival {
    Arrival {
        effects: Vec::new(),
        returning: Some(Payload::of(mission)),
    }
}
