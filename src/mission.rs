//! Fleet mission lifecycle: dispatch, arrival processing, recall.
//!
//! [`MissionControl`] is the entry point. Every operation runs in one
//! IMMEDIATE transaction. Strategies and transitions decide what happens;
//! this module loads their inputs and applies their effects.

pub mod feasibility;
pub mod strategy;
pub mod transition;

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use jiff::{SignedDuration, Timestamp};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::config::UniverseConfig;
use crate::model::{
    BodyType, Coordinate, FleetMission, InsufficientResources, InsufficientUnits, MissionId,
    MissionType, NewMission, PlanetId, PlayerId, Resources, UnitCollection,
};
use crate::storage::{self, Storage, StorageError};
use crate::travel::{self, SpeedPercent};

use feasibility::{FeasibilityCheck, MissionPossibleStatus};
use transition::{ArrivalContext, Effect};

/// Errors from fleet operations.
#[derive(Debug, thiserror::Error)]
pub enum FleetError {
    #[error("mission not possible: {0}")]
    InfeasibleMission(String),

    #[error(transparent)]
    InsufficientResources(#[from] InsufficientResources),

    #[error(transparent)]
    InsufficientUnits(#[from] InsufficientUnits),

    #[error("invalid mission state: {0}")]
    InvalidMissionState(String),

    #[error("target not found: {0}")]
    TargetNotFound(String),

    #[error("planet not found: {0}")]
    PlanetNotFound(PlanetId),

    #[error("mission not found: {0}")]
    MissionNotFound(MissionId),

    #[error("player {player} does not own {what}")]
    NotOwner { player: PlayerId, what: String },

    #[error("timestamp out of range: {0}")]
    Time(#[from] jiff::Error),

    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for FleetError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::InsufficientResources(e) => Self::InsufficientResources(e),
            StorageError::InsufficientUnits(e) => Self::InsufficientUnits(e),
            StorageError::PlanetNotFound(id) => Self::PlanetNotFound(id),
            StorageError::MissionNotFound(id) => Self::MissionNotFound(id),
            other => Self::Storage(other),
        }
    }
}

impl From<rusqlite::Error> for FleetError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Storage(StorageError::Sqlite(e))
    }
}

pub type Result<T> = core::result::Result<T, FleetError>;

/// A fleet about to leave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRequest {
    pub player: PlayerId,
    pub origin: PlanetId,
    pub mission_type: MissionType,
    pub destination: Coordinate,
    pub destination_body: BodyType,
    pub units: UnitCollection,
    pub resources: Resources,
    pub speed: SpeedPercent,
}

/// What a tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub processed: Vec<MissionId>,
    /// Missions whose processing failed and was rolled back, with the reason.
    pub failed: Vec<(MissionId, String)>,
}

/// Runs fleet missions against a [`Storage`].
pub struct MissionControl<'s> {
    storage: &'s Storage,
    universe: UniverseConfig,
}

impl<'s> MissionControl<'s> {
    pub fn new(storage: &'s Storage, universe: UniverseConfig) -> Self {
        Self { storage, universe }
    }

    pub fn universe(&self) -> &UniverseConfig {
        &self.universe
    }

    /// Whether `units` from `origin` could fly `mission_type` to the target.
    /// Errors only when the origin itself cannot be read.
    pub fn is_mission_possible(
        &self,
        origin: PlanetId,
        mission_type: MissionType,
        target: Coordinate,
        target_body: BodyType,
        units: &UnitCollection,
    ) -> Result<MissionPossibleStatus> {
        let tx = self.storage.snapshot()?;
        let origin = storage::planet::load_planet(&tx, origin)?;
        check_feasibility(
            &tx,
            &self.universe,
            &origin,
            mission_type,
            target,
            target_body,
            units,
        )
    }

    /// One-way flight time in seconds at full speed.
    pub fn calculate_fleet_mission_duration(
        &self,
        mission_type: MissionType,
        from: Coordinate,
        to: Coordinate,
        units: &UnitCollection,
    ) -> u64 {
        let distance = travel::distance(from, to, &self.universe);
        let speed = units.slowest_speed().unwrap_or(0);
        travel::calculate_fleet_mission_duration(mission_type, distance, speed, &self.universe)
    }

    /// Missions in flight that concern `player`, soonest first.
    pub fn active_missions(&self, player: PlayerId) -> Result<Vec<FleetMission>> {
        Ok(self.storage.active_missions(player)?)
    }

    /// Sends a fleet. Units, cargo, and fuel leave the origin in the same
    /// transaction that schedules the mission; on any error nothing changes.
    pub fn dispatch(&self, req: &DispatchRequest, now: Timestamp) -> Result<FleetMission> {
        let tx = self.storage.begin()?;
        let origin = storage::planet::load_planet(&tx, req.origin)?;
        if !origin.is_owned_by(req.player) {
            return Err(FleetError::NotOwner {
                player: req.player,
                what: format!("planet {}", origin.id),
            });
        }

        let status = check_feasibility(
            &tx,
            &self.universe,
            &origin,
            req.mission_type,
            req.destination,
            req.destination_body,
            &req.units,
        )?;
        if !status.possible {
            let reason = status.reason.unwrap_or_default();
            return Err(if status.target_missing {
                FleetError::TargetNotFound(reason)
            } else {
                FleetError::InfeasibleMission(reason)
            });
        }
        let cargo = Resources::cargo(
            req.resources.metal,
            req.resources.crystal,
            req.resources.deuterium,
        );
        origin.units.subtract(&req.units)?;
        origin.resources.subtract(&cargo)?;
        let capacity = req.units.cargo_capacity();
        if cargo.sum() > capacity {
            return Err(FleetError::InfeasibleMission(format!(
                "the fleet can carry {capacity} but {} was loaded",
                cargo.sum()
            )));
        }

        let distance = travel::distance(origin.coordinate, req.destination, &self.universe);
        let speed = req.units.slowest_speed().unwrap_or(0);
        let seconds = travel::mission_duration(
            req.mission_type,
            distance,
            speed,
            req.speed,
            &self.universe,
        );
        let fuel = travel::fuel_consumption(&req.units, distance, req.speed);

        storage::planet::subtract_units(&tx, origin.id, &req.units)?;
        storage::planet::subtract_resources(
            &tx,
            origin.id,
            &cargo.add(&Resources::cargo(0, 0, fuel)),
        )?;

        let target = target_body_at(&tx, req.destination, req.destination_body)?;
        let mission = storage::mission::insert_mission(
            &tx,
            &NewMission {
                player_id: req.player,
                mission_type: req.mission_type,
                parent_id: None,
                planet_id_from: Some(origin.id),
                origin: origin.coordinate,
                origin_body: origin.body_type,
                planet_id_to: target.as_ref().map(|p| p.id),
                destination: req.destination,
                destination_body: req.destination_body,
                target_owner_id: target.as_ref().map(|p| p.player_id),
                units: req.units.clone(),
                resources: cargo,
                time_departure: now,
                time_arrival: now.checked_add(SignedDuration::from_secs(
                    i64::try_from(seconds).unwrap_or(i64::MAX),
                ))?,
            },
        )?;
        tx.commit()?;

        info!(
            mission = mission.id,
            player = %req.player,
            kind = %req.mission_type,
            from = %origin.coordinate,
            to = %req.destination,
            seconds,
            fuel,
            "fleet dispatched"
        );
        Ok(mission)
    }

    /// Processes every mission concerning `player` that has arrived by `now`,
    /// oldest arrival first. Each mission commits or rolls back on its own;
    /// a failure is logged and reported without stopping the rest.
    pub fn process_due_missions(&self, player: PlayerId, now: Timestamp) -> Result<TickReport> {
        let due = self.storage.due_missions(player, now)?;
        debug!(player = %player, due = due.len(), "tick");

        let mut queue: BinaryHeap<Reverse<(Timestamp, MissionId)>> = due
            .into_iter()
            .map(|(id, arrival)| Reverse((arrival, id)))
            .collect();
        let mut report = TickReport::default();

        while let Some(Reverse((_, id))) = queue.pop() {
            match self.process_one(id, now) {
                Ok(Landing::Skipped) => debug!(mission = id, "already processed"),
                Ok(Landing::Processed(spawned)) => {
                    report.processed.push(id);
                    if let Some(back) = spawned.filter(|m| m.time_arrival <= now) {
                        queue.push(Reverse((back.time_arrival, back.id)));
                    }
                }
                Err(e) => {
                    warn!(mission = id, error = %e, "mission processing failed");
                    report.failed.push((id, e.to_string()));
                }
            }
        }
        Ok(report)
    }

    /// Turns a fleet around mid-flight.
    pub fn recall(&self, player: PlayerId, id: MissionId, now: Timestamp) -> Result<FleetMission> {
        let tx = self.storage.begin()?;
        let mission = storage::mission::load_mission(&tx, id)?;
        if mission.player_id != player {
            return Err(FleetError::NotOwner {
                player,
                what: format!("mission {id}"),
            });
        }

        let transition = transition::recall(&mission, now)?;
        if !storage::mission::cancel_mission(&tx, id)? {
            return Err(FleetError::InvalidMissionState(format!(
                "mission {id} has already been completed"
            )));
        }
        for effect in &transition.effects {
            apply(&tx, effect)?;
        }
        let back = transition
            .spawn
            .map(|m| storage::mission::insert_mission(&tx, &m))
            .transpose()?
            .ok_or_else(|| FleetError::InvalidMissionState(format!("mission {id} cannot return")))?;
        tx.commit()?;

        info!(mission = id, back = back.id, arrival = %back.time_arrival, "fleet recalled");
        Ok(back)
    }

    fn process_one(&self, id: MissionId, now: Timestamp) -> Result<Landing> {
        let tx = self.storage.begin()?;
        let mission = storage::mission::load_mission(&tx, id)?;
        if mission.processed || !storage::mission::claim_mission(&tx, id)? {
            return Ok(Landing::Skipped);
        }

        let target = landing_site(&tx, &mission)?;
        let origin = mission
            .planet_id_from
            .map(|p| optional(storage::planet::load_planet(&tx, p)))
            .transpose()?
            .flatten();
        let debris = storage::debris::load_debris(&tx, mission.destination)?;
        let planet_count = storage::planet::count_planets(&tx, mission.player_id)?;

        let ctx = ArrivalContext {
            target: target.as_ref(),
            origin: origin.as_ref(),
            debris: debris.as_ref(),
            planet_count,
            universe: &self.universe,
            now,
        };
        let mut rng = mission_rng(self.universe.seed, id);
        let transition = transition::process(&mission, &ctx, &mut rng)?;

        if mission.is_return() && transition.effects.is_empty() {
            warn!(mission = id, to = %mission.destination, "fleet returned to a lost planet");
        }
        for effect in &transition.effects {
            apply(&tx, effect)?;
        }
        let spawned = transition
            .spawn
            .map(|m| storage::mission::insert_mission(&tx, &m))
            .transpose()?;
        tx.commit()?;

        info!(
            mission = id,
            kind = %mission.label(),
            at = %mission.destination,
            effects = transition.effects.len(),
            "mission arrived"
        );
        Ok(Landing::Processed(spawned))
    }
}

enum Landing {
    Skipped,
    /// Carries the return leg, if one was scheduled.
    Processed(Option<FleetMission>),
}

fn check_feasibility(
    conn: &Connection,
    universe: &UniverseConfig,
    origin: &crate::model::Planet,
    mission_type: MissionType,
    target: Coordinate,
    target_body: BodyType,
    units: &UnitCollection,
) -> Result<MissionPossibleStatus> {
    let target_planet = target_body_at(conn, target, target_body)?;
    let debris = storage::debris::load_debris(conn, target)?;
    let planet_count = storage::planet::count_planets(conn, origin.player_id)?;
    let check = FeasibilityCheck {
        origin,
        target,
        target_body,
        target_planet: target_planet.as_ref(),
        debris: debris.as_ref(),
        units,
        planet_count,
        universe,
    };
    if let Err(refused) = feasibility::common(&check) {
        return Ok(refused);
    }
    let strategy = strategy::strategy_for(mission_type);
    Ok((strategy.is_mission_possible)(&check))
}

/// The planet or moon at a coordinate. Debris fields have no body.
fn target_body_at(
    conn: &Connection,
    coordinate: Coordinate,
    body: BodyType,
) -> Result<Option<crate::model::Planet>> {
    if body == BodyType::DebrisField {
        return Ok(None);
    }
    Ok(storage::planet::find_planet_at(conn, coordinate, body)?)
}

/// Where a landing mission ends up. Outbound legs meet whatever sits at
/// the destination now. Return legs go to their home body, or to the
/// planet under it if a home moon is gone.
fn landing_site(conn: &Connection, mission: &FleetMission) -> Result<Option<crate::model::Planet>> {
    if let Some(id) = mission.planet_id_to
        && let Some(planet) = optional(storage::planet::load_planet(conn, id))?
        && planet.coordinate == mission.destination
    {
        return Ok(Some(planet));
    }
    let found = target_body_at(conn, mission.destination, mission.destination_body)?;
    if found.is_none() && mission.is_return() && mission.destination_body == BodyType::Moon {
        return target_body_at(conn, mission.destination, BodyType::Planet);
    }
    Ok(found)
}

fn optional<T>(r: storage::Result<T>) -> Result<Option<T>> {
    match r {
        Ok(v) => Ok(Some(v)),
        Err(StorageError::PlanetNotFound(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Random source for one mission's outcome, stable across retries.
fn mission_rng(seed: u64, id: MissionId) -> ChaCha8Rng {
    let mixed = u64::from_ne_bytes(id.to_ne_bytes()).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    ChaCha8Rng::seed_from_u64(seed ^ mixed)
}

fn apply(conn: &Connection, effect: &Effect) -> Result<()> {
    match effect {
        Effect::AddResources { planet, resources } => {
            storage::planet::add_resources(conn, *planet, resources)?;
        }
        Effect::SubtractResources { planet, resources } => {
            storage::planet::subtract_resources(conn, *planet, resources)?;
        }
        Effect::AddUnits { planet, units } => storage::planet::add_units(conn, *planet, units)?,
        Effect::RemoveUnits { planet, units } => {
            storage::planet::subtract_units(conn, *planet, units)?;
        }
        Effect::Message(message) => storage::message::insert_message(conn, message)?,
        Effect::AddDebris {
            coordinate,
            resources,
        } => storage::debris::add_debris(conn, *coordinate, resources)?,
        Effect::RemoveDebris {
            coordinate,
            resources,
        } => storage::debris::remove_debris(conn, *coordinate, resources)?,
        Effect::CreatePlanet(planet) => {
            storage::planet::create_planet(conn, planet)?;
        }
        Effect::DestroyPlanet(id) => storage::planet::delete_planet(conn, *id)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    use crate::model::{MessageKind, NewPlanet, Planet, UnitKind};
    use crate::storage::tests::test_storage;

    const T0: i64 = 1_700_000_000;

    fn at(offset: i64) -> Timestamp {
        Timestamp::from_second(T0 + offset).unwrap()
    }

    fn found(
        storage: &Storage,
        player: i64,
        position: u32,
        resources: Resources,
        units: UnitCollection,
    ) -> Planet {
        storage
            .create_planet(&NewPlanet {
                player_id: PlayerId(player),
                name: format!("P{position}"),
                coordinate: Coordinate::new(1, 1, position),
                body_type: BodyType::Planet,
                diameter: 12_800,
                resources,
                units,
            })
            .unwrap()
    }

    fn request(
        origin: &Planet,
        mission_type: MissionType,
        to: Coordinate,
        units: UnitCollection,
        resources: Resources,
    ) -> DispatchRequest {
        DispatchRequest {
            player: origin.player_id,
            origin: origin.id,
            mission_type,
            destination: to,
            destination_body: BodyType::Planet,
            units,
            resources,
            speed: SpeedPercent::FULL,
        }
    }

    fn inbox(storage: &Storage, player: i64) -> Vec<MessageKind> {
        storage
            .messages_for_player(PlayerId(player))
            .unwrap()
            .into_iter()
            .map(|m| m.kind)
            .collect()
    }

    fn cargo_fleet(n: u64) -> UnitCollection {
        UnitCollection::new().with(UnitKind::SmallCargo, n)
    }

    /// Player 1 holds a stocked planet at 1:1:1 and an empty one at 1:1:2.
    fn two_planets(storage: &Storage) -> (Planet, Planet) {
        let a = found(storage, 1, 1, Resources::cargo(1_000, 0, 10), cargo_fleet(5));
        let b = found(storage, 1, 2, Resources::ZERO, UnitCollection::new());
        (a, b)
    }

    #[test]
    fn deployment_delivers_exact_payload_without_return() {
        let storage = test_storage();
        let control = MissionControl::new(&storage, UniverseConfig::default());
        let (a, b) = two_planets(&storage);

        let mission = control
            .dispatch(
                &request(
                    &a,
                    MissionType::Deployment,
                    b.coordinate,
                    cargo_fleet(1),
                    Resources::cargo(100, 0, 0),
                ),
                at(0),
            )
            .unwrap();
        assert_eq!(mission.duration_secs(), 506);

        let after = storage.planet(a.id).unwrap();
        assert_eq!(after.resources, Resources::cargo(900, 0, 8));
        assert_eq!(after.units, cargo_fleet(4));

        let report = control.process_due_missions(PlayerId(1), at(506)).unwrap();
        assert_eq!(report.processed, vec![mission.id]);
        assert!(report.failed.is_empty());

        let b = storage.planet(b.id).unwrap();
        assert_eq!(b.resources, Resources::cargo(100, 0, 0));
        assert_eq!(b.units, cargo_fleet(1));
        assert!(storage.child_missions(mission.id).unwrap().is_empty());
        assert_eq!(inbox(&storage, 1), vec![MessageKind::FleetDeploymentWithResources]);
    }

    #[test]
    fn deployment_without_cargo_sends_plain_notice() {
        let storage = test_storage();
        let control = MissionControl::new(&storage, UniverseConfig::default());
        let (a, b) = two_planets(&storage);

        control
            .dispatch(
                &request(
                    &a,
                    MissionType::Deployment,
                    b.coordinate,
                    cargo_fleet(1),
                    Resources::ZERO,
                ),
                at(0),
            )
            .unwrap();
        control.process_due_missions(PlayerId(1), at(1_000)).unwrap();

        assert_eq!(inbox(&storage, 1), vec![MessageKind::FleetDeployment]);
    }

    #[test]
    fn mission_not_yet_arrived_is_left_alone() {
        let storage = test_storage();
        let control = MissionControl::new(&storage, UniverseConfig::default());
        let (a, b) = two_planets(&storage);

        control
            .dispatch(
                &request(
                    &a,
                    MissionType::Deployment,
                    b.coordinate,
                    cargo_fleet(1),
                    Resources::ZERO,
                ),
                at(0),
            )
            .unwrap();

        let report = control.process_due_missions(PlayerId(1), at(505)).unwrap();
        assert!(report.processed.is_empty());
        assert_eq!(control.active_missions(PlayerId(1)).unwrap().len(), 1);
    }

    #[test]
    fn overdrawn_dispatch_changes_nothing() {
        let storage = test_storage();
        let control = MissionControl::new(&storage, UniverseConfig::default());
        let (a, b) = two_planets(&storage);

        let err = control
            .dispatch(
                &request(
                    &a,
                    MissionType::Transport,
                    b.coordinate,
                    cargo_fleet(1),
                    Resources::cargo(2_000, 0, 0),
                ),
                at(0),
            )
            .unwrap_err();
        assert!(matches!(err, FleetError::InsufficientResources(_)));

        let err = control
            .dispatch(
                &request(&a, MissionType::Transport, b.coordinate, cargo_fleet(6), Resources::ZERO),
                at(0),
            )
            .unwrap_err();
        assert!(matches!(err, FleetError::InsufficientUnits(_)));

        assert_eq!(storage.planet(a.id).unwrap(), a);
        assert!(control.active_missions(PlayerId(1)).unwrap().is_empty());
    }

    #[test]
    fn infeasible_dispatch_is_refused() {
        let storage = test_storage();
        let control = MissionControl::new(&storage, UniverseConfig::default());
        let (a, _) = two_planets(&storage);
        let foreign = found(&storage, 2, 3, Resources::ZERO, UnitCollection::new());

        let err = control
            .dispatch(
                &request(
                    &a,
                    MissionType::Deployment,
                    foreign.coordinate,
                    cargo_fleet(1),
                    Resources::ZERO,
                ),
                at(0),
            )
            .unwrap_err();
        assert!(matches!(err, FleetError::InfeasibleMission(_)));

        let err = control
            .dispatch(
                &request(
                    &a,
                    MissionType::Transport,
                    Coordinate::new(1, 1, 9),
                    cargo_fleet(1),
                    Resources::ZERO,
                ),
                at(0),
            )
            .unwrap_err();
        assert!(matches!(err, FleetError::TargetNotFound(_)));

        storage
            .stock_planet(a.id, &Resources::cargo(10_000, 0, 0), &UnitCollection::new())
            .unwrap();
        let err = control
            .dispatch(
                &request(
                    &a,
                    MissionType::Transport,
                    foreign.coordinate,
                    cargo_fleet(1),
                    Resources::cargo(5_001, 0, 0),
                ),
                at(0),
            )
            .unwrap_err();
        assert!(matches!(err, FleetError::InfeasibleMission(msg) if msg.contains("carry")));

        let status = control
            .is_mission_possible(
                a.id,
                MissionType::Attack,
                foreign.coordinate,
                BodyType::Planet,
                &cargo_fleet(1),
            )
            .unwrap();
        assert!(status.possible);
    }

    #[test]
    fn only_the_owner_may_dispatch() {
        let storage = test_storage();
        let control = MissionControl::new(&storage, UniverseConfig::default());
        let (a, b) = two_planets(&storage);

        let mut req = request(
            &a,
            MissionType::Deployment,
            b.coordinate,
            cargo_fleet(1),
            Resources::ZERO,
        );
        req.player = PlayerId(2);
        assert!(matches!(
            control.dispatch(&req, at(0)),
            Err(FleetError::NotOwner { .. })
        ));
    }

    #[test]
    fn espionage_round_trip_restores_the_fleet() {
        let storage = test_storage();
        let control = MissionControl::new(&storage, UniverseConfig::default());
        let probes = UnitCollection::new().with(UnitKind::EspionageProbe, 3);
        let a = found(&storage, 1, 1, Resources::cargo(1_000, 0, 10), probes.clone());
        let target = found(&storage, 2, 3, Resources::cargo(42, 0, 0), UnitCollection::new());

        let mission = control
            .dispatch(
                &request(
                    &a,
                    MissionType::Espionage,
                    target.coordinate,
                    UnitCollection::new().with(UnitKind::EspionageProbe, 1),
                    Resources::ZERO,
                ),
                at(0),
            )
            .unwrap();
        let fuel = 10 - storage.planet(a.id).unwrap().resources.deuterium;

        // Outbound and return are both past due: one tick lands both.
        let report = control.process_due_missions(PlayerId(1), at(10_000)).unwrap();
        let back = storage.child_missions(mission.id).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(report.processed, vec![mission.id, back[0].id]);

        let home = storage.planet(a.id).unwrap();
        assert_eq!(home.units, probes);
        assert_eq!(home.resources, Resources::cargo(1_000, 0, 10 - fuel));
        assert_eq!(
            inbox(&storage, 1),
            vec![MessageKind::EspionageReport, MessageKind::ReturnOfFleet]
        );
        assert_eq!(inbox(&storage, 2), vec![MessageKind::EspionageDetected]);
    }

    #[test]
    fn ticking_twice_processes_once() {
        let storage = test_storage();
        let control = MissionControl::new(&storage, UniverseConfig::default());
        let (a, b) = two_planets(&storage);
        control
            .dispatch(
                &request(
                    &a,
                    MissionType::Deployment,
                    b.coordinate,
                    cargo_fleet(1),
                    Resources::cargo(100, 0, 0),
                ),
                at(0),
            )
            .unwrap();

        let first = control.process_due_missions(PlayerId(1), at(600)).unwrap();
        let second = control.process_due_missions(PlayerId(1), at(600)).unwrap();

        assert_eq!(first.processed.len(), 1);
        assert!(second.processed.is_empty());
        assert_eq!(storage.planet(b.id).unwrap().resources.metal, 100);
    }

    #[test]
    fn concurrent_stores_process_each_mission_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("universe.sqlite");
        let first = Storage::open(&path).unwrap();
        let second = Storage::open(&path).unwrap();
        let (a, b) = two_planets(&first);

        let one = MissionControl::new(&first, UniverseConfig::default());
        let two = MissionControl::new(&second, UniverseConfig::default());
        one.dispatch(
            &request(
                &a,
                MissionType::Deployment,
                b.coordinate,
                cargo_fleet(1),
                Resources::cargo(100, 0, 0),
            ),
            at(0),
        )
        .unwrap();

        let r1 = one.process_due_missions(PlayerId(1), at(600)).unwrap();
        let r2 = two.process_due_missions(PlayerId(1), at(600)).unwrap();

        assert_eq!(r1.processed.len() + r2.processed.len(), 1);
        assert_eq!(second.planet(b.id).unwrap().resources.metal, 100);
    }

    #[test]
    fn recall_returns_after_elapsed_time() {
        let storage = test_storage();
        let control = MissionControl::new(&storage, UniverseConfig::default());
        let (a, b) = two_planets(&storage);
        let mission = control
            .dispatch(
                &request(
                    &a,
                    MissionType::Transport,
                    b.coordinate,
                    cargo_fleet(1),
                    Resources::cargo(100, 0, 0),
                ),
                at(0),
            )
            .unwrap();

        let back = control.recall(PlayerId(1), mission.id, at(30)).unwrap();
        assert_eq!(back.time_departure, at(30));
        assert_eq!(back.time_arrival, at(60));
        assert_eq!(back.parent_id, Some(mission.id));

        let outbound = storage.mission(mission.id).unwrap();
        assert!(outbound.canceled && outbound.processed);

        let report = control.process_due_missions(PlayerId(1), at(60)).unwrap();
        assert_eq!(report.processed, vec![back.id]);

        let home = storage.planet(a.id).unwrap();
        assert_eq!(home.units, cargo_fleet(5));
        assert_eq!(home.resources.metal, 1_000);
        assert_eq!(storage.planet(b.id).unwrap().resources, Resources::ZERO);
        assert_eq!(
            inbox(&storage, 1),
            vec![MessageKind::FleetRecalled, MessageKind::ReturnOfFleet]
        );
    }

    #[test]
    fn recall_is_refused_when_repeated_foreign_or_late() {
        let storage = test_storage();
        let control = MissionControl::new(&storage, UniverseConfig::default());
        let (a, b) = two_planets(&storage);
        let send = |at_| {
            control
                .dispatch(
                    &request(
                        &a,
                        MissionType::Transport,
                        b.coordinate,
                        cargo_fleet(1),
                        Resources::ZERO,
                    ),
                    at_,
                )
                .unwrap()
        };

        let m = send(at(0));
        control.recall(PlayerId(1), m.id, at(30)).unwrap();
        assert!(matches!(
            control.recall(PlayerId(1), m.id, at(40)),
            Err(FleetError::InvalidMissionState(_))
        ));

        let m = send(at(0));
        assert!(matches!(
            control.recall(PlayerId(2), m.id, at(10)),
            Err(FleetError::NotOwner { .. })
        ));
        assert!(matches!(
            control.recall(PlayerId(1), m.id, at(506)),
            Err(FleetError::InvalidMissionState(_))
        ));
        assert!(matches!(
            control.recall(PlayerId(1), 9_999, at(10)),
            Err(FleetError::MissionNotFound(9_999))
        ));
    }

    #[test]
    fn attack_is_processed_by_the_defenders_tick() {
        let storage = test_storage();
        let control = MissionControl::new(&storage, UniverseConfig::default());
        let fleet = UnitCollection::new().with(UnitKind::Battleship, 10);
        let a = found(&storage, 1, 1, Resources::cargo(0, 0, 10_000), fleet.clone());
        let victim = found(
            &storage,
            2,
            3,
            Resources::cargo(10_000, 10_000, 0),
            UnitCollection::new(),
        );

        let mission = control
            .dispatch(
                &request(
                    &a,
                    MissionType::Attack,
                    victim.coordinate,
                    fleet.clone(),
                    Resources::ZERO,
                ),
                at(0),
            )
            .unwrap();

        let report = control
            .process_due_missions(PlayerId(2), mission.time_arrival)
            .unwrap();
        assert_eq!(report.processed, vec![mission.id]);
        assert_eq!(
            storage.planet(victim.id).unwrap().resources,
            Resources::cargo(5_000, 5_000, 0)
        );

        let before = storage.planet(a.id).unwrap().resources;
        control.process_due_missions(PlayerId(1), at(100_000)).unwrap();
        let home = storage.planet(a.id).unwrap();
        assert_eq!(home.units, fleet);
        assert_eq!(home.resources.metal, before.metal + 5_000);
        assert_eq!(home.resources.crystal, before.crystal + 5_000);
        assert_eq!(
            inbox(&storage, 2),
            vec![MessageKind::BattleReport]
        );
    }

    #[test]
    fn colonization_founds_a_planet() {
        let storage = test_storage();
        let control = MissionControl::new(&storage, UniverseConfig::default());
        let fleet = UnitCollection::new()
            .with(UnitKind::ColonyShip, 1)
            .with(UnitKind::SmallCargo, 1);
        let a = found(&storage, 1, 1, Resources::cargo(1_000, 0, 10_000), fleet.clone());
        let slot = Coordinate::new(1, 1, 9);

        control
            .dispatch(
                &request(&a, MissionType::Colonization, slot, fleet, Resources::cargo(300, 0, 0)),
                at(0),
            )
            .unwrap();
        control.process_due_missions(PlayerId(1), at(100_000)).unwrap();

        let colony = storage.planet_at(slot, BodyType::Planet).unwrap().unwrap();
        assert_eq!(colony.player_id, PlayerId(1));
        assert_eq!(colony.resources, Resources::cargo(300, 0, 0));
        assert_eq!(storage.planet(a.id).unwrap().units, cargo_fleet(1));
        assert!(inbox(&storage, 1).contains(&MessageKind::ColonyEstablished));
    }

    #[test]
    fn recyclers_bring_debris_home() {
        let storage = test_storage();
        let control = MissionControl::new(&storage, UniverseConfig::default());
        let recycler = UnitCollection::new().with(UnitKind::Recycler, 1);
        let a = found(&storage, 1, 1, Resources::cargo(0, 0, 10_000), recycler.clone());
        let spot = Coordinate::new(1, 1, 3);
        let tx = storage.begin().unwrap();
        storage::debris::add_debris(&tx, spot, &Resources::cargo(4_000, 1_000, 0)).unwrap();
        tx.commit().unwrap();

        let mut req = request(&a, MissionType::Recycle, spot, recycler, Resources::ZERO);
        req.destination_body = BodyType::DebrisField;
        control.dispatch(&req, at(0)).unwrap();
        let before = storage.planet(a.id).unwrap().resources;
        control.process_due_missions(PlayerId(1), at(100_000)).unwrap();

        assert!(storage.debris_at(spot).unwrap().is_none());
        let home = storage.planet(a.id).unwrap().resources;
        assert_eq!(home.metal, before.metal + 4_000);
        assert_eq!(home.crystal, before.crystal + 1_000);
    }

    #[test]
    fn a_broken_mission_does_not_stop_the_tick() {
        let storage = test_storage();
        let control = MissionControl::new(&storage, UniverseConfig::default());
        let (a, b) = two_planets(&storage);
        let send = || {
            control
                .dispatch(
                    &request(
                        &a,
                        MissionType::Transport,
                        b.coordinate,
                        cargo_fleet(1),
                        Resources::ZERO,
                    ),
                    at(0),
                )
                .unwrap()
        };
        let broken = send();
        let fine = send();
        let tx = storage.begin().unwrap();
        tx.execute(
            "UPDATE fleet_missions SET units = 'garbage' WHERE id = ?1",
            [broken.id],
        )
        .unwrap();
        tx.commit().unwrap();

        let report = control.process_due_missions(PlayerId(1), at(506)).unwrap();

        assert_eq!(report.processed, vec![fine.id]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, broken.id);
    }

    #[test]
    fn duration_uses_slowest_ship() {
        let storage = test_storage();
        let control = MissionControl::new(&storage, UniverseConfig::default());
        let from = Coordinate::new(1, 1, 1);
        let to = Coordinate::new(1, 1, 2);

        let alone = control.calculate_fleet_mission_duration(
            MissionType::Transport,
            from,
            to,
            &cargo_fleet(1),
        );
        let mixed = control.calculate_fleet_mission_duration(
            MissionType::Transport,
            from,
            to,
            &cargo_fleet(1).with(UnitKind::Recycler, 1),
        );
        assert_eq!(alone, 506);
        assert!(mixed > alone);
    }

    #[test]
    fn oversized_requests_report_missing_holdings() {
        let storage = test_storage();
        let control = MissionControl::new(&storage, UniverseConfig::default());
        let (a, b) = two_planets(&storage);

        let err = control
            .dispatch(
                &request(
                    &a,
                    MissionType::Transport,
                    b.coordinate,
                    cargo_fleet(4_000_000_000_000_000),
                    Resources::ZERO,
                ),
                at(0),
            )
            .unwrap_err();
        assert!(matches!(err, FleetError::InsufficientUnits(_)));

        let err = control
            .dispatch(
                &request(
                    &a,
                    MissionType::Transport,
                    b.coordinate,
                    cargo_fleet(1),
                    Resources::cargo(u64::MAX, 1, 0),
                ),
                at(0),
            )
            .unwrap_err();
        assert!(matches!(err, FleetError::InsufficientResources(_)));

        assert_eq!(storage.planet(a.id).unwrap(), a);
    }

    #[test]
    fn arrivals_at_one_planet_are_all_credited_in_order() {
        let storage = test_storage();
        let control = MissionControl::new(&storage, UniverseConfig::default());
        let (a, b) = two_planets(&storage);
        let send = |metal, at_| {
            control
                .dispatch(
                    &request(
                        &a,
                        MissionType::Transport,
                        b.coordinate,
                        cargo_fleet(1),
                        Resources::cargo(metal, 0, 0),
                    ),
                    at_,
                )
                .unwrap()
        };
        let later = send(250, at(100));
        let sooner = send(100, at(0));

        let report = control.process_due_missions(PlayerId(1), at(10_000)).unwrap();

        let back = |m: &FleetMission| storage.child_missions(m.id).unwrap()[0].id;
        assert_eq!(
            report.processed,
            vec![sooner.id, later.id, back(&sooner), back(&later)]
        );
        assert_eq!(
            storage.planet(b.id).unwrap().resources,
            Resources::cargo(350, 0, 0)
        );
    }

    #[test]
    fn feasibility_check_reads_past_a_busy_writer() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("universe.sqlite");
        let writer = Storage::open(&path).unwrap();
        let reader = Storage::open(&path).unwrap();
        let (a, b) = two_planets(&writer);

        let _held = writer.begin().unwrap();
        let control = MissionControl::new(&reader, UniverseConfig::default());
        let status = control
            .is_mission_possible(
                a.id,
                MissionType::Deployment,
                b.coordinate,
                BodyType::Planet,
                &cargo_fleet(1),
            )
            .unwrap();

        assert!(status.possible);
    }
}
