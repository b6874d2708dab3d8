//! Fleet mission storage and the processed/canceled latches.

use jiff::Timestamp;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::model::{
    BodyType, Coordinate, FleetMission, MissionId, MissionType, NewMission, PlayerId, Resources,
    UnitCollection,
};

use super::{Result, Storage, StorageError, timestamp, to_i64, to_u32, to_u64};

const MISSION_COLUMNS: &str = "id, player_id, mission_type, parent_id,
    planet_id_from, galaxy_from, system_from, position_from, type_from,
    planet_id_to, galaxy_to, system_to, position_to, type_to,
    target_owner_id, units, metal, crystal, deuterium,
    time_departure, time_arrival, processed, canceled";

/// Missions that concern `player`: flown by them, or aimed at one of their bodies.
const CONCERNS_PLAYER: &str = "(player_id = ?1
    OR planet_id_to IN (SELECT id FROM planets WHERE player_id = ?1))";

impl Storage {
    pub fn mission(&self, id: MissionId) -> Result<FleetMission> {
        load_mission(&self.conn, id)
    }

    /// Unprocessed missions concerning `player`, soonest arrival first.
    pub fn active_missions(&self, player: PlayerId) -> Result<Vec<FleetMission>> {
        active_missions(&self.conn, player)
    }

    /// Unprocessed missions concerning `player` that have arrived by `now`.
    pub fn due_missions(
        &self,
        player: PlayerId,
        now: Timestamp,
    ) -> Result<Vec<(MissionId, Timestamp)>> {
        due_missions(&self.conn, player, now)
    }

    /// Return legs spawned by `parent`.
    pub fn child_missions(&self, parent: MissionId) -> Result<Vec<FleetMission>> {
        child_missions(&self.conn, parent)
    }
}

pub fn insert_mission(conn: &Connection, mission: &NewMission) -> Result<FleetMission> {
    let units = serde_json::to_string(&mission.units)?;
    conn.execute(
        "INSERT INTO fleet_missions (
            player_id, mission_type, parent_id,
            planet_id_from, galaxy_from, system_from, position_from, type_from,
            planet_id_to, galaxy_to, system_to, position_to, type_to,
            target_owner_id, units, metal, crystal, deuterium,
            time_departure, time_arrival)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18,
                 ?19, ?20)",
        params![
            mission.player_id.0,
            mission.mission_type.id(),
            mission.parent_id,
            mission.planet_id_from,
            mission.origin.galaxy,
            mission.origin.system,
            mission.origin.position,
            mission.origin_body.id(),
            mission.planet_id_to,
            mission.destination.galaxy,
            mission.destination.system,
            mission.destination.position,
            mission.destination_body.id(),
            mission.target_owner_id.map(|p| p.0),
            units,
            to_i64(mission.resources.metal),
            to_i64(mission.resources.crystal),
            to_i64(mission.resources.deuterium),
            mission.time_departure.as_second(),
            mission.time_arrival.as_second(),
        ],
    )?;
    load_mission(conn, conn.last_insert_rowid())
}

pub fn load_mission(conn: &Connection, id: MissionId) -> Result<FleetMission> {
    conn.query_row(
        &format!("SELECT {MISSION_COLUMNS} FROM fleet_missions WHERE id = ?1"),
        [id],
        read_row,
    )
    .optional()?
    .ok_or(StorageError::MissionNotFound(id))?
}

/// Sets the processed latch. Returns `false` if another worker got there first.
pub fn claim_mission(conn: &Connection, id: MissionId) -> Result<bool> {
    let rows = conn.execute(
        "UPDATE fleet_missions SET processed = 1 WHERE id = ?1 AND processed = 0",
        [id],
    )?;
    Ok(rows == 1)
}

/// Marks a mission recalled. Both latches are set so no tick will ever
/// process its arrival. Returns `false` if it was already processed or canceled.
pub fn cancel_mission(conn: &Connection, id: MissionId) -> Result<bool> {
    let rows = conn.execute(
        "UPDATE fleet_missions SET canceled = 1, processed = 1
         WHERE id = ?1 AND processed = 0 AND canceled = 0",
        [id],
    )?;
    Ok(rows == 1)
}

/// Ids and arrival times of unprocessed missions concerning `player` that
/// have arrived by `now`, in arrival order. Rows are loaded one by one
/// afterwards, so a corrupt row only fails its own processing.
pub fn due_missions(
    conn: &Connection,
    player: PlayerId,
    now: Timestamp,
) -> Result<Vec<(MissionId, Timestamp)>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, time_arrival FROM fleet_missions
         WHERE processed = 0 AND time_arrival <= ?2 AND {CONCERNS_PLAYER}
         ORDER BY time_arrival, id"
    ))?;
    let rows = stmt
        .query_map(params![player.0, now.as_second()], |r| {
            Ok((r.get::<_, MissionId>(0)?, r.get::<_, i64>(1)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    rows.into_iter()
        .map(|(id, arrival)| Ok((id, timestamp(arrival, "time_arrival")?)))
        .collect()
}

pub fn active_missions(conn: &Connection, player: PlayerId) -> Result<Vec<FleetMission>> {
    query_missions(
        conn,
        &format!(
            "SELECT {MISSION_COLUMNS} FROM fleet_missions
             WHERE processed = 0 AND {CONCERNS_PLAYER}
             ORDER BY time_arrival, id"
        ),
        params![player.0],
    )
}

pub fn child_missions(conn: &Connection, parent: MissionId) -> Result<Vec<FleetMission>> {
    query_missions(
        conn,
        &format!(
            "SELECT {MISSION_COLUMNS} FROM fleet_missions WHERE parent_id = ?1 ORDER BY id"
        ),
        params![parent],
    )
}

fn query_missions(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::ToSql],
) -> Result<Vec<FleetMission>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, read_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    rows.into_iter().collect()
}

/// Reads a row; validation errors surface as the inner `Result`.
fn read_row(r: &Row<'_>) -> rusqlite::Result<Result<FleetMission>> {
    let raw = RawMission {
        id: r.get(0)?,
        player_id: r.get(1)?,
        mission_type: r.get(2)?,
        parent_id: r.get(3)?,
        planet_id_from: r.get(4)?,
        origin: [r.get(5)?, r.get(6)?, r.get(7)?],
        origin_body: r.get(8)?,
        planet_id_to: r.get(9)?,
        destination: [r.get(10)?, r.get(11)?, r.get(12)?],
        destination_body: r.get(13)?,
        target_owner_id: r.get(14)?,
        units: r.get(15)?,
        resources: [r.get(16)?, r.get(17)?, r.get(18)?],
        time_departure: r.get(19)?,
        time_arrival: r.get(20)?,
        processed: r.get(21)?,
        canceled: r.get(22)?,
    };
    Ok(raw.validate())
}

struct RawMission {
    id: MissionId,
    player_id: i64,
    mission_type: i64,
    parent_id: Option<MissionId>,
    planet_id_from: Option<i64>,
    origin: [i64; 3],
    origin_body: i64,
    planet_id_to: Option<i64>,
    destination: [i64; 3],
    destination_body: i64,
    target_owner_id: Option<i64>,
    units: String,
    resources: [i64; 3],
    time_departure: i64,
    time_arrival: i64,
    processed: bool,
    canceled: bool,
}

impl RawMission {
    fn validate(self) -> Result<FleetMission> {
        let mission_type = MissionType::from_id(self.mission_type).ok_or_else(|| {
            StorageError::Corrupt(format!("invalid mission type: {}", self.mission_type))
        })?;
        let units: UnitCollection = serde_json::from_str(&self.units)
            .map_err(|e| {
                StorageError::Corrupt(format!("invalid units in mission {}: {e}", self.id))
            })?;
        let [m, c, d] = self.resources;
        Ok(FleetMission {
            id: self.id,
            player_id: PlayerId(self.player_id),
            mission_type,
            parent_id: self.parent_id,
            planet_id_from: self.planet_id_from,
            origin: coordinate(self.origin)?,
            origin_body: body(self.origin_body)?,
            planet_id_to: self.planet_id_to,
            destination: coordinate(self.destination)?,
            destination_body: body(self.destination_body)?,
            target_owner_id: self.target_owner_id.map(PlayerId),
            units,
            resources: Resources::cargo(
                to_u64(m, "metal")?,
                to_u64(c, "crystal")?,
                to_u64(d, "deuterium")?,
            ),
            time_departure: timestamp(self.time_departure, "time_departure")?,
            time_arrival: timestamp(self.time_arrival, "time_arrival")?,
            processed: self.processed,
            canceled: self.canceled,
        })
    }
}

fn coordinate([g, s, p]: [i64; 3]) -> Result<Coordinate> {
    Ok(Coordinate::new(
        to_u32(g, "galaxy")?,
        to_u32(s, "system")?,
        to_u32(p, "position")?,
    ))
}

fn body(id: i64) -> Result<BodyType> {
    BodyType::from_id(id).ok_or_else(|| StorageError::Corrupt(format!("invalid body type: {id}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::UnitKind;
    use crate::storage::planet::{create_planet, tests::homeworld};
    use crate::storage::tests::test_storage;

    use tempfile::TempDir;

    fn at(seconds: i64) -> Timestamp {
        Timestamp::from_second(seconds).unwrap()
    }

    fn outbound(player: i64, to: Option<i64>, arrival: i64) -> NewMission {
        NewMission {
            player_id: PlayerId(player),
            mission_type: MissionType::Transport,
            parent_id: None,
            planet_id_from: None,
            origin: Coordinate::new(1, 1, 1),
            origin_body: BodyType::Planet,
            planet_id_to: to,
            destination: Coordinate::new(1, 1, 2),
            destination_body: BodyType::Planet,
            target_owner_id: None,
            units: UnitCollection::new().with(UnitKind::SmallCargo, 2),
            resources: Resources::cargo(100, 50, 0),
            time_departure: at(0),
            time_arrival: at(arrival),
        }
    }

    #[test]
    fn insert_and_load_round_trip() {
        let storage = test_storage();
        let tx = storage.begin().unwrap();
        let stored = insert_mission(&tx, &outbound(1, None, 60)).unwrap();
        tx.commit().unwrap();

        let loaded = storage.mission(stored.id).unwrap();
        assert_eq!(loaded, stored);
        assert_eq!(loaded.units.amount(UnitKind::SmallCargo), 2);
        assert!(!loaded.processed && !loaded.canceled);
    }

    #[test]
    fn claim_is_a_one_shot_latch() {
        let storage = test_storage();
        let tx = storage.begin().unwrap();
        let m = insert_mission(&tx, &outbound(1, None, 60)).unwrap();

        assert!(claim_mission(&tx, m.id).unwrap());
        assert!(!claim_mission(&tx, m.id).unwrap());
        assert!(!cancel_mission(&tx, m.id).unwrap());
    }

    #[test]
    fn cancel_sets_both_latches() {
        let storage = test_storage();
        let tx = storage.begin().unwrap();
        let m = insert_mission(&tx, &outbound(1, None, 60)).unwrap();
        assert!(cancel_mission(&tx, m.id).unwrap());
        tx.commit().unwrap();

        let loaded = storage.mission(m.id).unwrap();
        assert!(loaded.processed && loaded.canceled);
    }

    #[test]
    fn due_includes_missions_aimed_at_players_planets() {
        let storage = test_storage();
        let tx = storage.begin().unwrap();
        let target = create_planet(&tx, &homeworld(2, 2)).unwrap();
        insert_mission(&tx, &outbound(1, Some(target.id), 50)).unwrap();
        insert_mission(&tx, &outbound(2, None, 40)).unwrap();
        insert_mission(&tx, &outbound(2, None, 500)).unwrap();
        insert_mission(&tx, &outbound(3, None, 10)).unwrap();
        tx.commit().unwrap();

        let due = storage.due_missions(PlayerId(2), at(100)).unwrap();
        let arrivals: Vec<_> = due.iter().map(|(_, t)| t.as_second()).collect();
        assert_eq!(arrivals, vec![40, 50]);

        assert_eq!(storage.active_missions(PlayerId(2)).unwrap().len(), 3);
    }

    #[test]
    fn children_link_to_parent() {
        let storage = test_storage();
        let tx = storage.begin().unwrap();
        let parent = insert_mission(&tx, &outbound(1, None, 60)).unwrap();
        let back = NewMission::return_of(
            &parent,
            parent.units.clone(),
            Resources::ZERO,
            parent.time_arrival,
            at(120),
        );
        let child = insert_mission(&tx, &back).unwrap();
        tx.commit().unwrap();

        assert_eq!(storage.child_missions(parent.id).unwrap(), vec![child]);
    }

    #[test]
    fn claim_is_exclusive_across_connections() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("universe.sqlite");
        let first = Storage::open(&path).unwrap();
        let second = Storage::open(&path).unwrap();

        let tx = first.begin().unwrap();
        let m = insert_mission(&tx, &outbound(1, None, 60)).unwrap();
        tx.commit().unwrap();

        let tx = first.begin().unwrap();
        assert!(claim_mission(&tx, m.id).unwrap());
        tx.commit().unwrap();

        let tx = second.begin().unwrap();
        assert!(!claim_mission(&tx, m.id).unwrap());
    }

    #[test]
    fn corrupt_units_are_reported() {
        let storage = test_storage();
        let tx = storage.begin().unwrap();
        let m = insert_mission(&tx, &outbound(1, None, 60)).unwrap();
        tx.execute("UPDATE fleet_missions SET units = 'nope' WHERE id = ?1", [m.id])
            .unwrap();

        assert!(matches!(load_mission(&tx, m.id), Err(StorageError::Corrupt(_))));
    }
}
