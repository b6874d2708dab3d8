//! Planet storage: founding, lookup, and resource/unit balances.

use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params};

use crate::model::{
    BodyType, Coordinate, NewPlanet, Planet, PlanetId, PlayerId, Resources, UnitCollection,
    UnitKind,
};

use super::{Result, Storage, StorageError, to_i64, to_u32, to_u64};

const PLANET_COLUMNS: &str = "id, player_id, name, galaxy, system, position, body_type, diameter, \
                              metal, crystal, deuterium, energy";

impl Storage {
    /// Founds a planet in its own transaction.
    pub fn create_planet(&self, planet: &NewPlanet) -> Result<Planet> {
        let tx = self.begin()?;
        let created = create_planet(&tx, planet)?;
        tx.commit()?;
        Ok(created)
    }

    pub fn planet(&self, id: PlanetId) -> Result<Planet> {
        load_planet(&self.conn, id)
    }

    pub fn planet_at(&self, coordinate: Coordinate, body: BodyType) -> Result<Option<Planet>> {
        find_planet_at(&self.conn, coordinate, body)
    }

    pub fn planets_for_player(&self, player: PlayerId) -> Result<Vec<Planet>> {
        planets_for_player(&self.conn, player)
    }

    /// Adds resources and units to a planet, as an administrative top-up.
    pub fn stock_planet(
        &self,
        id: PlanetId,
        resources: &Resources,
        units: &UnitCollection,
    ) -> Result<Planet> {
        let tx = self.begin()?;
        add_resources(&tx, id, resources)?;
        add_units(&tx, id, units)?;
        let planet = load_planet(&tx, id)?;
        tx.commit()?;
        Ok(planet)
    }
}

/// Inserts a planet and its garrison. Fails with [`StorageError::SlotTaken`]
/// if another body of the same type sits at the coordinate.
pub fn create_planet(conn: &Connection, planet: &NewPlanet) -> Result<Planet> {
    let r = &planet.resources;
    let inserted = conn.execute(
        "INSERT INTO planets (player_id, name, galaxy, system, position, body_type, diameter,
                              metal, crystal, deuterium, energy)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            planet.player_id.0,
            &planet.name,
            planet.coordinate.galaxy,
            planet.coordinate.system,
            planet.coordinate.position,
            planet.body_type.id(),
            to_i64(planet.diameter),
            to_i64(r.metal),
            to_i64(r.crystal),
            to_i64(r.deuterium),
            to_i64(r.energy),
        ],
    );
    match inserted {
        Ok(_) => {}
        Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
            return Err(StorageError::SlotTaken(format!(
                "{} ({})",
                planet.coordinate, planet.body_type
            )));
        }
        Err(e) => return Err(e.into()),
    }
    let id = conn.last_insert_rowid();
    add_units(conn, id, &planet.units)?;
    load_planet(conn, id)
}

pub fn load_planet(conn: &Connection, id: PlanetId) -> Result<Planet> {
    let row = conn
        .query_row(
            &format!("SELECT {PLANET_COLUMNS} FROM planets WHERE id = ?1"),
            [id],
            read_row,
        )
        .optional()?
        .ok_or(StorageError::PlanetNotFound(id))?;
    into_planet(conn, row)
}

pub fn find_planet_at(
    conn: &Connection,
    coordinate: Coordinate,
    body: BodyType,
) -> Result<Option<Planet>> {
    let row = conn
        .query_row(
            &format!(
                "SELECT {PLANET_COLUMNS} FROM planets
                 WHERE galaxy = ?1 AND system = ?2 AND position = ?3 AND body_type = ?4"
            ),
            params![
                coordinate.galaxy,
                coordinate.system,
                coordinate.position,
                body.id()
            ],
            read_row,
        )
        .optional()?;
    row.map(|r| into_planet(conn, r)).transpose()
}

pub fn planets_for_player(conn: &Connection, player: PlayerId) -> Result<Vec<Planet>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PLANET_COLUMNS} FROM planets WHERE player_id = ?1 ORDER BY id"
    ))?;
    let rows = stmt
        .query_map([player.0], read_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    rows.into_iter().map(|r| into_planet(conn, r)).collect()
}

/// Planets (not moons) held by `player`.
pub fn count_planets(conn: &Connection, player: PlayerId) -> Result<u32> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM planets WHERE player_id = ?1 AND body_type = ?2",
        params![player.0, BodyType::Planet.id()],
        |r| r.get(0),
    )?;
    to_u32(n, "planet count")
}

pub fn add_resources(conn: &Connection, id: PlanetId, resources: &Resources) -> Result<()> {
    let current = load_resources(conn, id)?;
    store_resources(conn, id, &current.add(resources))
}

/// Withdraws resources, failing without change if any balance would go negative.
pub fn subtract_resources(conn: &Connection, id: PlanetId, resources: &Resources) -> Result<()> {
    let current = load_resources(conn, id)?;
    store_resources(conn, id, &current.subtract(resources)?)
}

pub fn add_units(conn: &Connection, id: PlanetId, units: &UnitCollection) -> Result<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO planet_units (planet_id, unit, amount) VALUES (?1, ?2, ?3)
         ON CONFLICT (planet_id, unit) DO UPDATE SET amount = amount + excluded.amount",
    )?;
    for (unit, amount) in units.iter() {
        stmt.execute(params![id, unit.as_str(), to_i64(amount)])?;
    }
    Ok(())
}

/// Withdraws units, failing without change if any stack is too small.
pub fn subtract_units(conn: &Connection, id: PlanetId, units: &UnitCollection) -> Result<()> {
    let current = load_units(conn, id)?;
    let remaining = current.subtract(units)?;
    for (unit, _) in units.iter() {
        let left = remaining.amount(unit);
        if left == 0 {
            conn.execute(
                "DELETE FROM planet_units WHERE planet_id = ?1 AND unit = ?2",
                params![id, unit.as_str()],
            )?;
        } else {
            conn.execute(
                "UPDATE planet_units SET amount = ?3 WHERE planet_id = ?1 AND unit = ?2",
                params![id, unit.as_str(), to_i64(left)],
            )?;
        }
    }
    Ok(())
}

/// Removes a planet and its garrison.
pub fn delete_planet(conn: &Connection, id: PlanetId) -> Result<()> {
    let rows = conn.execute("DELETE FROM planets WHERE id = ?1", [id])?;
    if rows == 0 {
        return Err(StorageError::PlanetNotFound(id));
    }
    Ok(())
}

fn load_resources(conn: &Connection, id: PlanetId) -> Result<Resources> {
    let raw: Option<[i64; 4]> = conn
        .query_row(
            "SELECT metal, crystal, deuterium, energy FROM planets WHERE id = ?1",
            [id],
            |r| Ok([r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?]),
        )
        .optional()?;
    let [m, c, d, e] = raw.ok_or(StorageError::PlanetNotFound(id))?;
    Ok(Resources::new(
        to_u64(m, "metal")?,
        to_u64(c, "crystal")?,
        to_u64(d, "deuterium")?,
        to_u64(e, "energy")?,
    ))
}

fn store_resources(conn: &Connection, id: PlanetId, r: &Resources) -> Result<()> {
    conn.execute(
        "UPDATE planets SET metal = ?2, crystal = ?3, deuterium = ?4, energy = ?5 WHERE id = ?1",
        params![
            id,
            to_i64(r.metal),
            to_i64(r.crystal),
            to_i64(r.deuterium),
            to_i64(r.energy)
        ],
    )?;
    Ok(())
}

fn load_units(conn: &Connection, id: PlanetId) -> Result<UnitCollection> {
    let mut stmt = conn.prepare_cached(
        "SELECT unit, amount FROM planet_units WHERE planet_id = ?1 ORDER BY rowid",
    )?;
    let rows = stmt
        .query_map([id], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    rows.into_iter()
        .map(|(unit, amount)| {
            let unit = unit.parse::<UnitKind>().map_err(StorageError::Corrupt)?;
            Ok((unit, to_u64(amount, "unit amount")?))
        })
        .collect()
}

/// A planets row before validation.
struct PlanetRow {
    id: PlanetId,
    player_id: i64,
    name: String,
    coordinate: [i64; 3],
    body_type: i64,
    diameter: i64,
    resources: [i64; 4],
}

fn read_row(r: &Row<'_>) -> rusqlite::Result<PlanetRow> {
    Ok(PlanetRow {
        id: r.get(0)?,
        player_id: r.get(1)?,
        name: r.get(2)?,
        coordinate: [r.get(3)?, r.get(4)?, r.get(5)?],
        body_type: r.get(6)?,
        diameter: r.get(7)?,
        resources: [r.get(8)?, r.get(9)?, r.get(10)?, r.get(11)?],
    })
}

fn into_planet(conn: &Connection, row: PlanetRow) -> Result<Planet> {
    let [g, s, p] = row.coordinate;
    let [m, c, d, e] = row.resources;
    let body_type = BodyType::from_id(row.body_type)
        .ok_or_else(|| StorageError::Corrupt(format!("invalid body type: {}", row.body_type)))?;
    Ok(Planet {
        id: row.id,
        player_id: PlayerId(row.player_id),
        name: row.name,
        coordinate: Coordinate::new(
            to_u32(g, "galaxy")?,
            to_u32(s, "system")?,
            to_u32(p, "position")?,
        ),
        body_type,
        diameter: to_u64(row.diameter, "diameter")?,
        resources: Resources::new(
            to_u64(m, "metal")?,
            to_u64(c, "crystal")?,
            to_u64(d, "deuterium")?,
            to_u64(e, "energy")?,
        ),
        units: load_units(conn, row.id)?,
    })
}
