//! Debris field storage.

use rusqlite::{Connection, OptionalExtension, params};

use crate::model::{Coordinate, DebrisField, Resources};

use super::{Result, Storage, to_i64, to_u64};

impl Storage {
    pub fn debris_at(&self, coordinate: Coordinate) -> Result<Option<DebrisField>> {
        load_debris(&self.conn, coordinate)
    }
}

pub fn load_debris(conn: &Connection, coordinate: Coordinate) -> Result<Option<DebrisField>> {
    let raw: Option<[i64; 3]> = conn
        .query_row(
            "SELECT metal, crystal, deuterium FROM debris_fields
             WHERE galaxy = ?1 AND system = ?2 AND position = ?3",
            params![coordinate.galaxy, coordinate.system, coordinate.position],
            |r| Ok([r.get(0)?, r.get(1)?, r.get(2)?]),
        )
        .optional()?;
    raw.map(|[m, c, d]| {
        Ok(DebrisField {
            coordinate,
            resources: Resources::cargo(
                to_u64(m, "metal")?,
                to_u64(c, "crystal")?,
                to_u64(d, "deuterium")?,
            ),
        })
    })
    .transpose()
}

/// Piles `resources` onto the field at `coordinate`, creating it if needed.
pub fn add_debris(conn: &Connection, coordinate: Coordinate, resources: &Resources) -> Result<()> {
    if resources.sum() == 0 {
        return Ok(());
    }
    conn.execute(
        "INSERT INTO debris_fields (galaxy, system, position, metal, crystal, deuterium)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT (galaxy, system, position) DO UPDATE SET
             metal = metal + excluded.metal,
             crystal = crystal + excluded.crystal,
             deuterium = deuterium + excluded.deuterium",
        params![
            coordinate.galaxy,
            coordinate.system,
            coordinate.position,
            to_i64(resources.metal),
            to_i64(resources.crystal),
            to_i64(resources.deuterium),
        ],
    )?;
    Ok(())
}

/// Removes `resources` from the field at `coordinate`. An emptied field is deleted.
pub fn remove_debris(
    conn: &Connection,
    coordinate: Coordinate,
    resources: &Resources,
) -> Result<()> {
    let field = load_debris(conn, coordinate)?.map_or(Resources::ZERO, |f| f.resources);
    let left = field.subtract(resources)?;
    if left.sum() == 0 {
        conn.execute(
            "DELETE FROM debris_fields WHERE galaxy = ?1 AND system = ?2 AND position = ?3",
            params![coordinate.galaxy, coordinate.system, coordinate.position],
        )?;
    } else {
        conn.execute(
            "UPDATE debris_fields SET metal = ?4, crystal = ?5, deuterium = ?6
             WHERE galaxy = ?1 AND system = ?2 AND position = ?3",
            params![
                coordinate.galaxy,
                coordinate.system,
                coordinate.position,
                to_i64(left.metal),
                to_i64(left.crystal),
                to_i64(left.deuterium),
            ],
        )?;
    }
    Ok(())
}
