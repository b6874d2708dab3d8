//! Units: the ship and defense catalog, and ordered unit collections.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Resources;

/// A withdrawal would leave fewer than zero units of some type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("insufficient {unit}: have {available}, need {requested}")]
pub struct InsufficientUnits {
    pub unit: UnitKind,
    pub available: u64,
    pub requested: u64,
}

/// Everything a planet can hold: ships that fly and defenses that don't.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    SmallCargo,
    LargeCargo,
    LightFighter,
    HeavyFighter,
    Cruiser,
    Battleship,
    Battlecruiser,
    Bomber,
    Destroyer,
    Deathstar,
    ColonyShip,
    Recycler,
    EspionageProbe,
    SolarSatellite,
    RocketLauncher,
    LightLaser,
    HeavyLaser,
    GaussCannon,
    IonCannon,
    PlasmaTurret,
}

/// Static stats for one unit type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitStats {
    pub cost: Resources,
    /// Base drive speed. Zero for anything that cannot fly.
    pub speed: u64,
    pub cargo: u64,
    /// Base deuterium consumption per flight.
    pub fuel: u64,
    pub attack: u64,
    pub shield: u64,
    /// Hull points: a tenth of the structural cost (metal + crystal).
    pub hull: u64,
}

#[allow(clippy::too_many_arguments)]
const fn stats(
    metal: u64,
    crystal: u64,
    deuterium: u64,
    speed: u64,
    cargo: u64,
    fuel: u64,
    attack: u64,
    shield: u64,
) -> UnitStats {
    UnitStats {
        cost: Resources::cargo(metal, crystal, deuterium),
        speed,
        cargo,
        fuel,
        attack,
        shield,
        hull: (metal + crystal) / 10,
    }
}

impl UnitKind {
    pub const ALL: [Self; 20] = [
        Self::SmallCargo,
        Self::LargeCargo,
        Self::LightFighter,
        Self::HeavyFighter,
        Self::Cruiser,
        Self::Battleship,
        Self::Battlecruiser,
        Self::Bomber,
        Self::Destroyer,
        Self::Deathstar,
        Self::ColonyShip,
        Self::Recycler,
        Self::EspionageProbe,
        Self::SolarSatellite,
        Self::RocketLauncher,
        Self::LightLaser,
        Self::HeavyLaser,
        Self::GaussCannon,
        Self::IonCannon,
        Self::PlasmaTurret,
    ];

    pub const fn stats(self) -> UnitStats {
        match self {
            Self::SmallCargo => stats(2_000, 2_000, 0, 5_000, 5_000, 10, 5, 10),
            Self::LargeCargo => stats(6_000, 6_000, 0, 7_500, 25_000, 50, 5, 25),
            Self::LightFighter => stats(3_000, 1_000, 0, 12_500, 50, 20, 50, 10),
            Self::HeavyFighter => stats(6_000, 4_000, 0, 10_000, 100, 75, 150, 25),
            Self::Cruiser => stats(20_000, 7_000, 2_000, 15_000, 800, 300, 400, 50),
            Self::Battleship => stats(45_000, 15_000, 0, 10_000, 1_500, 500, 1_000, 200),
            Self::Battlecruiser => stats(30_000, 40_000, 15_000, 10_000, 750, 250, 700, 400),
            Self::Bomber => stats(50_000, 25_000, 15_000, 4_000, 500, 700, 1_000, 500),
            Self::Destroyer => stats(60_000, 50_000, 15_000, 5_000, 2_000, 1_000, 2_000, 500),
            Self::Deathstar => {
                stats(5_000_000, 4_000_000, 1_000_000, 100, 1_000_000, 1, 200_000, 50_000)
            }
            Self::ColonyShip => stats(10_000, 20_000, 10_000, 2_500, 7_500, 1_000, 50, 100),
            Self::Recycler => stats(10_000, 6_000, 2_000, 2_000, 20_000, 300, 1, 10),
            Self::EspionageProbe => stats(0, 1_000, 0, 100_000_000, 0, 1, 0, 0),
            Self::SolarSatellite => stats(0, 2_000, 500, 0, 0, 0, 1, 1),
            Self::RocketLauncher => stats(2_000, 0, 0, 0, 0, 0, 80, 20),
            Self::LightLaser => stats(1_500, 500, 0, 0, 0, 0, 100, 25),
            Self::HeavyLaser => stats(6_000, 2_000, 0, 0, 0, 0, 250, 100),
            Self::GaussCannon => stats(20_000, 15_000, 2_000, 0, 0, 0, 1_100, 200),
            Self::IonCannon => stats(5_000, 3_000, 0, 0, 0, 0, 150, 500),
            Self::PlasmaTurret => stats(50_000, 50_000, 30_000, 0, 0, 0, 3_000, 300),
        }
    }

    /// Ships with a drive. Defenses and solar satellites stay home.
    pub const fn is_mobile(self) -> bool {
        self.stats().speed > 0
    }

    /// Defensive structures: fight at home but never leave debris.
    pub const fn is_defense(self) -> bool {
        matches!(
            self,
            Self::RocketLauncher
                | Self::LightLaser
                | Self::HeavyLaser
                | Self::GaussCannon
                | Self::IonCannon
                | Self::PlasmaTurret
        )
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SmallCargo => "small_cargo",
            Self::LargeCargo => "large_cargo",
            Self::LightFighter => "light_fighter",
            Self::HeavyFighter => "heavy_fighter",
            Self::Cruiser => "cruiser",
            Self::Battleship => "battleship",
            Self::Battlecruiser => "battlecruiser",
            Self::Bomber => "bomber",
            Self::Destroyer => "destroyer",
            Self::Deathstar => "deathstar",
            Self::ColonyShip => "colony_ship",
            Self::Recycler => "recycler",
            Self::EspionageProbe => "espionage_probe",
            Self::SolarSatellite => "solar_satellite",
            Self::RocketLauncher => "rocket_launcher",
            Self::LightLaser => "light_laser",
            Self::HeavyLaser => "heavy_laser",
            Self::GaussCannon => "gauss_cannon",
            Self::IonCannon => "ion_cannon",
            Self::PlasmaTurret => "plasma_turret",
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnitKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown unit: {s}"))
    }
}

/// One entry of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStack {
    pub unit: UnitKind,
    pub amount: u64,
}

/// An ordered mapping from unit type to quantity.
///
/// Entries keep the order in which their type was first added.
/// Zero quantities are never stored, so an empty collection has no entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitCollection {
    stacks: Vec<UnitStack>,
}

impl UnitCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `amount` units of `unit`, merging with an existing stack.
    pub fn add_unit(&mut self, unit: UnitKind, amount: u64) {
        if amount == 0 {
            return;
        }
        match self.stacks.iter_mut().find(|s| s.unit == unit) {
            Some(stack) => stack.amount = stack.amount.saturating_add(amount),
            None => self.stacks.push(UnitStack { unit, amount }),
        }
    }

    /// Builder-style [`add_unit`](Self::add_unit).
    #[must_use]
    pub fn with(mut self, unit: UnitKind, amount: u64) -> Self {
        self.add_unit(unit, amount);
        self
    }

    pub fn amount(&self, unit: UnitKind) -> u64 {
        self.stacks
            .iter()
            .find(|s| s.unit == unit)
            .map_or(0, |s| s.amount)
    }

    /// Total number of units across all types.
    pub fn total(&self) -> u64 {
        self.stacks.iter().fold(0, |acc, s| acc.saturating_add(s.amount))
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (UnitKind, u64)> + '_ {
        self.stacks.iter().map(|s| (s.unit, s.amount))
    }

    /// Returns a new collection holding both sets of units.
    #[must_use]
    pub fn merged(&self, other: &Self) -> Self {
        let mut out = self.clone();
        for (unit, amount) in other.iter() {
            out.add_unit(unit, amount);
        }
        out
    }

    /// Returns what remains after taking `other` away.
    pub fn subtract(&self, other: &Self) -> Result<Self, InsufficientUnits> {
        for (unit, requested) in other.iter() {
            let available = self.amount(unit);
            if available < requested {
                return Err(InsufficientUnits {
                    unit,
                    available,
                    requested,
                });
            }
        }
        let stacks = self
            .stacks
            .iter()
            .map(|s| UnitStack {
                unit: s.unit,
                amount: s.amount - other.amount(s.unit),
            })
            .filter(|s| s.amount > 0)
            .collect();
        Ok(Self { stacks })
    }

    /// Only the units of the given kind, or an empty collection.
    #[must_use]
    pub fn only(&self, unit: UnitKind) -> Self {
        Self::new().with(unit, self.amount(unit))
    }

    /// Removes every unit of `unit`.
    #[must_use]
    pub fn without(&self, unit: UnitKind) -> Self {
        self.iter().filter(|(k, _)| *k != unit).collect()
    }

    pub fn only_mobile(&self) -> bool {
        self.iter().all(|(unit, _)| unit.is_mobile())
    }

    /// Speed of the slowest ship, or `None` for an empty collection.
    pub fn slowest_speed(&self) -> Option<u64> {
        self.iter().map(|(unit, _)| unit.stats().speed).min()
    }

    /// Combined hold of all ships, saturating at `u64::MAX`.
    pub fn cargo_capacity(&self) -> u64 {
        self.weighted(|stats| stats.cargo)
    }

    /// Sum of base fuel consumption over all ships.
    pub fn base_fuel(&self) -> u64 {
        self.weighted(|stats| stats.fuel)
    }

    fn weighted(&self, per_unit: impl Fn(&UnitStats) -> u64) -> u64 {
        self.iter().fold(0, |acc, (unit, n)| {
            acc.saturating_add(per_unit(&unit.stats()).saturating_mul(n))
        })
    }
}

impl FromIterator<(UnitKind, u64)> for UnitCollection {
    fn from_iter<I: IntoIterator<Item = (UnitKind, u64)>>(iter: I) -> Self {
        let mut out = Self::new();
        for (unit, amount) in iter {
            out.add_unit(unit, amount);
        }
        out
    }
}

impl fmt::Display for UnitCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let parts: Vec<String> = self.iter().map(|(u, n)| format!("{u} x{n}")).collect();
        f.write_str(&parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_unit_merges_and_keeps_insertion_order() {
        let mut units = UnitCollection::new();
        units.add_unit(UnitKind::Recycler, 2);
        units.add_unit(UnitKind::SmallCargo, 1);
        units.add_unit(UnitKind::Recycler, 3);

        let order: Vec<_> = units.iter().collect();
        assert_eq!(
            order,
            vec![(UnitKind::Recycler, 5), (UnitKind::SmallCargo, 1)]
        );
        assert_eq!(units.total(), 6);
        assert_eq!(units.amount(UnitKind::Deathstar), 0);
    }

    #[test]
    fn zero_amounts_are_not_stored() {
        let units = UnitCollection::new().with(UnitKind::Cruiser, 0);
        assert!(units.is_empty());
    }

    #[test]
    fn subtract_leaves_original_untouched() {
        let home = UnitCollection::new()
            .with(UnitKind::SmallCargo, 5)
            .with(UnitKind::LightFighter, 2);
        let sent = UnitCollection::new().with(UnitKind::SmallCargo, 5);

        let left = home.subtract(&sent).unwrap();

        assert_eq!(left.amount(UnitKind::SmallCargo), 0);
        assert_eq!(left.iter().count(), 1);
        assert_eq!(home.amount(UnitKind::SmallCargo), 5);
    }

    #[test]
    fn subtract_too_many_fails() {
        let home = UnitCollection::new().with(UnitKind::SmallCargo, 5);
        let sent = UnitCollection::new().with(UnitKind::SmallCargo, 10);

        let err = home.subtract(&sent).unwrap_err();
        assert_eq!(err.unit, UnitKind::SmallCargo);
        assert_eq!(err.available, 5);
        assert_eq!(err.requested, 10);
    }

    #[test]
    fn fleet_speed_is_slowest_ship() {
        let fleet = UnitCollection::new()
            .with(UnitKind::LightFighter, 10)
            .with(UnitKind::Recycler, 1);
        assert_eq!(fleet.slowest_speed(), Some(2_000));
        assert_eq!(UnitCollection::new().slowest_speed(), None);
    }

    #[test]
    fn defenses_are_not_mobile() {
        let units = UnitCollection::new()
            .with(UnitKind::SmallCargo, 1)
            .with(UnitKind::RocketLauncher, 1);
        assert!(!units.only_mobile());
        assert!(!UnitKind::SolarSatellite.is_mobile());
        assert!(UnitKind::RocketLauncher.is_defense());
    }

    #[test]
    fn unit_names_parse_back() {
        for unit in UnitKind::ALL {
            assert_eq!(unit.as_str().parse::<UnitKind>().unwrap(), unit);
        }
    }

    #[test]
    fn serializes_as_array_of_stacks() {
        let units = UnitCollection::new().with(UnitKind::SmallCargo, 3);
        let json = serde_json::to_string(&units).unwrap();
        assert_eq!(json, r#"[{"unit":"small_cargo","amount":3}]"#);
    }

    #[test]
    fn capacity_and_fuel_saturate() {
        let swarm = UnitCollection::new()
            .with(UnitKind::SmallCargo, u64::MAX)
            .with(UnitKind::SmallCargo, 1);
        assert_eq!(swarm.amount(UnitKind::SmallCargo), u64::MAX);
        assert_eq!(swarm.cargo_capacity(), u64::MAX);
        assert_eq!(swarm.base_fuel(), u64::MAX);
        assert_eq!(swarm.with(UnitKind::Recycler, 5).total(), u64::MAX);
    }
}
