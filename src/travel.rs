//! Travel math: distance between coordinates, flight duration, fuel.
//!
//! Everything here is a pure function of its inputs so that scheduled
//! arrival times can be reproduced exactly, in the engine and in tests.

use crate::config::UniverseConfig;
use crate::model::{Coordinate, MissionType, UnitCollection};

/// Distance between two slots in the same position (planet to its moon or debris).
pub const SAME_POSITION_DISTANCE: u64 = 5;

/// Fleet speed as a percentage of full drive power, in steps of ten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedPercent(u8);

impl SpeedPercent {
    pub const FULL: Self = Self(100);

    /// Accepts 10, 20, ... 100.
    pub const fn new(percent: u8) -> Option<Self> {
        if percent >= 10 && percent <= 100 && percent % 10 == 0 {
            Some(Self(percent))
        } else {
            None
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

impl Default for SpeedPercent {
    fn default() -> Self {
        Self::FULL
    }
}

/// Distance between two coordinates in the universe's units.
pub fn distance(from: Coordinate, to: Coordinate, universe: &UniverseConfig) -> u64 {
    if from.galaxy != to.galaxy {
        let delta = axis_delta(from.galaxy, to.galaxy, universe.galaxies, universe.donut_galaxy);
        return 20_000 * delta;
    }
    if from.system != to.system {
        let delta = axis_delta(from.system, to.system, universe.systems, universe.donut_system);
        return 2_700 + 95 * delta;
    }
    if from.position != to.position {
        return 1_000 + 5 * u64::from(from.position.abs_diff(to.position));
    }
    SAME_POSITION_DISTANCE
}

fn axis_delta(a: u32, b: u32, size: u32, donut: bool) -> u64 {
    let direct = a.abs_diff(b);
    if donut && size > 0 {
        u64::from(direct.min(size.saturating_sub(direct)))
    } else {
        u64::from(direct)
    }
}

/// Flight time in seconds for a fleet of `speed` over `distance`.
///
/// Grows with the square root of distance, so long hauls take
/// proportionally less time per unit than short hops.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn duration(distance: u64, speed: u64, percent: SpeedPercent, multiplier: u32) -> u64 {
    let speed = speed.max(1) as f64;
    let percent = f64::from(percent.get());
    let seconds = (35_000.0 / percent * (distance as f64 * 10.0 / speed).sqrt() + 10.0)
        / f64::from(multiplier.max(1));
    seconds.round().max(1.0) as u64
}

/// Universe speed multiplier for a mission's class.
pub fn speed_multiplier(mission_type: MissionType, universe: &UniverseConfig) -> u32 {
    match mission_type {
        MissionType::Attack | MissionType::Espionage | MissionType::Destroy => {
            universe.fleet_speed_war
        }
        MissionType::Expedition => universe.fleet_speed_holding,
        MissionType::Transport
        | MissionType::Deployment
        | MissionType::Colonization
        | MissionType::Recycle => universe.fleet_speed_peaceful,
    }
}

/// One-way flight time for `mission_type` at full speed.
pub fn calculate_fleet_mission_duration(
    mission_type: MissionType,
    distance: u64,
    speed: u64,
    universe: &UniverseConfig,
) -> u64 {
    mission_duration(mission_type, distance, speed, SpeedPercent::FULL, universe)
}

/// One-way flight time for `mission_type`.
pub fn mission_duration(
    mission_type: MissionType,
    distance: u64,
    speed: u64,
    percent: SpeedPercent,
    universe: &UniverseConfig,
) -> u64 {
    duration(distance, speed, percent, speed_multiplier(mission_type, universe))
}

/// Deuterium burned by `units` flying `distance` at `percent`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn fuel_consumption(units: &UnitCollection, distance: u64, percent: SpeedPercent) -> u64 {
    let factor = f64::from(percent.get()) / 100.0 + 1.0;
    let burn = units.base_fuel() as f64 * distance as f64 / 35_000.0 * factor * factor;
    (burn.round() as u64).saturating_add(1)
}
