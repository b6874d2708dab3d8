//! Fleet missions: the scheduled movements at the heart of the game.

use std::fmt;
use std::str::FromStr;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::{BodyType, Coordinate, PlanetId, PlayerId, Resources, UnitCollection};

pub type MissionId = i64;

/// The kind of mission a fleet flies. Numeric ids are the persisted form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionType {
    Attack,
    Transport,
    Deployment,
    Espionage,
    Colonization,
    Recycle,
    Destroy,
    Expedition,
}

impl MissionType {
    pub const ALL: [Self; 8] = [
        Self::Attack,
        Self::Transport,
        Self::Deployment,
        Self::Espionage,
        Self::Colonization,
        Self::Recycle,
        Self::Destroy,
        Self::Expedition,
    ];

    pub const fn id(self) -> i64 {
        match self {
            Self::Attack => 1,
            Self::Transport => 3,
            Self::Deployment => 4,
            Self::Espionage => 6,
            Self::Colonization => 7,
            Self::Recycle => 8,
            Self::Destroy => 9,
            Self::Expedition => 15,
        }
    }

    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.id() == id)
    }

    /// Display name, as shown in fleet event lists.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Attack => "Attack",
            Self::Transport => "Transport",
            Self::Deployment => "Deployment",
            Self::Espionage => "Espionage",
            Self::Colonization => "Colonisation",
            Self::Recycle => "Harvest",
            Self::Destroy => "Moon Destruction",
            Self::Expedition => "Expedition",
        }
    }
}

impl fmt::Display for MissionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MissionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "attack" => Ok(Self::Attack),
            "transport" => Ok(Self::Transport),
            "deployment" | "deploy" => Ok(Self::Deployment),
            "espionage" | "spy" => Ok(Self::Espionage),
            "colonization" | "colonisation" | "colonize" => Ok(Self::Colonization),
            "recycle" | "harvest" => Ok(Self::Recycle),
            "destroy" => Ok(Self::Destroy),
            "expedition" => Ok(Self::Expedition),
            other => Err(format!("unknown mission type: {other}")),
        }
    }
}

/// Where a mission stands, as observed at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissionState {
    /// In flight: departed, not yet arrived.
    Scheduled,
    /// Arrival time has passed but no tick has processed it yet.
    Due,
    /// Side effects applied. Terminal.
    Processed,
    /// Recalled. Terminal; the return leg carries the fleet home.
    Canceled,
}

/// A fleet in flight, or the historical record of one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetMission {
    pub id: MissionId,
    pub player_id: PlayerId,
    pub mission_type: MissionType,
    /// Set on return legs: the outbound mission this one brings home.
    pub parent_id: Option<MissionId>,
    pub planet_id_from: Option<PlanetId>,
    pub origin: Coordinate,
    pub origin_body: BodyType,
    /// Absent when the target does not exist yet (or never will):
    /// empty colony slots, expedition space, debris fields.
    pub planet_id_to: Option<PlanetId>,
    pub destination: Coordinate,
    pub destination_body: BodyType,
    /// Owner of the destination when the fleet left.
    pub target_owner_id: Option<PlayerId>,
    pub units: UnitCollection,
    pub resources: Resources,
    pub time_departure: Timestamp,
    pub time_arrival: Timestamp,
    pub processed: bool,
    pub canceled: bool,
}

impl FleetMission {
    pub fn is_return(&self) -> bool {
        self.parent_id.is_some()
    }

    /// Flight time in whole seconds.
    pub fn duration_secs(&self) -> i64 {
        self.time_arrival.as_second() - self.time_departure.as_second()
    }

    pub fn state(&self, now: Timestamp) -> MissionState {
        if self.canceled {
            MissionState::Canceled
        } else if self.processed {
            MissionState::Processed
        } else if now >= self.time_arrival {
            MissionState::Due
        } else {
            MissionState::Scheduled
        }
    }

    /// Label used in event lists, `(R)` marking return legs.
    pub fn label(&self) -> String {
        if self.is_return() {
            format!("{} (R)", self.mission_type.name())
        } else {
            self.mission_type.name().to_string()
        }
    }
}

/// A mission about to be stored. The store assigns the id and clears the flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMission {
    pub player_id: PlayerId,
    pub mission_type: MissionType,
    pub parent_id: Option<MissionId>,
    pub planet_id_from: Option<PlanetId>,
    pub origin: Coordinate,
    pub origin_body: BodyType,
    pub planet_id_to: Option<PlanetId>,
    pub destination: Coordinate,
    pub destination_body: BodyType,
    pub target_owner_id: Option<PlayerId>,
    pub units: UnitCollection,
    pub resources: Resources,
    pub time_departure: Timestamp,
    pub time_arrival: Timestamp,
}

impl NewMission {
    /// A return leg for `parent`: endpoints swapped, same mission type.
    pub fn return_of(
        parent: &FleetMission,
        units: UnitCollection,
        resources: Resources,
        time_departure: Timestamp,
        time_arrival: Timestamp,
    ) -> Self {
        Self {
            player_id: parent.player_id,
            mission_type: parent.mission_type,
            parent_id: Some(parent.id),
            planet_id_from: parent.planet_id_to,
            origin: parent.destination,
            origin_body: parent.destination_body,
            planet_id_to: parent.planet_id_from,
            destination: parent.origin,
            destination_body: parent.origin_body,
            target_owner_id: Some(parent.player_id),
            units,
            resources,
            time_departure,
            time_arrival,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::UnitKind;

    fn sample() -> FleetMission {
        FleetMission {
            id: 7,
            player_id: PlayerId(1),
            mission_type: MissionType::Transport,
            parent_id: None,
            planet_id_from: Some(10),
            origin: Coordinate::new(1, 1, 4),
            origin_body: BodyType::Planet,
            planet_id_to: Some(11),
            destination: Coordinate::new(1, 1, 5),
            destination_body: BodyType::Moon,
            target_owner_id: Some(PlayerId(2)),
            units: UnitCollection::new().with(UnitKind::SmallCargo, 1),
            resources: Resources::cargo(10, 0, 0),
            time_departure: Timestamp::from_second(1_000).unwrap(),
            time_arrival: Timestamp::from_second(1_500).unwrap(),
            processed: false,
            canceled: false,
        }
    }

    #[test]
    fn mission_type_ids_round_trip() {
        for t in MissionType::ALL {
            assert_eq!(MissionType::from_id(t.id()), Some(t));
        }
        assert_eq!(MissionType::from_id(2), None);
    }

    #[test]
    fn state_follows_flags_and_clock() {
        let mut m = sample();
        assert_eq!(m.state(Timestamp::from_second(1_200).unwrap()), MissionState::Scheduled);
        assert_eq!(m.state(Timestamp::from_second(1_500).unwrap()), MissionState::Due);
        m.processed = true;
        assert_eq!(m.state(Timestamp::from_second(1_500).unwrap()), MissionState::Processed);
        m.canceled = true;
        assert_eq!(m.state(Timestamp::from_second(1_500).unwrap()), MissionState::Canceled);
    }

    #[test]
    fn return_of_swaps_endpoints() {
        let parent = sample();
        let back = NewMission::return_of(
            &parent,
            parent.units.clone(),
            Resources::ZERO,
            parent.time_arrival,
            Timestamp::from_second(2_000).unwrap(),
        );
        assert_eq!(back.parent_id, Some(7));
        assert_eq!(back.planet_id_from, Some(11));
        assert_eq!(back.planet_id_to, Some(10));
        assert_eq!(back.origin, parent.destination);
        assert_eq!(back.destination_body, BodyType::Planet);
    }

    #[test]
    fn labels_mark_return_legs() {
        let mut m = sample();
        assert_eq!(m.label(), "Transport");
        m.parent_id = Some(1);
        assert_eq!(m.label(), "Transport (R)");
    }
}
