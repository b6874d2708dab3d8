//! Output formatting for CLI display.

use std::fmt::Write;

use jiff::Timestamp;

use armada::model::{FleetMission, Message, MissionState, Planet};

/// One-line planet summary for lists.
pub(super) fn format_planet_line(planet: &Planet) -> String {
    format!(
        "{}  [{}] {} {}",
        planet.id, planet.coordinate, planet.body_type, planet.name
    )
}

/// Multi-line planet detail.
pub(super) fn format_planet(planet: &Planet) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", format_planet_line(planet));
    let _ = writeln!(out, "  owner:     player {}", planet.player_id);
    let _ = writeln!(out, "  diameter:  {} km", planet.diameter);
    let _ = writeln!(out, "  resources: {}", planet.resources);
    let _ = writeln!(out, "  units:     {}", planet.units);
    out
}

/// One line per mission: id, label, route, state, and arrival.
pub(super) fn format_mission(mission: &FleetMission, now: Timestamp) -> String {
    let state = match mission.state(now) {
        MissionState::Scheduled => {
            let left = mission.time_arrival.as_second() - now.as_second();
            format!("in flight, {left}s left")
        }
        MissionState::Due => "arrived, awaiting tick".to_string(),
        MissionState::Processed => "done".to_string(),
        MissionState::Canceled => "recalled".to_string(),
    };
    format!(
        "{}  {:<18} [{}] -> [{}] {}  {}  ({})",
        mission.id,
        mission.label(),
        mission.origin,
        mission.destination,
        mission.destination_body,
        mission.units,
        state
    )
}

pub(super) fn format_message(message: &Message) -> String {
    let marker = if message.viewed { ' ' } else { '*' };
    format!(
        "{marker} {}  {}",
        message.created_at.strftime("%Y-%m-%d %H:%M:%S"),
        message.body()
    )
}
