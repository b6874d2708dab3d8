//! System messages sent to players when fleets arrive, return, and fight.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{PlayerId, Resources};

/// Template parameters, keyed by placeholder name.
pub type MessageParams = BTreeMap<String, String>;

/// Which template a message renders with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    FleetDeployment,
    FleetDeploymentWithResources,
    DeploymentFailed,
    DeploymentLost,
    ReturnOfFleet,
    FleetRecalled,
    TransportArrived,
    TransportReceived,
    TransportRejected,
    ColonyEstablished,
    ColonyFailed,
    EspionageReport,
    EspionageDetected,
    BattleReport,
    ExpeditionResult,
    DebrisHarvested,
    MoonDestroyed,
    MoonDestructionFailed,
}

impl MessageKind {
    const ALL: [Self; 18] = [
        Self::FleetDeployment,
        Self::FleetDeploymentWithResources,
        Self::DeploymentFailed,
        Self::DeploymentLost,
        Self::ReturnOfFleet,
        Self::FleetRecalled,
        Self::TransportArrived,
        Self::TransportReceived,
        Self::TransportRejected,
        Self::ColonyEstablished,
        Self::ColonyFailed,
        Self::EspionageReport,
        Self::EspionageDetected,
        Self::BattleReport,
        Self::ExpeditionResult,
        Self::DebrisHarvested,
        Self::MoonDestroyed,
        Self::MoonDestructionFailed,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            Self::FleetDeployment => "fleet_deployment",
            Self::FleetDeploymentWithResources => "fleet_deployment_with_resources",
            Self::DeploymentFailed => "deployment_failed",
            Self::DeploymentLost => "deployment_lost",
            Self::ReturnOfFleet => "return_of_fleet",
            Self::FleetRecalled => "fleet_recalled",
            Self::TransportArrived => "transport_arrived",
            Self::TransportReceived => "transport_received",
            Self::TransportRejected => "transport_rejected",
            Self::ColonyEstablished => "colony_established",
            Self::ColonyFailed => "colony_failed",
            Self::EspionageReport => "espionage_report",
            Self::EspionageDetected => "espionage_detected",
            Self::BattleReport => "battle_report",
            Self::ExpeditionResult => "expedition_result",
            Self::DebrisHarvested => "debris_harvested",
            Self::MoonDestroyed => "moon_destroyed",
            Self::MoonDestructionFailed => "moon_destruction_failed",
        }
    }

    pub const fn subject(self) -> &'static str {
        match self {
            Self::FleetDeployment | Self::FleetDeploymentWithResources => "Fleet deployment",
            Self::DeploymentFailed | Self::DeploymentLost => "Deployment failed",
            Self::ReturnOfFleet => "Return of a fleet",
            Self::FleetRecalled => "Fleet recalled",
            Self::TransportArrived | Self::TransportReceived => "Reaching a planet",
            Self::TransportRejected => "Delivery refused",
            Self::ColonyEstablished | Self::ColonyFailed => "Settlement report",
            Self::EspionageReport => "Espionage report",
            Self::EspionageDetected => "Espionage action",
            Self::BattleReport => "Combat report",
            Self::ExpeditionResult => "Expedition result",
            Self::DebrisHarvested => "Harvesting report",
            Self::MoonDestroyed | Self::MoonDestructionFailed => "Moon destruction",
        }
    }

    const fn template(self) -> &'static str {
        match self {
            Self::FleetDeployment => {
                "One of your fleets from {from} has reached {to}. The fleet doesn`t deliver goods."
            }
            Self::FleetDeploymentWithResources => {
                "One of your fleets from {from} has reached {to} and delivered its goods: \
                 Metal: {metal} Crystal: {crystal} Deuterium: {deuterium}"
            }
            Self::DeploymentFailed => {
                "Your fleet could not be stationed at {to}. \
                 Its ships and goods were returned to {from}."
            }
            Self::DeploymentLost => {
                "Your fleet could not be stationed at {to}, and {from} is no longer yours \
                 to return to. Its ships and goods were lost."
            }
            Self::ReturnOfFleet => {
                "Your fleet is returning from {from} to {to}. The fleet is delivering: \
                 Metal: {metal} Crystal: {crystal} Deuterium: {deuterium}"
            }
            Self::FleetRecalled => {
                "Your {mission} fleet headed for {to} has been recalled and is returning to {from}."
            }
            Self::TransportArrived => {
                "Your fleet from {from} has reached {to} and delivered its goods: \
                 Metal: {metal} Crystal: {crystal} Deuterium: {deuterium}"
            }
            Self::TransportReceived => {
                "An incoming fleet from {from} has reached your planet {to} and delivered: \
                 Metal: {metal} Crystal: {crystal} Deuterium: {deuterium}"
            }
            Self::TransportRejected => {
                "Your fleet has reached {to}, but the planet is no longer held by its \
                 recipient. The goods stay aboard and return to {from}."
            }
            Self::ColonyEstablished => {
                "The fleet has arrived at the assigned coordinates {to}, found a new planet \
                 there and is beginning to develop upon it immediately."
            }
            Self::ColonyFailed => {
                "The fleet has arrived at the assigned coordinates {to} but could not \
                 settle: {reason}. The fleet is returning."
            }
            Self::EspionageReport => {
                "Espionage report of {to}: Metal: {metal} Crystal: {crystal} \
                 Deuterium: {deuterium} Units: {units}"
            }
            Self::EspionageDetected => {
                "A foreign fleet from {from} has been spotted near your planet {to}."
            }
            Self::BattleReport => {
                "Combat at {to}: {outcome}. Attacker lost {attacker_losses}. \
                 Defender lost {defender_losses}. Loot: Metal: {metal} Crystal: {crystal} \
                 Deuterium: {deuterium}. Debris: {debris}"
            }
            Self::ExpeditionResult => "Expedition to {to}: {outcome}",
            Self::DebrisHarvested => {
                "Your recyclers harvested Metal: {metal} Crystal: {crystal} \
                 Deuterium: {deuterium} from the debris field at {to}."
            }
            Self::MoonDestroyed => {
                "The moon at {to} has been destroyed by the fleet from {from}. {fleet}"
            }
            Self::MoonDestructionFailed => {
                "The fleet from {from} failed to destroy the moon at {to}. {fleet}"
            }
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for MessageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.key() == s)
            .ok_or_else(|| format!("unknown message kind: {s}"))
    }
}

/// A delivered system message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub player_id: PlayerId,
    pub kind: MessageKind,
    pub params: MessageParams,
    pub created_at: Timestamp,
    pub viewed: bool,
}

impl Message {
    pub fn new(
        player_id: PlayerId,
        kind: MessageKind,
        params: MessageParams,
        now: Timestamp,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            player_id,
            kind,
            params,
            created_at: now,
            viewed: false,
        }
    }

    /// Fills the kind's template with this message's params.
    /// Unknown placeholders render empty.
    pub fn body(&self) -> String {
        render(self.kind.template(), &self.params)
    }
}

fn render(template: &str, params: &MessageParams) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        if let Some(value) = params.get(&after[..end]) {
            out.push_str(value);
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

/// Builds a params map from `(key, value)` pairs.
pub fn params<const N: usize>(pairs: [(&str, String); N]) -> MessageParams {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// Adds `metal`, `crystal`, and `deuterium` params.
pub fn with_resources(mut params: MessageParams, resources: &Resources) -> MessageParams {
    params.insert("metal".into(), resources.metal.to_string());
    params.insert("crystal".into(), resources.crystal.to_string());
    params.insert("deuterium".into(), resources.deuterium.to_string());
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_substitutes_params() {
        let p = with_resources(
            params([("from", "[1:1:1]".into()), ("to", "[1:1:2]".into())]),
            &Resources::cargo(100, 0, 0),
        );
        let msg = Message::new(
            PlayerId(1),
            MessageKind::FleetDeploymentWithResources,
            p,
            Timestamp::UNIX_EPOCH,
        );
        let body = msg.body();
        assert!(body.contains("has reached [1:1:2]"));
        assert!(body.contains("Metal: 100"));
    }

    #[test]
    fn missing_params_render_empty() {
        assert_eq!(render("a {x} b", &MessageParams::new()), "a  b");
        assert_eq!(render("open {brace", &MessageParams::new()), "open {brace");
    }

    #[test]
    fn kinds_parse_from_key() {
        for kind in MessageKind::ALL {
            assert_eq!(kind.key().parse::<MessageKind>().unwrap(), kind);
        }
    }
}
