//! Fleet commands: check, send, recall, list.

use clap::{Args, Subcommand};

use armada::mission::DispatchRequest;
use armada::model::{BodyType, Coordinate, MissionId, MissionType, PlanetId, UnitKind};
use armada::travel::SpeedPercent;

use super::format::format_mission;
use super::{CargoArgs, Session, parse_unit_stack, units_from};

#[derive(Debug, Subcommand)]
pub enum FleetCommand {
    /// Say whether a mission could fly, and how long it would take.
    Check {
        #[command(flatten)]
        route: RouteArgs,
    },

    /// Dispatch a fleet. Prints the mission id and arrival time.
    Send {
        #[command(flatten)]
        route: RouteArgs,

        #[command(flatten)]
        cargo: CargoArgs,

        /// Speed in percent: 10, 20, ... 100.
        #[arg(long, default_value_t = 100, value_parser = parse_speed)]
        speed: u8,
    },

    /// Turn a fleet around. Prints the return leg's id and arrival time.
    Recall { id: MissionId },

    /// List fleets in flight that concern the acting player.
    List {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Args)]
pub struct RouteArgs {
    /// Origin planet id.
    #[arg(long)]
    from: PlanetId,

    /// Destination as `galaxy:system:position`.
    #[arg(long)]
    to: Coordinate,

    /// `planet`, `moon`, or `debris`.
    #[arg(long, default_value = "planet")]
    body: BodyType,

    #[arg(long)]
    mission: MissionType,

    /// Ships to send, e.g. `small_cargo=5`. Repeatable.
    #[arg(long = "unit", value_parser = parse_unit_stack, required = true)]
    units: Vec<(UnitKind, u64)>,
}

fn parse_speed(s: &str) -> Result<u8, String> {
    let percent: u8 = s.parse().map_err(|e| format!("invalid speed '{s}': {e}"))?;
    SpeedPercent::new(percent)
        .map(SpeedPercent::get)
        .ok_or_else(|| {
            format!("speed must be a multiple of 10 between 10 and 100, got {percent}")
        })
}

pub(super) fn run(session: &Session<'_>, command: FleetCommand) -> Result<(), String> {
    match command {
        FleetCommand::Check { route } => cmd_check(session, &route),
        FleetCommand::Send {
            route,
            cargo,
            speed,
        } => {
            let request = DispatchRequest {
                player: session.player()?,
                origin: route.from,
                mission_type: route.mission,
                destination: route.to,
                destination_body: route.body,
                units: units_from(&route.units),
                resources: cargo.to_domain(),
                speed: SpeedPercent::new(speed).unwrap_or_default(),
            };
            let mission = session
                .control()
                .dispatch(&request, session.now)
                .map_err(|e| format!("failed to send fleet: {e}"))?;
            println!("{} arrives {}", mission.id, mission.time_arrival);
            Ok(())
        }
        FleetCommand::Recall { id } => {
            let back = session
                .control()
                .recall(session.player()?, id, session.now)
                .map_err(|e| format!("failed to recall mission {id}: {e}"))?;
            println!("{} arrives {}", back.id, back.time_arrival);
            Ok(())
        }
        FleetCommand::List { json } => {
            let missions = session
                .control()
                .active_missions(session.player()?)
                .map_err(|e| format!("failed to list missions: {e}"))?;
            if json {
                let out = serde_json::to_string_pretty(&missions)
                    .map_err(|e| format!("failed to serialize missions: {e}"))?;
                println!("{out}");
                return Ok(());
            }
            if missions.is_empty() {
                println!("No fleets in flight");
            }
            for mission in &missions {
                println!("{}", format_mission(mission, session.now));
            }
            Ok(())
        }
    }
}

fn cmd_check(session: &Session<'_>, route: &RouteArgs) -> Result<(), String> {
    let control = session.control();
    let units = units_from(&route.units);
    let status = control
        .is_mission_possible(route.from, route.mission, route.to, route.body, &units)
        .map_err(|e| format!("failed to check mission: {e}"))?;

    if !status.possible {
        println!(
            "not possible: {}",
            status.reason.as_deref().unwrap_or("no reason given")
        );
        return Ok(());
    }

    let origin = session
        .storage
        .planet(route.from)
        .map_err(|e| format!("failed to load planet: {e}"))?;
    let seconds = control.calculate_fleet_mission_duration(
        route.mission,
        origin.coordinate,
        route.to,
        &units,
    );
    println!("possible: {seconds}s one way");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_must_be_a_step_of_ten() {
        assert_eq!(parse_speed("50").unwrap(), 50);
        assert!(parse_speed("55").is_err());
        assert!(parse_speed("0").is_err());
        assert!(parse_speed("fast").is_err());
    }
}
