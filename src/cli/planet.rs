//! Planet commands: new, show, list, stock.

use clap::Subcommand;

use armada::model::{BodyType, Coordinate, NewPlanet, PlanetId};

use super::format::{format_planet, format_planet_line};
use super::{CargoArgs, Session, parse_unit_stack, units_from};

#[derive(Debug, Subcommand)]
pub enum PlanetCommand {
    /// Found a planet (or moon) for the acting player. Prints its id.
    New {
        /// Where, as `galaxy:system:position`.
        coordinate: Coordinate,

        #[arg(long)]
        name: Option<String>,

        /// Create a moon instead of a planet.
        #[arg(long)]
        moon: bool,

        #[arg(long, default_value_t = 12_800)]
        diameter: u64,

        #[command(flatten)]
        cargo: CargoArgs,

        /// Ships stationed from the start, e.g. `small_cargo=5`. Repeatable.
        #[arg(long = "unit", value_parser = parse_unit_stack)]
        units: Vec<(armada::model::UnitKind, u64)>,
    },

    /// Show one planet's stock and garrison.
    Show {
        id: PlanetId,

        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List the acting player's planets.
    List,

    /// Add resources and ships to one of the acting player's planets.
    Stock {
        id: PlanetId,

        #[command(flatten)]
        cargo: CargoArgs,

        #[arg(long = "unit", value_parser = parse_unit_stack)]
        units: Vec<(armada::model::UnitKind, u64)>,
    },
}

pub(super) fn run(session: &Session<'_>, command: PlanetCommand) -> Result<(), String> {
    match command {
        PlanetCommand::New {
            coordinate,
            name,
            moon,
            diameter,
            cargo,
            units,
        } => {
            let body_type = if moon { BodyType::Moon } else { BodyType::Planet };
            let planet = NewPlanet {
                player_id: session.player()?,
                name: name.unwrap_or_else(|| format!("Planet {coordinate}")),
                coordinate,
                body_type,
                diameter,
                resources: cargo.to_domain(),
                units: units_from(&units),
            };
            let planet = session
                .storage
                .create_planet(&planet)
                .map_err(|e| format!("failed to create planet: {e}"))?;
            println!("{}", planet.id);
            Ok(())
        }
        PlanetCommand::Show { id, json } => {
            let planet = session
                .storage
                .planet(id)
                .map_err(|e| format!("failed to load planet: {e}"))?;
            if json {
                let out = serde_json::to_string_pretty(&planet)
                    .map_err(|e| format!("failed to serialize planet: {e}"))?;
                println!("{out}");
            } else {
                print!("{}", format_planet(&planet));
            }
            Ok(())
        }
        PlanetCommand::List => {
            let planets = session
                .storage
                .planets_for_player(session.player()?)
                .map_err(|e| format!("failed to list planets: {e}"))?;
            if planets.is_empty() {
                println!("No planets");
            }
            for planet in &planets {
                println!("{}", format_planet_line(planet));
            }
            Ok(())
        }
        PlanetCommand::Stock { id, cargo, units } => {
            let player = session.player()?;
            let planet = session
                .storage
                .planet(id)
                .map_err(|e| format!("failed to load planet: {e}"))?;
            if !planet.is_owned_by(player) {
                return Err(format!("player {player} does not own planet {id}"));
            }
            session
                .storage
                .stock_planet(id, &cargo.to_domain(), &units_from(&units))
                .map_err(|e| format!("failed to stock planet: {e}"))?;
            println!("stocked planet {id}");
            Ok(())
        }
    }
}
