//! Battle resolution between an arriving fleet and a planet's garrison.
//!
//! Deterministic: each round both sides fire at once, firepower spread
//! over the opposing stacks in proportion to their size. Shields absorb
//! damage per unit; what gets through destroys whole units by hull points.

use serde::{Deserialize, Serialize};

use crate::model::{Resources, UnitCollection};

pub const MAX_ROUNDS: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleOutcome {
    AttackerWins,
    DefenderWins,
    Draw,
}

impl BattleOutcome {
    pub const fn describe(self) -> &'static str {
        match self {
            Self::AttackerWins => "the attacker has won the battle",
            Self::DefenderWins => "the defender has won the battle",
            Self::Draw => "the battle ended in a draw",
        }
    }
}

/// What a battle left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Battle {
    pub outcome: BattleOutcome,
    pub rounds: u32,
    pub attacker_survivors: UnitCollection,
    pub attacker_losses: UnitCollection,
    pub defender_survivors: UnitCollection,
    pub defender_losses: UnitCollection,
    /// Wreckage from destroyed ships. Defenses leave none.
    pub debris: Resources,
}

/// Fights up to [`MAX_ROUNDS`] rounds between `attacker` and `defender`.
pub fn resolve(
    attacker: &UnitCollection,
    defender: &UnitCollection,
    debris_percent: u64,
) -> Battle {
    let mut att = attacker.clone();
    let mut def = defender.clone();
    let mut att_losses = UnitCollection::new();
    let mut def_losses = UnitCollection::new();
    let mut rounds = 0;

    while rounds < MAX_ROUNDS && !att.is_empty() && !def.is_empty() {
        rounds += 1;
        let att_fire = firepower(&att);
        let def_fire = firepower(&def);

        let att_hit = casualties(&att, def_fire);
        let def_hit = casualties(&def, att_fire);

        att = remove(&att, &att_hit);
        def = remove(&def, &def_hit);
        att_losses = att_losses.merged(&att_hit);
        def_losses = def_losses.merged(&def_hit);
    }

    let outcome = match (att.is_empty(), def.is_empty()) {
        (false, true) => BattleOutcome::AttackerWins,
        (true, false) => BattleOutcome::DefenderWins,
        _ => BattleOutcome::Draw,
    };

    let debris = wreckage(&att_losses, debris_percent).add(&wreckage(&def_losses, debris_percent));

    Battle {
        outcome,
        rounds,
        attacker_survivors: att,
        attacker_losses: att_losses,
        defender_survivors: def,
        defender_losses: def_losses,
        debris,
    }
}

/// Resources an attacker carries off: `loot_percent` of the planet's stock,
/// scaled down to the fleet's free cargo space.
pub fn plunder(stock: &Resources, free_capacity: u64, loot_percent: u64) -> Resources {
    stock.percent(loot_percent).fit_into(free_capacity)
}

fn firepower(units: &UnitCollection) -> u128 {
    units
        .iter()
        .map(|(unit, n)| u128::from(unit.stats().attack) * u128::from(n))
        .sum()
}

/// Units destroyed when `incoming` firepower lands on `units`.
fn casualties(units: &UnitCollection, incoming: u128) -> UnitCollection {
    let total = u128::from(units.total());
    if total == 0 || incoming == 0 {
        return UnitCollection::new();
    }
    units
        .iter()
        .map(|(unit, n)| {
            let stats = unit.stats();
            let n128 = u128::from(n);
            let share = incoming * n128 / total;
            let absorbed = u128::from(stats.shield) * n128;
            let through = share.saturating_sub(absorbed);
            let destroyed = (through / u128::from(stats.hull.max(1))).min(n128);
            (unit, u64::try_from(destroyed).unwrap_or(n))
        })
        .collect()
}

fn remove(units: &UnitCollection, destroyed: &UnitCollection) -> UnitCollection {
    units
        .iter()
        .map(|(unit, n)| (unit, n.saturating_sub(destroyed.amount(unit))))
        .collect()
}

fn wreckage(losses: &UnitCollection, debris_percent: u64) -> Resources {
    losses
        .iter()
        .filter(|(unit, _)| !unit.is_defense())
        .fold(Resources::ZERO, |acc, (unit, n)| {
            let cost = unit.stats().cost;
            acc.add(&Resources::cargo(cost.metal * n, cost.crystal * n, 0))
        })
        .percent(debris_percent)
}
