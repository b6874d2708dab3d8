//! Resource bundles: metal, crystal, deuterium (and energy, which never travels).

use std::fmt;
use std::ops::Add;

use serde::{Deserialize, Serialize};

/// A withdrawal would drive one resource below zero.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("insufficient {resource}: have {available}, need {requested}")]
pub struct InsufficientResources {
    pub resource: &'static str,
    pub available: u64,
    pub requested: u64,
}

/// An amount of each resource.
///
/// Energy exists so planet balances can be carried as one value;
/// mission transfers always leave it at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    pub metal: u64,
    pub crystal: u64,
    pub deuterium: u64,
    #[serde(default)]
    pub energy: u64,
}

impl Resources {
    pub const ZERO: Self = Self::new(0, 0, 0, 0);

    pub const fn new(metal: u64, crystal: u64, deuterium: u64, energy: u64) -> Self {
        Self {
            metal,
            crystal,
            deuterium,
            energy,
        }
    }

    /// Convenience for transfer payloads, which never carry energy.
    pub const fn cargo(metal: u64, crystal: u64, deuterium: u64) -> Self {
        Self::new(metal, crystal, deuterium, 0)
    }

    /// Total of the transportable resources, saturating at `u64::MAX`.
    pub const fn sum(&self) -> u64 {
        self.metal
            .saturating_add(self.crystal)
            .saturating_add(self.deuterium)
    }

    pub const fn is_empty(&self) -> bool {
        self.sum() == 0 && self.energy == 0
    }

    pub const fn add(&self, other: &Self) -> Self {
        Self {
            metal: self.metal.saturating_add(other.metal),
            crystal: self.crystal.saturating_add(other.crystal),
            deuterium: self.deuterium.saturating_add(other.deuterium),
            energy: self.energy.saturating_add(other.energy),
        }
    }

    /// Subtracts `other`, failing on the first component that would go negative.
    pub fn subtract(&self, other: &Self) -> Result<Self, InsufficientResources> {
        Ok(Self {
            metal: take("metal", self.metal, other.metal)?,
            crystal: take("crystal", self.crystal, other.crystal)?,
            deuterium: take("deuterium", self.deuterium, other.deuterium)?,
            energy: take("energy", self.energy, other.energy)?,
        })
    }

    pub const fn has_at_least(&self, other: &Self) -> bool {
        self.metal >= other.metal
            && self.crystal >= other.crystal
            && self.deuterium >= other.deuterium
            && self.energy >= other.energy
    }

    /// Takes `percent` of each transportable resource, rounding down.
    pub fn percent(&self, percent: u64) -> Self {
        let share = |v: u64| {
            u64::try_from(u128::from(v) * u128::from(percent) / 100).unwrap_or(u64::MAX)
        };
        Self::cargo(share(self.metal), share(self.crystal), share(self.deuterium))
    }

    /// Scales the bundle down so its sum fits in `capacity`, keeping proportions.
    pub fn fit_into(&self, capacity: u64) -> Self {
        let total = self.sum();
        if total <= capacity {
            return Self::cargo(self.metal, self.crystal, self.deuterium);
        }
        let scale = |v: u64| {
            u64::try_from(u128::from(v) * u128::from(capacity) / u128::from(total))
                .unwrap_or(u64::MAX)
        };
        Self::cargo(scale(self.metal), scale(self.crystal), scale(self.deuterium))
    }
}

fn take(
    resource: &'static str,
    available: u64,
    requested: u64,
) -> Result<u64, InsufficientResources> {
    available
        .checked_sub(requested)
        .ok_or(InsufficientResources {
            resource,
            available,
            requested,
        })
}

impl Add for Resources {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Resources::add(&self, &rhs)
    }
}

impl fmt::Display for Resources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "metal {}, crystal {}, deuterium {}",
            self.metal, self.crystal, self.deuterium
        )
    }
}
