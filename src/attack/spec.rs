//! Attack descriptors

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Threat range outside the d20
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("threat range {0} is outside 1..=20")]
pub struct ThreatRangeError(pub u8);

/// Lowest natural d20 result that threatens a critical hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ThreatRange(u8);

impl ThreatRange {
    /// Only a natural 20 threatens
    pub const DEFAULT: ThreatRange = ThreatRange(20);

    pub fn new(range: u8) -> Result<Self, ThreatRangeError> {
        if (1..=20).contains(&range) {
            Ok(Self(range))
        } else {
            Err(ThreatRangeError(range))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Whether a natural result falls inside the range
    pub fn threatens(self, natural: u32) -> bool {
        natural >= self.0 as u32
    }
}

impl Default for ThreatRange {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u8> for ThreatRange {
    type Error = ThreatRangeError;

    fn try_from(range: u8) -> Result<Self, Self::Error> {
        Self::new(range)
    }
}

impl From<ThreatRange> for u8 {
    fn from(range: ThreatRange) -> u8 {
        range.0
    }
}

/// Critical hit options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CritOptions {
    /// Minimum natural roll for a threat (default 20)
    pub range: ThreatRange,
    /// Confirmation bonus or formula (defaults to the attack formula)
    pub attack: Option<String>,
    /// Extra damage on a critical hit (defaults to the damage formula)
    pub damage: Option<String>,
}

impl CritOptions {
    /// Options with a threat range, e.g. 19 for a 19-20 weapon
    pub fn range(range: u8) -> Result<Self, ThreatRangeError> {
        Ok(Self {
            range: ThreatRange::new(range)?,
            ..Self::default()
        })
    }

    pub fn with_attack(mut self, attack: impl ToString) -> Self {
        self.attack = Some(attack.to_string());
        self
    }

    pub fn with_damage(mut self, damage: impl Into<String>) -> Self {
        self.damage = Some(damage.into());
        self
    }
}

/// A single attack to roll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackSpec {
    /// Row label, e.g. "1st attack"
    pub name: String,
    /// Attack bonus or formula, e.g. "6+2" or "1d20+6+2"
    pub attack: String,
    /// Damage formula, e.g. "1d8+5"
    pub damage: String,
    pub crit: CritOptions,
}

impl AttackSpec {
    /// The attack bonus accepts anything printable, so `8` works as well as `"6+2"`.
    pub fn new(name: impl Into<String>, attack: impl ToString, damage: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attack: attack.to_string(),
            damage: damage.into(),
            crit: CritOptions::default(),
        }
    }

    pub fn with_crit(mut self, crit: CritOptions) -> Self {
        self.crit = crit;
        self
    }
}
