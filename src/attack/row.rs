//! Attack table rows

use serde::Serialize;

use crate::dice::RollResult;

/// Display style of a d20 check, judged on the natural die
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Highlight {
    /// Natural 20
    Success,
    /// Natural 1
    Failure,
    Plain,
}

impl Highlight {
    pub fn for_natural(natural: Option<u32>) -> Self {
        match natural {
            Some(20) => Highlight::Success,
            Some(1) => Highlight::Failure,
            _ => Highlight::Plain,
        }
    }

    pub fn for_roll(roll: &RollResult) -> Self {
        Self::for_natural(roll.natural)
    }
}

/// One row of an attack table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AttackRow {
    /// Centered title spanning the table
    Header { text: String },
    /// Attack roll against AC with its damage
    Attack {
        name: String,
        roll: RollResult,
        damage: RollResult,
    },
    /// Confirmation of a threat, with the extra critical damage
    Confirm { roll: RollResult, damage: RollResult },
    /// Combat maneuver check against CMD, never confirmed
    Maneuver {
        name: String,
        roll: RollResult,
        damage: Option<RollResult>,
    },
    /// Free text
    Note { text: String },
    /// Author-supplied markup inserted as is, e.g. `<b>Haste</b>`
    Markup { html: String },
}

impl AttackRow {
    /// The d20 check of this row, if it has one
    pub fn check(&self) -> Option<&RollResult> {
        match self {
            AttackRow::Attack { roll, .. }
            | AttackRow::Confirm { roll, .. }
            | AttackRow::Maneuver { roll, .. } => Some(roll),
            AttackRow::Header { .. } | AttackRow::Note { .. } | AttackRow::Markup { .. } => None,
        }
    }

    pub fn damage(&self) -> Option<&RollResult> {
        match self {
            AttackRow::Attack { damage, .. } | AttackRow::Confirm { damage, .. } => Some(damage),
            AttackRow::Maneuver { damage, .. } => damage.as_ref(),
            AttackRow::Header { .. } | AttackRow::Note { .. } | AttackRow::Markup { .. } => None,
        }
    }

    pub fn highlight(&self) -> Option<Highlight> {
        self.check().map(Highlight::for_roll)
    }

    pub fn is_confirmation(&self) -> bool {
        matches!(self, AttackRow::Confirm { .. })
    }
}
