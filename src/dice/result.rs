//! Evaluated roll results

use serde::{Deserialize, Serialize};

/// Sign of a formula term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sign {
    Plus,
    Minus,
}

impl Sign {
    /// Apply this sign to a value
    pub fn apply(self, value: i64) -> i64 {
        match self {
            Sign::Plus => value,
            Sign::Minus => -value,
        }
    }
}

/// A single die face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DieResult {
    pub value: u32,
    /// Whether this die counts towards the term total
    pub kept: bool,
}

/// The outcome of one formula term
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TermResult {
    Dice {
        sign: Sign,
        count: u32,
        sides: u32,
        results: Vec<DieResult>,
        /// Sum of kept dice, unsigned
        total: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        flavor: Option<String>,
    },
    Constant {
        sign: Sign,
        value: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        flavor: Option<String>,
    },
}

impl TermResult {
    /// Unsigned value of this term
    pub fn total(&self) -> i64 {
        match self {
            TermResult::Dice { total, .. } => *total,
            TermResult::Constant { value, .. } => *value,
        }
    }
}

/// An evaluated formula
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollResult {
    /// Canonical formula text
    pub formula: String,
    /// Signed sum of every term
    pub total: i64,
    /// Kept total of the first dice term, if the formula rolled any dice
    pub natural: Option<u32>,
    pub terms: Vec<TermResult>,
}

impl RollResult {
    /// Face values of every die rolled, in order
    pub fn faces(&self) -> Vec<u32> {
        self.terms
            .iter()
            .filter_map(|t| match t {
                TermResult::Dice { results, .. } => Some(results.iter().map(|d| d.value)),
                TermResult::Constant { .. } => None,
            })
            .flatten()
            .collect()
    }
}
