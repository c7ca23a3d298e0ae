//! Attack macro scripts
//!
//! A script describes one attack table in TOML:
//!
//! ```toml
//! header = "Full Attack"
//! speaker = "Valeros"
//!
//! [[rows]]
//! kind = "attack"
//! name = "Longsword"
//! attack = 12
//! damage = "1d8+5"
//! crit_range = 19
//!
//! [[rows]]
//! kind = "maneuver"
//! name = "Trip"
//! attack = "2d20kh+10"
//!
//! [[rows]]
//! kind = "note"
//! text = "Power Attack included"
//!
//! [[rows]]
//! kind = "note"
//! text = "<b>Hasted</b>"
//! raw = true
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use figment::providers::{Format, Toml};
use figment::Figment;
use serde::Deserialize;
use thiserror::Error;

use crate::attack::{AttackSpec, AttackTable, CritOptions, HtmlRenderer, ThreatRange};
use crate::dice::{DiceRoller, FormulaError};

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("script not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("invalid script: {0}")]
    Invalid(Box<figment::Error>),

    #[error("row {row}: {source}")]
    Roll {
        row: usize,
        #[source]
        source: FormulaError,
    },
}

impl From<figment::Error> for ScriptError {
    fn from(err: figment::Error) -> Self {
        ScriptError::Invalid(Box::new(err))
    }
}

/// An attack bonus written either as a number or a formula
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Bonus {
    Number(i64),
    Formula(String),
}

impl fmt::Display for Bonus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bonus::Number(n) => write!(f, "{}", n),
            Bonus::Formula(formula) => f.write_str(formula),
        }
    }
}

/// One entry of a script
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ScriptRow {
    Attack {
        name: String,
        attack: Bonus,
        damage: String,
        #[serde(default)]
        crit_range: Option<ThreatRange>,
        #[serde(default)]
        crit_attack: Option<Bonus>,
        #[serde(default)]
        crit_damage: Option<String>,
    },
    Maneuver {
        name: String,
        attack: Bonus,
        #[serde(default)]
        damage: Option<String>,
    },
    Note {
        text: String,
        /// Insert `text` as markup instead of escaping it
        #[serde(default)]
        raw: bool,
    },
}

/// A whole attack table script
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AttackScript {
    #[serde(default)]
    pub header: Option<String>,
    #[serde(default)]
    pub speaker: Option<String>,
    #[serde(default)]
    pub rows: Vec<ScriptRow>,
}

impl AttackScript {
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        if !path.exists() {
            return Err(ScriptError::NotFound(path.to_path_buf()));
        }
        Ok(Figment::from(Toml::file(path)).extract()?)
    }

    pub fn parse(source: &str) -> Result<Self, ScriptError> {
        Ok(Figment::from(Toml::string(source)).extract()?)
    }

    /// Roll every row into a new table
    pub fn build<R: DiceRoller>(
        &self,
        roller: R,
        renderer: HtmlRenderer,
    ) -> Result<AttackTable<R>, ScriptError> {
        let mut table = AttackTable::with_roller(roller).with_renderer(renderer);
        if let Some(header) = &self.header {
            table = table.with_header(header.clone());
        }

        for (index, row) in self.rows.iter().enumerate() {
            let rolled = match row {
                ScriptRow::Attack {
                    name,
                    attack,
                    damage,
                    crit_range,
                    crit_attack,
                    crit_damage,
                } => {
                    let crit = CritOptions {
                        range: crit_range.unwrap_or_default(),
                        attack: crit_attack.as_ref().map(Bonus::to_string),
                        damage: crit_damage.clone(),
                    };
                    let spec = AttackSpec::new(name.clone(), attack, damage.clone()).with_crit(crit);
                    table.add_attack(&spec).map(|_| ())
                }
                ScriptRow::Maneuver {
                    name,
                    attack,
                    damage,
                } => table
                    .add_maneuver(name.clone(), attack, damage.as_deref())
                    .map(|_| ()),
                ScriptRow::Note { text, raw: false } => {
                    table.add_note(text.clone());
                    Ok(())
                }
                ScriptRow::Note { text, raw: true } => {
                    table.add_markup(text.clone());
                    Ok(())
                }
            };
            rolled.map_err(|source| ScriptError::Roll {
                row: index + 1,
                source,
            })?;
        }

        Ok(table)
    }
}
