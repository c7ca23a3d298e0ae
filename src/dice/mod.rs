//! Dice rolling system
//!
//! Parses and rolls formulas like "1d20+6+2", "2d20kh+5", "1d8+5+1d6[fire]".
//! Evaluation goes through the [`DiceRoller`] trait so hosts can plug in
//! their own engine.

mod formula;
mod result;
mod roller;

pub use formula::{Formula, FormulaError, FormulaErrorKind, Keep, SignedTerm, Term, MAX_DICE};
pub use result::{DieResult, RollResult, Sign, TermResult};
pub use roller::{DiceRoller, DieSource, RngDice, Roller, ScriptedDice};
