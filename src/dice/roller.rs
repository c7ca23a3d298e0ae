//! Die sources and formula evaluators

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::formula::{Formula, FormulaError};
use super::result::RollResult;

/// Produces one die face at a time
pub trait DieSource {
    /// Roll a single die with the given number of sides (1..=sides)
    fn roll_die(&mut self, sides: u32) -> u32;
}

/// Random dice backed by any `rand` generator
#[derive(Debug, Clone)]
pub struct RngDice<R>(pub R);

impl<R: Rng> DieSource for RngDice<R> {
    fn roll_die(&mut self, sides: u32) -> u32 {
        self.0.random_range(1..=sides)
    }
}

/// Replays a fixed sequence of faces, cycling when exhausted.
///
/// Faces are clamped to the die being rolled. An empty script always rolls 1.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    faces: Vec<u32>,
    next: usize,
}

impl ScriptedDice {
    pub fn new(faces: impl IntoIterator<Item = u32>) -> Self {
        Self {
            faces: faces.into_iter().collect(),
            next: 0,
        }
    }

    /// Number of faces handed out so far
    pub fn rolled(&self) -> usize {
        self.next
    }
}

impl DieSource for ScriptedDice {
    fn roll_die(&mut self, sides: u32) -> u32 {
        let face = if self.faces.is_empty() {
            1
        } else {
            self.faces[self.next % self.faces.len()]
        };
        self.next += 1;
        face.clamp(1, sides)
    }
}

/// Evaluates formula strings into roll results
pub trait DiceRoller {
    fn evaluate(&mut self, formula: &str) -> Result<RollResult, FormulaError>;
}

impl<R: DiceRoller + ?Sized> DiceRoller for &mut R {
    fn evaluate(&mut self, formula: &str) -> Result<RollResult, FormulaError> {
        (**self).evaluate(formula)
    }
}

impl<R: DiceRoller + ?Sized> DiceRoller for Box<R> {
    fn evaluate(&mut self, formula: &str) -> Result<RollResult, FormulaError> {
        (**self).evaluate(formula)
    }
}

/// Parses and rolls formulas against a die source
#[derive(Debug, Clone)]
pub struct Roller<S = RngDice<StdRng>> {
    dice: S,
}

impl Roller {
    /// Roller seeded from the operating system
    pub fn from_entropy() -> Self {
        Self::new(RngDice(StdRng::from_os_rng()))
    }

    /// Reproducible roller
    pub fn seeded(seed: u64) -> Self {
        Self::new(RngDice(StdRng::seed_from_u64(seed)))
    }

    /// Seeded when a seed is given, otherwise from entropy
    pub fn with_seed(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::seeded)
    }
}

impl<S: DieSource> Roller<S> {
    pub fn new(dice: S) -> Self {
        Self { dice }
    }

    /// Access the underlying die source
    pub fn dice(&self) -> &S {
        &self.dice
    }

    /// Roll an already parsed formula
    pub fn roll(&mut self, formula: &Formula) -> RollResult {
        let result = formula.evaluate(&mut self.dice);
        debug!(
            formula = %result.formula,
            total = result.total,
            natural = ?result.natural,
            "rolled"
        );
        result
    }
}

impl<S: DieSource> DiceRoller for Roller<S> {
    fn evaluate(&mut self, formula: &str) -> Result<RollResult, FormulaError> {
        Ok(self.roll(&Formula::parse(formula)?))
    }
}
