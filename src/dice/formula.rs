//! Dice formula parsing
//!
//! Parses formulas like "1d20+6+2", "2d20kh+5", "4d6kl3-1" and
//! "1d8+5+1d6[fire]" into a list of signed terms.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::result::{DieResult, RollResult, Sign, TermResult};
use super::roller::DieSource;

/// Maximum number of dice in a single term
pub const MAX_DICE: u32 = 1000;

/// Why a formula failed to parse
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaErrorKind {
    #[error("formula is empty")]
    Empty,

    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),

    #[error("unexpected end of formula")]
    UnexpectedEnd,

    #[error("missing die size after 'd'")]
    MissingSides,

    #[error("dice count must be at least 1")]
    ZeroDice,

    #[error("die sides must be at least 1")]
    ZeroSides,

    #[error("too many dice ({count} > {max})")]
    TooManyDice { count: u32, max: u32 },

    #[error("cannot keep {keep} of {count} dice")]
    InvalidKeep { keep: u32, count: u32 },

    #[error("number too large")]
    NumberTooLarge,

    #[error("unclosed flavor text")]
    UnclosedFlavor,
}

/// A malformed dice formula
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid dice formula `{formula}` at position {position}: {kind}")]
pub struct FormulaError {
    /// The formula as given
    pub formula: String,
    /// Byte offset of the problem
    pub position: usize,
    pub kind: FormulaErrorKind,
}

/// Which dice of a pool count towards the total
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keep {
    Highest(u32),
    Lowest(u32),
}

impl Keep {
    fn count(self) -> u32 {
        match self {
            Keep::Highest(n) | Keep::Lowest(n) => n,
        }
    }
}

/// A single term of a formula
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// `NdS` with an optional keep modifier
    Dice {
        count: u32,
        sides: u32,
        keep: Option<Keep>,
    },
    /// A flat number
    Constant(u32),
}

impl Term {
    /// Lowest and highest unsigned value this term can produce
    fn bounds(&self) -> (i64, i64) {
        match *self {
            Term::Dice { count, sides, keep } => {
                let kept = keep.map_or(count, Keep::count) as i64;
                (kept, kept * sides as i64)
            }
            Term::Constant(v) => (v as i64, v as i64),
        }
    }
}

/// A term together with its sign and optional flavor annotation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTerm {
    pub sign: Sign,
    pub term: Term,
    pub flavor: Option<String>,
}

/// A parsed dice formula
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formula {
    terms: Vec<SignedTerm>,
}

impl Formula {
    /// Parse a formula string
    pub fn parse(formula: &str) -> Result<Self, FormulaError> {
        Parser::new(formula).parse()
    }

    /// The parsed terms, in order
    pub fn terms(&self) -> &[SignedTerm] {
        &self.terms
    }

    /// Whether any term rolls dice
    pub fn has_dice(&self) -> bool {
        self.terms
            .iter()
            .any(|t| matches!(t.term, Term::Dice { .. }))
    }

    /// Minimum possible total
    pub fn min(&self) -> i64 {
        self.terms
            .iter()
            .map(|t| {
                let (lo, hi) = t.term.bounds();
                match t.sign {
                    Sign::Plus => lo,
                    Sign::Minus => -hi,
                }
            })
            .sum()
    }

    /// Maximum possible total
    pub fn max(&self) -> i64 {
        self.terms
            .iter()
            .map(|t| {
                let (lo, hi) = t.term.bounds();
                match t.sign {
                    Sign::Plus => hi,
                    Sign::Minus => -lo,
                }
            })
            .sum()
    }

    /// Roll every dice term and sum the results
    ///
    /// The natural result is the kept total of the first dice term.
    pub fn evaluate<S: DieSource + ?Sized>(&self, dice: &mut S) -> RollResult {
        let mut total = 0i64;
        let mut natural = None;
        let mut terms = Vec::with_capacity(self.terms.len());

        for t in &self.terms {
            let result = match t.term {
                Term::Dice { count, sides, keep } => {
                    let mut results: Vec<DieResult> = (0..count)
                        .map(|_| DieResult {
                            value: dice.roll_die(sides),
                            kept: true,
                        })
                        .collect();
                    if let Some(keep) = keep {
                        mark_kept(&mut results, keep);
                    }
                    let subtotal: i64 = results
                        .iter()
                        .filter(|d| d.kept)
                        .map(|d| d.value as i64)
                        .sum();
                    if natural.is_none() {
                        natural = Some(subtotal as u32);
                    }
                    TermResult::Dice {
                        sign: t.sign,
                        count,
                        sides,
                        results,
                        total: subtotal,
                        flavor: t.flavor.clone(),
                    }
                }
                Term::Constant(value) => TermResult::Constant {
                    sign: t.sign,
                    value: value as i64,
                    flavor: t.flavor.clone(),
                },
            };
            total += t.sign.apply(result.total());
            terms.push(result);
        }

        RollResult {
            formula: self.to_string(),
            total,
            natural,
            terms,
        }
    }
}

/// Clear the `kept` flag on every die outside the keep window.
/// Ties resolve in favor of the earlier die.
fn mark_kept(results: &mut [DieResult], keep: Keep) {
    let mut order: Vec<usize> = (0..results.len()).collect();
    match keep {
        Keep::Highest(_) => order.sort_by(|&a, &b| results[b].value.cmp(&results[a].value)),
        Keep::Lowest(_) => order.sort_by(|&a, &b| results[a].value.cmp(&results[b].value)),
    }
    for &i in order.iter().skip(keep.count() as usize) {
        results[i].kept = false;
    }
}

impl FromStr for Formula {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Formula::parse(s)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, t) in self.terms.iter().enumerate() {
            match (i, t.sign) {
                (0, Sign::Plus) => {}
                (_, Sign::Plus) => write!(f, "+")?,
                (_, Sign::Minus) => write!(f, "-")?,
            }
            match t.term {
                Term::Dice { count, sides, keep } => {
                    write!(f, "{}d{}", count, sides)?;
                    match keep {
                        Some(Keep::Highest(1)) => write!(f, "kh")?,
                        Some(Keep::Lowest(1)) => write!(f, "kl")?,
                        Some(Keep::Highest(n)) => write!(f, "kh{}", n)?,
                        Some(Keep::Lowest(n)) => write!(f, "kl{}", n)?,
                        None => {}
                    }
                }
                Term::Constant(v) => write!(f, "{}", v)?,
            }
            if let Some(flavor) = &t.flavor {
                write!(f, "[{}]", flavor)?;
            }
        }
        Ok(())
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn error_at(&self, position: usize, kind: FormulaErrorKind) -> FormulaError {
        FormulaError {
            formula: self.src.to_string(),
            position,
            kind,
        }
    }

    fn error(&self, kind: FormulaErrorKind) -> FormulaError {
        self.error_at(self.pos, kind)
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    /// Error for whatever sits at the cursor
    fn unexpected(&self) -> FormulaError {
        match self.peek() {
            Some(c) => self.error(FormulaErrorKind::UnexpectedChar(c)),
            None => self.error(FormulaErrorKind::UnexpectedEnd),
        }
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn eat(&mut self, lower: char) -> bool {
        match self.peek() {
            Some(c) if c.to_ascii_lowercase() == lower => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn number(&mut self) -> Result<Option<u32>, FormulaError> {
        let start = self.pos;
        let mut value: u32 = 0;
        while let Some(c) = self.peek() {
            let Some(digit) = c.to_digit(10) else { break };
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(digit))
                .ok_or_else(|| self.error_at(start, FormulaErrorKind::NumberTooLarge))?;
            self.pos += 1;
        }
        Ok((self.pos > start).then_some(value))
    }

    fn parse(mut self) -> Result<Formula, FormulaError> {
        self.skip_ws();
        if self.peek().is_none() {
            return Err(self.error(FormulaErrorKind::Empty));
        }

        let mut sign = if self.eat('-') {
            Sign::Minus
        } else {
            self.eat('+');
            Sign::Plus
        };

        let mut terms = Vec::new();
        loop {
            self.skip_ws();
            let term = self.term()?;
            self.skip_ws();
            let flavor = self.flavor()?;
            terms.push(SignedTerm { sign, term, flavor });

            self.skip_ws();
            sign = match self.peek() {
                None => break,
                Some('+') => Sign::Plus,
                Some('-') => Sign::Minus,
                Some(_) => return Err(self.unexpected()),
            };
            self.pos += 1;

            // "+-1" reads as "-1"
            self.skip_ws();
            if self.eat('-') {
                sign = match sign {
                    Sign::Plus => Sign::Minus,
                    Sign::Minus => Sign::Plus,
                };
            } else {
                self.eat('+');
            }
        }

        Ok(Formula { terms })
    }

    fn term(&mut self) -> Result<Term, FormulaError> {
        let start = self.pos;
        let count = self.number()?;

        if !self.eat('d') {
            return count.map(Term::Constant).ok_or_else(|| self.unexpected());
        }

        let count = count.unwrap_or(1);
        if count == 0 {
            return Err(self.error_at(start, FormulaErrorKind::ZeroDice));
        }
        if count > MAX_DICE {
            return Err(self.error_at(
                start,
                FormulaErrorKind::TooManyDice {
                    count,
                    max: MAX_DICE,
                },
            ));
        }

        let sides_at = self.pos;
        let sides = self
            .number()?
            .ok_or_else(|| self.error(FormulaErrorKind::MissingSides))?;
        if sides == 0 {
            return Err(self.error_at(sides_at, FormulaErrorKind::ZeroSides));
        }

        let keep_at = self.pos;
        let keep = if self.eat('k') {
            let lowest = if self.eat('l') {
                true
            } else {
                self.eat('h');
                false
            };
            let n = self.number()?.unwrap_or(1);
            if n == 0 || n > count {
                return Err(self.error_at(keep_at, FormulaErrorKind::InvalidKeep { keep: n, count }));
            }
            Some(if lowest { Keep::Lowest(n) } else { Keep::Highest(n) })
        } else {
            None
        };

        Ok(Term::Dice { count, sides, keep })
    }

    fn flavor(&mut self) -> Result<Option<String>, FormulaError> {
        if self.peek() != Some('[') {
            return Ok(None);
        }
        let open = self.pos;
        let rest = &self.src[open + 1..];
        let close = rest
            .find(']')
            .ok_or_else(|| self.error_at(open, FormulaErrorKind::UnclosedFlavor))?;
        let text = rest[..close].trim().to_string();
        self.pos = open + 1 + close + 1;
        Ok(Some(text))
    }
}
