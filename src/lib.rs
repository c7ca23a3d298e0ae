//! macro-tools - attack tables and input dialogs for virtual tabletop macros
//!
//! Two small building blocks for macro authors:
//! - [`AttackTable`]: rolls attacks, damage and critical confirmations and
//!   renders them as a chat table with natural 1s and 20s highlighted
//! - [`InputDialog`]: a modal form whose entered values are delivered once a
//!   button is pressed
//!
//! Dice, chat and dialogs are reached through traits ([`DiceRoller`],
//! [`ChatSink`], [`DialogRenderer`]) so a host can supply its own.

pub mod attack;
pub mod chat;
pub mod config;
pub mod dice;
pub mod form;
pub mod markup;
pub mod script;

pub use attack::{normalize_attack_formula, AttackRow, AttackSpec, AttackTable, CritOptions};
pub use chat::{ChatLog, ChatMessage, ChatSink, Speaker};
pub use config::Settings;
pub use dice::{DiceRoller, FormulaError, RollResult, Roller};
pub use form::{DialogRenderer, FormError, FormResult, InputDialog};
