//! Attack tables for chat
//!
//! Rolls attacks and formats them into a table for a chat message:
//! - Natural 1s and 20s are highlighted
//! - Threats roll a confirmation row with extra damage
//! - Combat maneuvers roll a check without confirmation
//! - Free-text notes

mod render;
mod row;
mod spec;

pub use render::{HtmlRenderer, TableRenderer, TextRenderer};
pub use row::{AttackRow, Highlight};
pub use spec::{AttackSpec, CritOptions, ThreatRange, ThreatRangeError};

use tracing::{error, info};
use uuid::Uuid;

use crate::chat::{ChatError, ChatMessage, ChatSink, Speaker};
use crate::dice::{DiceRoller, FormulaError, RollResult, Roller};

/// Prefix an attack formula with `1d20+` unless it already rolls a d20.
///
/// Any `d20` token counts, so `"2d20kh+5"` passes through while `"6+2"`
/// becomes `"1d20+6+2"`. A blank bonus rolls a plain `"1d20"`.
pub fn normalize_attack_formula(formula: &str) -> String {
    if formula.trim().is_empty() {
        "1d20".to_string()
    } else if formula.to_ascii_lowercase().contains("d20") {
        formula.to_string()
    } else {
        format!("1d20+{}", formula)
    }
}

/// Accumulates attack rows and renders them for chat
#[derive(Debug)]
pub struct AttackTable<R = Roller> {
    roller: R,
    rows: Vec<AttackRow>,
    renderer: HtmlRenderer,
    user: Option<String>,
}

impl AttackTable<Roller> {
    /// Table rolling with entropy-seeded dice
    pub fn new() -> Self {
        Self::with_roller(Roller::from_entropy())
    }
}

impl Default for AttackTable<Roller> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: DiceRoller> AttackTable<R> {
    pub fn with_roller(roller: R) -> Self {
        Self {
            roller,
            rows: Vec::new(),
            renderer: HtmlRenderer::default(),
            user: None,
        }
    }

    /// Start the table with a header row, e.g. "Full Attack"
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.rows.insert(
            0,
            AttackRow::Header {
                text: header.into(),
            },
        );
        self
    }

    /// Renderer used by [`render`](Self::render) and [`publish`](Self::publish)
    pub fn with_renderer(mut self, renderer: HtmlRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// User id stamped on published messages
    pub fn with_user(mut self, user: Option<String>) -> Self {
        self.user = user;
        self
    }

    pub fn rows(&self) -> &[AttackRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Evaluate a formula with this table's roller
    pub fn evaluate_roll(&mut self, formula: &str) -> Result<RollResult, FormulaError> {
        self.roller.evaluate(formula)
    }

    /// Append an attack, plus a confirmation row when the natural roll threatens.
    ///
    /// On a formula error nothing more is appended for this attack; rows
    /// already in the table stay.
    pub fn add_attack(&mut self, spec: &AttackSpec) -> Result<&mut Self, FormulaError> {
        if let Err(err) = self.roll_attack(spec) {
            error!(
                name = %spec.name,
                attack = %spec.attack,
                damage = %spec.damage,
                crit_range = spec.crit.range.get(),
                crit_attack = ?spec.crit.attack,
                crit_damage = ?spec.crit.damage,
                error = %err,
                "error in add_attack"
            );
            return Err(err);
        }
        Ok(self)
    }

    fn roll_attack(&mut self, spec: &AttackSpec) -> Result<(), FormulaError> {
        let roll = self.evaluate_roll(&normalize_attack_formula(&spec.attack))?;
        let damage = self.evaluate_roll(&spec.damage)?;
        let threat = roll.natural.is_some_and(|n| spec.crit.range.threatens(n));

        self.rows.push(AttackRow::Attack {
            name: spec.name.clone(),
            roll,
            damage,
        });

        if threat {
            let attack = spec.crit.attack.as_deref().unwrap_or(&spec.attack);
            let roll = self.evaluate_roll(&normalize_attack_formula(attack))?;
            let damage = self.evaluate_roll(spec.crit.damage.as_deref().unwrap_or(&spec.damage))?;
            self.rows.push(AttackRow::Confirm { roll, damage });
        }
        Ok(())
    }

    /// Append a combat maneuver check with optional damage. Maneuvers never confirm.
    pub fn add_maneuver(
        &mut self,
        name: impl Into<String>,
        attack: impl ToString,
        damage: Option<&str>,
    ) -> Result<&mut Self, FormulaError> {
        let name = name.into();
        let attack = attack.to_string();

        let rolled = self
            .evaluate_roll(&normalize_attack_formula(&attack))
            .and_then(|roll| {
                let damage = damage.map(|d| self.evaluate_roll(d)).transpose()?;
                Ok((roll, damage))
            });

        match rolled {
            Ok((roll, damage)) => {
                self.rows.push(AttackRow::Maneuver { name, roll, damage });
                Ok(self)
            }
            Err(err) => {
                error!(
                    name = %name,
                    attack = %attack,
                    damage = ?damage,
                    error = %err,
                    "error in add_maneuver"
                );
                Err(err)
            }
        }
    }

    /// Append a free-text row spanning the table
    pub fn add_note(&mut self, text: impl Into<String>) -> &mut Self {
        self.rows.push(AttackRow::Note { text: text.into() });
        self
    }

    /// Append a row of author markup, inserted into the HTML without escaping
    pub fn add_markup(&mut self, html: impl Into<String>) -> &mut Self {
        self.rows.push(AttackRow::Markup { html: html.into() });
        self
    }

    /// Render with the configured HTML renderer
    pub fn render(&self) -> String {
        self.renderer.render(&self.rows)
    }

    pub fn render_with(&self, renderer: &dyn TableRenderer) -> String {
        renderer.render(&self.rows)
    }

    /// Post the rendered table as a new chat message. Every call posts again.
    pub fn publish(&self, sink: &dyn ChatSink, speaker: Option<Speaker>) -> Result<Uuid, ChatError> {
        let message = ChatMessage::new(self.render())
            .with_user(self.user.clone())
            .with_speaker(speaker);
        let id = message.id;
        sink.create(message)?;
        info!(message_id = %id, rows = self.rows.len(), "published attack table");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatLog;
    use crate::dice::ScriptedDice;

    fn table(faces: &[u32]) -> AttackTable<Roller<ScriptedDice>> {
        AttackTable::with_roller(Roller::new(ScriptedDice::new(faces.iter().copied())))
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_attack_formula("6+2"), "1d20+6+2");
        assert_eq!(normalize_attack_formula("2d20kh+5"), "2d20kh+5");
        assert_eq!(normalize_attack_formula("1D20+3"), "1D20+3");
        assert_eq!(normalize_attack_formula(&8.to_string()), "1d20+8");
    }

    #[test]
    fn test_blank_bonus_rolls_plain_d20() {
        assert_eq!(normalize_attack_formula(""), "1d20");
        assert_eq!(normalize_attack_formula("  "), "1d20");

        let mut t = table(&[12, 3]);
        t.add_attack(&AttackSpec::new("Slam", "", "1d4")).unwrap();
        assert_eq!(t.rows()[0].check().unwrap().formula, "1d20");
        assert_eq!(t.rows()[0].check().unwrap().total, 12);
    }

    #[test]
    fn test_markup_note_not_escaped() {
        let mut t = table(&[]);
        t.add_note("<i>escaped</i>").add_markup("<b>raw</b>");
        let html = t.render();
        assert!(html.contains("&lt;i&gt;escaped&lt;/i&gt;"));
        assert!(html.contains(r#"<td colspan="4"><b>raw</b></td>"#));
    }

    #[test]
    fn test_attack_without_threat() {
        let mut t = table(&[15, 4]);
        t.add_attack(&AttackSpec::new("Bite", "6+2", "1d8+5")).unwrap();

        assert_eq!(t.rows().len(), 1);
        match &t.rows()[0] {
            AttackRow::Attack { name, roll, damage } => {
                assert_eq!(name, "Bite");
                assert_eq!(roll.formula, "1d20+6+2");
                assert_eq!(roll.total, 23);
                assert_eq!(damage.total, 9);
            }
            other => panic!("Expected attack row, got {:?}", other),
        }
    }

    #[test]
    fn test_natural_20_confirms() {
        let mut t = table(&[20, 4, 9, 6]);
        t.add_attack(&AttackSpec::new("Bite", "6+2", "1d8+5")).unwrap();

        assert_eq!(t.rows().len(), 2);
        assert!(t.rows()[1].is_confirmation());
        let confirm = t.rows()[1].check().unwrap();
        assert_eq!(confirm.formula, "1d20+6+2");
        assert_eq!(confirm.total, 17);
        assert_eq!(t.rows()[1].damage().unwrap().total, 11);
    }

    #[test]
    fn test_crit_options_override_confirmation() {
        let spec = AttackSpec::new("Rapier", "10", "1d6+3")
            .with_crit(CritOptions::range(18).unwrap().with_attack(12).with_damage("2d6+6"));
        let mut t = table(&[18, 2, 7, 3, 4]);
        t.add_attack(&spec).unwrap();

        assert_eq!(t.rows().len(), 2);
        assert_eq!(t.rows()[1].check().unwrap().formula, "1d20+12");
        assert_eq!(t.rows()[1].damage().unwrap().formula, "2d6+6");
        assert_eq!(t.rows()[1].damage().unwrap().total, 13);
    }

    #[test]
    fn test_threat_uses_natural_not_total() {
        // total 29 but natural 19 with default range
        let mut t = table(&[19, 1]);
        t.add_attack(&AttackSpec::new("Bite", "10", "1d4")).unwrap();
        assert_eq!(t.rows().len(), 1);
    }

    #[test]
    fn test_formula_error_keeps_earlier_rows() {
        let mut t = table(&[10, 3]);
        t.add_note("Round 1");
        t.add_attack(&AttackSpec::new("Bite", "6", "1d8")).unwrap();

        let err = t.add_attack(&AttackSpec::new("Claw", "6", "1d")).unwrap_err();
        assert_eq!(err.formula, "1d");
        assert_eq!(t.rows().len(), 2);

        assert!(t.add_attack(&AttackSpec::new("Gore", "+*", "1d8")).is_err());
        assert_eq!(t.rows().len(), 2);
    }

    #[test]
    fn test_failed_confirmation_keeps_attack_row() {
        let spec = AttackSpec::new("Bite", "6", "1d8")
            .with_crit(CritOptions::default().with_attack("oops"));
        let mut t = table(&[20, 3]);
        assert!(t.add_attack(&spec).is_err());
        assert_eq!(t.rows().len(), 1);
        assert!(!t.rows()[0].is_confirmation());
    }

    #[test]
    fn test_maneuver_never_confirms() {
        let mut t = table(&[20, 5]);
        t.add_maneuver("Trip", 10, None).unwrap();
        t.add_maneuver("Bull Rush", "2d20kh+8", Some("1d6")).unwrap();

        assert_eq!(t.rows().len(), 2);
        assert_eq!(t.rows()[0].highlight(), Some(Highlight::Success));
        assert!(t.rows()[0].damage().is_none());
        assert!(t.rows().iter().all(|r| !r.is_confirmation()));
        assert_eq!(t.rows()[1].check().unwrap().formula, "2d20kh+8");
        assert!(t.rows()[1].damage().is_some());
    }

    #[test]
    fn test_maneuver_error_appends_nothing() {
        let mut t = table(&[12]);
        assert!(t.add_maneuver("Trip", 10, Some("1d0")).is_err());
        assert!(t.is_empty());
    }

    #[test]
    fn test_header_is_first_row() {
        let mut t = table(&[3, 3]).with_header("Full Attack");
        t.add_note("Flanking");
        assert!(matches!(&t.rows()[0], AttackRow::Header { text } if text == "Full Attack"));
        assert_eq!(t.rows().len(), 2);
    }

    #[test]
    fn test_note_renders_text_only() {
        let mut t = table(&[]);
        t.add_note("foo");
        assert_eq!(
            t.render(),
            r#"<table class="pf1 chat-card card-buttons"><tr><td colspan="4">foo</td></tr></table>"#
        );
    }

    #[test]
    fn test_render_idempotent_and_publish_posts_each_time() {
        let mut t = table(&[11, 2]).with_user(Some("gm".to_string()));
        t.add_attack(&AttackSpec::new("Bite", 4, "1d6")).unwrap();
        assert_eq!(t.render(), t.render());

        let log = ChatLog::new();
        let first = t.publish(&log, Some(Speaker::new("Wolf"))).unwrap();
        let second = t.publish(&log, None).unwrap();
        assert_ne!(first, second);

        let messages = log.drain();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, t.render());
        assert_eq!(messages[0].user.as_deref(), Some("gm"));
        assert_eq!(messages[0].speaker.as_ref().unwrap().alias, "Wolf");
        assert!(messages[1].speaker.is_none());
    }
}
