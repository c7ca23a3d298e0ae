//! Attack table renderers
//!
//! Rows are plain data; a [`TableRenderer`] turns them into chat markup
//! ([`HtmlRenderer`]) or terminal text ([`TextRenderer`]).

use std::fmt::Write;

use super::row::{AttackRow, Highlight};
use crate::config::TableSettings;
use crate::dice::RollResult;
use crate::markup::escape;

/// Serializes attack rows into a display format
pub trait TableRenderer {
    fn render(&self, rows: &[AttackRow]) -> String;
}

const DAMAGE_SEPARATOR: &str = r#"</td><td>for</td><td style="text-align:right">"#;

/// Renders rows as an HTML table of inline rolls
#[derive(Debug, Clone, Default)]
pub struct HtmlRenderer {
    settings: TableSettings,
}

impl HtmlRenderer {
    pub fn new(settings: TableSettings) -> Self {
        Self { settings }
    }

    /// Inline roll link, optionally colored for natural 1s and 20s
    pub fn inline_roll(&self, roll: &RollResult, highlight: bool) -> String {
        let style = if highlight {
            match Highlight::for_roll(roll) {
                Highlight::Success => format!(r#" style="color:{}""#, escape(&self.settings.success_color)),
                Highlight::Failure => format!(r#" style="color:{}""#, escape(&self.settings.failure_color)),
                Highlight::Plain => String::new(),
            }
        } else {
            String::new()
        };
        let data = serde_json::to_string(roll).unwrap_or_default();

        format!(
            r#"<a class="inline-roll inline-result" title="{}" data-roll="{}"><i class="fas fa-dice-d20"{}></i> {}</a>"#,
            escape(&roll.formula),
            escape(&data),
            style,
            roll.total
        )
    }

    /// Button applying a damage amount to the selected token
    pub fn apply_button(&self, amount: i64) -> String {
        format!(
            r#"<button data-action="applyDamage" data-value="{}" style="font-size: 12px;padding: 0px 0px;line-height:16px;width:42px">Apply</button>"#,
            amount
        )
    }

    fn damage_cell(&self, damage: &RollResult) -> String {
        let mut cell = self.inline_roll(damage, false);
        if self.settings.apply_buttons {
            cell.push_str(&self.apply_button(damage.total));
        }
        cell
    }

    fn row(&self, out: &mut String, row: &AttackRow) {
        match row {
            AttackRow::Header { text } => {
                let _ = write!(
                    out,
                    r#"<tr><th colspan="4" style="text-align:center">{}</th></tr>"#,
                    escape(text)
                );
            }
            AttackRow::Attack { name, roll, damage } => {
                let _ = write!(
                    out,
                    "<tr><td>{}</td><td>AC {}{}{}</td></tr>",
                    escape(name),
                    self.inline_roll(roll, true),
                    DAMAGE_SEPARATOR,
                    self.damage_cell(damage)
                );
            }
            AttackRow::Confirm { roll, damage } => {
                let _ = write!(
                    out,
                    "<tr><td>&nbsp;&nbsp;&nbsp;Confirm</td><td>AC {}{}+{}</td></tr>",
                    self.inline_roll(roll, true),
                    DAMAGE_SEPARATOR,
                    self.damage_cell(damage)
                );
            }
            AttackRow::Maneuver { name, roll, damage } => {
                let _ = write!(
                    out,
                    "<tr><td>{}</td><td>CMD {}",
                    escape(name),
                    self.inline_roll(roll, true)
                );
                if let Some(damage) = damage {
                    out.push_str(DAMAGE_SEPARATOR);
                    out.push_str(&self.damage_cell(damage));
                }
                out.push_str("</td></tr>");
            }
            AttackRow::Note { text } => {
                let _ = write!(out, r#"<tr><td colspan="4">{}</td></tr>"#, escape(text));
            }
            AttackRow::Markup { html } => {
                let _ = write!(out, r#"<tr><td colspan="4">{}</td></tr>"#, html);
            }
        }
    }
}

impl TableRenderer for HtmlRenderer {
    fn render(&self, rows: &[AttackRow]) -> String {
        let mut out = format!(r#"<table class="{}">"#, escape(&self.settings.class));
        for row in rows {
            self.row(&mut out, row);
        }
        out.push_str("</table>");
        out
    }
}

/// Renders rows as plain text lines, one per row
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer;

impl TextRenderer {
    fn check(roll: &RollResult) -> String {
        match Highlight::for_roll(roll) {
            Highlight::Success => format!("{} (natural 20)", roll.total),
            Highlight::Failure => format!("{} (natural 1)", roll.total),
            Highlight::Plain => roll.total.to_string(),
        }
    }
}

impl TableRenderer for TextRenderer {
    fn render(&self, rows: &[AttackRow]) -> String {
        let mut out = String::new();
        for row in rows {
            match row {
                AttackRow::Header { text } => {
                    let _ = writeln!(out, "== {} ==", text);
                }
                AttackRow::Attack { name, roll, damage } => {
                    let _ = writeln!(out, "{}: AC {} for {}", name, Self::check(roll), damage.total);
                }
                AttackRow::Confirm { roll, damage } => {
                    let _ = writeln!(out, "   Confirm: AC {} for +{}", Self::check(roll), damage.total);
                }
                AttackRow::Maneuver { name, roll, damage } => {
                    let _ = write!(out, "{}: CMD {}", name, Self::check(roll));
                    if let Some(damage) = damage {
                        let _ = write!(out, " for {}", damage.total);
                    }
                    out.push('\n');
                }
                AttackRow::Note { text } => {
                    let _ = writeln!(out, "{}", text);
                }
                AttackRow::Markup { html } => {
                    let _ = writeln!(out, "{}", html);
                }
            }
        }
        out
    }
}
