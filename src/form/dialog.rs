//! Dialog requests and renderers
//!
//! An [`InputDialog`](super::InputDialog) is shown by handing a
//! [`DialogRequest`] to a [`DialogRenderer`]. The renderer owns the request
//! until the user presses one of its buttons or abandons it.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::io::{BufRead, Write};

use thiserror::Error;
use tracing::{debug, info};

use super::field::{FieldSpec, InputKind, RawInput};

/// Dialog rendering errors
#[derive(Debug, Error)]
pub enum DialogError {
    #[error("dialog I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("dialog rejected: {0}")]
    Rejected(String),
}

/// Live field values, read when a button is pressed
pub trait FieldReader {
    fn read(&self, id: &str) -> Option<RawInput>;
}

impl FieldReader for HashMap<String, RawInput> {
    fn read(&self, id: &str) -> Option<RawInput> {
        self.get(id).cloned()
    }
}

type ButtonCallback = Box<dyn FnOnce(&dyn FieldReader) + Send>;

/// A button wired to read the form when pressed
pub struct DialogButton {
    pub id: String,
    pub label: String,
    callback: ButtonCallback,
}

impl DialogButton {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        callback: impl FnOnce(&dyn FieldReader) + Send + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            callback: Box::new(callback),
        }
    }

    /// Activate the button with the current field values
    pub fn press(self, fields: &dyn FieldReader) {
        debug!(button = %self.id, "button pressed");
        (self.callback)(fields)
    }
}

impl fmt::Debug for DialogButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogButton")
            .field("id", &self.id)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Everything a renderer needs to show a dialog
#[derive(Debug)]
pub struct DialogRequest {
    pub title: String,
    /// Form markup
    pub content: String,
    pub fields: Vec<FieldSpec>,
    pub buttons: Vec<DialogButton>,
}

impl DialogRequest {
    /// Initial values of every field, as the form first shows them
    pub fn defaults(&self) -> HashMap<String, RawInput> {
        self.fields
            .iter()
            .map(|f| (f.id.clone(), f.default_input()))
            .collect()
    }

    pub fn button_ids(&self) -> Vec<&str> {
        self.buttons.iter().map(|b| b.id.as_str()).collect()
    }

    /// Press the button with the given id. Returns false if there is no such button
    /// (or it was already pressed).
    pub fn press(&mut self, button_id: &str, fields: &dyn FieldReader) -> bool {
        match self.buttons.iter().position(|b| b.id == button_id) {
            Some(index) => {
                self.buttons.remove(index).press(fields);
                true
            }
            None => false,
        }
    }
}

/// Displays dialogs until a button is activated
pub trait DialogRenderer {
    fn render(&mut self, request: DialogRequest) -> Result<(), DialogError>;
}

impl<R: DialogRenderer + ?Sized> DialogRenderer for &mut R {
    fn render(&mut self, request: DialogRequest) -> Result<(), DialogError> {
        (**self).render(request)
    }
}

/// Holds requests for a host event loop to activate later
#[derive(Debug, Default)]
pub struct DialogQueue {
    pending: VecDeque<DialogRequest>,
}

impl DialogQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Oldest request not yet handed out
    pub fn next(&mut self) -> Option<DialogRequest> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl DialogRenderer for DialogQueue {
    fn render(&mut self, request: DialogRequest) -> Result<(), DialogError> {
        debug!(title = %request.title, "dialog queued");
        self.pending.push_back(request);
        Ok(())
    }
}

/// Prompts for each field on a terminal.
///
/// Empty input keeps the default. End of input abandons the dialog.
pub struct TerminalDialog<I, O> {
    input: I,
    output: O,
}

impl<I: BufRead, O: Write> TerminalDialog<I, O> {
    pub fn new(input: I, output: O) -> Self {
        Self { input, output }
    }

    /// Recover the output stream
    pub fn into_output(self) -> O {
        self.output
    }

    /// Read one trimmed line; `None` at end of input
    fn line(&mut self) -> Result<Option<String>, DialogError> {
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn prompt_field(&mut self, field: &FieldSpec) -> Result<Option<RawInput>, DialogError> {
        match (field.kind, field.default_input()) {
            (InputKind::Checkbox, RawInput::Checked(default)) => loop {
                let hint = if default { "Y/n" } else { "y/N" };
                write!(self.output, "{} [{}]: ", field.label, hint)?;
                let Some(answer) = self.line()? else {
                    return Ok(None);
                };
                match parse_flag(&answer, default) {
                    Some(checked) => return Ok(Some(RawInput::Checked(checked))),
                    None => writeln!(self.output, "Please answer y or n.")?,
                }
            },
            (_, default) => {
                let shown = match &default {
                    RawInput::Text(text) => text.clone(),
                    RawInput::Checked(checked) => checked.to_string(),
                };
                write!(self.output, "{} [{}]: ", field.label, shown)?;
                let Some(answer) = self.line()? else {
                    return Ok(None);
                };
                if answer.is_empty() {
                    Ok(Some(default))
                } else {
                    Ok(Some(RawInput::Text(answer)))
                }
            }
        }
    }

    fn choose_button(&mut self, buttons: &[DialogButton]) -> Result<Option<usize>, DialogError> {
        if buttons.len() == 1 {
            return Ok(Some(0));
        }
        loop {
            let choices: Vec<String> = buttons
                .iter()
                .enumerate()
                .map(|(i, b)| format!("{}) {}", i + 1, b.label))
                .collect();
            write!(self.output, "{} [1]: ", choices.join("  "))?;
            let Some(answer) = self.line()? else {
                return Ok(None);
            };
            if answer.is_empty() {
                return Ok(Some(0));
            }
            let by_number = answer
                .parse::<usize>()
                .ok()
                .filter(|n| (1..=buttons.len()).contains(n))
                .map(|n| n - 1);
            let by_name = buttons.iter().position(|b| {
                b.id.eq_ignore_ascii_case(&answer) || b.label.eq_ignore_ascii_case(&answer)
            });
            match by_number.or(by_name) {
                Some(index) => return Ok(Some(index)),
                None => writeln!(self.output, "Unknown choice '{}'.", answer)?,
            }
        }
    }
}

fn parse_flag(answer: &str, default: bool) -> Option<bool> {
    match answer.to_ascii_lowercase().as_str() {
        "" => Some(default),
        "y" | "yes" | "true" | "1" | "on" => Some(true),
        "n" | "no" | "false" | "0" | "off" => Some(false),
        _ => None,
    }
}

impl<I: BufRead, O: Write> DialogRenderer for TerminalDialog<I, O> {
    fn render(&mut self, mut request: DialogRequest) -> Result<(), DialogError> {
        writeln!(self.output, "== {} ==", request.title)?;

        let mut values = HashMap::new();
        for field in &request.fields {
            match self.prompt_field(field)? {
                Some(value) => {
                    values.insert(field.id.clone(), value);
                }
                None => {
                    info!(title = %request.title, "dialog closed without a button press");
                    return Ok(());
                }
            }
        }

        match self.choose_button(&request.buttons)? {
            Some(index) => {
                request.buttons.remove(index).press(&values);
            }
            None => info!(title = %request.title, "dialog closed without a button press"),
        }
        Ok(())
    }
}
