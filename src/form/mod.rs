//! Input dialogs
//!
//! Builds a simple modal form, hands it to a [`DialogRenderer`] and delivers
//! the entered values once a button is pressed. A dialog closed without a
//! button press never delivers anything.

mod dialog;
mod field;

pub use dialog::{
    DialogButton, DialogError, DialogQueue, DialogRenderer, DialogRequest, FieldReader,
    TerminalDialog,
};
pub use field::{FieldDefault, FieldSpec, FieldValue, InputKind, RawInput};

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Key under which the pressed button is reported
pub const BUTTON_KEY: &str = "button";

/// Field and button ids: a letter, then letters, digits, `-` or `_`
static ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*$").unwrap());

/// Form construction errors
#[derive(Debug, Error)]
pub enum FormError {
    #[error("duplicate field id '{0}'")]
    DuplicateFieldId(String),

    #[error("duplicate button id '{0}'")]
    DuplicateButtonId(String),

    #[error("invalid id '{0}' (must start with a letter, then letters, digits, '-' or '_')")]
    InvalidId(String),

    #[error("field id '{0}' is reserved")]
    ReservedFieldId(String),

    #[error("dialog has no buttons")]
    NoButtons,

    #[error(transparent)]
    Dialog(#[from] DialogError),
}

fn validate_id(id: &str) -> Result<(), FormError> {
    if ID_REGEX.is_match(id) {
        Ok(())
    } else {
        Err(FormError::InvalidId(id.to_string()))
    }
}

/// Values entered into a dialog and the button that submitted it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormResult {
    pub button: String,
    #[serde(flatten)]
    pub values: BTreeMap<String, FieldValue>,
}

impl FormResult {
    pub fn get(&self, id: &str) -> Option<&FieldValue> {
        self.values.get(id)
    }

    pub fn text(&self, id: &str) -> Option<&str> {
        self.get(id).and_then(FieldValue::as_str)
    }

    pub fn integer(&self, id: &str) -> Option<i64> {
        self.get(id).and_then(FieldValue::as_i64)
    }

    pub fn flag(&self, id: &str) -> Option<bool> {
        self.get(id).and_then(FieldValue::as_bool)
    }
}

/// Read every field; a field the renderer does not report keeps its default
fn collect(fields: &[FieldSpec], reader: &dyn FieldReader, button: &str) -> FormResult {
    let values = fields
        .iter()
        .map(|field| {
            let raw = reader.read(&field.id).unwrap_or_else(|| field.default_input());
            (field.id.clone(), FieldValue::coerce(raw))
        })
        .collect();

    FormResult {
        button: button.to_string(),
        values,
    }
}

type Continuation = Box<dyn FnOnce(FormResult) + Send>;

/// A dialog requesting user input
#[derive(Debug, Clone)]
pub struct InputDialog {
    title: String,
    buttons: Vec<(String, String)>,
    fields: Vec<FieldSpec>,
}

impl InputDialog {
    /// Dialog with a single "Ok" button
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            buttons: vec![("ok".to_string(), "Ok".to_string())],
            fields: Vec::new(),
        }
    }

    /// Replace the buttons with `(id, label)` pairs, shown in order.
    /// A dialog always has at least one button.
    pub fn with_buttons<I, K, V>(mut self, buttons: I) -> Result<Self, FormError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut list: Vec<(String, String)> = Vec::new();
        for (id, label) in buttons {
            let id = id.into();
            validate_id(&id)?;
            if list.iter().any(|(existing, _)| *existing == id) {
                return Err(FormError::DuplicateButtonId(id));
            }
            list.push((id, label.into()));
        }
        if list.is_empty() {
            return Err(FormError::NoButtons);
        }
        self.buttons = list;
        Ok(self)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// `(id, label)` of every button
    pub fn buttons(&self) -> &[(String, String)] {
        &self.buttons
    }

    /// Append a field. Ids must be unique within the form.
    pub fn add_field(&mut self, field: FieldSpec) -> Result<&mut Self, FormError> {
        validate_id(&field.id)?;
        if field.id == BUTTON_KEY {
            return Err(FormError::ReservedFieldId(field.id));
        }
        if self.fields.iter().any(|f| f.id == field.id) {
            return Err(FormError::DuplicateFieldId(field.id));
        }
        self.fields.push(field);
        Ok(self)
    }

    /// Append a text input
    pub fn add_input(
        &mut self,
        label: impl Into<String>,
        id: impl Into<String>,
        default: impl Into<String>,
    ) -> Result<&mut Self, FormError> {
        self.add_field(FieldSpec::text(label, id, default))
    }

    /// Append a number input
    pub fn add_number(
        &mut self,
        label: impl Into<String>,
        id: impl Into<String>,
        default: i64,
    ) -> Result<&mut Self, FormError> {
        self.add_field(FieldSpec::number(label, id, default))
    }

    /// Append a checkbox
    pub fn add_checkbox(
        &mut self,
        label: impl Into<String>,
        id: impl Into<String>,
        checked: bool,
    ) -> Result<&mut Self, FormError> {
        self.add_field(FieldSpec::checkbox(label, id, checked))
    }

    /// Form markup of all fields
    pub fn content(&self) -> String {
        let inner: String = self.fields.iter().map(FieldSpec::markup).collect();
        format!("<form>{}</form><br>", inner)
    }

    /// Build the renderer request. Every button reads all fields when pressed;
    /// `on_submit` runs for the first press only.
    pub fn request(&self, on_submit: impl FnOnce(FormResult) + Send + 'static) -> DialogRequest {
        let pending: Arc<Mutex<Option<Continuation>>> =
            Arc::new(Mutex::new(Some(Box::new(on_submit))));
        let fields = Arc::new(self.fields.clone());

        let buttons = self
            .buttons
            .iter()
            .map(|(id, label)| {
                let pending = pending.clone();
                let fields = fields.clone();
                let button = id.clone();
                DialogButton::new(id.clone(), label.clone(), move |reader| {
                    let Some(on_submit) = pending.lock().take() else {
                        warn!(button = %button, "dialog already submitted, ignoring button");
                        return;
                    };
                    let result = collect(&fields, reader, &button);
                    debug!(button = %button, fields = result.values.len(), "dialog submitted");
                    on_submit(result);
                })
            })
            .collect();

        DialogRequest {
            title: self.title.clone(),
            content: self.content(),
            fields: self.fields.clone(),
            buttons,
        }
    }

    /// Show the dialog and call `on_submit` when a button is pressed.
    ///
    /// Returns once the renderer has taken the request; `on_submit` may run
    /// later, or never if the dialog is closed without a button press.
    pub fn present<R>(
        &self,
        renderer: &mut R,
        on_submit: impl FnOnce(FormResult) + Send + 'static,
    ) -> Result<(), FormError>
    where
        R: DialogRenderer + ?Sized,
    {
        debug!(title = %self.title, fields = self.fields.len(), "presenting dialog");
        renderer.render(self.request(on_submit))?;
        Ok(())
    }

    /// Show the dialog and resolve with the submitted values.
    ///
    /// If the dialog is closed without a button press the future stays
    /// pending forever.
    pub fn present_async<R>(
        &self,
        renderer: &mut R,
    ) -> Result<impl Future<Output = FormResult> + Send + 'static, FormError>
    where
        R: DialogRenderer + ?Sized,
    {
        let (tx, rx) = oneshot::channel();
        self.present(renderer, move |result| {
            let _ = tx.send(result);
        })?;

        Ok(async move {
            match rx.await {
                Ok(result) => result,
                Err(_) => {
                    debug!("dialog dropped without a button press");
                    std::future::pending().await
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hero_dialog() -> InputDialog {
        let mut dialog = InputDialog::new("Hero");
        dialog
            .add_input("Name", "name", "Bob")
            .unwrap()
            .add_checkbox("Hasted", "hasted", false)
            .unwrap();
        dialog
    }

    fn submitted() -> (Arc<Mutex<Vec<FormResult>>>, impl FnOnce(FormResult) + Send + 'static) {
        let results = Arc::new(Mutex::new(Vec::new()));
        let sink = results.clone();
        (results, move |result| sink.lock().push(result))
    }

    #[test]
    fn test_defaults_pass_through() {
        let dialog = hero_dialog();
        let mut queue = DialogQueue::new();
        let (results, on_submit) = submitted();
        dialog.present(&mut queue, on_submit).unwrap();

        let mut request = queue.next().unwrap();
        let defaults = request.defaults();
        assert!(request.press("ok", &defaults));

        let results = results.lock();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].button, "ok");
        assert_eq!(results[0].text("name"), Some("Bob"));
        assert_eq!(results[0].flag("hasted"), Some(false));
    }

    #[test]
    fn test_values_read_at_press_time() {
        let mut dialog = InputDialog::new("Attack")
            .with_buttons([("attack", "Attack"), ("full", "Full Attack")])
            .unwrap();
        dialog.add_number("Attack Bonus", "ab", 6).unwrap();
        dialog.add_input("Damage", "dmg", "1d8+5").unwrap();

        let mut queue = DialogQueue::new();
        let (results, on_submit) = submitted();
        dialog.present(&mut queue, on_submit).unwrap();

        let mut request = queue.next().unwrap();
        let mut live = request.defaults();
        live.insert("ab".to_string(), RawInput::Text("42".to_string()));
        request.press("full", &live);

        let results = results.lock();
        assert_eq!(results[0].button, "full");
        assert_eq!(results[0].integer("ab"), Some(42));
        assert_eq!(results[0].text("dmg"), Some("1d8+5"));
    }

    #[test]
    fn test_second_button_is_ignored() {
        let dialog = hero_dialog()
            .with_buttons([("ok", "Ok"), ("cancel", "Cancel")])
            .unwrap();
        let mut queue = DialogQueue::new();
        let (results, on_submit) = submitted();
        dialog.present(&mut queue, on_submit).unwrap();

        let mut request = queue.next().unwrap();
        let defaults = request.defaults();
        request.press("cancel", &defaults);
        request.press("ok", &defaults);

        let results = results.lock();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].button, "cancel");
    }

    #[test]
    fn test_missing_field_falls_back_to_default() {
        let dialog = hero_dialog();
        let mut queue = DialogQueue::new();
        let (results, on_submit) = submitted();
        dialog.present(&mut queue, on_submit).unwrap();

        let mut request = queue.next().unwrap();
        let mut partial = std::collections::HashMap::new();
        partial.insert("hasted".to_string(), RawInput::Checked(true));
        request.press("ok", &partial);

        let results = results.lock();
        assert_eq!(results[0].text("name"), Some("Bob"));
        assert_eq!(results[0].flag("hasted"), Some(true));
    }

    #[test]
    fn test_abandoned_dialog_never_submits() {
        let dialog = hero_dialog();
        let mut queue = DialogQueue::new();
        let (results, on_submit) = submitted();
        dialog.present(&mut queue, on_submit).unwrap();

        drop(queue.next());
        assert!(results.lock().is_empty());
    }

    #[test]
    fn test_duplicate_and_invalid_ids() {
        let mut dialog = hero_dialog();
        assert!(matches!(
            dialog.add_input("Other name", "name", ""),
            Err(FormError::DuplicateFieldId(id)) if id == "name"
        ));
        assert!(matches!(
            dialog.add_checkbox("Button", "button", false),
            Err(FormError::ReservedFieldId(_))
        ));
        assert!(matches!(
            dialog.add_input("Bad", "1st", ""),
            Err(FormError::InvalidId(_))
        ));
        assert!(matches!(
            dialog.add_input("Bad", "a b", ""),
            Err(FormError::InvalidId(_))
        ));
        assert_eq!(dialog.fields().len(), 2);

        assert!(matches!(
            InputDialog::new("x").with_buttons([("ok", "Ok"), ("ok", "Again")]),
            Err(FormError::DuplicateButtonId(_))
        ));
        assert!(matches!(
            InputDialog::new("x").with_buttons(Vec::<(String, String)>::new()),
            Err(FormError::NoButtons)
        ));
    }

    #[test]
    fn test_dialog_always_has_a_button() {
        let dialog = InputDialog::new("Plain");
        assert_eq!(dialog.buttons(), &[("ok".to_string(), "Ok".to_string())]);

        let rejected = dialog.clone().with_buttons(Vec::<(String, String)>::new());
        assert!(matches!(rejected, Err(FormError::NoButtons)));

        let mut queue = DialogQueue::new();
        dialog.present(&mut queue, |_| {}).unwrap();
        assert_eq!(queue.next().unwrap().button_ids(), vec!["ok"]);
    }

    #[test]
    fn test_content_markup() {
        let dialog = hero_dialog();
        assert_eq!(
            dialog.content(),
            "<form>\
             <p><label for=\"name\">Name</label><input type=\"text\" id=\"name\" value=\"Bob\"></p>\
             <p><input type=\"checkbox\" id=\"hasted\"><label for=\"hasted\">Hasted</label></p>\
             </form><br>"
        );
    }

    #[test]
    fn test_result_serializes_flat() {
        let mut values = BTreeMap::new();
        values.insert("name".to_string(), FieldValue::Text("Bob".to_string()));
        values.insert("hasted".to_string(), FieldValue::Bool(false));
        let result = FormResult {
            button: "ok".to_string(),
            values,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "button": "ok", "name": "Bob", "hasted": false })
        );
    }

    #[tokio::test]
    async fn test_present_async_resolves() {
        let dialog = hero_dialog();
        let mut queue = DialogQueue::new();
        let submission = dialog.present_async(&mut queue).unwrap();

        let mut request = queue.next().unwrap();
        let defaults = request.defaults();
        request.press("ok", &defaults);

        let result = submission.await;
        assert_eq!(result.button, "ok");
        assert_eq!(result.text("name"), Some("Bob"));
    }

    #[tokio::test]
    async fn test_present_async_abandoned_stays_pending() {
        let dialog = hero_dialog();
        let mut queue = DialogQueue::new();
        let submission = dialog.present_async(&mut queue).unwrap();
        drop(queue.next());

        let outcome =
            tokio::time::timeout(std::time::Duration::from_millis(50), submission).await;
        assert!(outcome.is_err());
    }
}
