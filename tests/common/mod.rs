//! Common test utilities - scripted dice and captured dialog submissions

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use macro_tools::attack::AttackTable;
use macro_tools::dice::{Roller, ScriptedDice};
use macro_tools::form::{FormResult, RawInput};
use parking_lot::Mutex;

pub type ScriptedTable = AttackTable<Roller<ScriptedDice>>;

/// Attack table whose dice come up with `faces`, in order
pub fn scripted_table(faces: &[u32]) -> ScriptedTable {
    AttackTable::with_roller(Roller::new(ScriptedDice::new(faces.iter().copied())))
}

/// Field states as a renderer would report them
pub fn inputs(entries: &[(&str, RawInput)]) -> HashMap<String, RawInput> {
    entries
        .iter()
        .map(|(id, raw)| (id.to_string(), raw.clone()))
        .collect()
}

pub fn text(value: &str) -> RawInput {
    RawInput::Text(value.to_string())
}

/// Submission callback that records every result it receives
pub fn capture() -> (
    Arc<Mutex<Vec<FormResult>>>,
    impl FnOnce(FormResult) + Send + 'static,
) {
    let results = Arc::new(Mutex::new(Vec::new()));
    let sink = results.clone();
    (results, move |result| sink.lock().push(result))
}
