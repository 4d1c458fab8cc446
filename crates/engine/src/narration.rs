use crate::error::EngineError;
use async_trait::async_trait;
use novella_common::OpenedLabel;
use novella_session::NarrationSubsystem;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;

/// One engine command produced by a narration step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StepCommand {
    /// Show a dialogue line.
    Say {
        character: Option<String>,
        text: String,
    },
    /// Set a persistent variable.
    Set { key: String, value: Value },
    /// Set a temporary variable scoped to the current label nesting.
    SetTemp { key: String, value: Value },
    /// Set or unset a boolean flag.
    SetFlag { name: String, value: bool },
    /// Remove a variable.
    Remove { key: String },
    /// Open another label on top of the current one.
    Call { label: String },
    /// Start playback on a sound channel.
    PlaySound { channel: String, track: String },
    /// Schedule an animation ticker, optionally force-completed at step end.
    StartTicker {
        alias: Option<String>,
        duration_frames: u32,
        complete_on_step_end: bool,
    },
}

/// A named, registered sequence of narrative steps. Each step is the list
/// of commands the engine executes before waiting for the player again.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub id: String,
    pub steps: Vec<Vec<StepCommand>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct NarrationState {
    #[serde(rename = "stepCounter")]
    step_counter: u64,
    #[serde(rename = "openedLabels")]
    opened_labels: Vec<OpenedLabel>,
}

/// Narration bookkeeping: the label registry, the opened-label stack, and
/// the step counter.
///
/// The registry survives `clear` and restore — labels are code, registered
/// at startup; only the runtime position is session state.
#[derive(Debug, Default)]
pub struct NarrationManager {
    labels: BTreeMap<String, Label>,
    opened_labels: Vec<OpenedLabel>,
    step_counter: u64,
    steps_running: usize,
}

impl NarrationManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a label. Re-registering an existing id overwrites it —
    /// logged as informational, never an error.
    pub fn new_label(&mut self, id: impl Into<String>, steps: Vec<Vec<StepCommand>>) {
        let id = id.into();
        if self.labels.contains_key(&id) {
            tracing::info!(label = %id, "label already exists, it will be overwritten");
        }
        self.labels.insert(id.clone(), Label { id, steps });
    }

    pub fn label(&self, id: &str) -> Option<&Label> {
        self.labels.get(id)
    }

    pub fn registered_label_count(&self) -> usize {
        self.labels.len()
    }

    /// Push a label onto the opened stack, starting at its first step.
    pub fn open_label(&mut self, id: &str) -> Result<(), EngineError> {
        if !self.labels.contains_key(id) {
            return Err(EngineError::UnknownLabel(id.into()));
        }
        self.opened_labels.push(OpenedLabel::new(id));
        Ok(())
    }

    /// Take the next step's commands from the innermost open label and
    /// advance its position.
    ///
    /// The label stays on the stack even when this was its last step — its
    /// commands still execute inside the label's scope. The driver closes
    /// exhausted labels afterwards via [`close_finished_labels`].
    ///
    /// [`close_finished_labels`]: NarrationManager::close_finished_labels
    pub fn next_commands(&mut self) -> Result<Vec<StepCommand>, EngineError> {
        let current = self
            .opened_labels
            .last()
            .cloned()
            .ok_or(EngineError::NoOpenLabel)?;
        let label = self
            .labels
            .get(&current.label)
            .ok_or_else(|| EngineError::UnknownLabel(current.label.clone()))?;

        let commands = label
            .steps
            .get(current.step_index)
            .cloned()
            .unwrap_or_default();

        self.step_counter += 1;
        if let Some(top) = self.opened_labels.last_mut() {
            top.step_index = current.step_index + 1;
        }
        Ok(commands)
    }

    /// Pop every exhausted label from the top of the stack, innermost
    /// first. Returns how many labels closed.
    pub fn close_finished_labels(&mut self) -> usize {
        let mut closed = 0;
        while let Some(top) = self.opened_labels.last() {
            let finished = self
                .labels
                .get(&top.label)
                .map(|label| top.step_index >= label.steps.len())
                .unwrap_or(true);
            if !finished {
                break;
            }
            self.opened_labels.pop();
            closed += 1;
        }
        closed
    }

    /// Mark a step in flight. Exports taken while this gauge is non-zero
    /// may be inconsistent.
    pub fn begin_step(&mut self) {
        self.steps_running += 1;
    }

    pub fn finish_step(&mut self) {
        self.steps_running = self.steps_running.saturating_sub(1);
    }
}

#[async_trait(?Send)]
impl NarrationSubsystem for NarrationManager {
    type Error = EngineError;

    fn export(&self) -> Value {
        json!({
            "stepCounter": self.step_counter,
            "openedLabels": self.opened_labels,
        })
    }

    async fn restore(
        &mut self,
        state: Value,
        last_history_step: Option<Value>,
    ) -> Result<(), Self::Error> {
        let parsed: NarrationState = serde_json::from_value(state).map_err(|source| {
            EngineError::MalformedState {
                subsystem: "narration",
                source,
            }
        })?;
        self.step_counter = parsed.step_counter;
        self.opened_labels = parsed.opened_labels;

        // Reconcile the innermost position against the last checkpoint: a
        // snapshot taken mid-label can be older than the history's view of
        // the same label.
        if let Some(reference) = last_history_step {
            let reference_index = reference.get("labelIndex").and_then(Value::as_u64);
            if let (Some(top), Some(index)) = (self.opened_labels.last_mut(), reference_index) {
                let index = index as usize;
                if top.step_index < index {
                    top.step_index = index;
                }
            }
        }
        Ok(())
    }

    fn step_counter(&self) -> u64 {
        self.step_counter
    }

    fn set_step_counter(&mut self, value: u64) {
        self.step_counter = value;
    }

    fn opened_labels(&self) -> Vec<OpenedLabel> {
        self.opened_labels.clone()
    }

    fn set_opened_labels(&mut self, labels: Vec<OpenedLabel>) {
        self.opened_labels = labels;
    }

    fn current_label_step_index(&self) -> usize {
        self.opened_labels.last().map(|l| l.step_index).unwrap_or(0)
    }

    fn steps_running(&self) -> usize {
        self.steps_running
    }

    fn clear(&mut self) {
        self.opened_labels.clear();
        self.step_counter = 0;
        self.steps_running = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn say(text: &str) -> Vec<StepCommand> {
        vec![StepCommand::Say {
            character: None,
            text: text.into(),
        }]
    }

    #[test]
    fn opening_an_unregistered_label_fails() {
        let mut narration = NarrationManager::new();
        assert!(matches!(
            narration.open_label("missing"),
            Err(EngineError::UnknownLabel(_))
        ));
    }

    #[test]
    fn advancing_without_an_open_label_fails() {
        let mut narration = NarrationManager::new();
        assert!(matches!(
            narration.next_commands(),
            Err(EngineError::NoOpenLabel)
        ));
    }

    #[test]
    fn label_closes_after_its_last_step() {
        let mut narration = NarrationManager::new();
        narration.new_label("intro", vec![say("one"), say("two")]);
        narration.open_label("intro").unwrap();

        narration.next_commands().unwrap();
        assert_eq!(narration.close_finished_labels(), 0);
        assert_eq!(narration.current_label_step_index(), 1);

        narration.next_commands().unwrap();
        assert_eq!(narration.close_finished_labels(), 1);
        assert!(narration.opened_labels().is_empty());
        assert_eq!(narration.step_counter(), 2);
    }

    #[test]
    fn nested_exhausted_labels_close_together() {
        let mut narration = NarrationManager::new();
        narration.new_label("outer", vec![say("last")]);
        narration.new_label("inner", vec![say("only")]);
        narration.open_label("outer").unwrap();
        narration.next_commands().unwrap(); // outer exhausted, still open
        narration.open_label("inner").unwrap();
        narration.next_commands().unwrap(); // inner exhausted too

        assert_eq!(narration.close_finished_labels(), 2);
        assert!(narration.opened_labels().is_empty());
    }

    #[test]
    fn reregistering_a_label_overwrites_it() {
        let mut narration = NarrationManager::new();
        narration.new_label("intro", vec![say("old")]);
        narration.new_label("intro", vec![say("new"), say("longer")]);

        assert_eq!(narration.registered_label_count(), 1);
        assert_eq!(narration.label("intro").unwrap().steps.len(), 2);
    }

    #[test]
    fn clear_keeps_the_registry() {
        let mut narration = NarrationManager::new();
        narration.new_label("intro", vec![say("one")]);
        narration.open_label("intro").unwrap();
        narration.clear();

        assert_eq!(narration.step_counter(), 0);
        assert!(narration.opened_labels().is_empty());
        assert_eq!(narration.registered_label_count(), 1);
    }

    #[test]
    fn restore_reconciles_against_the_last_checkpoint() {
        let mut narration = NarrationManager::new();
        narration.new_label("intro", vec![say("one"), say("two"), say("three")]);

        let state = json!({
            "stepCounter": 1,
            "openedLabels": [{"label": "intro", "stepIndex": 1}],
        });
        let checkpoint = json!({ "labelIndex": 2 });
        pollster::block_on(narration.restore(state, Some(checkpoint))).unwrap();

        assert_eq!(narration.step_counter(), 1);
        assert_eq!(narration.current_label_step_index(), 2);
    }

    #[test]
    fn restore_without_checkpoint_keeps_the_snapshot_position() {
        let mut narration = NarrationManager::new();
        let state = json!({
            "stepCounter": 4,
            "openedLabels": [{"label": "intro", "stepIndex": 1}],
        });
        pollster::block_on(narration.restore(state, None)).unwrap();
        assert_eq!(narration.current_label_step_index(), 1);
    }
}
