use novella_session::{GameStepState, HistoryAddOptions, HistorySubsystem};
use serde_json::{Value, json};

/// Ordered list of step checkpoints.
///
/// Entries are appended at every step boundary and popped for step-level
/// rollback. A full-session restore does not touch the history; it only
/// reads the last checkpoint as the narration reconciliation reference.
#[derive(Debug, Default)]
pub struct HistoryManager {
    entries: Vec<Value>,
    reference_step: Option<GameStepState>,
}

impl HistoryManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove and return the most recent checkpoint.
    pub fn pop_last(&mut self) -> Option<Value> {
        self.entries.pop()
    }

    /// The step state the last rollback re-applied, if any.
    pub fn reference_step(&self) -> Option<&GameStepState> {
        self.reference_step.as_ref()
    }
}

impl HistorySubsystem for HistoryManager {
    type Error = crate::EngineError;

    fn export(&self) -> Value {
        json!({ "entries": self.entries })
    }

    fn add(&mut self, entry: Value, options: &HistoryAddOptions) {
        self.entries.push(entry);
        if let Some(cap) = options.cap {
            while self.entries.len() > cap {
                self.entries.remove(0);
            }
        }
    }

    fn last_step(&self) -> Option<Value> {
        self.entries.last().cloned()
    }

    fn set_reference_step(&mut self, step: GameStepState) {
        self.reference_step = Some(step);
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.reference_step = None;
    }
}
