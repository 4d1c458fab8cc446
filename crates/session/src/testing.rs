//! Recording subsystem doubles shared by the coordinator tests.
//!
//! Each mock appends the mutating calls it receives to a shared log so the
//! tests can assert cross-subsystem ordering, and keeps its last restored
//! blob so the tests can assert what reached it.

use crate::step::GameStepState;
use crate::subsystem::{
    CanvasOptions, CanvasSubsystem, HistoryAddOptions, HistorySubsystem, NarrationSubsystem,
    SoundSubsystem, StorageSubsystem,
};
use async_trait::async_trait;
use novella_common::{OpenedLabel, StepEndTickers, TickerId};
use serde_json::{Value, json};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

pub type CallLog = Rc<RefCell<Vec<String>>>;

pub fn new_call_log() -> CallLog {
    Rc::new(RefCell::new(Vec::new()))
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct MockError(pub String);

pub struct MockNarration {
    pub log: CallLog,
    pub state: Value,
    pub step_counter: u64,
    pub opened: Vec<OpenedLabel>,
    pub steps_running: usize,
}

#[async_trait(?Send)]
impl NarrationSubsystem for MockNarration {
    type Error = MockError;

    fn export(&self) -> Value {
        self.state.clone()
    }

    async fn restore(
        &mut self,
        state: Value,
        _last_history_step: Option<Value>,
    ) -> Result<(), Self::Error> {
        self.log.borrow_mut().push("narration.restore".into());
        self.state = state;
        Ok(())
    }

    fn step_counter(&self) -> u64 {
        self.step_counter
    }

    fn set_step_counter(&mut self, value: u64) {
        self.step_counter = value;
    }

    fn opened_labels(&self) -> Vec<OpenedLabel> {
        self.opened.clone()
    }

    fn set_opened_labels(&mut self, labels: Vec<OpenedLabel>) {
        self.opened = labels;
    }

    fn current_label_step_index(&self) -> usize {
        self.opened.last().map(|l| l.step_index).unwrap_or(0)
    }

    fn steps_running(&self) -> usize {
        self.steps_running
    }

    fn clear(&mut self) {
        self.state = json!({});
        self.step_counter = 0;
        self.opened.clear();
    }
}

pub struct MockStorage {
    pub log: CallLog,
    pub vars: BTreeMap<String, Value>,
    pub fail_restore: bool,
    pub pruned_to: Option<usize>,
}

impl StorageSubsystem for MockStorage {
    type Error = MockError;

    fn export(&self) -> Value {
        if self.vars.is_empty() {
            json!({})
        } else {
            json!({ "variables": self.vars })
        }
    }

    fn restore(&mut self, state: Value) -> Result<(), Self::Error> {
        if self.fail_restore {
            return Err(MockError("storage rejected the blob".into()));
        }
        self.log.borrow_mut().push("storage.restore".into());
        self.vars = state
            .get("variables")
            .and_then(Value::as_object)
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();
        Ok(())
    }

    fn variable(&self, key: &str) -> Option<Value> {
        self.vars.get(key).cloned()
    }

    fn set_variable(&mut self, key: &str, value: Value) {
        self.vars.insert(key.into(), value);
    }

    fn remove_variable(&mut self, key: &str) {
        self.vars.remove(key);
    }

    fn flag(&self, name: &str) -> bool {
        self.vars.get(name).and_then(Value::as_bool).unwrap_or(false)
    }

    fn set_flag(&mut self, name: &str, value: bool) {
        self.vars.insert(name.into(), Value::Bool(value));
    }

    fn clear_old_temp_variables(&mut self, opened_labels_count: usize) {
        self.pruned_to = Some(opened_labels_count);
    }

    fn clear(&mut self) {
        self.vars.clear();
        self.pruned_to = None;
    }
}

pub struct MockCanvas {
    pub log: CallLog,
    pub state: Value,
    pub pending: StepEndTickers,
    pub completions: Vec<(TickerId, Option<String>)>,
}

#[async_trait(?Send)]
impl CanvasSubsystem for MockCanvas {
    type Error = MockError;
    type Handle = ();

    async fn initialize(&mut self, _options: &CanvasOptions) -> Result<(), Self::Error> {
        self.log.borrow_mut().push("canvas.initialize".into());
        Ok(())
    }

    fn export(&self) -> Value {
        self.state.clone()
    }

    async fn restore(&mut self, state: Value) -> Result<(), Self::Error> {
        self.log.borrow_mut().push("canvas.restore".into());
        self.state = state;
        Ok(())
    }

    fn force_completion_of_ticker(&mut self, id: TickerId, alias: Option<&str>) {
        self.completions.push((id, alias.map(String::from)));
    }

    fn take_step_end_tickers(&mut self) -> StepEndTickers {
        std::mem::take(&mut self.pending)
    }

    fn clear(&mut self) {
        self.state = json!({});
        self.pending = StepEndTickers::default();
        self.completions.clear();
    }
}

pub struct MockSound {
    pub log: CallLog,
    pub state: Value,
}

impl SoundSubsystem for MockSound {
    type Error = MockError;

    fn export(&self) -> Value {
        self.state.clone()
    }

    fn restore(&mut self, state: Value) -> Result<(), Self::Error> {
        self.log.borrow_mut().push("sound.restore".into());
        self.state = state;
        Ok(())
    }

    fn clear(&mut self) {
        self.state = json!({});
    }
}

pub struct MockHistory {
    pub log: CallLog,
    pub entries: Vec<Value>,
    pub reference_step: Option<GameStepState>,
}

impl HistorySubsystem for MockHistory {
    type Error = MockError;

    fn export(&self) -> Value {
        if self.entries.is_empty() {
            json!({})
        } else {
            json!({ "entries": self.entries })
        }
    }

    fn add(&mut self, entry: Value, _options: &HistoryAddOptions) {
        self.entries.push(entry);
    }

    fn last_step(&self) -> Option<Value> {
        self.entries.last().cloned()
    }

    fn set_reference_step(&mut self, step: GameStepState) {
        self.log
            .borrow_mut()
            .push("history.set_reference_step".into());
        self.reference_step = Some(step);
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.reference_step = None;
    }
}

pub type MockSession = crate::Session<MockNarration, MockStorage, MockCanvas, MockSound, MockHistory>;

/// A session over recording mocks, not yet initialized.
pub fn session(log: &CallLog) -> MockSession {
    crate::Session::new(
        MockNarration {
            log: log.clone(),
            state: json!({}),
            step_counter: 0,
            opened: Vec::new(),
            steps_running: 0,
        },
        MockStorage {
            log: log.clone(),
            vars: BTreeMap::new(),
            fail_restore: false,
            pruned_to: None,
        },
        MockCanvas {
            log: log.clone(),
            state: json!({}),
            pending: StepEndTickers::default(),
            completions: Vec::new(),
        },
        MockSound {
            log: log.clone(),
            state: json!({}),
        },
        MockHistory {
            log: log.clone(),
            entries: Vec::new(),
            reference_step: None,
        },
    )
}

/// A session over recording mocks with `initialize` already completed.
pub fn initialized_session(log: &CallLog) -> MockSession {
    let mut s = session(log);
    pollster::block_on(s.initialize(&CanvasOptions::new(800, 600)))
        .expect("mock canvas init cannot fail");
    s
}
