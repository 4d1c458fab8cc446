use crate::error::SessionError;
use crate::session::Session;
use crate::step::GameStepState;
use crate::subsystem::{
    CanvasSubsystem, HistoryAddOptions, HistorySubsystem, NarrationSubsystem, SoundSubsystem,
    StorageSubsystem,
};
use async_trait::async_trait;
use novella_common::GamePath;
use serde_json::Value;

/// The capability surface the session hands to the external engine.
///
/// The engine used to receive a bag of individually-bound closures at init
/// time; this trait replaces that bag with one explicit interface, bound
/// once and mockable in tests. Everything the engine needs at a step
/// boundary — checkpoint capture and rollback, narration counters, variable
/// and flag access, the ticker drain, temp-variable pruning — goes through
/// here.
#[async_trait(?Send)]
pub trait SessionStateProvider {
    /// Point-in-time capture of the current step.
    fn current_step_state(&self) -> Result<GameStepState, SessionError>;

    /// Step-level rollback, same ordering discipline as a full restore.
    async fn restore_step_state(
        &mut self,
        state: GameStepState,
        navigate: &mut (dyn for<'a> FnMut(&'a GamePath)),
    ) -> Result<(), SessionError>;

    fn step_counter(&self) -> u64;
    fn set_step_counter(&mut self, value: u64);
    fn opened_label_count(&self) -> usize;
    fn steps_running(&self) -> usize;

    /// Append a checkpoint to the step history.
    fn add_history_entry(&mut self, entry: Value, options: &HistoryAddOptions);

    /// Step boundary: drain and force-complete the pending tickers.
    fn on_go_next_end(&mut self) -> Result<(), SessionError>;

    /// Label close: prune temp variables deeper than `opened_labels_count`.
    fn on_label_closing(&mut self, opened_labels_count: usize) -> Result<(), SessionError>;

    fn variable(&self, key: &str) -> Option<Value>;
    fn set_variable(&mut self, key: &str, value: Value);
    fn remove_variable(&mut self, key: &str);
    fn flag(&self, name: &str) -> bool;
    fn set_flag(&mut self, name: &str, value: bool);
}

#[async_trait(?Send)]
impl<N, S, C, A, H> SessionStateProvider for Session<N, S, C, A, H>
where
    N: NarrationSubsystem,
    S: StorageSubsystem,
    C: CanvasSubsystem,
    A: SoundSubsystem,
    H: HistorySubsystem,
{
    fn current_step_state(&self) -> Result<GameStepState, SessionError> {
        Session::current_step_state(self)
    }

    async fn restore_step_state(
        &mut self,
        state: GameStepState,
        navigate: &mut (dyn for<'a> FnMut(&'a GamePath)),
    ) -> Result<(), SessionError> {
        Session::restore_step_state(self, state, navigate).await
    }

    fn step_counter(&self) -> u64 {
        self.narration().step_counter()
    }

    fn set_step_counter(&mut self, value: u64) {
        self.narration_mut().set_step_counter(value);
    }

    fn opened_label_count(&self) -> usize {
        self.narration().opened_labels().len()
    }

    fn steps_running(&self) -> usize {
        self.narration().steps_running()
    }

    fn add_history_entry(&mut self, entry: Value, options: &HistoryAddOptions) {
        self.history_mut().add(entry, options);
    }

    fn on_go_next_end(&mut self) -> Result<(), SessionError> {
        Session::on_go_next_end(self)
    }

    fn on_label_closing(&mut self, opened_labels_count: usize) -> Result<(), SessionError> {
        Session::on_label_closing(self, opened_labels_count)
    }

    fn variable(&self, key: &str) -> Option<Value> {
        self.storage().variable(key)
    }

    fn set_variable(&mut self, key: &str, value: Value) {
        self.storage_mut().set_variable(key, value);
    }

    fn remove_variable(&mut self, key: &str) {
        self.storage_mut().remove_variable(key);
    }

    fn flag(&self, name: &str) -> bool {
        self.storage().flag(name)
    }

    fn set_flag(&mut self, name: &str, value: bool) {
        self.storage_mut().set_flag(name, value);
    }
}
