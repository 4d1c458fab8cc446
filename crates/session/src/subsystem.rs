//! Trait seams for the externally-owned engine subsystems.
//!
//! The coordinator reaches every subsystem only through these contracts and
//! treats their exported state as opaque JSON blobs it never inspects.
//! Restore paths that may suspend (narration reconciliation, canvas asset
//! reload) are async; everything else is synchronous.

use crate::step::GameStepState;
use async_trait::async_trait;
use novella_common::{StepEndTickers, TickerId};
use serde_json::Value;

/// Options for setting up the canvas renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasOptions {
    pub width: u32,
    pub height: u32,
    pub background_color: Option<String>,
}

impl CanvasOptions {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            background_color: None,
        }
    }
}

/// Options for appending a history checkpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryAddOptions {
    /// Drop the oldest entries beyond this cap.
    pub cap: Option<usize>,
}

/// Narration subsystem: step counter, label stack, script position.
#[async_trait(?Send)]
pub trait NarrationSubsystem {
    type Error: std::error::Error + Send + Sync + 'static;

    fn export(&self) -> Value;

    /// Re-hydrate narration state. `last_history_step` is the most recent
    /// history checkpoint, which the subsystem uses to reconcile its
    /// internal position with the restored step counter.
    async fn restore(
        &mut self,
        state: Value,
        last_history_step: Option<Value>,
    ) -> Result<(), Self::Error>;

    fn step_counter(&self) -> u64;
    fn set_step_counter(&mut self, value: u64);
    fn opened_labels(&self) -> Vec<novella_common::OpenedLabel>;
    fn set_opened_labels(&mut self, labels: Vec<novella_common::OpenedLabel>);
    /// Index of the current step inside the innermost open label.
    fn current_label_step_index(&self) -> usize;
    /// How many steps are executing right now. Non-zero while the engine
    /// advances; a consistent export requires zero.
    fn steps_running(&self) -> usize;
    fn clear(&mut self);
}

/// Storage subsystem: key/value variables, boolean flags, and
/// label-scoped temporary variables.
pub trait StorageSubsystem {
    type Error: std::error::Error + Send + Sync + 'static;

    fn export(&self) -> Value;
    fn restore(&mut self, state: Value) -> Result<(), Self::Error>;

    fn variable(&self, key: &str) -> Option<Value>;
    fn set_variable(&mut self, key: &str, value: Value);
    fn remove_variable(&mut self, key: &str);
    fn flag(&self, name: &str) -> bool;
    fn set_flag(&mut self, name: &str, value: bool);

    /// Prune temporary variables whose scope was bound to label nesting
    /// deeper than `opened_labels_count`.
    fn clear_old_temp_variables(&mut self, opened_labels_count: usize);

    fn clear(&mut self);
}

/// Canvas subsystem: renderer setup, visual state, animation tickers.
#[async_trait(?Send)]
pub trait CanvasSubsystem {
    type Error: std::error::Error + Send + Sync + 'static;
    /// Handle to the initialized renderer, returned to the host.
    type Handle;

    /// Set up the renderer. Awaits renderer/asset setup; called exactly
    /// once, before any other canvas operation.
    async fn initialize(&mut self, options: &CanvasOptions) -> Result<Self::Handle, Self::Error>;

    fn export(&self) -> Value;

    /// Re-hydrate visual state. May suspend while assets reload; callers
    /// must not touch the canvas until it completes.
    async fn restore(&mut self, state: Value) -> Result<(), Self::Error>;

    /// Jump a running ticker to its finished state. With an alias, only the
    /// binding scheduled under that alias is affected.
    fn force_completion_of_ticker(&mut self, id: TickerId, alias: Option<&str>);

    /// Drain the registry of tickers scheduled to complete at step end.
    /// The registry is empty once this returns.
    fn take_step_end_tickers(&mut self) -> StepEndTickers;

    fn clear(&mut self);
}

/// Sound subsystem: channel and playback state.
pub trait SoundSubsystem {
    type Error: std::error::Error + Send + Sync + 'static;

    fn export(&self) -> Value;
    fn restore(&mut self, state: Value) -> Result<(), Self::Error>;
    fn clear(&mut self);
}

/// Step-history subsystem: the ordered list of step checkpoints.
///
/// Deliberately has no restore operation. A full-session restore hands the
/// last history step to the narration subsystem as its reconciliation
/// reference but leaves the history itself alone; history accumulates only
/// through `add` and resets only through `clear`.
pub trait HistorySubsystem {
    type Error: std::error::Error + Send + Sync + 'static;

    fn export(&self) -> Value;

    /// Append a checkpoint entry.
    fn add(&mut self, entry: Value, options: &HistoryAddOptions);

    /// The most recent checkpoint, if any.
    fn last_step(&self) -> Option<Value>;

    /// Hand the subsystem the step state a rollback is re-applying, so it
    /// can reconcile its own cursor against it.
    fn set_reference_step(&mut self, step: GameStepState);

    fn clear(&mut self);
}
