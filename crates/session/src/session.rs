use crate::ENGINE_VERSION;
use crate::error::{SessionError, SubsystemKind};
use crate::snapshot::GameStateSnapshot;
use crate::step::GameStepState;
use crate::subsystem::{
    CanvasOptions, CanvasSubsystem, HistorySubsystem, NarrationSubsystem, SoundSubsystem,
    StorageSubsystem,
};
use novella_common::GamePath;

/// The live game session.
///
/// Owns the five subsystem collaborators and coordinates snapshot export,
/// snapshot restore, and the step-boundary callbacks between them. The host
/// application owns the session and passes it by reference into every entry
/// point; there is no module-level singleton.
///
/// None of the entry points are reentrant: the host's single-threaded event
/// loop must let a restore (including its awaited canvas step) finish before
/// issuing the next export or restore.
pub struct Session<N, S, C, A, H> {
    narration: N,
    storage: S,
    canvas: C,
    sound: A,
    history: H,
    path: GamePath,
    initialized: bool,
}

impl<N, S, C, A, H> Session<N, S, C, A, H>
where
    N: NarrationSubsystem,
    S: StorageSubsystem,
    C: CanvasSubsystem,
    A: SoundSubsystem,
    H: HistorySubsystem,
{
    /// Assemble an uninitialized session at the root route.
    pub fn new(narration: N, storage: S, canvas: C, sound: A, history: H) -> Self {
        Self {
            narration,
            storage,
            canvas,
            sound,
            history,
            path: GamePath::root(),
            initialized: false,
        }
    }

    /// Set up the renderer and mark the session live.
    ///
    /// Must complete before any other entry point; a second call is an
    /// error rather than a re-initialization.
    pub async fn initialize(&mut self, options: &CanvasOptions) -> Result<C::Handle, SessionError> {
        if self.initialized {
            return Err(SessionError::AlreadyInitialized);
        }
        let handle = self
            .canvas
            .initialize(options)
            .await
            .map_err(SessionError::init_failure)?;
        self.initialized = true;
        tracing::debug!(width = options.width, height = options.height, "session initialized");
        Ok(handle)
    }

    /// Capture the full session state as one atomic snapshot.
    ///
    /// Pure read: the five subsystem exports and the current route are taken
    /// without any intervening mutation.
    pub fn export_game_state(&self) -> Result<GameStateSnapshot, SessionError> {
        self.ensure_initialized()?;
        let steps_running = self.narration.steps_running();
        if steps_running > 0 {
            tracing::warn!(steps_running, "exporting while a step is in flight");
        }
        Ok(GameStateSnapshot {
            engine_version: ENGINE_VERSION.to_string(),
            step_data: self.narration.export(),
            storage_data: self.storage.export(),
            canvas_data: self.canvas.export(),
            sound_data: self.sound.export(),
            history_data: self.history.export(),
            path: self.path.clone(),
        })
    }

    /// Re-hydrate the whole session from a snapshot, then navigate.
    ///
    /// Validation happens before any subsystem is touched; after it passes,
    /// subsystems are restored in dependency order — narration (reconciled
    /// against the last history step), storage, canvas (awaited), sound —
    /// and navigation fires last, so UI mounted by the route change observes
    /// fully-restored state. A subsystem failure surfaces as
    /// [`SessionError::SubsystemRestore`] and leaves the session partially
    /// restored; there is no rollback.
    pub async fn restore_game_state(
        &mut self,
        snapshot: &GameStateSnapshot,
        mut navigate: impl FnMut(&GamePath),
    ) -> Result<(), SessionError> {
        self.ensure_initialized()?;
        snapshot.validate()?;

        self.narration
            .restore(snapshot.step_data.clone(), self.history.last_step())
            .await
            .map_err(|e| SessionError::restore_failure(SubsystemKind::Narration, e))?;
        self.storage
            .restore(snapshot.storage_data.clone())
            .map_err(|e| SessionError::restore_failure(SubsystemKind::Storage, e))?;
        self.canvas
            .restore(snapshot.canvas_data.clone())
            .await
            .map_err(|e| SessionError::restore_failure(SubsystemKind::Canvas, e))?;
        self.sound
            .restore(snapshot.sound_data.clone())
            .map_err(|e| SessionError::restore_failure(SubsystemKind::Sound, e))?;

        self.path = snapshot.path.clone();
        navigate(&self.path);
        Ok(())
    }

    /// Reset every subsystem to its empty default state. Idempotent.
    pub fn clear(&mut self) -> Result<(), SessionError> {
        self.ensure_initialized()?;
        self.storage.clear();
        self.canvas.clear();
        self.sound.clear();
        self.narration.clear();
        self.history.clear();
        self.path = GamePath::root();
        Ok(())
    }

    /// Point-in-time capture of the current step, for step-level undo.
    pub fn current_step_state(&self) -> Result<GameStepState, SessionError> {
        self.ensure_initialized()?;
        Ok(GameStepState {
            path: self.path.clone(),
            storage: self.storage.export(),
            canvas: self.canvas.export(),
            sound: self.sound.export(),
            label_index: self.narration.current_label_step_index(),
            opened_labels: self.narration.opened_labels(),
        })
    }

    /// Roll a single step back: same ordering discipline as a full restore,
    /// scoped to the step's fields.
    pub async fn restore_step_state(
        &mut self,
        state: GameStepState,
        mut navigate: impl FnMut(&GamePath),
    ) -> Result<(), SessionError> {
        self.ensure_initialized()?;
        self.history.set_reference_step(state.clone());
        self.narration.set_opened_labels(state.opened_labels);
        self.storage
            .restore(state.storage)
            .map_err(|e| SessionError::restore_failure(SubsystemKind::Storage, e))?;
        self.canvas
            .restore(state.canvas)
            .await
            .map_err(|e| SessionError::restore_failure(SubsystemKind::Canvas, e))?;
        self.sound
            .restore(state.sound)
            .map_err(|e| SessionError::restore_failure(SubsystemKind::Sound, e))?;
        self.path = state.path;
        navigate(&self.path);
        Ok(())
    }

    /// Step-boundary hook: force-complete every ticker scheduled to finish
    /// at step end, then leave the pending registry empty.
    ///
    /// Drain-and-clear: each pending entry (id-addressed and
    /// alias-addressed) receives exactly one force-completion.
    pub fn on_go_next_end(&mut self) -> Result<(), SessionError> {
        self.ensure_initialized()?;
        let pending = self.canvas.take_step_end_tickers();
        for id in pending.ids {
            self.canvas.force_completion_of_ticker(id, None);
        }
        for binding in pending.step_aliases {
            self.canvas
                .force_completion_of_ticker(binding.id, Some(&binding.alias));
        }
        Ok(())
    }

    /// Label-scope hook: prune temporary variables bound to label nesting
    /// deeper than `opened_labels_count`.
    pub fn on_label_closing(&mut self, opened_labels_count: usize) -> Result<(), SessionError> {
        self.ensure_initialized()?;
        self.storage.clear_old_temp_variables(opened_labels_count);
        Ok(())
    }

    /// Current UI route.
    pub fn path(&self) -> &GamePath {
        &self.path
    }

    /// Record a route change performed by the host's navigation.
    pub fn set_path(&mut self, path: GamePath) {
        self.path = path;
    }

    pub fn narration(&self) -> &N {
        &self.narration
    }

    pub fn narration_mut(&mut self) -> &mut N {
        &mut self.narration
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut C {
        &mut self.canvas
    }

    pub fn sound(&self) -> &A {
        &self.sound
    }

    pub fn sound_mut(&mut self) -> &mut A {
        &mut self.sound
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut H {
        &mut self.history
    }

    fn ensure_initialized(&self) -> Result<(), SessionError> {
        if self.initialized {
            Ok(())
        } else {
            Err(SessionError::NotInitialized)
        }
    }
}
