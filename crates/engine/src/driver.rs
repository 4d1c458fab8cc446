use crate::canvas::CanvasManager;
use crate::error::EngineError;
use crate::history::HistoryManager;
use crate::narration::{NarrationManager, StepCommand};
use crate::sound::SoundManager;
use crate::storage::StorageManager;
use novella_common::GamePath;
use novella_session::{
    GameStepState, HistoryAddOptions, HistorySubsystem, NarrationSubsystem, Session, SessionError,
    SessionStateProvider,
};
use serde_json::json;

/// A session wired to the in-memory reference subsystems.
pub type NovellaSession =
    Session<NarrationManager, StorageManager, CanvasManager, SoundManager, HistoryManager>;

/// Assemble an uninitialized session over fresh in-memory subsystems.
pub fn new_session() -> NovellaSession {
    Session::new(
        NarrationManager::new(),
        StorageManager::new(),
        CanvasManager::new(),
        SoundManager::new(),
        HistoryManager::new(),
    )
}

/// Errors from driving the narration.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("history has no step to roll back")]
    NothingToRollBack,
}

/// What one `go_next` call did.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub commands: Vec<StepCommand>,
    /// How many label scopes closed at this step boundary.
    pub closed_labels: usize,
}

/// Advance the narration by one step.
///
/// Checkpoints the pre-step state into history, executes the step's
/// commands inside their label scope, then closes the step boundary:
/// exhausted labels close (pruning their temp variables) and pending
/// step-end tickers are drained.
pub fn go_next(session: &mut NovellaSession) -> Result<StepOutcome, DriverError> {
    let checkpoint = session.current_step_state()?;
    let entry = serde_json::to_value(&checkpoint).map_err(SessionError::from)?;

    session.narration_mut().begin_step();
    let step = session.narration_mut().next_commands();
    let commands = match step {
        Ok(commands) => commands,
        Err(err) => {
            session.narration_mut().finish_step();
            return Err(err.into());
        }
    };
    // The checkpoint becomes history only once the step is known to run;
    // a failed advance must leave nothing for go_back to restore.
    session.history_mut().add(entry, &HistoryAddOptions::default());
    for command in &commands {
        if let Err(err) = apply(session, command) {
            session.narration_mut().finish_step();
            return Err(err);
        }
    }
    session.narration_mut().finish_step();

    let closed_labels = session.narration_mut().close_finished_labels();
    if closed_labels > 0 {
        let remaining = session.narration().opened_labels().len();
        session.on_label_closing(remaining)?;
    }
    session.on_go_next_end()?;

    Ok(StepOutcome {
        commands,
        closed_labels,
    })
}

/// Roll the narration back one step using the last history checkpoint.
pub async fn go_back(
    session: &mut NovellaSession,
    navigate: impl FnMut(&GamePath),
) -> Result<(), DriverError> {
    let entry = session
        .history_mut()
        .pop_last()
        .ok_or(DriverError::NothingToRollBack)?;
    let state: GameStepState = serde_json::from_value(entry).map_err(SessionError::from)?;
    session.restore_step_state(state, navigate).await?;
    Ok(())
}

fn apply(session: &mut NovellaSession, command: &StepCommand) -> Result<(), DriverError> {
    match command {
        // State effects go through the same capability surface the external
        // engine is handed, so the binding stays on the hot path.
        StepCommand::Say { character, text } => {
            SessionStateProvider::set_variable(
                session,
                "currentDialogue",
                json!({ "character": character, "text": text }),
            );
        }
        StepCommand::Set { key, value } => {
            SessionStateProvider::set_variable(session, key, value.clone());
        }
        StepCommand::SetFlag { name, value } => {
            SessionStateProvider::set_flag(session, name, *value);
        }
        StepCommand::Remove { key } => {
            SessionStateProvider::remove_variable(session, key);
        }
        StepCommand::SetTemp { key, value } => {
            let depth = session.narration().opened_labels().len();
            session
                .storage_mut()
                .set_temp_variable(key.clone(), value.clone(), depth);
        }
        StepCommand::Call { label } => {
            session.narration_mut().open_label(label)?;
        }
        StepCommand::PlaySound { channel, track } => {
            session.sound_mut().play(channel.clone(), track.clone());
        }
        StepCommand::StartTicker {
            alias,
            duration_frames,
            complete_on_step_end,
        } => {
            session.canvas_mut().schedule_ticker(
                alias.clone(),
                *duration_frames,
                *complete_on_step_end,
            );
        }
    }
    Ok(())
}
