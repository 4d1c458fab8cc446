use std::fmt;

/// Names the subsystem that rejected an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubsystemKind {
    Narration,
    Storage,
    Canvas,
    Sound,
    History,
}

impl fmt::Display for SubsystemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Narration => "narration",
            Self::Storage => "storage",
            Self::Canvas => "canvas",
            Self::Sound => "sound",
            Self::History => "history",
        };
        f.write_str(name)
    }
}

/// Errors from session coordinator operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A snapshot is missing a required field. Raised at the validation
    /// boundary, before any subsystem has been mutated.
    #[error("snapshot is missing required field `{field}`")]
    Validation { field: &'static str },

    /// The input text is not valid serialized session state.
    #[error("failed to parse serialized game state: {0}")]
    Parse(#[from] serde_json::Error),

    /// An external subsystem rejected its restore call. The session is left
    /// partially restored; there is no compensating rollback.
    #[error("{subsystem} subsystem failed to restore: {source}")]
    SubsystemRestore {
        subsystem: SubsystemKind,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The canvas renderer failed to come up during `initialize`.
    #[error("renderer initialization failed: {source}")]
    Initialize {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An entry point was invoked before `initialize` completed.
    #[error("session is not initialized; call initialize first")]
    NotInitialized,

    /// `initialize` was invoked on an already-initialized session.
    #[error("session is already initialized")]
    AlreadyInitialized,
}

impl SessionError {
    pub(crate) fn restore_failure<E>(subsystem: SubsystemKind, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::SubsystemRestore {
            subsystem,
            source: Box::new(source),
        }
    }

    pub(crate) fn init_failure<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Initialize {
            source: Box::new(source),
        }
    }
}
