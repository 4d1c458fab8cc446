//! Session coordination: atomic snapshot export/restore and step-boundary
//! wiring between the externally-owned engine subsystems.
//!
//! # Invariants
//! - A snapshot is an atomic unit; no field is restored in isolation.
//! - Restore order is fixed: narration, storage, canvas (awaited), sound,
//!   then navigation.
//! - Validation failures occur before any subsystem mutation; subsystem
//!   failures after that point are surfaced without rollback.
//! - No entry point is reentrant; the host's single-threaded event loop is
//!   the only synchronization.

pub mod error;
pub mod provider;
pub mod session;
pub mod snapshot;
pub mod step;
pub mod subsystem;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{SessionError, SubsystemKind};
pub use provider::SessionStateProvider;
pub use session::Session;
pub use snapshot::GameStateSnapshot;
pub use step::GameStepState;
pub use subsystem::{
    CanvasOptions, CanvasSubsystem, HistoryAddOptions, HistorySubsystem, NarrationSubsystem,
    SoundSubsystem, StorageSubsystem,
};

/// Version tag stamped into every exported snapshot. Carried in saves for
/// inspection; never interpreted on restore.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
