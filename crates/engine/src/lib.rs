//! In-memory reference engine for the novella session layer.
//!
//! Implements the five subsystem seams the session coordinator restores
//! through: narration (label registry and step position), storage
//! (variables, flags, label-scoped temps), canvas (tickers), sound and
//! step history. The driver advances the narration one step at a time and
//! closes every step with the boundary hooks.
//!
//! # Invariants
//! - Subsystem exports use ordered collections, so equal state exports to
//!   equal JSON.
//! - A step's commands execute inside their label scope; label close and
//!   the ticker drain happen only at the step boundary.

pub mod canvas;
pub mod driver;
pub mod error;
pub mod history;
pub mod narration;
pub mod sound;
pub mod storage;

pub use canvas::{CanvasManager, RendererHandle, Ticker};
pub use driver::{DriverError, NovellaSession, StepOutcome, go_back, go_next, new_session};
pub use error::EngineError;
pub use history::HistoryManager;
pub use narration::{Label, NarrationManager, StepCommand};
pub use sound::SoundManager;
pub use storage::StorageManager;
