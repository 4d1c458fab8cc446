//! Shared types for the novella session layer.
//!
//! # Invariants
//! - Types here carry no behavior beyond construction and formatting.
//! - Everything is serde-serializable with stable JSON key names, so the
//!   save-file wire format is defined in one place.

pub mod types;

pub use types::{GamePath, OpenedLabel, StepEndTickers, TickerAliasBinding, TickerId};
