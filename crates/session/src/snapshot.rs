use crate::error::SessionError;
use novella_common::GamePath;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A complete, self-consistent capture of session state.
///
/// The five subsystem blobs are produced and consumed exclusively by their
/// subsystems; the coordinator never inspects them. A snapshot is only
/// meaningful as an atomic unit: the blobs carry cross-references (history
/// step indices into narration state, canvas bindings to stored variables)
/// that are consistent only within one capture instant.
///
/// JSON key names are wire-compatible with the save files the original
/// integration layer wrote, so old saves keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStateSnapshot {
    /// Version tag of the engine that produced the snapshot. Carried for
    /// inspection only; no migration logic interprets it.
    pub engine_version: String,
    /// Narration subsystem export.
    #[serde(rename = "stepData", default)]
    pub step_data: Value,
    /// Storage subsystem export (variables and flags).
    #[serde(rename = "storageData", default)]
    pub storage_data: Value,
    /// Canvas subsystem export.
    #[serde(rename = "canvasData", default)]
    pub canvas_data: Value,
    /// Sound subsystem export.
    #[serde(rename = "soundData", default)]
    pub sound_data: Value,
    /// Step-history subsystem export.
    #[serde(rename = "historyData", default)]
    pub history_data: Value,
    /// UI route at capture time, owned by the host's navigation.
    pub path: GamePath,
}

impl GameStateSnapshot {
    /// Parse a serialized snapshot. Fails with [`SessionError::Parse`] on
    /// text that is not a valid snapshot record.
    ///
    /// A record missing one of the blob fields still parses (the field
    /// deserializes to `null`); the absence is reported by [`validate`]
    /// at the restore boundary instead.
    ///
    /// [`validate`]: GameStateSnapshot::validate
    pub fn from_json(text: &str) -> Result<Self, SessionError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serialize the snapshot to a JSON string.
    pub fn to_json(&self) -> Result<String, SessionError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Check that every required field is present.
    ///
    /// Restore is all-or-nothing at this boundary: a failure here means no
    /// subsystem has been touched yet.
    pub fn validate(&self) -> Result<(), SessionError> {
        for (field, value) in [
            ("stepData", &self.step_data),
            ("storageData", &self.storage_data),
            ("canvasData", &self.canvas_data),
            ("soundData", &self.sound_data),
            ("historyData", &self.history_data),
        ] {
            if value.is_null() {
                return Err(SessionError::Validation { field });
            }
        }
        Ok(())
    }
}
