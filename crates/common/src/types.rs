use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an animation ticker scheduled on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TickerId(pub Uuid);

impl TickerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TickerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TickerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The current UI route of the host application.
///
/// Owned by the host's navigation, not by the engine; the session only
/// records it so a snapshot can bring the UI back to the same screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GamePath(String);

impl GamePath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// The initial route a fresh session starts at.
    pub fn root() -> Self {
        Self("/".into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for GamePath {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for GamePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GamePath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

/// A narrative label currently open on the narration stack, together with
/// the index of the next step to run inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenedLabel {
    pub label: String,
    #[serde(rename = "stepIndex")]
    pub step_index: usize,
}

impl OpenedLabel {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            step_index: 0,
        }
    }
}

/// A ticker addressed through a named canvas alias bound to the current step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerAliasBinding {
    pub alias: String,
    pub id: TickerId,
}

/// The pending-completion registry drained at every step boundary.
///
/// Tickers land here when they are scheduled to finish at step end, either
/// by raw id or through a step-bound alias. Draining force-completes every
/// entry exactly once and leaves both lists empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepEndTickers {
    pub ids: Vec<TickerId>,
    #[serde(rename = "stepAliases")]
    pub step_aliases: Vec<TickerAliasBinding>,
}

impl StepEndTickers {
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty() && self.step_aliases.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len() + self.step_aliases.len()
    }
}
