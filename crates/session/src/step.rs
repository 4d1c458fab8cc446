use novella_common::{GamePath, OpenedLabel};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Point-in-time capture of one narration step.
///
/// Narrower than a full [`GameStateSnapshot`]: it records only what the
/// engine needs to roll a single step back (step-level undo), not the
/// narration or history exports. The engine checkpoints one of these at
/// every step boundary.
///
/// [`GameStateSnapshot`]: crate::GameStateSnapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStepState {
    /// UI route at the step boundary.
    pub path: GamePath,
    /// Storage subsystem export.
    pub storage: Value,
    /// Canvas subsystem export.
    pub canvas: Value,
    /// Sound subsystem export.
    pub sound: Value,
    /// Index of the current step inside the innermost open label.
    #[serde(rename = "labelIndex")]
    pub label_index: usize,
    /// The labels open at capture time, innermost last.
    #[serde(rename = "openedLabels")]
    pub opened_labels: Vec<OpenedLabel>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn step_state_round_trips_through_json() {
        let state = GameStepState {
            path: GamePath::new("/game"),
            storage: json!({"variables": {}}),
            canvas: json!({}),
            sound: json!({}),
            label_index: 2,
            opened_labels: vec![OpenedLabel {
                label: "intro".into(),
                step_index: 2,
            }],
        };
        let text = serde_json::to_string(&state).unwrap();
        let back: GameStepState = serde_json::from_str(&text).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn step_state_json_keys_match_wire_format() {
        let state = GameStepState {
            path: GamePath::root(),
            storage: json!({}),
            canvas: json!({}),
            sound: json!({}),
            label_index: 0,
            opened_labels: vec![],
        };
        let value = serde_json::to_value(&state).unwrap();
        assert!(value.get("labelIndex").is_some());
        assert!(value.get("openedLabels").is_some());
    }
}
