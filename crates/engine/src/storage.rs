use crate::error::EngineError;
use novella_session::StorageSubsystem;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::{BTreeMap, BTreeSet};

/// A temporary variable together with the label nesting depth it was set at.
///
/// Temp variables live only as long as their label scope: when the label
/// stack shrinks below `label_depth`, the variable is pruned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TempVariable {
    pub value: Value,
    #[serde(rename = "labelDepth")]
    pub label_depth: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct StorageState {
    variables: BTreeMap<String, Value>,
    flags: BTreeSet<String>,
    #[serde(rename = "tempVariables", default)]
    temp_variables: BTreeMap<String, TempVariable>,
}

/// Key/value game storage: persistent variables, boolean flags, and
/// label-scoped temporary variables.
///
/// Uses `BTreeMap`/`BTreeSet` so exports are deterministic across runs.
#[derive(Debug, Default)]
pub struct StorageManager {
    state: StorageState,
}

impl StorageManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a temporary variable scoped to the current label nesting depth.
    /// A temp variable shadows a persistent variable of the same name.
    pub fn set_temp_variable(
        &mut self,
        key: impl Into<String>,
        value: Value,
        opened_labels_count: usize,
    ) {
        self.state.temp_variables.insert(
            key.into(),
            TempVariable {
                value,
                label_depth: opened_labels_count,
            },
        );
    }

    pub fn variable_count(&self) -> usize {
        self.state.variables.len()
    }

    pub fn temp_variable_count(&self) -> usize {
        self.state.temp_variables.len()
    }
}

impl StorageSubsystem for StorageManager {
    type Error = EngineError;

    fn export(&self) -> Value {
        json!({
            "variables": self.state.variables,
            "flags": self.state.flags,
            "tempVariables": self.state.temp_variables,
        })
    }

    fn restore(&mut self, state: Value) -> Result<(), Self::Error> {
        self.state = serde_json::from_value(state).map_err(|source| {
            EngineError::MalformedState {
                subsystem: "storage",
                source,
            }
        })?;
        Ok(())
    }

    fn variable(&self, key: &str) -> Option<Value> {
        self.state
            .temp_variables
            .get(key)
            .map(|t| t.value.clone())
            .or_else(|| self.state.variables.get(key).cloned())
    }

    fn set_variable(&mut self, key: &str, value: Value) {
        self.state.variables.insert(key.into(), value);
    }

    fn remove_variable(&mut self, key: &str) {
        self.state.variables.remove(key);
        self.state.temp_variables.remove(key);
    }

    fn flag(&self, name: &str) -> bool {
        self.state.flags.contains(name)
    }

    fn set_flag(&mut self, name: &str, value: bool) {
        if value {
            self.state.flags.insert(name.into());
        } else {
            self.state.flags.remove(name);
        }
    }

    fn clear_old_temp_variables(&mut self, opened_labels_count: usize) {
        self.state
            .temp_variables
            .retain(|_, temp| temp.label_depth <= opened_labels_count);
    }

    fn clear(&mut self) {
        self.state = StorageState::default();
    }
}
