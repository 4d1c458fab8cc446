/// Errors from the in-memory engine subsystems.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A restore blob did not deserialize into the subsystem's state shape.
    #[error("malformed {subsystem} state: {source}")]
    MalformedState {
        subsystem: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A step referenced a label id that was never registered.
    #[error("label `{0}` is not registered")]
    UnknownLabel(String),

    /// The narration was advanced with no label open.
    #[error("no label is open; open a label before advancing")]
    NoOpenLabel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_label_names_the_label() {
        let err = EngineError::UnknownLabel("missing".into());
        assert!(err.to_string().contains("`missing`"));
    }
}
