use crate::error::EngineError;
use novella_session::SoundSubsystem;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;

/// Playback state of one sound channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelState {
    pub track: String,
    pub volume: f32,
    pub playing: bool,
}

/// Sound channels and their playback state.
#[derive(Debug, Default)]
pub struct SoundManager {
    channels: BTreeMap<String, ChannelState>,
}

impl SoundManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn play(&mut self, channel: impl Into<String>, track: impl Into<String>) {
        self.channels.insert(channel.into(), ChannelState {
            track: track.into(),
            volume: 1.0,
            playing: true,
        });
    }

    pub fn stop(&mut self, channel: &str) {
        if let Some(state) = self.channels.get_mut(channel) {
            state.playing = false;
        }
    }

    pub fn channel(&self, name: &str) -> Option<&ChannelState> {
        self.channels.get(name)
    }
}

impl SoundSubsystem for SoundManager {
    type Error = EngineError;

    fn export(&self) -> Value {
        json!({ "channels": self.channels })
    }

    fn restore(&mut self, state: Value) -> Result<(), Self::Error> {
        #[derive(Deserialize)]
        struct SoundState {
            channels: BTreeMap<String, ChannelState>,
        }
        let parsed: SoundState = serde_json::from_value(state).map_err(|source| {
            EngineError::MalformedState {
                subsystem: "sound",
                source,
            }
        })?;
        self.channels = parsed.channels;
        Ok(())
    }

    fn clear(&mut self) {
        self.channels.clear();
    }
}
