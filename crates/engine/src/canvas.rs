use crate::error::EngineError;
use async_trait::async_trait;
use novella_common::{StepEndTickers, TickerAliasBinding, TickerId};
use novella_session::{CanvasOptions, CanvasSubsystem};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;

/// Handle to the initialized rendering surface, returned to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RendererHandle {
    pub width: u32,
    pub height: u32,
}

/// A scheduled animation task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub alias: Option<String>,
    #[serde(rename = "durationFrames")]
    pub duration_frames: u32,
    pub elapsed: u32,
    pub done: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct CanvasState {
    tickers: BTreeMap<TickerId, Ticker>,
    aliases: BTreeMap<String, TickerId>,
}

/// Visual state and animation tickers.
///
/// Stands in for a real rendering backend: it tracks the ticker table, the
/// alias bindings, and the registry of tickers scheduled to finish at the
/// next step boundary. Restore is async because a real backend reloads
/// assets there.
#[derive(Debug, Default)]
pub struct CanvasManager {
    state: CanvasState,
    pending_step_end: StepEndTickers,
    surface: Option<RendererHandle>,
}

impl CanvasManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a new ticker, optionally bound to a canvas alias and
    /// optionally registered for force-completion at step end.
    pub fn schedule_ticker(
        &mut self,
        alias: Option<String>,
        duration_frames: u32,
        complete_on_step_end: bool,
    ) -> TickerId {
        let id = TickerId::new();
        if let Some(alias) = &alias {
            self.state.aliases.insert(alias.clone(), id);
        }
        self.state.tickers.insert(
            id,
            Ticker {
                alias: alias.clone(),
                duration_frames,
                elapsed: 0,
                done: false,
            },
        );
        if complete_on_step_end {
            match alias {
                Some(alias) => self
                    .pending_step_end
                    .step_aliases
                    .push(TickerAliasBinding { alias, id }),
                None => self.pending_step_end.ids.push(id),
            }
        }
        id
    }

    pub fn ticker(&self, id: TickerId) -> Option<&Ticker> {
        self.state.tickers.get(&id)
    }

    pub fn running_ticker_count(&self) -> usize {
        self.state.tickers.values().filter(|t| !t.done).count()
    }

    /// Read-only view of the pending step-end registry.
    pub fn pending_step_end(&self) -> &StepEndTickers {
        &self.pending_step_end
    }

    pub fn surface(&self) -> Option<RendererHandle> {
        self.surface
    }
}

#[async_trait(?Send)]
impl CanvasSubsystem for CanvasManager {
    type Error = EngineError;
    type Handle = RendererHandle;

    async fn initialize(&mut self, options: &CanvasOptions) -> Result<RendererHandle, Self::Error> {
        let handle = RendererHandle {
            width: options.width,
            height: options.height,
        };
        self.surface = Some(handle);
        tracing::debug!(
            width = options.width,
            height = options.height,
            "canvas surface ready"
        );
        Ok(handle)
    }

    fn export(&self) -> Value {
        json!({
            "tickers": self.state.tickers,
            "aliases": self.state.aliases,
        })
    }

    async fn restore(&mut self, state: Value) -> Result<(), Self::Error> {
        self.state = serde_json::from_value(state).map_err(|source| {
            EngineError::MalformedState {
                subsystem: "canvas",
                source,
            }
        })?;
        // A restore interrupts whatever the previous session had queued for
        // the next step boundary.
        self.pending_step_end = StepEndTickers::default();
        Ok(())
    }

    fn force_completion_of_ticker(&mut self, id: TickerId, alias: Option<&str>) {
        if let Some(ticker) = self.state.tickers.get_mut(&id) {
            ticker.elapsed = ticker.duration_frames;
            ticker.done = true;
        }
        if let Some(alias) = alias {
            if self.state.aliases.get(alias) == Some(&id) {
                self.state.aliases.remove(alias);
            }
        }
    }

    fn take_step_end_tickers(&mut self) -> StepEndTickers {
        std::mem::take(&mut self.pending_step_end)
    }

    fn clear(&mut self) {
        self.state = CanvasState::default();
        self.pending_step_end = StepEndTickers::default();
    }
}
