//! Session primitives: the import state machine's states, the progress event
//! stream, and the cancellation signal.

use std::fmt;

use serde::Serialize;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportState {
    Idle,
    Loading,
    Loaded,
    Parsing,
    Done,
    Error,
}

impl ImportState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportState::Idle => "idle",
            ImportState::Loading => "loading",
            ImportState::Loaded => "loaded",
            ImportState::Parsing => "parsing",
            ImportState::Done => "done",
            ImportState::Error => "error",
        }
    }

    /// A phase is in flight; only a reset may interrupt it.
    pub fn is_busy(&self) -> bool {
        matches!(self, ImportState::Loading | ImportState::Parsing)
    }
}

impl fmt::Display for ImportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Loading,
    Parsing,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressEvent {
    pub phase: Phase,
    /// In `[0, 1]`, never decreasing within a phase.
    pub fraction: f32,
}

/// Single writer of a session's progress. Subscribers see the latest event
/// only; `None` means no phase has started since the last reset.
pub struct ProgressReporter {
    tx: watch::Sender<Option<ProgressEvent>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<ProgressEvent>> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> Option<ProgressEvent> {
        *self.tx.borrow()
    }

    /// Starts `phase` at 0.
    pub fn begin(&self, phase: Phase) {
        self.tx.send_replace(Some(ProgressEvent {
            phase,
            fraction: 0.0,
        }));
    }

    /// Moves the current phase forward. Backward moves and updates for a phase
    /// that is not current are dropped.
    pub fn advance(&self, phase: Phase, fraction: f32) {
        let fraction = fraction.clamp(0.0, 1.0);
        self.tx.send_if_modified(|current| match current {
            Some(event) if event.phase == phase && fraction > event.fraction => {
                event.fraction = fraction;
                true
            }
            _ => false,
        });
    }

    pub fn clear(&self) {
        self.tx.send_replace(None);
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Epoch-based cancellation. Work captures the epoch when it starts and is
/// cancelled as soon as the epoch moves on.
pub struct CancelSignal {
    tx: watch::Sender<u64>,
}

impl CancelSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx }
    }

    pub fn epoch(&self) -> u64 {
        *self.tx.borrow()
    }

    /// Cancels everything started under the current epoch.
    pub fn cancel(&self) -> u64 {
        self.tx.send_modify(|epoch| *epoch += 1);
        self.epoch()
    }

    pub fn is_current(&self, epoch: u64) -> bool {
        self.epoch() == epoch
    }

    /// Resolves once `epoch` has been cancelled.
    pub async fn cancelled(&self, epoch: u64) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this only errors on teardown.
        let _ = rx.wait_for(|current| *current != epoch).await;
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}
