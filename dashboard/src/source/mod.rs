use speedo_lib::position::PositionSample;
use thiserror::Error;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::tracker::TrackerError;

pub mod gpsd;
pub mod replay;

/// Per-update failure reported by a positional source. Non-fatal: the
/// session keeps running and the source may recover.
#[derive(Debug, Clone, Error)]
#[error("position unavailable (code {code}): {message}")]
pub struct PositionError {
    pub code: i32,
    pub message: String,
}

pub const POSITION_UNAVAILABLE: i32 = 2;

#[derive(Debug, Clone)]
pub enum PositionEvent {
    Update(PositionSample),
    Error(PositionError),
}

#[derive(Debug, Clone, Copy)]
pub struct WatchOptions {
    /// Maximum allowed age of a cached reading, in milliseconds.
    pub maximum_age_ms: u64,
    pub high_accuracy: bool,
}

impl Default for WatchOptions {
    fn default() -> Self {
        // Always-fresh, high accuracy readings.
        Self {
            maximum_age_ms: 0,
            high_accuracy: true,
        }
    }
}

#[async_trait::async_trait]
pub trait PositionSource {
    async fn subscribe(&self, options: WatchOptions) -> Result<PositionWatch, TrackerError>;
}

/// A live position subscription. Dropping the watch unsubscribes by
/// aborting the delivery task.
pub struct PositionWatch {
    events: mpsc::Receiver<PositionEvent>,
    reader: JoinHandle<()>,
}

impl PositionWatch {
    pub fn new(events: mpsc::Receiver<PositionEvent>, reader: JoinHandle<()>) -> Self {
        Self { events, reader }
    }

    /// `None` once the source has stopped emitting for good.
    pub async fn next_event(&mut self) -> Option<PositionEvent> {
        self.events.recv().await
    }
}

impl Drop for PositionWatch {
    fn drop(&mut self) {
        self.reader.abort();
    }
}
