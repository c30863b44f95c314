use std::{path::PathBuf, time::Duration};

use chrono::DateTime;
use serde::Deserialize;
use speedo_lib::position::PositionSample;
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};

use super::{PositionError, PositionEvent, PositionSource, PositionWatch, WatchOptions, POSITION_UNAVAILABLE};
use crate::tracker::TrackerError;

/// Per-gap wait cap, so old recordings don't replay in real time. Speed
/// and distance still come out of the recorded timestamps.
const MAX_GAP: Duration = Duration::from_secs(1);

/// Plays back a recorded ride from a JSONL file, one sample per line:
/// `{"lat":12.9716,"lon":77.5946,"speed_ms":5.2,"timestamp_ms":0}`.
pub struct ReplaySource {
    path: PathBuf,
}

impl ReplaySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[derive(Deserialize)]
struct ReplaySample {
    lat: f64,
    lon: f64,
    #[serde(default)]
    speed_ms: Option<f64>,
    timestamp_ms: i64,
}

#[async_trait::async_trait]
impl PositionSource for ReplaySource {
    async fn subscribe(&self, _options: WatchOptions) -> Result<PositionWatch, TrackerError> {
        let file = File::open(&self.path).await
            .map_err(|err| TrackerError::UnsupportedCapability(format!("cannot open replay file {:?}: {}", self.path, err)))?;

        let (tx, rx) = mpsc::channel(16);
        let reader = tokio::spawn(async move {
            let mut lines = BufReader::new(file).lines();
            let mut last_timestamp: Option<i64> = None;

            while let Ok(Some(line)) = lines.next_line().await {
                if line.trim().is_empty() {
                    continue;
                }

                let event = match parse_line(&line) {
                    Some(sample) => {
                        let timestamp_ms = sample.timestamp.timestamp_millis();
                        if let Some(last) = last_timestamp {
                            let gap = Duration::from_millis((timestamp_ms - last).max(0) as u64);
                            tokio::time::sleep(gap.min(MAX_GAP)).await;
                        }
                        last_timestamp = Some(timestamp_ms);
                        PositionEvent::Update(sample)
                    }
                    None => PositionEvent::Error(PositionError {
                        code: POSITION_UNAVAILABLE,
                        message: format!("unreadable replay line: {line}"),
                    }),
                };

                if tx.send(event).await.is_err() {
                    break; // watch dropped
                }
            }
        });

        Ok(PositionWatch::new(rx, reader))
    }
}

fn parse_line(line: &str) -> Option<PositionSample> {
    let sample: ReplaySample = serde_json::from_str(line).ok()?;
    let timestamp = DateTime::from_timestamp_millis(sample.timestamp_ms)?;
    Some(PositionSample::new(sample.lat, sample.lon, sample.speed_ms, timestamp))
}
