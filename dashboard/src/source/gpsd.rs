use std::net::SocketAddr;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use speedo_lib::position::PositionSample;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::TcpStream,
    sync::mpsc,
};

use super::{PositionError, PositionEvent, PositionSource, PositionWatch, WatchOptions, POSITION_UNAVAILABLE};
use crate::tracker::TrackerError;

/// gpsd watch command; the daemon answers with one JSON document per line.
const WATCH_COMMAND: &[u8] = b"?WATCH={\"enable\":true,\"json\":true};\n";

/// Live positions from a gpsd endpoint (default port 2947).
pub struct GpsdSource {
    address: SocketAddr,
}

impl GpsdSource {
    pub fn new(address: SocketAddr) -> Self {
        Self { address }
    }
}

#[derive(Deserialize)]
struct GpsdReport {
    class: String,
    /// Fix mode: 0/1 no fix, 2 = 2D, 3 = 3D.
    #[serde(default)]
    mode: i32,
    lat: Option<f64>,
    lon: Option<f64>,
    /// Speed over ground, m/s.
    speed: Option<f64>,
    /// Fix time, RFC 3339.
    time: Option<DateTime<Utc>>,
}

#[async_trait::async_trait]
impl PositionSource for GpsdSource {
    async fn subscribe(&self, options: WatchOptions) -> Result<PositionWatch, TrackerError> {
        tracing::debug!(
            "watching gpsd at {} (high_accuracy={}, maximum_age_ms={})",
            self.address, options.high_accuracy, options.maximum_age_ms
        );

        let mut stream = TcpStream::connect(self.address).await
            .map_err(|err| TrackerError::UnsupportedCapability(format!("gpsd not reachable at {}: {}", self.address, err)))?;

        stream.write_all(WATCH_COMMAND).await
            .map_err(|err| TrackerError::UnsupportedCapability(format!("gpsd rejected watch request: {}", err)))?;

        let (tx, rx) = mpsc::channel(16);
        let reader = tokio::spawn(async move {
            let mut lines = BufReader::new(stream).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let Some(event) = parse_report(&line) else { continue };
                        if tx.send(event).await.is_err() {
                            break; // watch dropped
                        }
                    }
                    Ok(None) => break,
                    Err(err) => {
                        let error = PositionError {
                            code: POSITION_UNAVAILABLE,
                            message: format!("gpsd read failed: {err}"),
                        };
                        let _ = tx.send(PositionEvent::Error(error)).await;
                        break;
                    }
                }
            }
        });

        Ok(PositionWatch::new(rx, reader))
    }
}

/// TPV documents with a 2D-or-better fix become updates, fixless TPVs
/// become position errors. Everything else gpsd sends is ignored.
fn parse_report(line: &str) -> Option<PositionEvent> {
    let report: GpsdReport = serde_json::from_str(line).ok()?;
    if report.class != "TPV" {
        return None;
    }

    match (report.lat, report.lon, report.time) {
        (Some(lat), Some(lon), Some(time)) if report.mode >= 2 => {
            Some(PositionEvent::Update(PositionSample::new(lat, lon, report.speed, time)))
        }
        _ => Some(PositionEvent::Error(PositionError {
            code: POSITION_UNAVAILABLE,
            message: "no position fix".to_string(),
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tpv_with_fix_becomes_update() {
        let line = r#"{"class":"TPV","device":"/dev/ttyS0","mode":3,"time":"2026-08-29T10:00:00.000Z","lat":12.9716,"lon":77.5946,"speed":5.2}"#;
        let Some(PositionEvent::Update(sample)) = parse_report(line) else {
            panic!("expected an update");
        };
        assert_eq!(sample.latitude(), 12.9716);
        assert_eq!(sample.longitude(), 77.5946);
        assert_eq!(sample.speed, Some(5.2));
    }

    #[test]
    fn tpv_without_fix_becomes_position_error() {
        let line = r#"{"class":"TPV","device":"/dev/ttyS0","mode":1}"#;
        let Some(PositionEvent::Error(error)) = parse_report(line) else {
            panic!("expected an error");
        };
        assert_eq!(error.code, POSITION_UNAVAILABLE);
    }

    #[test]
    fn non_tpv_documents_are_ignored() {
        let line = r#"{"class":"SKY","device":"/dev/ttyS0","satellites":[]}"#;
        assert!(parse_report(line).is_none());
    }

    #[test]
    fn garbage_lines_are_ignored() {
        assert!(parse_report("not json").is_none());
    }
}
