use chrono::Utc;
use speedo_data_management::{DataManager, DataManagerError};
use speedo_lib::{session::TripSession, trip_record::TripRecord};
use thiserror::Error;

use crate::source::{PositionError, PositionEvent, PositionSource, PositionWatch, WatchOptions};

#[derive(Debug, Error)]
pub enum TrackerError {
    /// No positional data source can be reached. Starting a session is
    /// impossible until one becomes available; retrying later is fine.
    #[error("positional source unavailable: {0}")]
    UnsupportedCapability(String),
    #[error(transparent)]
    Storage(#[from] DataManagerError),
    #[error("a tracking session is already active")]
    AlreadyActive,
    #[error("no tracking session is active")]
    NotActive,
}

enum TrackerState {
    Idle,
    Active {
        session: TripSession,
        watch: PositionWatch,
    },
}

/// Start/stop lifecycle around a [`TripSession`]: subscribes on start,
/// feeds samples to the session while active, and persists the finished
/// trip through the ledger on stop.
pub struct TripTracker {
    data_manager: DataManager,
    mileage_kmpl: f64,
    state: TrackerState,
    last_error: Option<PositionError>,
}

impl TripTracker {
    pub fn new(data_manager: DataManager, mileage_kmpl: f64) -> Self {
        Self {
            data_manager,
            mileage_kmpl,
            state: TrackerState::Idle,
            last_error: None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, TrackerState::Active { .. })
    }

    /// Starts a session: resets the accumulator and subscribes to the
    /// position source.
    pub async fn start(&mut self, source: &dyn PositionSource) -> Result<(), TrackerError> {
        if self.is_active() {
            return Err(TrackerError::AlreadyActive);
        }

        let watch = source.subscribe(WatchOptions::default()).await?;
        self.state = TrackerState::Active {
            session: TripSession::new(self.mileage_kmpl),
            watch,
        };
        self.last_error = None;

        Ok(())
    }

    /// Next event from the live subscription. `None` once the stream has
    /// ended, or immediately when no session is active.
    pub async fn next_event(&mut self) -> Option<PositionEvent> {
        match &mut self.state {
            TrackerState::Active { watch, .. } => watch.next_event().await,
            TrackerState::Idle => None,
        }
    }

    /// Applies one event. Ignored while idle: a callback already queued
    /// when the session stopped must not resurrect it.
    pub fn handle_event(&mut self, event: PositionEvent) {
        let TrackerState::Active { session, .. } = &mut self.state else {
            return;
        };

        match event {
            PositionEvent::Update(sample) => {
                session.apply(sample);
                self.last_error = None;
            }
            PositionEvent::Error(error) => {
                tracing::warn!("{error}");
                self.last_error = Some(error);
            }
        }
    }

    /// Tears down the subscription and, when the session covered a
    /// recordable distance, persists the finished trip. The write is
    /// awaited; a sub-threshold session persists nothing.
    pub async fn stop(&mut self) -> Result<Option<TripRecord>, TrackerError> {
        let TrackerState::Active { session, watch } = std::mem::replace(&mut self.state, TrackerState::Idle) else {
            return Err(TrackerError::NotActive);
        };

        // Unsubscribe before the write; late callbacks are ignored.
        drop(watch);

        if !session.exceeds_record_threshold() {
            return Ok(None);
        }

        let record = self
            .data_manager
            .add_trip_record(session.distance_km(), session.mileage_kmpl(), Utc::now())
            .await?;

        Ok(Some(record))
    }

    pub fn speed_kmh(&self) -> f64 {
        match &self.state {
            TrackerState::Active { session, .. } => session.speed_kmh(),
            TrackerState::Idle => 0.0,
        }
    }

    pub fn distance_km(&self) -> f64 {
        match &self.state {
            TrackerState::Active { session, .. } => session.distance_km(),
            TrackerState::Idle => 0.0,
        }
    }

    pub fn fuel_consumed_l(&self) -> f64 {
        self.distance_km() / self.mileage_kmpl
    }

    pub fn last_error(&self) -> Option<&PositionError> {
        self.last_error.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::POSITION_UNAVAILABLE;
    use chrono::DateTime;
    use speedo_lib::position::PositionSample;
    use tokio::sync::mpsc;

    struct ScriptedSource {
        events: Vec<PositionEvent>,
    }

    #[async_trait::async_trait]
    impl PositionSource for ScriptedSource {
        async fn subscribe(&self, _options: WatchOptions) -> Result<PositionWatch, TrackerError> {
            let (tx, rx) = mpsc::channel(16);
            let events = self.events.clone();
            let reader = tokio::spawn(async move {
                for event in events {
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
            });
            Ok(PositionWatch::new(rx, reader))
        }
    }

    fn update(latitude: f64, longitude: f64, millis: i64) -> PositionEvent {
        PositionEvent::Update(PositionSample::new(
            latitude,
            longitude,
            None,
            DateTime::from_timestamp_millis(millis).unwrap(),
        ))
    }

    async fn temp_manager(tag: &str) -> DataManager {
        let path = std::env::temp_dir().join(format!("speedo_tracker_{}_{}.db", tag, std::process::id()));
        let _ = std::fs::remove_file(&path);
        DataManager::start_at(&path).await.unwrap()
    }

    async fn drain(tracker: &mut TripTracker) {
        while let Some(event) = tracker.next_event().await {
            tracker.handle_event(event);
        }
    }

    #[tokio::test]
    async fn finished_trip_is_persisted_once() {
        let data_manager = temp_manager("persists").await;
        let mut tracker = TripTracker::new(data_manager.clone(), 40.0);
        let source = ScriptedSource {
            events: vec![
                update(12.9716, 77.5946, 0),
                update(12.9816, 77.5946, 60_000),
            ],
        };

        tracker.start(&source).await.unwrap();
        drain(&mut tracker).await;

        assert!((66.0..67.5).contains(&tracker.speed_kmh()));

        let record = tracker.stop().await.unwrap().expect("trip long enough to record");
        assert!((1.10..1.13).contains(&record.distance_km));
        assert_eq!(record.fuel_consumed_l, record.distance_km / 40.0);
        assert_eq!(record.mileage_kmpl, 40.0);

        let records = data_manager.get_trip_records().await.unwrap();
        assert_eq!(records.len(), 1);
        assert!(!tracker.is_active());
        assert_eq!(tracker.speed_kmh(), 0.0);
    }

    #[tokio::test]
    async fn sub_threshold_trip_is_discarded() {
        let data_manager = temp_manager("discards").await;
        let mut tracker = TripTracker::new(data_manager.clone(), 40.0);
        let source = ScriptedSource {
            events: vec![
                update(12.9716, 77.5946, 0),
                update(12.9716, 77.5946, 60_000),
            ],
        };

        tracker.start(&source).await.unwrap();
        drain(&mut tracker).await;

        assert!(tracker.stop().await.unwrap().is_none());
        assert!(data_manager.get_trip_records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn position_errors_do_not_end_the_session() {
        let data_manager = temp_manager("errors").await;
        let mut tracker = TripTracker::new(data_manager, 40.0);
        let source = ScriptedSource {
            events: vec![
                update(12.9716, 77.5946, 0),
                PositionEvent::Error(PositionError {
                    code: POSITION_UNAVAILABLE,
                    message: "no position fix".to_string(),
                }),
                update(12.9816, 77.5946, 60_000),
            ],
        };

        tracker.start(&source).await.unwrap();

        let first = tracker.next_event().await.unwrap();
        tracker.handle_event(first);
        let error = tracker.next_event().await.unwrap();
        tracker.handle_event(error);

        assert!(tracker.is_active());
        assert_eq!(tracker.last_error().unwrap().code, POSITION_UNAVAILABLE);

        let second = tracker.next_event().await.unwrap();
        tracker.handle_event(second);

        assert!(tracker.last_error().is_none());
        assert!(tracker.distance_km() > 1.0);
    }

    #[tokio::test]
    async fn start_requires_idle_and_stop_requires_active() {
        let data_manager = temp_manager("lifecycle").await;
        let mut tracker = TripTracker::new(data_manager, 40.0);
        let source = ScriptedSource { events: vec![] };

        assert!(matches!(tracker.stop().await, Err(TrackerError::NotActive)));

        tracker.start(&source).await.unwrap();
        assert!(matches!(tracker.start(&source).await, Err(TrackerError::AlreadyActive)));

        tracker.stop().await.unwrap();
        assert!(!tracker.is_active());
    }

    #[tokio::test]
    async fn events_are_ignored_while_idle() {
        let data_manager = temp_manager("idle").await;
        let mut tracker = TripTracker::new(data_manager, 40.0);

        tracker.handle_event(update(12.9716, 77.5946, 0));
        assert_eq!(tracker.distance_km(), 0.0);
        assert!(tracker.next_event().await.is_none());
    }
}
