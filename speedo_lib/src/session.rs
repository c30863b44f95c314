use crate::position::{haversine_distance_m, PositionSample};

pub const MS_TO_KMH: f64 = 3.6;
/// Upper bound of the gauge. Derived speeds are clamped into [0, MAX].
pub const MAX_SPEED_KMH: f64 = 200.0;
/// Sessions at or below this distance are discarded on stop.
pub const MIN_TRIP_DISTANCE_KM: f64 = 0.01;

/// Running state of one active tracking session: last received sample,
/// cumulative distance and the current gauge speed. Pure arithmetic,
/// the subscription lifecycle lives with the tracker.
pub struct TripSession {
    mileage_kmpl: f64,
    last_position: Option<PositionSample>,
    distance_km: f64,
    speed_kmh: f64,
}

impl TripSession {
    pub fn new(mileage_kmpl: f64) -> Self {
        Self {
            mileage_kmpl,
            last_position: None,
            distance_km: 0.0,
            speed_kmh: 0.0,
        }
    }

    /// Folds one position sample into the session.
    pub fn apply(&mut self, sample: PositionSample) {
        if let Some(speed) = self.derive_speed_kmh(&sample) {
            self.speed_kmh = speed.clamp(0.0, MAX_SPEED_KMH);
        }

        if let Some(last) = &self.last_position {
            let increment_m = haversine_distance_m(last.position, sample.position);
            self.distance_km += increment_m / 1000.0;
        }

        self.last_position = Some(sample);
    }

    /// `None` means the gauge keeps its previous value (zero or negative
    /// elapsed time between samples).
    fn derive_speed_kmh(&self, sample: &PositionSample) -> Option<f64> {
        if let Some(speed) = sample.speed.filter(|speed| *speed > 0.0) {
            return Some(speed * MS_TO_KMH);
        }

        let Some(last) = &self.last_position else {
            return Some(0.0);
        };

        let elapsed_s = (sample.timestamp - last.timestamp).num_milliseconds() as f64 / 1000.0;
        if elapsed_s <= 0.0 {
            return None;
        }

        let distance_m = haversine_distance_m(last.position, sample.position);
        Some(distance_m / elapsed_s * MS_TO_KMH)
    }

    pub fn speed_kmh(&self) -> f64 {
        self.speed_kmh
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_km
    }

    pub fn mileage_kmpl(&self) -> f64 {
        self.mileage_kmpl
    }

    pub fn fuel_consumed_l(&self) -> f64 {
        self.distance_km / self.mileage_kmpl
    }

    /// Whether the session covered enough ground to be worth a trip record.
    pub fn exceeds_record_threshold(&self) -> bool {
        self.distance_km > MIN_TRIP_DISTANCE_KM
    }
}
