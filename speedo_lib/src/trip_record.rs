use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One finished tracking session. Immutable once stored.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TripRecord {
    pub trip_id: i64,
    /// Completion time of the trip.
    pub timestamp: DateTime<Utc>,
    pub distance_km: f64,
    pub fuel_consumed_l: f64,
    /// Mileage in effect when the trip was recorded.
    pub mileage_kmpl: f64,
}

impl TripRecord {
    pub fn new(trip_id: i64, timestamp: DateTime<Utc>, distance_km: f64, mileage_kmpl: f64) -> Self {
        Self {
            trip_id,
            timestamp,
            distance_km,
            fuel_consumed_l: distance_km / mileage_kmpl,
            mileage_kmpl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fuel_consumed_is_distance_over_mileage() {
        let record = TripRecord::new(1, Utc::now(), 120.0, 40.0);
        assert_eq!(record.fuel_consumed_l, 3.0);
    }
}
