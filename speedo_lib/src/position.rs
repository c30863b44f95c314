use chrono::{DateTime, Utc};
use geo_types::Point;
use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A single reading from a positional source. Never persisted, only the
/// values derived from it survive a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionSample {
    pub position: Point<f64>,
    /// Speed over ground in m/s, when the source reports one directly.
    pub speed: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl PositionSample {
    pub fn new(latitude: f64, longitude: f64, speed: Option<f64>, timestamp: DateTime<Utc>) -> Self {
        Self {
            position: Point::new(longitude, latitude),
            speed,
            timestamp,
        }
    }

    pub fn latitude(&self) -> f64 {
        self.position.y()
    }

    pub fn longitude(&self) -> f64 {
        self.position.x()
    }
}

/// Great-circle distance between two points, in meters.
pub fn haversine_distance_m(p1: Point<f64>, p2: Point<f64>) -> f64 {
    let d_lat = (p2.y() - p1.y()).to_radians();
    let d_lon = (p2.x() - p1.x()).to_radians();
    let lat1 = p1.y().to_radians();
    let lat2 = p2.y().to_radians();

    let a = f64::sin(d_lat / 2.).powi(2)
        + f64::cos(lat1) * f64::cos(lat2) * f64::sin(d_lon / 2.).powi(2);
    let c = 2. * f64::atan2(a.sqrt(), (1. - a).sqrt());

    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_is_symmetric() {
        let a = Point::new(77.5946, 12.9716);
        let b = Point::new(77.6033, 12.9352);
        assert_eq!(haversine_distance_m(a, b), haversine_distance_m(b, a));
    }

    #[test]
    fn haversine_of_identical_points_is_zero() {
        let p = Point::new(77.5946, 12.9716);
        assert_eq!(haversine_distance_m(p, p), 0.0);
    }

    #[test]
    fn haversine_matches_known_distance() {
        // 0.01 degrees of latitude is roughly 1.112 km.
        let a = Point::new(77.5946, 12.9716);
        let b = Point::new(77.5946, 12.9816);
        let d = haversine_distance_m(a, b);
        assert!((1105.0..1120.0).contains(&d), "got {d}");
    }
}
