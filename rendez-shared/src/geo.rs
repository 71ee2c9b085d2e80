use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Arithmetic midpoint of two coordinates.
    pub fn midpoint(a: GeoPoint, b: GeoPoint) -> GeoPoint {
        GeoPoint {
            lat: (a.lat + b.lat) / 2.0,
            lng: (a.lng + b.lng) / 2.0,
        }
    }
}

/// Haversine formula: great-circle distance (km) between two points on a
/// sphere given their latitude and longitude in decimal degrees.
pub fn haversine_km(p1: GeoPoint, p2: GeoPoint) -> f64 {
    let d_lat = (p2.lat - p1.lat).to_radians();
    let d_lng = (p2.lng - p1.lng).to_radians();

    let a = (d_lat / 2.0).sin() * (d_lat / 2.0).sin()
        + p1.lat.to_radians().cos() * p2.lat.to_radians().cos()
            * (d_lng / 2.0).sin() * (d_lng / 2.0).sin();

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_known_distance() {
        // Paris -> London is roughly 344 km
        let paris = GeoPoint::new(48.8566, 2.3522);
        let london = GeoPoint::new(51.5074, -0.1278);

        let d = haversine_km(paris, london);
        assert!(d > 330.0 && d < 360.0, "got {}", d);
    }

    #[test]
    fn test_haversine_zero_for_same_point() {
        let p = GeoPoint::new(10.5, 106.7);
        assert!(haversine_km(p, p).abs() < 1e-9);
    }

    #[test]
    fn test_midpoint() {
        let a = GeoPoint::new(10.0, 100.0);
        let b = GeoPoint::new(12.0, 104.0);
        let mid = GeoPoint::midpoint(a, b);
        assert_eq!(mid.lat, 11.0);
        assert_eq!(mid.lng, 102.0);
    }
}
