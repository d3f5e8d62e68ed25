//! Great-circle distance helpers.

use geo::{HaversineDistance, Point};

/// Default search radius for nearby alerts in kilometers.
pub const DEFAULT_NEARBY_RADIUS_KM: f64 = 5.0;

/// Returns the haversine distance in kilometers between two (latitude, longitude) pairs.
pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    // geo points are (x = longitude, y = latitude)
    let a = Point::new(from.1, from.0);
    let b = Point::new(to.1, to.0);
    a.haversine_distance(&b) / 1000.0
}

/// Returns true when `to` lies within `radius_km` of `from` (inclusive).
pub fn within_radius_km(from: (f64, f64), to: (f64, f64), radius_km: f64) -> bool {
    haversine_km(from, to) <= radius_km
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_same_point_is_zero() {
        let quito = (-0.22, -78.51);
        assert!(haversine_km(quito, quito).abs() < 1e-9);
    }

    #[test]
    fn test_haversine_one_degree_latitude() {
        // One degree of latitude is roughly 111 km
        let d = haversine_km((0.0, 0.0), (1.0, 0.0));
        assert!((d - 111.2).abs() < 0.5, "distance was {}", d);
    }

    #[test]
    fn test_haversine_is_symmetric() {
        let a = (-0.22, -78.51);
        let b = (-0.18, -78.47);
        assert!((haversine_km(a, b) - haversine_km(b, a)).abs() < 1e-9);
    }

    #[test]
    fn test_within_radius() {
        let center = (-0.22, -78.51);
        // ~6.3 km north-east
        let near = (-0.18, -78.47);
        assert!(within_radius_km(center, near, 10.0));
        assert!(!within_radius_km(center, near, DEFAULT_NEARBY_RADIUS_KM));
    }
}
