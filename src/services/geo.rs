//! Geodesic helpers for the radius search.
//!
//! Great-circle distance via the haversine formula over a spherical Earth.
//! Good to a fraction of a percent, which is plenty for "homes near me".

/// Mean Earth radius in kilometers (IUGG)
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Default search radius in kilometers
pub const DEFAULT_RADIUS_KM: f64 = 10.0;

/// Great-circle distance between two points, in kilometers
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lng2 - lng1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // atan2 stays finite even when rounding pushes a fractionally past 1
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Round a distance to 3 decimal places for presentation
pub fn round_km(km: f64) -> f64 {
    (km * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_distance_for_same_point() {
        assert_eq!(haversine_km(51.5074, -0.1278, 51.5074, -0.1278), 0.0);
    }

    #[test]
    fn test_london_to_paris() {
        // London to Paris is roughly 344 km
        let d = haversine_km(51.5074, -0.1278, 48.8566, 2.3522);
        assert!((d - 344.0).abs() < 2.0, "got {}", d);
    }

    #[test]
    fn test_antipodal_distance_is_half_circumference() {
        let d = haversine_km(0.0, 0.0, 0.0, 180.0);
        let half = std::f64::consts::PI * EARTH_RADIUS_KM;
        assert!((d - half).abs() < 0.001, "got {}", d);
    }

    #[test]
    fn test_near_antipodal_points_stay_finite() {
        // Rounding can push the haversine term fractionally past 1 here
        let d = haversine_km(10.0, 20.0, -10.0, -160.0);
        assert!(d.is_finite(), "got {}", d);
        assert!(d <= std::f64::consts::PI * EARTH_RADIUS_KM + 1e-6);
    }

    #[test]
    fn test_round_km() {
        assert_eq!(round_km(12.3456789), 12.346);
        assert_eq!(round_km(0.0004), 0.0);
        assert_eq!(round_km(1.0005), 1.001);
    }
}
