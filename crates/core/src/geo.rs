//! Great-circle distance and radius filtering.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A WGS84 point. Longitude first, matching GeoJSON coordinate order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    /// Build a point, rejecting non-finite or out-of-range coordinates.
    pub fn new(longitude: f64, latitude: f64) -> Result<Self, CoreError> {
        let point = Self {
            longitude,
            latitude,
        };
        point.validate()?;
        Ok(point)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(CoreError::Validation(format!(
                "longitude must be between -180 and 180, got {}",
                self.longitude
            )));
        }
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(CoreError::Validation(format!(
                "latitude must be between -90 and 90, got {}",
                self.latitude
            )));
        }
        Ok(())
    }

    /// Haversine distance to `other` in kilometres.
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        haversine_km(*self, *other)
    }
}

/// Great-circle distance between two points in kilometres.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Validate a search radius against the configured ceiling.
pub fn validate_radius(radius_km: f64, max_radius_km: f64) -> Result<(), CoreError> {
    if !radius_km.is_finite() || radius_km <= 0.0 || radius_km > max_radius_km {
        return Err(CoreError::Validation(format!(
            "radius_km must be greater than 0 and at most {max_radius_km}, got {radius_km}"
        )));
    }
    Ok(())
}

/// Keep the items within `radius_km` of `origin`, paired with their
/// distance and ordered nearest first. Ties keep their input order.
pub fn within_radius<T>(
    origin: GeoPoint,
    radius_km: f64,
    items: impl IntoIterator<Item = T>,
    point_of: impl Fn(&T) -> GeoPoint,
) -> Vec<(T, f64)> {
    let mut kept: Vec<(T, f64)> = items
        .into_iter()
        .filter_map(|item| {
            let distance = haversine_km(origin, point_of(&item));
            (distance <= radius_km).then_some((item, distance))
        })
        .collect();
    kept.sort_by(|a, b| a.1.total_cmp(&b.1));
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A point `km` kilometres due north of `origin`.
    fn north_of(origin: GeoPoint, km: f64) -> GeoPoint {
        GeoPoint {
            longitude: origin.longitude,
            latitude: origin.latitude + (km / EARTH_RADIUS_KM).to_degrees(),
        }
    }

    const ORIGIN: GeoPoint = GeoPoint {
        longitude: 77.5946,
        latitude: 12.9716,
    };

    #[test]
    fn distance_to_self_is_zero() {
        assert_eq!(haversine_km(ORIGIN, ORIGIN), 0.0);
    }

    #[test]
    fn known_city_pair() {
        // Paris to London is roughly 344 km.
        let paris = GeoPoint::new(2.3522, 48.8566).unwrap();
        let london = GeoPoint::new(-0.1278, 51.5074).unwrap();
        let d = paris.distance_km(&london);
        assert!((d - 343.5).abs() < 1.0, "got {d}");
    }

    #[test]
    fn radius_boundary_is_inclusive_and_tight() {
        let inside = north_of(ORIGIN, 9.9999);
        let outside = north_of(ORIGIN, 10.0001);
        let kept = within_radius(ORIGIN, 10.0, [("in", inside), ("out", outside)], |(_, p)| *p);
        let names: Vec<&str> = kept.iter().map(|((name, _), _)| *name).collect();
        assert_eq!(names, vec!["in"]);
    }

    #[test]
    fn results_are_nearest_first() {
        let far = north_of(ORIGIN, 8.0);
        let near = north_of(ORIGIN, 2.0);
        let mid = north_of(ORIGIN, 5.0);
        let kept = within_radius(ORIGIN, 10.0, [far, near, mid], |p| *p);
        let distances: Vec<f64> = kept.iter().map(|(_, d)| *d).collect();
        assert!(distances.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn invalid_coordinates_are_rejected() {
        assert!(GeoPoint::new(181.0, 0.0).is_err());
        assert!(GeoPoint::new(0.0, -90.5).is_err());
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
        assert!(GeoPoint::new(-180.0, 90.0).is_ok());
    }

    #[test]
    fn radius_must_be_positive_and_bounded() {
        assert!(validate_radius(10.0, 500.0).is_ok());
        assert!(validate_radius(0.0, 500.0).is_err());
        assert!(validate_radius(-1.0, 500.0).is_err());
        assert!(validate_radius(501.0, 500.0).is_err());
        assert!(validate_radius(f64::INFINITY, 500.0).is_err());
    }
}
