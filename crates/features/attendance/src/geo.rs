//! Great-circle distances and geofence checks.

use crate::error::AttendanceError;
use rollcall_courses::Geofence;
use rollcall_derive::api_model;

/// Mean Earth radius (IUGG), metres.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A location fix captured by the client at scan time.
#[api_model]
#[derive(Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Reported horizontal accuracy, metres
    #[serde(default)]
    pub accuracy_m: Option<f64>,
}

impl GeoPoint {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude, accuracy_m: None }
    }

    /// Checks coordinate ranges and that the accuracy is a non-negative number no worse than
    /// `max_accuracy_m`.
    ///
    /// # Errors
    /// [`AttendanceError::Validation`] describing the first violated bound.
    pub fn validate(self, max_accuracy_m: f64) -> Result<Self, AttendanceError> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(AttendanceError::validation("latitude must be within [-90, 90]"));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(AttendanceError::validation("longitude must be within [-180, 180]"));
        }
        if let Some(accuracy) = self.accuracy_m {
            if !(accuracy >= 0.0 && accuracy.is_finite()) {
                return Err(AttendanceError::validation("accuracy must be a non-negative number"));
            }
            if accuracy > max_accuracy_m {
                return Err(AttendanceError::validation(format!(
                    "location accuracy of {accuracy:.0} m is worse than the allowed {max_accuracy_m:.0} m"
                )));
            }
        }
        Ok(self)
    }

    /// Haversine distance in metres.
    #[must_use]
    pub fn distance_m(&self, other: &Self) -> f64 {
        haversine_m(self.latitude, self.longitude, other.latitude, other.longitude)
    }

    /// Distance to the geofence centre, and whether the fix may lie inside the circle once its
    /// accuracy is taken into account.
    #[must_use]
    pub fn within(&self, fence: &Geofence) -> (bool, f64) {
        let distance = haversine_m(self.latitude, self.longitude, fence.latitude, fence.longitude);
        let slack = self.accuracy_m.unwrap_or(0.0);
        (distance <= fence.radius_m + slack, distance)
    }
}

/// Great-circle distance between two coordinates in degrees, metres.
#[must_use]
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().min(1.0).asin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const PARIS: GeoPoint = GeoPoint::new(48.8566, 2.3522);
    const LONDON: GeoPoint = GeoPoint::new(51.5074, -0.1278);
    const NEW_YORK: GeoPoint = GeoPoint::new(40.7128, -74.0060);
    const LOS_ANGELES: GeoPoint = GeoPoint::new(34.0522, -118.2437);

    #[test]
    fn known_city_pairs() {
        let paris_london = PARIS.distance_m(&LONDON);
        assert!((paris_london - 343_500.0).abs() < 1_500.0, "{paris_london}");

        let ny_la = NEW_YORK.distance_m(&LOS_ANGELES);
        assert!((ny_la - 3_935_700.0).abs() < 10_000.0, "{ny_la}");
    }

    #[test]
    fn geofence_admits_accuracy_slack() {
        let fence = Geofence { latitude: 48.8566, longitude: 2.3522, radius_m: 100.0 };

        let (inside, distance) = PARIS.within(&fence);
        assert!(inside);
        assert!(distance < 1e-6);

        // ~150 m north of the centre.
        let north = GeoPoint::new(48.8566 + 150.0 / 111_195.0, 2.3522);
        let (inside, distance) = north.within(&fence);
        assert!(!inside);
        assert!((distance - 150.0).abs() < 1.0, "{distance}");

        let fuzzy = GeoPoint { accuracy_m: Some(60.0), ..north };
        assert!(fuzzy.within(&fence).0);
        assert!(!LONDON.within(&fence).0);
    }

    #[test]
    fn validation_bounds() {
        assert!(PARIS.validate(100.0).is_ok());
        assert!(GeoPoint::new(90.5, 0.0).validate(100.0).is_err());
        assert!(GeoPoint::new(0.0, 181.0).validate(100.0).is_err());
        assert!(GeoPoint::new(f64::NAN, 0.0).validate(100.0).is_err());

        let negative = GeoPoint { accuracy_m: Some(-1.0), ..PARIS };
        assert!(negative.validate(100.0).is_err());
        let vague = GeoPoint { accuracy_m: Some(250.0), ..PARIS };
        assert!(vague.validate(100.0).is_err());
        assert!(vague.validate(250.0).is_ok());
    }

    fn point() -> impl Strategy<Value = GeoPoint> {
        (-90.0f64..=90.0, -180.0f64..=180.0).prop_map(|(lat, lon)| GeoPoint::new(lat, lon))
    }

    proptest! {
        #[test]
        fn distance_is_symmetric_and_bounded(a in point(), b in point()) {
            let ab = a.distance_m(&b);
            let ba = b.distance_m(&a);
            prop_assert!(ab >= 0.0);
            prop_assert!((ab - ba).abs() < 1e-6);
            prop_assert!(ab <= std::f64::consts::PI * EARTH_RADIUS_M + 1e-6);
        }

        #[test]
        fn distance_to_self_is_zero(a in point()) {
            prop_assert!(a.distance_m(&a) < 1e-6);
        }

        #[test]
        fn triangle_inequality(a in point(), b in point(), c in point()) {
            prop_assert!(a.distance_m(&c) <= a.distance_m(&b) + b.distance_m(&c) + 1e-3);
        }
    }
}
