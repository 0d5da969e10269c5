//! Geometry on the unit sphere.
//!
//! All angles are in degrees. Longitudes are normalized into `[0, 360)`.

use ndarray::{Array1, Zip};
use serde::{Deserialize, Serialize};

/// Normalize a longitude into `[0, 360)`.
pub fn wrap_longitude(lon: f64) -> f64 {
    let wrapped = lon.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Great-circle separation between two points, in degrees.
///
/// Uses the Vincenty special case of the haversine formula, which stays accurate
/// for both tiny and antipodal separations.
pub fn angular_distance(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let (lon1, lat1, lon2, lat2) = (
        lon1.to_radians(),
        lat1.to_radians(),
        lon2.to_radians(),
        lat2.to_radians(),
    );
    let dlon = lon2 - lon1;
    let (sin_dlon, cos_dlon) = dlon.sin_cos();
    let (sin_lat1, cos_lat1) = lat1.sin_cos();
    let (sin_lat2, cos_lat2) = lat2.sin_cos();

    let num1 = cos_lat2 * sin_dlon;
    let num2 = cos_lat1 * sin_lat2 - sin_lat1 * cos_lat2 * cos_dlon;
    let denominator = sin_lat1 * sin_lat2 + cos_lat1 * cos_lat2 * cos_dlon;

    num1.hypot(num2).atan2(denominator).to_degrees()
}

/// Separation of every sample from a fixed reference point.
pub fn angular_distances(lon0: f64, lat0: f64, lon: &Array1<f64>, lat: &Array1<f64>) -> Array1<f64> {
    Zip::from(lon)
        .and(lat)
        .map_collect(|&l, &b| angular_distance(lon0, lat0, l, b))
}

/// Point reached travelling `distance` degrees from (`lon`, `lat`) along a great
/// circle with initial `bearing` (degrees east of north).
pub fn destination(lon: f64, lat: f64, bearing: f64, distance: f64) -> (f64, f64) {
    let lat1 = lat.to_radians();
    let theta = bearing.to_radians();
    let delta = distance.to_radians();

    let (sin_lat1, cos_lat1) = lat1.sin_cos();
    let (sin_delta, cos_delta) = delta.sin_cos();

    let sin_lat2 = (sin_lat1 * cos_delta + cos_lat1 * sin_delta * theta.cos()).clamp(-1.0, 1.0);
    let lat2 = sin_lat2.asin();
    let dlon = (theta.sin() * sin_delta * cos_lat1).atan2(cos_delta - sin_lat1 * sin_lat2);

    (wrap_longitude(lon + dlon.to_degrees()), lat2.to_degrees())
}

/// A longitude/latitude box on the sky.
///
/// A box crossing the 0/360 meridian is stored wrapped, with `lon.0 > lon.1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Boundaries {
    pub lon: (f64, f64),
    pub lat: (f64, f64),
}

impl Boundaries {
    /// Whether the box crosses the 0/360 meridian.
    pub fn is_wrapped(&self) -> bool {
        self.lon.0 > self.lon.1
    }

    /// Whether the box spans every longitude.
    pub fn is_full_longitude(&self) -> bool {
        self.lon.0 <= 0.0 && self.lon.1 >= 360.0
    }

    /// Whether a point lies inside the box (edges included).
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        if lat < self.lat.0 || lat > self.lat.1 {
            return false;
        }
        if self.is_full_longitude() {
            return true;
        }
        let lon = wrap_longitude(lon);
        if self.is_wrapped() {
            lon >= self.lon.0 || lon <= self.lon.1
        } else {
            lon >= self.lon.0 && lon <= self.lon.1
        }
    }

    /// Box guaranteed to contain every point within `extent` degrees of the centre.
    ///
    /// Latitude is clamped to [-90, 90]. Longitude half-width is `extent / cos(b)`
    /// with `b` the largest |latitude| the box reaches, and the box covers all
    /// longitudes near the poles or when the half-width reaches 180 degrees.
    pub fn around(lon0: f64, lat0: f64, extent: f64) -> Boundaries {
        let min_lat = (lat0 - extent).max(-90.0);
        let max_lat = (lat0 + extent).min(90.0);
        let max_abs_lat = min_lat.abs().max(max_lat.abs());

        let half_width = extent / max_abs_lat.to_radians().cos();
        if max_abs_lat > 89.0 || half_width >= 180.0 {
            return Boundaries {
                lon: (0.0, 360.0),
                lat: (min_lat, max_lat),
            };
        }

        let center = wrap_longitude(lon0);
        let mut min_lon = center - half_width;
        let mut max_lon = center + half_width;
        if min_lon < 0.0 {
            min_lon += 360.0;
        } else if max_lon > 360.0 {
            max_lon -= 360.0;
        }

        Boundaries {
            lon: (min_lon, max_lon),
            lat: (min_lat, max_lat),
        }
    }
}
