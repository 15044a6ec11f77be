//! Geographic coordinate utilities
//!
//! Every piece of globe geometry (destination markers, flight paths,
//! landmass outlines) goes through [`project`], so they all agree on where a
//! latitude/longitude lands on the sphere.
//!
//! Axis convention (Bevy, Y up):
//! - (lat 0, lng 0) maps to +X
//! - the north pole maps to +Y
//! - (lat 0, lng -90) maps to +Z

use bevy::math::{DVec3, Vec3};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoordError {
    #[error("invalid latitude: {0:?}")]
    Latitude(f64),
    #[error("invalid longitude: {0:?}")]
    Longitude(f64),
}

/// Degrees a boundary position may overshoot the lon/lat domain by.
pub const RANGE_TOLERANCE: f64 = 1e-6;

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    /// Build a point without range checks. See [`GeoPoint::in_range`] for the
    /// lenient check boundary data goes through.
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    pub fn from_degrees(latitude: f64, longitude: f64) -> Result<Self, CoordError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordError::Latitude(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordError::Longitude(longitude));
        }
        Ok(Self::new(longitude, latitude))
    }

    pub fn is_finite(&self) -> bool {
        self.longitude.is_finite() && self.latitude.is_finite()
    }

    /// Inside the lon/lat domain, allowing [`RANGE_TOLERANCE`] of overshoot.
    /// False for NaN.
    pub fn in_range(&self) -> bool {
        self.latitude.abs() <= 90.0 + RANGE_TOLERANCE
            && self.longitude.abs() <= 180.0 + RANGE_TOLERANCE
    }

    /// Plain arithmetic mean of the two (lon, lat) pairs.
    pub fn midpoint(&self, other: &GeoPoint) -> GeoPoint {
        GeoPoint::new(
            (self.longitude + other.longitude) / 2.0,
            (self.latitude + other.latitude) / 2.0,
        )
    }

    /// Linear interpolation in (lon, lat) space. Not a great circle.
    pub fn lerp(&self, other: &GeoPoint, t: f64) -> GeoPoint {
        GeoPoint::new(
            self.longitude + (other.longitude - self.longitude) * t,
            self.latitude + (other.latitude - self.latitude) * t,
        )
    }

    pub fn to_sphere(&self, radius: f32) -> Vec3 {
        project(self.latitude, self.longitude, radius)
    }
}

impl From<Vec3> for GeoPoint {
    /// Inverse of [`project`]. The vector's length is ignored.
    fn from(value: Vec3) -> Self {
        let n = value.as_dvec3().normalize_or_zero();
        if n == DVec3::ZERO {
            return GeoPoint::new(0.0, 0.0);
        }
        let latitude = n.y.clamp(-1.0, 1.0).asin().to_degrees();
        let theta = n.z.atan2(-n.x).to_degrees();
        let mut longitude = theta - 180.0;
        if longitude < -180.0 {
            longitude += 360.0;
        }
        GeoPoint::new(longitude, latitude)
    }
}

/// Map (lat, lng) in degrees to a point on a sphere of the given radius.
///
/// `phi` is the polar angle measured from +Y and `theta` the azimuth offset
/// by 180 degrees. Total over the whole lat/lng domain.
pub fn project(lat: f64, lng: f64, radius: f32) -> Vec3 {
    let phi = (90.0 - lat) * (PI / 180.0);
    let theta = (lng + 180.0) * (PI / 180.0);
    let r = radius as f64;

    // f64 for the trig, Bevy wants f32
    let x = -r * phi.sin() * theta.cos();
    let y = r * phi.cos();
    let z = r * phi.sin() * theta.sin();
    Vec3::new(x as f32, y as f32, z as f32)
}

/// Point `altitude` units above the surface of a sphere of `radius`.
pub fn point_at_altitude(point: &GeoPoint, radius: f32, altitude: f32) -> Vec3 {
    point.to_sphere(radius + altitude)
}

/// Great-circle separation of two points in radians (haversine).
pub fn angular_distance(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * h.sqrt().clamp(0.0, 1.0).asin()
}
