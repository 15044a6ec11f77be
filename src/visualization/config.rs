//! Visualization configuration

use bevy::prelude::*;
use std::path::PathBuf;

use crate::animation::AnimatorSettings;
use crate::boundaries::BoundarySource;

/// Globe and scene tunables
#[derive(Resource, Debug, Clone)]
pub struct GlobeConfig {
    pub globe_radius: f32,
    /// Icosphere subdivisions of the globe body; each edge is split into n + 1 segments.
    pub globe_subdivisions: u32,
    pub globe_color: Color,
    pub wireframe_color: Color,
    /// Wireframe shell radius relative to the globe.
    pub wireframe_scale: f32,
    /// Globe spin about +Y, radians per second.
    pub spin_rate: f32,
    pub marker_radius: f32,
    pub marker_size: f32,
    pub glow_size: f32,
    pub boundary_source: Option<BoundarySource>,
    pub boundary_radius: f32,
    /// Segments longer than this (degrees of lon or lat) are densified.
    pub boundary_max_gap_degrees: f64,
    pub boundary_color: Color,
    /// Great-circle radians per second that every airplane covers.
    pub base_flight_velocity: f64,
    pub hover_scale_factor: f32,
    pub cloud_color: Color,
    pub animator: AnimatorSettings,
}

impl Default for GlobeConfig {
    fn default() -> Self {
        Self {
            globe_radius: 1.5,
            globe_subdivisions: 3,
            globe_color: Color::srgb_u8(0x1a, 0x52, 0x76),
            wireframe_color: Color::srgba_u8(0x34, 0x98, 0xdb, 77),
            wireframe_scale: 1.01,
            spin_rate: 0.1,
            marker_radius: 1.52,
            marker_size: 0.04,
            glow_size: 0.075,
            boundary_source: Some(BoundarySource::File(PathBuf::from(
                "assets/geo/land.geojson",
            ))),
            boundary_radius: 1.505,
            boundary_max_gap_degrees: 5.0,
            boundary_color: Color::srgb_u8(0x5d, 0xad, 0xe2),
            base_flight_velocity: 0.18,
            hover_scale_factor: 1.3,
            cloud_color: Color::srgba(1.0, 1.0, 1.0, 0.8),
            animator: AnimatorSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_consistent() {
        let config = GlobeConfig::default();
        assert_eq!(config.animator.globe_radius, config.globe_radius);
        assert!(config.marker_radius > config.globe_radius);
        assert!(config.boundary_radius > config.globe_radius);
        assert!(config.boundary_radius < config.marker_radius);
        assert!(config.animator.min_flight_height < config.animator.max_flight_height);
    }
}
