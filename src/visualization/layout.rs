//! Scene layout: destinations, routes, clouds and props
//!
//! The built-in layout is used unless a `scene_layout.json` is found, first
//! under `assets/`, then in the platform config directory:
//! - macOS: ~/Library/Application Support/travelglobe/
//! - Linux: ~/.config/travelglobe/
//! - Windows: %APPDATA%\travelglobe\config\

use anyhow::{Context, bail};
use bevy::prelude::*;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::f32::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};

use crate::animation::{AnimationKind, AnimationSpec};
use crate::core::coordinates::GeoPoint;

pub const LAYOUT_FILE: &str = "scene_layout.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    /// sRGB hex, e.g. `#ff6b6b`.
    pub color: String,
}

impl Destination {
    fn new(name: &str, lat: f64, lng: f64, color: &str) -> Self {
        Self {
            name: name.to_string(),
            lat,
            lng,
            color: color.to_string(),
        }
    }

    pub fn geo_point(&self) -> GeoPoint {
        GeoPoint::new(self.lng, self.lat)
    }

    pub fn color(&self) -> anyhow::Result<Color> {
        let srgba = Srgba::hex(&self.color)
            .with_context(|| format!("invalid color {:?} for {}", self.color, self.name))?;
        Ok(Color::Srgba(srgba))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSpec {
    /// Destination names.
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub initial_progress: f32,
    /// Overrides the speed derived from the route length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flight_speed: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudSpec {
    pub orbit_radius: f32,
    pub orbit_speed: f32,
    pub orbit_offset: f32,
    pub y_offset: f32,
    pub scale: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropModel {
    /// glTF scene under `assets/`.
    Gltf { path: String },
    /// Procedural passport booklet.
    Passport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropSpec {
    pub name: String,
    pub model: PropModel,
    /// Euler XYZ, radians.
    #[serde(default)]
    pub rotation: [f32; 3],
    pub kind: AnimationKind,
    pub animation: AnimationSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirplaneSpec {
    pub model: String,
    pub scale: f32,
}

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneLayout {
    pub destinations: Vec<Destination>,
    pub routes: Vec<RouteSpec>,
    pub airplane: AirplaneSpec,
    pub clouds: Vec<CloudSpec>,
    pub props: Vec<PropSpec>,
}

impl Default for SceneLayout {
    fn default() -> Self {
        let destinations = vec![
            Destination::new("Paris", 48.8566, 2.3522, "#ff6b6b"),
            Destination::new("Tokyo", 35.6762, 139.6503, "#4ecdc4"),
            Destination::new("New York", 40.7128, -74.006, "#ffe66d"),
            Destination::new("Sydney", -33.8688, 151.2093, "#95e1d3"),
            Destination::new("Cairo", 30.0444, 31.2357, "#f38181"),
            Destination::new("Rio", -22.9068, -43.1729, "#aa96da"),
            Destination::new("London", 51.5074, -0.1278, "#fcbad3"),
            Destination::new("Dubai", 25.2048, 55.2708, "#a8d8ea"),
            Destination::new("Singapore", 1.3521, 103.8198, "#6bcb77"),
            Destination::new("Los Angeles", 34.0522, -118.2437, "#ffd93d"),
            Destination::new("Cape Town", -33.9249, 18.4241, "#c9b1ff"),
            Destination::new("Moscow", 55.7558, 37.6173, "#4d96ff"),
        ];

        let route = |from: &str, to: &str, initial_progress: f32| RouteSpec {
            from: from.to_string(),
            to: to.to_string(),
            initial_progress,
            flight_speed: None,
        };
        let routes = vec![
            route("Paris", "Tokyo", 0.0),
            route("New York", "Sydney", 0.33),
            route("London", "Cairo", 0.66),
            route("Dubai", "Singapore", 0.15),
            route("Los Angeles", "Tokyo", 0.5),
            route("Rio", "Cape Town", 0.8),
            route("Moscow", "Dubai", 0.25),
        ];

        let cloud = |orbit_radius, orbit_speed, orbit_offset, y_offset, scale| CloudSpec {
            orbit_radius,
            orbit_speed,
            orbit_offset,
            y_offset,
            scale,
        };
        let clouds = vec![
            cloud(1.62, 0.15, 0.0, 0.6, 0.3),
            cloud(1.65, 0.12, PI / 2.0, -0.4, 0.35),
            cloud(1.6, 0.18, PI, 0.1, 0.25),
            cloud(1.64, 0.1, PI * 1.5, -0.7, 0.3),
            cloud(1.61, 0.14, PI / 4.0, 0.9, 0.22),
            cloud(1.63, 0.11, PI * 0.75, -0.2, 0.28),
            cloud(1.62, 0.16, PI * 1.25, 0.4, 0.26),
            cloud(1.65, 0.09, PI * 1.75, -0.9, 0.32),
        ];

        let floating = |position: [f32; 3], offset: f32, speed: f32, scale: f32| AnimationSpec {
            base_scale: Some(scale),
            base_position: Some(position),
            float_offset: Some(offset),
            float_speed: Some(speed),
            ..Default::default()
        };
        let props = vec![
            PropSpec {
                name: "Suitcase".to_string(),
                model: PropModel::Gltf {
                    path: "models/airport_suitcase.glb".to_string(),
                },
                rotation: [0.0, PI / 4.0, 0.1],
                kind: AnimationKind::Floating,
                animation: floating([-1.0, -0.8, 2.0], PI / 2.0, 0.8, 0.55),
            },
            PropSpec {
                name: "Passport".to_string(),
                model: PropModel::Passport,
                rotation: [0.2, -0.3, 0.1],
                kind: AnimationKind::Floating,
                animation: floating([1.0, -1.0, 2.0], PI, 1.0, 1.0),
            },
            PropSpec {
                name: "Sunglasses".to_string(),
                model: PropModel::Gltf {
                    path: "models/sun_glasses_low_poly.glb".to_string(),
                },
                rotation: [0.0, 0.6, 0.1],
                kind: AnimationKind::Floating,
                animation: floating([-0.8, 0.2, 2.2], PI * 0.75, 0.9, 0.002),
            },
        ];

        Self {
            destinations,
            routes,
            airplane: AirplaneSpec::default(),
            clouds,
            props,
        }
    }
}

impl Default for AirplaneSpec {
    fn default() -> Self {
        Self {
            model: "models/low_poly_airplane.glb".to_string(),
            scale: 0.08,
        }
    }
}

impl SceneLayout {
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let layout: SceneLayout = serde_json::from_str(json)?;
        layout.validate()?;
        Ok(layout)
    }

    /// Read a layout file. `Ok(None)` when the file does not exist.
    pub fn read(path: &Path) -> anyhow::Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let layout =
            Self::from_json_str(&contents).with_context(|| format!("loading {}", path.display()))?;
        Ok(Some(layout))
    }

    /// Reject layouts that would fail later while spawning.
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut names = HashSet::new();
        for dest in &self.destinations {
            GeoPoint::from_degrees(dest.lat, dest.lng)
                .with_context(|| format!("destination {}", dest.name))?;
            dest.color()?;
            if !names.insert(dest.name.as_str()) {
                bail!("duplicate destination {}", dest.name);
            }
        }
        for route in &self.routes {
            self.route_endpoints(route)?;
            if !(0.0..=1.0).contains(&route.initial_progress) {
                bail!(
                    "route {} -> {}: initial_progress {} is outside [0, 1]",
                    route.from,
                    route.to,
                    route.initial_progress
                );
            }
        }
        for (i, cloud) in self.clouds.iter().enumerate() {
            if cloud.scale.is_nan() || cloud.scale <= 0.0 {
                bail!("cloud {}: scale must be positive", i);
            }
        }
        Ok(())
    }

    pub fn destination(&self, name: &str) -> Option<&Destination> {
        self.destinations.iter().find(|d| d.name == name)
    }

    pub fn route_endpoints(&self, route: &RouteSpec) -> anyhow::Result<(GeoPoint, GeoPoint)> {
        let lookup = |name: &str| {
            self.destination(name)
                .map(Destination::geo_point)
                .with_context(|| format!("route references unknown destination {name:?}"))
        };
        Ok((lookup(&route.from)?, lookup(&route.to)?))
    }

    /// Animation parameters for the airplane flying `route`.
    pub fn flight_spec(&self, route: &RouteSpec) -> anyhow::Result<AnimationSpec> {
        let (from, to) = self.route_endpoints(route)?;
        Ok(AnimationSpec {
            base_scale: Some(self.airplane.scale),
            from: Some(from),
            to: Some(to),
            flight_speed: route.flight_speed,
            initial_progress: Some(route.initial_progress),
            ..Default::default()
        })
    }
}

/// Candidate override files, most specific first
pub fn layout_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("assets").join(LAYOUT_FILE)];
    if let Some(dirs) = ProjectDirs::from("", "", "travelglobe") {
        paths.push(dirs.config_dir().join(LAYOUT_FILE));
    }
    paths
}

/// First layout override found, or the built-in layout.
///
/// A present but malformed file is an error, not a silent fallback.
pub fn resolve_layout() -> anyhow::Result<SceneLayout> {
    for path in layout_paths() {
        if let Some(layout) = SceneLayout::read(&path)? {
            info!("Using scene layout from {}", path.display());
            return Ok(layout);
        }
    }
    Ok(SceneLayout::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_is_valid() {
        let layout = SceneLayout::default();
        layout.validate().expect("built-in layout validates");
        assert_eq!(layout.destinations.len(), 12);
        assert_eq!(layout.routes.len(), 7);
        assert_eq!(layout.clouds.len(), 8);
        assert_eq!(layout.props.len(), 3);
    }

    #[test]
    fn test_route_endpoints_resolve_by_name() {
        let layout = SceneLayout::default();
        let (from, to) = layout.route_endpoints(&layout.routes[0]).unwrap();
        assert_eq!(from, GeoPoint::new(2.3522, 48.8566));
        assert_eq!(to, GeoPoint::new(139.6503, 35.6762));
    }

    #[test]
    fn test_unknown_destination_is_rejected() {
        let mut layout = SceneLayout::default();
        layout.routes.push(RouteSpec {
            from: "Paris".to_string(),
            to: "Atlantis".to_string(),
            initial_progress: 0.0,
            flight_speed: None,
        });
        let err = layout.validate().unwrap_err();
        assert!(format!("{err:#}").contains("Atlantis"));
    }

    #[test]
    fn test_bad_color_and_coordinates_are_rejected() {
        let mut layout = SceneLayout::default();
        layout.destinations[0].color = "not-a-color".to_string();
        assert!(layout.validate().is_err());

        let mut layout = SceneLayout::default();
        layout.destinations[0].lat = 120.0;
        assert!(layout.validate().is_err());
    }

    #[test]
    fn test_json_roundtrip_of_partial_layout() {
        let json = r##"{
            "destinations": [
                {"name": "A", "lat": 10.0, "lng": 20.0, "color": "#ffffff"},
                {"name": "B", "lat": -10.0, "lng": -20.0, "color": "#000000"}
            ],
            "routes": [{"from": "A", "to": "B", "initial_progress": 0.5}],
            "clouds": [],
            "props": [{
                "name": "Passport",
                "model": {"type": "passport"},
                "kind": "floating",
                "animation": {"base_scale": 1.0, "base_position": [0, 0, 2], "float_offset": 0, "float_speed": 1}
            }]
        }"##;
        let layout = SceneLayout::from_json_str(json).unwrap();
        assert_eq!(layout.routes[0].initial_progress, 0.5);
        // Missing sections fall back to the defaults
        assert_eq!(layout.airplane, AirplaneSpec::default());
        assert_eq!(layout.props[0].model, PropModel::Passport);

        let spec = layout.flight_spec(&layout.routes[0]).unwrap();
        assert_eq!(spec.initial_progress, Some(0.5));
        assert_eq!(spec.base_scale, Some(0.08));
    }

    #[test]
    fn test_read_missing_file_is_none() {
        let path = Path::new("/nonexistent/travelglobe/scene_layout.json");
        assert!(SceneLayout::read(path).unwrap().is_none());
    }

    #[test]
    fn test_read_malformed_file_is_error() {
        let path = std::env::temp_dir().join(format!("travelglobe-layout-{}.json", std::process::id()));
        fs::write(&path, "{ not json").unwrap();
        let result = SceneLayout::read(&path);
        let _ = fs::remove_file(&path);
        assert!(result.is_err());
    }
}
