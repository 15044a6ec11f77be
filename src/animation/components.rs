//! Animated object model
//!
//! Layout files describe objects with a loose [`AnimationSpec`] bag; the
//! registry resolves it once into a typed [`Behavior`] so the per-frame code
//! never has to ask whether a field is present.

use bevy::math::Vec3;
use serde::{Deserialize, Serialize};

use crate::core::coordinates::GeoPoint;

/// Which per-frame rule drives an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationKind {
    Floating,
    Orbiting,
    Flying,
    PulsingMarker,
}

/// Untyped animation parameters as they appear in a scene layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnimationSpec {
    pub base_scale: Option<f32>,
    // Floating
    pub base_position: Option<[f32; 3]>,
    pub float_offset: Option<f32>,
    pub float_speed: Option<f32>,
    // Orbiting
    pub orbit_radius: Option<f32>,
    pub orbit_speed: Option<f32>,
    pub orbit_offset: Option<f32>,
    pub y_offset: Option<f32>,
    // Flying
    pub from: Option<GeoPoint>,
    pub to: Option<GeoPoint>,
    /// Progress units per second. Derived from the route length when absent.
    pub flight_speed: Option<f32>,
    pub initial_progress: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatParams {
    pub base_position: Vec3,
    /// Phase, radians.
    pub offset: f32,
    pub speed: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitParams {
    pub radius: f32,
    pub speed: f32,
    /// Phase, radians.
    pub offset: f32,
    pub y_offset: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightDirection {
    Outbound,
    Return,
}

impl FlightDirection {
    pub fn sign(self) -> f32 {
        match self {
            FlightDirection::Outbound => 1.0,
            FlightDirection::Return => -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightParams {
    pub from: GeoPoint,
    pub to: GeoPoint,
    pub speed: f32,
}

/// Ping-pong state of a flight. `progress` stays in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightState {
    pub progress: f32,
    pub direction: FlightDirection,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Behavior {
    Floating(FloatParams),
    Orbiting(OrbitParams),
    Flying {
        params: FlightParams,
        state: FlightState,
    },
    PulsingMarker {
        /// Position among markers in creation order; sets the pulse phase.
        index: usize,
        base_scale: f32,
    },
}

#[cfg(test)]
impl Behavior {
    pub fn kind(&self) -> AnimationKind {
        match self {
            Behavior::Floating(_) => AnimationKind::Floating,
            Behavior::Orbiting(_) => AnimationKind::Orbiting,
            Behavior::Flying { .. } => AnimationKind::Flying,
            Behavior::PulsingMarker { .. } => AnimationKind::PulsingMarker,
        }
    }
}

/// Hover-driven scale, smoothed toward `target` by the animator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleState {
    pub base: f32,
    pub current: f32,
    pub target: f32,
}

impl ScaleState {
    pub fn new(base: f32) -> Self {
        Self {
            base,
            current: base,
            target: base,
        }
    }
}

/// Index of an object inside its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub usize);

/// A scene node plus the behavior that moves it every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimatedObject<H> {
    pub handle: H,
    pub behavior: Behavior,
    /// `None` for objects whose scale is not hover-driven (markers, and
    /// orbiting bodies registered without a base scale).
    pub scale: Option<ScaleState>,
}

#[cfg(test)]
impl<H> AnimatedObject<H> {
    pub fn kind(&self) -> AnimationKind {
        self.behavior.kind()
    }

    pub fn flight_state(&self) -> Option<&FlightState> {
        match &self.behavior {
            Behavior::Flying { state, .. } => Some(state),
            _ => None,
        }
    }
}
