//! Registry of animated scene objects

use std::collections::HashMap;
use std::hash::Hash;

use bevy::log::debug;
use bevy::math::Vec3;
use bevy::prelude::Resource;

use super::components::{
    AnimatedObject, AnimationKind, AnimationSpec, Behavior, FlightDirection, FlightParams,
    FlightState, FloatParams, ObjectId, OrbitParams, ScaleState,
};
use crate::core::coordinates::angular_distance;

/// Angular separation below which two route endpoints count as the same place.
const MIN_ROUTE_ANGLE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("{kind:?} object: {reason}")]
    ConfigMismatch { kind: AnimationKind, reason: String },
    #[error("scene node is already registered as object {0:?}")]
    DuplicateHandle(ObjectId),
}

impl RegistryError {
    fn mismatch(kind: AnimationKind, reason: impl Into<String>) -> Self {
        RegistryError::ConfigMismatch {
            kind,
            reason: reason.into(),
        }
    }
}

/// Every animated object in the scene, in registration order.
///
/// `H` is the scene-node handle; the app uses [`bevy::prelude::Entity`].
#[derive(Resource, Debug, Clone)]
pub struct AnimationRegistry<H: Copy + Eq + Hash + Send + Sync + 'static> {
    objects: Vec<AnimatedObject<H>>,
    by_handle: HashMap<H, ObjectId>,
    markers: usize,
    /// Angular velocity (radians of great circle per second) used to derive
    /// `flight_speed` when a route does not set one.
    base_flight_velocity: f64,
}

impl<H: Copy + Eq + Hash + Send + Sync + 'static> AnimationRegistry<H> {
    pub fn new(base_flight_velocity: f64) -> Self {
        Self {
            objects: Vec::new(),
            by_handle: HashMap::new(),
            markers: 0,
            base_flight_velocity,
        }
    }

    /// Validate `spec` against `kind` and add the object.
    ///
    /// Nothing is stored when an error is returned.
    pub fn register(
        &mut self,
        handle: H,
        kind: AnimationKind,
        spec: &AnimationSpec,
    ) -> Result<ObjectId, RegistryError> {
        if let Some(existing) = self.by_handle.get(&handle) {
            return Err(RegistryError::DuplicateHandle(*existing));
        }

        let (behavior, scale) = match kind {
            AnimationKind::Floating => {
                let base_position = require(kind, "base_position", spec.base_position)?;
                let params = FloatParams {
                    base_position: Vec3::from_array(base_position),
                    offset: require(kind, "float_offset", spec.float_offset)?,
                    speed: require(kind, "float_speed", spec.float_speed)?,
                };
                if !params.base_position.is_finite() {
                    return Err(RegistryError::mismatch(kind, "base_position is not finite"));
                }
                let base = require_scale(kind, spec.base_scale)?;
                (Behavior::Floating(params), Some(ScaleState::new(base)))
            }
            AnimationKind::Orbiting => {
                let params = OrbitParams {
                    radius: require(kind, "orbit_radius", spec.orbit_radius)?,
                    speed: require(kind, "orbit_speed", spec.orbit_speed)?,
                    offset: require(kind, "orbit_offset", spec.orbit_offset)?,
                    y_offset: require(kind, "y_offset", spec.y_offset)?,
                };
                let scale = match spec.base_scale {
                    Some(base) => Some(ScaleState::new(positive_scale(kind, base)?)),
                    None => None,
                };
                (Behavior::Orbiting(params), scale)
            }
            AnimationKind::Flying => {
                let from = require(kind, "from", spec.from)?;
                let to = require(kind, "to", spec.to)?;
                if !from.is_finite() || !to.is_finite() {
                    return Err(RegistryError::mismatch(kind, "route endpoint is not finite"));
                }
                let speed = match spec.flight_speed {
                    Some(speed) => positive(kind, "flight_speed", speed)?,
                    None => {
                        let angle = angular_distance(&from, &to);
                        if angle < MIN_ROUTE_ANGLE {
                            return Err(RegistryError::mismatch(
                                kind,
                                "route endpoints coincide; cannot derive flight_speed",
                            ));
                        }
                        (self.base_flight_velocity / angle) as f32
                    }
                };
                let progress = spec.initial_progress.unwrap_or(0.0);
                if !(0.0..=1.0).contains(&progress) {
                    return Err(RegistryError::mismatch(
                        kind,
                        format!("initial_progress {progress} is outside [0, 1]"),
                    ));
                }
                let base = require_scale(kind, spec.base_scale)?;
                let behavior = Behavior::Flying {
                    params: FlightParams { from, to, speed },
                    state: FlightState {
                        progress,
                        direction: FlightDirection::Outbound,
                    },
                };
                (behavior, Some(ScaleState::new(base)))
            }
            AnimationKind::PulsingMarker => {
                let base_scale = match spec.base_scale {
                    Some(base) => positive_scale(kind, base)?,
                    None => 1.0,
                };
                let behavior = Behavior::PulsingMarker {
                    index: self.markers,
                    base_scale,
                };
                (behavior, None)
            }
        };

        let id = ObjectId(self.objects.len());
        if kind == AnimationKind::PulsingMarker {
            self.markers += 1;
        }
        self.objects.push(AnimatedObject {
            handle,
            behavior,
            scale,
        });
        self.by_handle.insert(handle, id);
        debug!("Registered {:?} object {:?}", kind, id);
        Ok(id)
    }

    pub fn get(&self, id: ObjectId) -> Option<&AnimatedObject<H>> {
        self.objects.get(id.0)
    }

    pub fn find_by_handle(&self, handle: H) -> Option<ObjectId> {
        self.by_handle.get(&handle).copied()
    }

    /// Objects in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &AnimatedObject<H>)> {
        self.objects
            .iter()
            .enumerate()
            .map(|(i, object)| (ObjectId(i), object))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ObjectId, &mut AnimatedObject<H>)> {
        self.objects
            .iter_mut()
            .enumerate()
            .map(|(i, object)| (ObjectId(i), object))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    #[cfg(test)]
    pub fn marker_count(&self) -> usize {
        self.markers
    }
}

fn require<T>(kind: AnimationKind, field: &str, value: Option<T>) -> Result<T, RegistryError> {
    value.ok_or_else(|| RegistryError::mismatch(kind, format!("missing `{field}`")))
}

fn positive(kind: AnimationKind, field: &str, value: f32) -> Result<f32, RegistryError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(RegistryError::mismatch(
            kind,
            format!("`{field}` must be positive, got {value}"),
        ))
    }
}

fn positive_scale(kind: AnimationKind, base: f32) -> Result<f32, RegistryError> {
    positive(kind, "base_scale", base)
}

fn require_scale(kind: AnimationKind, base: Option<f32>) -> Result<f32, RegistryError> {
    positive_scale(kind, require(kind, "base_scale", base)?)
}
