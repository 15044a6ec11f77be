//! Per-frame animation rules
//!
//! [`Animator::tick`] walks the registry once per frame and hands each
//! object's new pose to a caller-supplied sink. The motion rules themselves
//! are free functions so they can be checked without a scene.

use std::f32::consts::PI;
use std::hash::Hash;

use bevy::math::{Mat3, Quat, Vec3};
use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

use super::components::{
    Behavior, FlightDirection, FlightParams, FlightState, FloatParams, OrbitParams, ScaleState,
};
use super::registry::AnimationRegistry;
use crate::core::coordinates::point_at_altitude;

/// Squared length below which the flight tangent is treated as degenerate.
const MIN_TANGENT_LENGTH_SQ: f32 = 1e-10;

/// Direction in the local flight frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameAxis {
    /// Along the route, toward where the plane is heading.
    Forward,
    Backward,
    /// Away from the globe centre.
    Up,
    Down,
    /// `up x forward`.
    Right,
    Left,
}

impl FrameAxis {
    fn resolve(self, forward: Vec3, up: Vec3, right: Vec3) -> Vec3 {
        match self {
            FrameAxis::Forward => forward,
            FrameAxis::Backward => -forward,
            FrameAxis::Up => up,
            FrameAxis::Down => -up,
            FrameAxis::Right => right,
            FrameAxis::Left => -right,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("basis mapping ({x:?}, {y:?}, {z:?}) is not a right-handed rotation")]
pub struct InvalidBasis {
    pub x: FrameAxis,
    pub y: FrameAxis,
    pub z: FrameAxis,
}

/// Which flight-frame direction each model axis points along.
///
/// The default suits aircraft models whose nose is modelled along -X with +Y
/// up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBasis", into = "RawBasis")]
pub struct BasisMapping {
    x: FrameAxis,
    y: FrameAxis,
    z: FrameAxis,
}

#[derive(Serialize, Deserialize)]
struct RawBasis {
    x: FrameAxis,
    y: FrameAxis,
    z: FrameAxis,
}

impl TryFrom<RawBasis> for BasisMapping {
    type Error = InvalidBasis;

    fn try_from(raw: RawBasis) -> Result<Self, Self::Error> {
        BasisMapping::new(raw.x, raw.y, raw.z)
    }
}

impl From<BasisMapping> for RawBasis {
    fn from(basis: BasisMapping) -> Self {
        RawBasis {
            x: basis.x,
            y: basis.y,
            z: basis.z,
        }
    }
}

impl Default for BasisMapping {
    fn default() -> Self {
        Self {
            x: FrameAxis::Backward,
            y: FrameAxis::Up,
            z: FrameAxis::Right,
        }
    }
}

impl BasisMapping {
    pub fn new(x: FrameAxis, y: FrameAxis, z: FrameAxis) -> Result<Self, InvalidBasis> {
        // Any orthonormal right-handed frame will do for the check
        let probe = Mat3::from_cols(
            x.resolve(Vec3::X, Vec3::Y, Vec3::Y.cross(Vec3::X)),
            y.resolve(Vec3::X, Vec3::Y, Vec3::Y.cross(Vec3::X)),
            z.resolve(Vec3::X, Vec3::Y, Vec3::Y.cross(Vec3::X)),
        );
        if (probe.determinant() - 1.0).abs() > 1e-3 {
            return Err(InvalidBasis { x, y, z });
        }
        Ok(Self { x, y, z })
    }

    pub fn rotation(&self, forward: Vec3, up: Vec3, right: Vec3) -> Quat {
        let m = Mat3::from_cols(
            self.x.resolve(forward, up, right),
            self.y.resolve(forward, up, right),
            self.z.resolve(forward, up, right),
        );
        Quat::from_mat3(&m).normalize()
    }
}

/// Tunables for the animator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimatorSettings {
    pub globe_radius: f32,
    /// Cruise altitude above the surface at the route endpoints.
    pub min_flight_height: f32,
    /// Altitude above the surface at mid-route.
    pub max_flight_height: f32,
    /// Progress offset used to sample the heading.
    pub look_ahead: f32,
    pub look_ahead_min: f32,
    pub look_ahead_max: f32,
    /// Fraction of the remaining scale gap closed each frame.
    pub scale_smoothing: f32,
    pub basis: BasisMapping,
}

impl Default for AnimatorSettings {
    fn default() -> Self {
        Self {
            globe_radius: 1.5,
            min_flight_height: 0.08,
            max_flight_height: 0.4,
            look_ahead: 0.01,
            look_ahead_min: 0.01,
            look_ahead_max: 0.99,
            scale_smoothing: 0.1,
            basis: BasisMapping::default(),
        }
    }
}

/// Inputs for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    /// Seconds since the previous frame.
    pub delta: f32,
    /// Seconds since the scene started.
    pub elapsed: f32,
    /// Current globe spin about +Y, radians.
    pub globe_rotation_y: f32,
}

/// What changed on an object this frame. `None` fields are left alone.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ObjectPose {
    pub translation: Option<Vec3>,
    pub rotation: Option<Quat>,
    pub scale: Option<f32>,
}

#[derive(Resource, Debug, Clone, Default)]
pub struct Animator {
    pub settings: AnimatorSettings,
}

impl Animator {
    pub fn new(settings: AnimatorSettings) -> Self {
        Self { settings }
    }

    /// Advance every registered object by one frame, in registration order.
    pub fn tick<H, F>(&self, registry: &mut AnimationRegistry<H>, frame: &FrameInput, mut apply: F)
    where
        H: Copy + Eq + Hash + Send + Sync + 'static,
        F: FnMut(H, ObjectPose),
    {
        let t = frame.elapsed;
        let globe = Quat::from_rotation_y(frame.globe_rotation_y);

        for (_, object) in registry.iter_mut() {
            let mut pose = ObjectPose::default();

            match &mut object.behavior {
                Behavior::Floating(params) => {
                    pose.translation = Some(params.base_position + floating_offset(params, t));
                }
                Behavior::Orbiting(params) => {
                    pose.translation = Some(orbit_position(params, t));
                }
                Behavior::Flying { params, state } => {
                    advance_flight(state, params.speed, frame.delta);
                    let position = globe * flight_position(params, state.progress, &self.settings);
                    let ahead = look_ahead_progress(state, &self.settings);
                    let target = globe * flight_position(params, ahead, &self.settings);
                    pose.translation = Some(position);
                    pose.rotation = solve_flight_basis(position, target, &self.settings.basis);
                }
                Behavior::PulsingMarker { index, base_scale } => {
                    pose.scale = Some(*base_scale * pulse_scale(*index, t));
                }
            }

            if let Some(scale) = object.scale.as_mut() {
                pose.scale = Some(smooth_scale(scale, self.settings.scale_smoothing));
            }

            apply(object.handle, pose);
        }
    }
}

/// Bobbing offset from the rest position.
pub fn floating_offset(params: &FloatParams, t: f32) -> Vec3 {
    Vec3::new(
        (t * params.speed * 0.5 + params.offset).cos() * 0.05,
        (t * params.speed + params.offset).sin() * 0.1,
        0.0,
    )
}

/// Circular orbit about +Y with a slight vertical wobble.
pub fn orbit_position(params: &OrbitParams, t: f32) -> Vec3 {
    let angle = t * params.speed + params.offset;
    Vec3::new(
        angle.cos() * params.radius,
        params.y_offset + (t * 0.5 + params.offset).sin() * 0.2,
        angle.sin() * params.radius,
    )
}

/// Marker pulse multiplier; each marker is phase-shifted by its index.
pub fn pulse_scale(index: usize, t: f32) -> f32 {
    1.0 + (t * 2.0 + index as f32 * 0.5).sin() * 0.15
}

/// Integrate progress and bounce off the ends of the route.
pub fn advance_flight(state: &mut FlightState, speed: f32, delta: f32) {
    state.progress += delta.max(0.0) * speed * state.direction.sign();
    if state.progress >= 1.0 {
        state.progress = 1.0;
        state.direction = FlightDirection::Return;
    } else if state.progress <= 0.0 {
        state.progress = 0.0;
        state.direction = FlightDirection::Outbound;
    }
}

/// Altitude above the surface: lowest at the endpoints, highest mid-route.
pub fn flight_height(progress: f32, settings: &AnimatorSettings) -> f32 {
    let arc = settings.max_flight_height - settings.min_flight_height;
    settings.min_flight_height + (progress * PI).sin() * arc
}

/// Position along the route in the globe's local frame.
pub fn flight_position(params: &FlightParams, progress: f32, settings: &AnimatorSettings) -> Vec3 {
    let p = params.from.lerp(&params.to, progress as f64);
    point_at_altitude(&p, settings.globe_radius, flight_height(progress, settings))
}

/// Progress sampled slightly ahead in the current direction of travel.
pub fn look_ahead_progress(state: &FlightState, settings: &AnimatorSettings) -> f32 {
    (state.progress + settings.look_ahead * state.direction.sign())
        .clamp(settings.look_ahead_min, settings.look_ahead_max)
}

/// Orientation that keeps the model tangent to the globe, heading toward
/// `target`. `None` when the heading cannot be resolved.
pub fn solve_flight_basis(position: Vec3, target: Vec3, basis: &BasisMapping) -> Option<Quat> {
    let up = position.normalize_or_zero();
    if up == Vec3::ZERO {
        return None;
    }
    let raw = (target - position).normalize_or_zero();
    let tangent = raw - up * raw.dot(up);
    if tangent.length_squared() < MIN_TANGENT_LENGTH_SQ {
        return None;
    }
    let forward = tangent.normalize();
    let right = up.cross(forward).normalize_or_zero();
    if right == Vec3::ZERO {
        return None;
    }
    Some(basis.rotation(forward, up, right))
}

/// Move `current` a fixed fraction of the way toward `target`.
pub fn smooth_scale(scale: &mut ScaleState, fraction: f32) -> f32 {
    scale.current += (scale.target - scale.current) * fraction;
    scale.current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::components::{AnimationKind, AnimationSpec};
    use crate::core::coordinates::GeoPoint;
    use std::collections::HashMap;

    const EPSILON: f32 = 1e-5;
    const PARIS: GeoPoint = GeoPoint::new(2.3522, 48.8566);
    const TOKYO: GeoPoint = GeoPoint::new(139.6503, 35.6762);

    fn paris_tokyo() -> FlightParams {
        FlightParams {
            from: PARIS,
            to: TOKYO,
            speed: 0.12,
        }
    }

    fn outbound(progress: f32) -> FlightState {
        FlightState {
            progress,
            direction: FlightDirection::Outbound,
        }
    }

    #[test]
    fn test_flight_altitude_profile() {
        let settings = AnimatorSettings::default();
        let params = paris_tokyo();

        let start = flight_position(&params, 0.0, &settings);
        assert!((start.length() - 1.58).abs() < EPSILON, "{}", start.length());
        let paris = PARIS.to_sphere(1.0);
        assert!(start.normalize().dot(paris) > 0.99999);

        let mid = flight_position(&params, 0.5, &settings);
        assert!((mid.length() - 1.9).abs() < EPSILON, "{}", mid.length());

        let end = flight_position(&params, 1.0, &settings);
        assert!((end.length() - 1.58).abs() < 1e-4);
    }

    #[test]
    fn test_progress_bounces_at_destination() {
        let mut state = outbound(0.95);
        advance_flight(&mut state, 0.12, 1.0);
        assert_eq!(state.progress, 1.0);
        assert_eq!(state.direction, FlightDirection::Return);

        advance_flight(&mut state, 0.12, 1.0);
        assert!((state.progress - 0.88).abs() < EPSILON);
        assert_eq!(state.direction, FlightDirection::Return);
    }

    #[test]
    fn test_progress_bounces_at_origin() {
        let mut state = FlightState {
            progress: 0.05,
            direction: FlightDirection::Return,
        };
        advance_flight(&mut state, 0.12, 1.0);
        assert_eq!(state.progress, 0.0);
        assert_eq!(state.direction, FlightDirection::Outbound);
    }

    #[test]
    fn test_progress_stays_in_range_and_flips_once_per_bound() {
        let mut state = outbound(0.33);
        let mut last = state.direction;
        let mut flips = Vec::new();
        for _ in 0..2000 {
            advance_flight(&mut state, 0.37, 0.07);
            assert!((0.0..=1.0).contains(&state.progress));
            if state.direction != last {
                let at_bound = if state.direction == FlightDirection::Return {
                    1.0
                } else {
                    0.0
                };
                assert_eq!(state.progress, at_bound);
                flips.push(state.direction);
                last = state.direction;
            }
        }
        assert!(flips.len() > 4);
        // Alternates strictly: never two flips toward the same end in a row
        for pair in flips.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }

    #[test]
    fn test_zero_delta_holds_position() {
        let mut state = outbound(0.4);
        advance_flight(&mut state, 0.12, 0.0);
        assert_eq!(state, outbound(0.4));
    }

    #[test]
    fn test_look_ahead_is_clamped() {
        let settings = AnimatorSettings::default();
        assert!((look_ahead_progress(&outbound(0.5), &settings) - 0.51).abs() < EPSILON);
        assert_eq!(look_ahead_progress(&outbound(1.0), &settings), 0.99);
        let back = FlightState {
            progress: 0.0,
            direction: FlightDirection::Return,
        };
        assert_eq!(look_ahead_progress(&back, &settings), 0.01);
    }

    #[test]
    fn test_flight_basis_is_orthonormal_and_tangent() {
        let settings = AnimatorSettings::default();
        let params = paris_tokyo();
        let position = flight_position(&params, 0.3, &settings);
        let target = flight_position(&params, 0.31, &settings);
        let rotation = solve_flight_basis(position, target, &settings.basis).expect("valid heading");

        let up = position.normalize();
        // Model +Y points away from the globe
        assert!((rotation * Vec3::Y).dot(up) > 0.9999);
        // Model nose (-X) is tangent to the surface and heads toward the target
        let nose = rotation * Vec3::NEG_X;
        assert!(nose.dot(up).abs() < 1e-4);
        assert!(nose.dot(target - position) > 0.0);
        // Proper rotation
        assert!((Mat3::from_quat(rotation).determinant() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_degenerate_heading_yields_none() {
        let basis = BasisMapping::default();
        let p = Vec3::new(0.0, 1.5, 0.0);
        assert_eq!(solve_flight_basis(p, p, &basis), None);
        // Target straight overhead has no tangential component
        assert_eq!(solve_flight_basis(p, p * 1.2, &basis), None);
        assert_eq!(solve_flight_basis(Vec3::ZERO, p, &basis), None);
    }

    #[test]
    fn test_basis_mapping_rejects_reflections() {
        assert!(BasisMapping::new(FrameAxis::Forward, FrameAxis::Up, FrameAxis::Right).is_err());
        assert!(BasisMapping::new(FrameAxis::Forward, FrameAxis::Up, FrameAxis::Left).is_ok());
        assert!(BasisMapping::new(FrameAxis::Up, FrameAxis::Up, FrameAxis::Right).is_err());
        assert_eq!(
            BasisMapping::new(FrameAxis::Backward, FrameAxis::Up, FrameAxis::Right),
            Ok(BasisMapping::default())
        );
    }

    #[test]
    fn test_basis_mapping_serde() {
        let basis: BasisMapping =
            serde_json::from_str(r#"{"x":"forward","y":"up","z":"left"}"#).unwrap();
        assert_eq!(
            basis,
            BasisMapping::new(FrameAxis::Forward, FrameAxis::Up, FrameAxis::Left).unwrap()
        );
        assert!(
            serde_json::from_str::<BasisMapping>(r#"{"x":"forward","y":"up","z":"right"}"#)
                .is_err()
        );
    }

    #[test]
    fn test_smoothing_converges_without_overshoot() {
        let mut scale = ScaleState::new(0.55);
        scale.target = 0.55 * 1.3;
        let mut previous = scale.current;
        for _ in 0..200 {
            let current = smooth_scale(&mut scale, 0.1);
            assert!(current >= previous);
            assert!(current <= scale.target);
            previous = current;
        }
        assert!((scale.current - scale.target).abs() < 1e-4);
    }

    #[test]
    fn test_smoothing_from_above_never_undershoots() {
        let mut scale = ScaleState::new(0.55);
        scale.current = 0.55 * 1.3;
        let mut previous = scale.current;
        for _ in 0..200 {
            let current = smooth_scale(&mut scale, 0.1);
            assert!(current <= previous);
            assert!(current >= scale.target);
            previous = current;
        }
        assert!((scale.current - scale.target).abs() < 1e-4);
    }

    #[test]
    fn test_smoothing_first_step() {
        let mut scale = ScaleState::new(1.0);
        scale.target = 1.3;
        assert!((smooth_scale(&mut scale, 0.1) - 1.03).abs() < EPSILON);
    }

    #[test]
    fn test_pulse_phase_depends_on_index() {
        assert!((pulse_scale(0, 0.0) - 1.0).abs() < EPSILON);
        assert!((pulse_scale(1, 0.0) - (1.0 + 0.5_f32.sin() * 0.15)).abs() < EPSILON);
        for i in 0..12 {
            let s = pulse_scale(i, 4.2);
            assert!((0.85 - EPSILON..=1.15 + EPSILON).contains(&s));
        }
    }

    #[test]
    fn test_orbit_keeps_radius() {
        let params = OrbitParams {
            radius: 2.2,
            speed: 0.05,
            offset: 1.3,
            y_offset: 0.5,
        };
        for i in 0..50 {
            let p = orbit_position(&params, i as f32 * 0.7);
            assert!((Vec3::new(p.x, 0.0, p.z).length() - 2.2).abs() < 1e-4);
            assert!((p.y - 0.5).abs() <= 0.2 + EPSILON);
        }
    }

    #[test]
    fn test_floating_offset_bounds() {
        let params = FloatParams {
            base_position: Vec3::new(-1.0, -0.8, 2.0),
            offset: 1.57,
            speed: 0.8,
        };
        for i in 0..50 {
            let o = floating_offset(&params, i as f32 * 0.3);
            assert!(o.x.abs() <= 0.05 + EPSILON);
            assert!(o.y.abs() <= 0.1 + EPSILON);
            assert_eq!(o.z, 0.0);
        }
    }

    fn scene() -> AnimationRegistry<u32> {
        let mut registry = AnimationRegistry::new(0.18);
        registry
            .register(1, AnimationKind::PulsingMarker, &AnimationSpec::default())
            .unwrap();
        registry
            .register(
                2,
                AnimationKind::Flying,
                &AnimationSpec {
                    base_scale: Some(0.08),
                    from: Some(PARIS),
                    to: Some(TOKYO),
                    initial_progress: Some(0.25),
                    ..Default::default()
                },
            )
            .unwrap();
        registry
            .register(
                3,
                AnimationKind::Orbiting,
                &AnimationSpec {
                    orbit_radius: Some(2.2),
                    orbit_speed: Some(0.05),
                    orbit_offset: Some(0.0),
                    y_offset: Some(0.5),
                    ..Default::default()
                },
            )
            .unwrap();
        registry
    }

    fn run(frames: &[FrameInput]) -> Vec<(u32, ObjectPose)> {
        let animator = Animator::default();
        let mut registry = scene();
        let mut out = Vec::new();
        for frame in frames {
            animator.tick(&mut registry, frame, |h, pose| out.push((h, pose)));
        }
        out
    }

    #[test]
    fn test_tick_visits_in_registration_order() {
        let frame = FrameInput {
            delta: 0.016,
            elapsed: 1.0,
            globe_rotation_y: 0.1,
        };
        let poses = run(&[frame]);
        let handles: Vec<u32> = poses.iter().map(|(h, _)| *h).collect();
        assert_eq!(handles, vec![1, 2, 3]);

        let marker = poses[0].1;
        assert!(marker.translation.is_none());
        assert!(marker.scale.is_some());

        let plane = poses[1].1;
        assert!(plane.translation.is_some());
        assert!(plane.rotation.is_some());
        assert_eq!(plane.scale, Some(0.08));

        let cloud = poses[2].1;
        assert!(cloud.translation.is_some());
        assert!(cloud.scale.is_none());
    }

    #[test]
    fn test_tick_is_deterministic() {
        let frames: Vec<FrameInput> = (0..120)
            .map(|i| FrameInput {
                delta: 1.0 / 60.0,
                elapsed: i as f32 / 60.0,
                globe_rotation_y: i as f32 * 0.1 / 60.0,
            })
            .collect();
        assert_eq!(run(&frames), run(&frames));
    }

    #[test]
    fn test_flight_follows_globe_spin() {
        let animator = Animator::default();
        let mut still = scene();
        let mut spun = scene();
        let mut at_rest = HashMap::new();
        let mut rotated = HashMap::new();
        let frame = FrameInput {
            delta: 0.0,
            elapsed: 0.0,
            globe_rotation_y: 0.0,
        };
        animator.tick(&mut still, &frame, |h, pose| {
            at_rest.insert(h, pose);
        });
        let spin = FrameInput {
            globe_rotation_y: 0.7,
            ..frame
        };
        animator.tick(&mut spun, &spin, |h, pose| {
            rotated.insert(h, pose);
        });
        let expected = Quat::from_rotation_y(0.7) * at_rest[&2].translation.unwrap();
        assert!((rotated[&2].translation.unwrap() - expected).length() < 1e-4);
    }
}
