//! Per-frame animation systems

use bevy::picking::events::{Out, Over, Pointer};
use bevy::prelude::*;

use super::animator::{Animator, FrameInput};
use super::hover::HoverController;
use super::registry::AnimationRegistry;
use crate::visualization::globe::GlobeRotation;

/// Leaf entity currently under the pointer, if any.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HoveredLeaf(pub Option<Entity>);

/// Follow pointer enter/leave messages
pub fn track_hovered_leaf(
    mut over_events: MessageReader<Pointer<Over>>,
    mut out_events: MessageReader<Pointer<Out>>,
    mut hovered: ResMut<HoveredLeaf>,
) {
    let mut leaf = hovered.0;
    for ev in out_events.read() {
        if leaf == Some(ev.entity) {
            leaf = None;
        }
    }
    for ev in over_events.read() {
        leaf = Some(ev.entity);
    }
    hovered.set_if_neq(HoveredLeaf(leaf));
}

/// Advance every registered object and write the result to its transform
pub fn tick_animations(
    time: Res<Time>,
    rotation: Res<GlobeRotation>,
    animator: Res<Animator>,
    mut registry: ResMut<AnimationRegistry<Entity>>,
    mut transforms: Query<&mut Transform>,
) {
    let frame = FrameInput {
        delta: time.delta_secs(),
        elapsed: time.elapsed_secs(),
        globe_rotation_y: rotation.0,
    };
    animator.tick(&mut registry, &frame, |entity, pose| {
        // Despawned nodes are skipped, their registry entry stays inert
        let Ok(mut transform) = transforms.get_mut(entity) else {
            return;
        };
        if let Some(translation) = pose.translation {
            transform.translation = translation;
        }
        if let Some(rotation) = pose.rotation {
            transform.rotation = rotation;
        }
        if let Some(scale) = pose.scale {
            transform.scale = Vec3::splat(scale);
        }
    });
}

/// Resolve the hovered object and retarget hover scales
pub fn apply_hover_targets_system(
    hovered: Res<HoveredLeaf>,
    controller: Res<HoverController>,
    parents: Query<&ChildOf>,
    mut registry: ResMut<AnimationRegistry<Entity>>,
) {
    controller.update(&mut registry, &parents, hovered.0);
}
