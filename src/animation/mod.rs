//! Scene animation
//!
//! Registered objects are moved once per frame by the [`Animator`]; the
//! hover controller retargets their scale from pointer state.

use bevy::prelude::*;

pub mod animator;
pub mod components;
pub mod hover;
pub mod registry;
pub mod systems;

pub use animator::{Animator, AnimatorSettings};
pub use components::{AnimationKind, AnimationSpec};
pub use registry::AnimationRegistry;

use hover::HoverController;
use systems::HoveredLeaf;

use crate::visualization::config::GlobeConfig;
use crate::visualization::globe::spin_globe;

/// Ordering for everything that runs once per frame
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnimationSet;

/// Plugin for the per-frame animation loop
pub struct AnimationPlugin;

impl Plugin for AnimationPlugin {
    fn build(&self, app: &mut App) {
        let config = app
            .world()
            .get_resource::<GlobeConfig>()
            .cloned()
            .unwrap_or_default();

        app.insert_resource(AnimationRegistry::<Entity>::new(config.base_flight_velocity))
            .insert_resource(Animator::new(config.animator.clone()))
            .insert_resource(HoverController {
                scale_factor: config.hover_scale_factor,
            })
            .init_resource::<HoveredLeaf>()
            .add_systems(
                Update,
                (
                    spin_globe,
                    systems::track_hovered_leaf,
                    systems::tick_animations,
                    systems::apply_hover_targets_system,
                )
                    .chain()
                    .in_set(AnimationSet),
            );
    }
}
