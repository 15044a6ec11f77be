//! Hover resolution and hover-driven scale targets
//!
//! The pointer usually lands on a leaf mesh deep inside an imported model.
//! Walking up the parent chain finds the animated object that owns it.

use std::hash::Hash;

use bevy::prelude::{ChildOf, Entity, Query, Resource};

use super::components::ObjectId;
use super::registry::AnimationRegistry;

/// Upper bound on parent hops.
const MAX_DEPTH: usize = 256;

/// Read-only view of a scene hierarchy.
pub trait SceneGraph {
    type Node: Copy + Eq + Hash + Send + Sync + 'static;

    fn parent(&self, node: Self::Node) -> Option<Self::Node>;
}

/// The Bevy hierarchy, walked through [`ChildOf`].
impl SceneGraph for Query<'_, '_, &ChildOf> {
    type Node = Entity;

    fn parent(&self, node: Entity) -> Option<Entity> {
        self.get(node).ok().map(ChildOf::parent)
    }
}

/// Nearest registered object at or above `leaf`.
pub fn resolve_hovered<G: SceneGraph>(
    registry: &AnimationRegistry<G::Node>,
    graph: &G,
    leaf: Option<G::Node>,
) -> Option<ObjectId> {
    let mut node = leaf?;
    for _ in 0..MAX_DEPTH {
        if let Some(id) = registry.find_by_handle(node) {
            return Some(id);
        }
        node = graph.parent(node)?;
    }
    None
}

/// Point the hovered object at its enlarged scale and everything else back at
/// its base scale. Objects without a [`ScaleState`](super::components::ScaleState)
/// are never touched.
pub fn apply_hover_targets<H>(registry: &mut AnimationRegistry<H>, hovered: Option<ObjectId>, factor: f32)
where
    H: Copy + Eq + Hash + Send + Sync + 'static,
{
    for (id, object) in registry.iter_mut() {
        if let Some(scale) = object.scale.as_mut() {
            scale.target = if Some(id) == hovered {
                scale.base * factor
            } else {
                scale.base
            };
        }
    }
}

#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct HoverController {
    pub scale_factor: f32,
}

impl Default for HoverController {
    fn default() -> Self {
        Self { scale_factor: 1.3 }
    }
}

impl HoverController {
    /// Resolve the hovered object and update every scale target.
    pub fn update<G: SceneGraph>(
        &self,
        registry: &mut AnimationRegistry<G::Node>,
        graph: &G,
        leaf: Option<G::Node>,
    ) -> Option<ObjectId> {
        let hovered = resolve_hovered(registry, graph, leaf);
        apply_hover_targets(registry, hovered, self.scale_factor);
        hovered
    }
}
