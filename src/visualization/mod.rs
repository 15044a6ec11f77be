//! Visualization module
//!
//! Builds the scene: globe, destination markers, clouds, floating props and
//! airplanes. Everything that moves is handed to the animation registry.

use bevy::prelude::*;

pub mod config;
pub mod globe;
pub mod layout;
pub mod markers;
pub mod props;

pub use config::GlobeConfig;

use globe::GlobeRotation;

/// Plugin for scene construction
pub struct VisualizationPlugin;

impl Plugin for VisualizationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GlobeConfig>()
            .init_resource::<GlobeRotation>()
            .add_systems(
                Startup,
                (
                    load_scene_layout,
                    globe::spawn_globe,
                    markers::spawn_destination_markers,
                    props::spawn_clouds,
                    props::spawn_floating_props,
                    props::spawn_airplanes,
                )
                    .chain(),
            );
    }
}

/// Load the layout override if present. A broken override aborts startup.
fn load_scene_layout(mut commands: Commands) -> Result {
    let layout = layout::resolve_layout()?;
    info!(
        "Scene layout: {} destinations, {} routes, {} clouds, {} props",
        layout.destinations.len(),
        layout.routes.len(),
        layout.clouds.len(),
        layout.props.len()
    );
    commands.insert_resource(layout);
    Ok(())
}
