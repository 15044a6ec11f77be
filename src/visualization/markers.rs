use bevy::picking::Pickable;
use bevy::prelude::*;

use crate::animation::{AnimationKind, AnimationRegistry, AnimationSpec};
use crate::visualization::config::GlobeConfig;
use crate::visualization::globe::Globe;
use crate::visualization::layout::SceneLayout;

/// Destination marker on the globe surface
#[derive(Component, Debug, Clone)]
pub struct DestinationMarker {
    pub name: String,
}

/// Spawn one pulsing marker per destination as children of the globe
pub fn spawn_destination_markers(
    mut commands: Commands,
    layout: Res<SceneLayout>,
    config: Res<GlobeConfig>,
    globe: Single<Entity, With<Globe>>,
    mut registry: ResMut<AnimationRegistry<Entity>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) -> Result {
    let marker_mesh = meshes.add(Sphere::new(config.marker_size).mesh().uv(8, 8));
    let glow_mesh = meshes.add(Sphere::new(config.glow_size).mesh().ico(1)?);

    for dest in &layout.destinations {
        let color = dest.color()?;
        let position = dest.geo_point().to_sphere(config.marker_radius);

        let glow = materials.add(StandardMaterial {
            base_color: color.with_alpha(0.35),
            emissive: color.to_linear() * 0.6,
            alpha_mode: AlphaMode::Add,
            unlit: true,
            ..default()
        });

        let marker = commands
            .spawn((
                Mesh3d(marker_mesh.clone()),
                MeshMaterial3d(materials.add(StandardMaterial {
                    base_color: color,
                    unlit: true,
                    ..default()
                })),
                Transform::from_translation(position),
                DestinationMarker {
                    name: dest.name.clone(),
                },
                Name::new(format!("Marker: {}", dest.name)),
                ChildOf(*globe),
            ))
            .with_children(|parent| {
                parent.spawn((Mesh3d(glow_mesh.clone()), MeshMaterial3d(glow), Pickable::IGNORE));
            })
            .id();

        registry.register(marker, AnimationKind::PulsingMarker, &AnimationSpec::default())?;
    }

    info!("Spawned {} destination markers", layout.destinations.len());
    Ok(())
}
