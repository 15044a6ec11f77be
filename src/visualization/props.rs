//! Clouds, floating travel props and airplanes

use bevy::picking::Pickable;
use bevy::prelude::*;

use crate::animation::{AnimationKind, AnimationRegistry, AnimationSpec};
use crate::visualization::config::GlobeConfig;
use crate::visualization::layout::{PropModel, SceneLayout};

/// Puffs making up one cloud: local offset and relative size.
const CLOUD_PUFFS: [(Vec3, f32); 4] = [
    (Vec3::new(0.0, 0.0, 0.0), 1.0),
    (Vec3::new(0.25, 0.1, 0.0), 0.8),
    (Vec3::new(-0.25, 0.05, 0.0), 0.85),
    (Vec3::new(0.1, 0.15, 0.1), 0.7),
];

#[derive(Component)]
pub struct Cloud;

#[derive(Component, Debug, Clone)]
pub struct Airplane {
    pub from: String,
    pub to: String,
}

#[derive(Component, Debug, Clone)]
pub struct FloatingProp {
    pub name: String,
}

pub fn spawn_clouds(
    mut commands: Commands,
    layout: Res<SceneLayout>,
    config: Res<GlobeConfig>,
    mut registry: ResMut<AnimationRegistry<Entity>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) -> Result {
    let puff_mesh = meshes.add(flat_icosphere(0.3)?);
    let material = materials.add(StandardMaterial {
        base_color: config.cloud_color,
        alpha_mode: AlphaMode::Blend,
        perceptual_roughness: 1.0,
        ..default()
    });

    for (i, cloud) in layout.clouds.iter().enumerate() {
        let entity = commands
            .spawn((
                Transform::from_scale(Vec3::splat(cloud.scale)),
                Visibility::Visible,
                Cloud,
                Name::new(format!("Cloud {i}")),
            ))
            .with_children(|parent| {
                for (offset, size) in CLOUD_PUFFS {
                    parent.spawn((
                        Mesh3d(puff_mesh.clone()),
                        MeshMaterial3d(material.clone()),
                        Transform::from_translation(offset).with_scale(Vec3::splat(size)),
                        Pickable::IGNORE,
                    ));
                }
            })
            .id();

        // Scale stays fixed, so no base_scale
        let spec = AnimationSpec {
            orbit_radius: Some(cloud.orbit_radius),
            orbit_speed: Some(cloud.orbit_speed),
            orbit_offset: Some(cloud.orbit_offset),
            y_offset: Some(cloud.y_offset),
            ..default()
        };
        registry.register(entity, AnimationKind::Orbiting, &spec)?;
    }

    info!("Spawned {} clouds", layout.clouds.len());
    Ok(())
}

pub fn spawn_floating_props(
    mut commands: Commands,
    layout: Res<SceneLayout>,
    config: Res<GlobeConfig>,
    asset_server: Res<AssetServer>,
    mut registry: ResMut<AnimationRegistry<Entity>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) -> Result {
    for prop in &layout.props {
        let [x, y, z] = prop.rotation;
        let position = prop.animation.base_position.unwrap_or_default();
        let scale = prop.animation.base_scale.unwrap_or(1.0);
        let transform = Transform::from_translation(Vec3::from_array(position))
            .with_rotation(Quat::from_euler(EulerRot::XYZ, x, y, z))
            .with_scale(Vec3::splat(scale));

        let mut entity = commands.spawn((
            transform,
            Visibility::Visible,
            FloatingProp {
                name: prop.name.clone(),
            },
            Name::new(prop.name.clone()),
        ));
        match &prop.model {
            PropModel::Gltf { path } => {
                entity.with_child(SceneRoot(
                    asset_server.load(GltfAssetLabel::Scene(0).from_asset(path.clone())),
                ));
            }
            PropModel::Passport => {
                let cover = materials.add(StandardMaterial {
                    base_color: config.globe_color,
                    perceptual_roughness: 0.9,
                    ..default()
                });
                let emblem = materials.add(StandardMaterial {
                    base_color: Color::srgb_u8(0xf1, 0xc4, 0x0f),
                    unlit: true,
                    ..default()
                });
                entity.with_children(|parent| {
                    parent.spawn((
                        Mesh3d(meshes.add(Cuboid::new(0.18, 0.25, 0.02))),
                        MeshMaterial3d(cover),
                    ));
                    parent.spawn((
                        Mesh3d(meshes.add(RegularPolygon::new(0.04, 8))),
                        MeshMaterial3d(emblem),
                        Transform::from_xyz(0.0, 0.0, 0.011),
                    ));
                });
            }
        }
        let id = entity.id();

        registry.register(id, prop.kind, &prop.animation)?;
    }

    info!("Spawned {} floating props", layout.props.len());
    Ok(())
}

pub fn spawn_airplanes(
    mut commands: Commands,
    layout: Res<SceneLayout>,
    asset_server: Res<AssetServer>,
    mut registry: ResMut<AnimationRegistry<Entity>>,
) -> Result {
    let model: Handle<Scene> =
        asset_server.load(GltfAssetLabel::Scene(0).from_asset(layout.airplane.model.clone()));

    for route in &layout.routes {
        let spec = layout.flight_spec(route)?;
        let entity = commands
            .spawn((
                Transform::from_scale(Vec3::splat(layout.airplane.scale)),
                Visibility::Visible,
                Airplane {
                    from: route.from.clone(),
                    to: route.to.clone(),
                },
                Name::new(format!("Flight {} -> {}", route.from, route.to)),
            ))
            .with_child(SceneRoot(model.clone()))
            .id();

        registry.register(entity, AnimationKind::Flying, &spec)?;
    }

    info!("Spawned {} airplanes", layout.routes.len());
    Ok(())
}

/// Icosphere with one normal per face.
fn flat_icosphere(radius: f32) -> Result<Mesh> {
    let mesh = Sphere::new(radius)
        .mesh()
        .ico(1)?
        .with_duplicated_vertices()
        .with_computed_flat_normals();
    Ok(mesh)
}
