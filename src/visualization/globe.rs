use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, PrimitiveTopology, VertexAttributeValues};
use bevy::picking::Pickable;
use bevy::prelude::*;
use std::collections::HashSet;
use std::f32::consts::TAU;

use crate::core::coordinates::GeoPoint;
use crate::visualization::config::GlobeConfig;

/// The rotating globe. Markers and outlines are its children.
#[derive(Component)]
pub struct Globe;

/// Accumulated spin of the globe about +Y, radians in [0, 2π).
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq)]
pub struct GlobeRotation(pub f32);

/// Spawn the flat-shaded globe and its wireframe shell
pub fn spawn_globe(
    mut commands: Commands,
    config: Res<GlobeConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) -> Result {
    let (body_mesh, shell_mesh) = globe_meshes(config.globe_radius, config.globe_subdivisions)?;
    let faces = body_mesh.count_vertices() / 3;

    let body = materials.add(StandardMaterial {
        base_color: config.globe_color,
        perceptual_roughness: 0.9,
        ..default()
    });
    let shell = materials.add(StandardMaterial {
        base_color: config.wireframe_color,
        alpha_mode: AlphaMode::Blend,
        unlit: true,
        ..default()
    });

    commands
        .spawn((
            Mesh3d(meshes.add(body_mesh)),
            MeshMaterial3d(body),
            Transform::IDENTITY,
            Visibility::Visible,
            Globe,
            Name::new("Globe"),
        ))
        .with_children(|parent| {
            parent.spawn((
                Mesh3d(meshes.add(shell_mesh)),
                MeshMaterial3d(shell),
                Transform::from_scale(Vec3::splat(config.wireframe_scale)),
                Pickable::IGNORE,
                Name::new("Globe wireframe"),
            ));
        })
        .observe(
            |mut event: On<Pointer<Click>>, rotation: Res<GlobeRotation>| {
                if let Some(pos) = event.hit.position {
                    // Undo the spin to get back to geographic coordinates
                    let local = Quat::from_rotation_y(-rotation.0) * pos;
                    let point = GeoPoint::from(local);
                    info!(
                        "Latlon of selected point: Lat: {:.4}, Lon: {:.4}",
                        point.latitude, point.longitude
                    );
                }
                event.propagate(false);
            },
        );

    info!("Globe spawned: radius {}, {} faces", config.globe_radius, faces);
    Ok(())
}

/// Advance the globe spin
pub fn spin_globe(
    time: Res<Time>,
    config: Res<GlobeConfig>,
    mut rotation: ResMut<GlobeRotation>,
    mut globe: Query<&mut Transform, With<Globe>>,
) {
    rotation.0 = (rotation.0 + config.spin_rate * time.delta_secs()).rem_euclid(TAU);
    for mut transform in &mut globe {
        transform.rotation = Quat::from_rotation_y(rotation.0);
    }
}

/// Globe body and wireframe shell, both from one Bevy icosphere.
///
/// The shell is built at the body's radius; its entity scales it outward.
pub fn globe_meshes(radius: f32, subdivisions: u32) -> Result<(Mesh, Mesh)> {
    let sphere = Sphere::new(radius).mesh().ico(subdivisions)?;
    let shell = wireframe_mesh(&sphere)?;
    let body = sphere
        .with_duplicated_vertices()
        .with_computed_flat_normals();
    Ok((body, shell))
}

/// Line list with each shared triangle edge of an indexed mesh drawn once.
pub fn wireframe_mesh(mesh: &Mesh) -> Result<Mesh> {
    let positions = mesh
        .attribute(Mesh::ATTRIBUTE_POSITION)
        .and_then(VertexAttributeValues::as_float3)
        .ok_or("mesh has no float3 positions")?
        .to_vec();
    let triangles: Vec<u32> = mesh
        .indices()
        .ok_or("mesh is not indexed")?
        .iter()
        .map(|i| i as u32)
        .collect();

    let mut edges = HashSet::new();
    let mut lines = Vec::new();
    for tri in triangles.chunks_exact(3) {
        for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            if edges.insert((a.min(b), a.max(b))) {
                lines.extend_from_slice(&[a.min(b), a.max(b)]);
            }
        }
    }
    Ok(
        Mesh::new(PrimitiveTopology::LineList, RenderAssetUsages::default())
            .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
            .with_inserted_indices(Indices::U32(lines)),
    )
}
