//! Boundary worker startup and mesh spawning

use bevy::asset::RenderAssetUsages;
use bevy::mesh::PrimitiveTopology;
use bevy::picking::Pickable;
use bevy::prelude::*;
use std::sync::mpsc::TryRecvError;

use super::fetcher::start_boundary_worker;
use super::rasterizer::RasterizedBoundaries;
use super::types::{BoundaryChannels, BoundaryOutline, BoundaryRequest, BoundaryResultMsg};
use crate::visualization::config::GlobeConfig;
use crate::visualization::globe::Globe;

/// Setup system to start the boundary worker when a source is configured
pub fn setup_boundary_worker(mut commands: Commands, config: Res<GlobeConfig>) {
    let Some(source) = config.boundary_source.clone() else {
        info!("No boundary source configured, globe will render without outlines");
        return;
    };
    info!("Loading landmass outlines from {}", source);
    commands.insert_resource(start_boundary_worker(BoundaryRequest {
        source,
        radius: config.boundary_radius,
        max_gap_degrees: config.boundary_max_gap_degrees,
    }));
}

/// Drain worker results and attach outline meshes to the globe
pub fn process_boundary_results_system(
    mut commands: Commands,
    channels: Option<Res<BoundaryChannels>>,
    globe: Query<Entity, With<Globe>>,
    config: Res<GlobeConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let Some(channels) = channels else { return };
    // Outlines are globe children, wait for the globe to exist
    let Ok(globe) = globe.single() else { return };
    let received = match channels.res_rx.lock() {
        Ok(rx) => rx.try_recv(),
        Err(_) => {
            warn!("Boundary channel lock poisoned, outlines will not load");
            commands.remove_resource::<BoundaryChannels>();
            return;
        }
    };
    let msg = match received {
        Ok(msg) => msg,
        Err(TryRecvError::Empty) => return,
        Err(TryRecvError::Disconnected) => {
            warn!("Boundary worker exited without a result, outlines will not load");
            commands.remove_resource::<BoundaryChannels>();
            return;
        }
    };

    match msg {
        BoundaryResultMsg::Loaded { source, boundaries } => {
            let material = materials.add(StandardMaterial {
                base_color: config.boundary_color,
                unlit: true,
                ..default()
            });
            let spawned = spawn_outlines(
                &mut commands,
                globe,
                &boundaries,
                &mut meshes,
                material,
            );
            info!("Attached {} outline meshes from {}", spawned, source);
        }
        BoundaryResultMsg::Failure { source, error } => {
            warn!("Landmass outlines unavailable ({}): {}", source, error);
        }
    }
    commands.remove_resource::<BoundaryChannels>();
}

/// One line strip per polyline, plus a single point list for point features.
fn spawn_outlines(
    commands: &mut Commands,
    globe: Entity,
    boundaries: &RasterizedBoundaries,
    meshes: &mut Assets<Mesh>,
    material: Handle<StandardMaterial>,
) -> usize {
    let mut spawned = 0;
    commands.entity(globe).with_children(|parent| {
        for line in &boundaries.lines {
            parent.spawn((
                Mesh3d(meshes.add(outline_mesh(PrimitiveTopology::LineStrip, line))),
                MeshMaterial3d(material.clone()),
                Pickable::IGNORE,
                BoundaryOutline,
            ));
            spawned += 1;
        }
        if !boundaries.points.is_empty() {
            parent.spawn((
                Mesh3d(meshes.add(outline_mesh(
                    PrimitiveTopology::PointList,
                    &boundaries.points,
                ))),
                MeshMaterial3d(material.clone()),
                Pickable::IGNORE,
                BoundaryOutline,
            ));
            spawned += 1;
        }
    });
    spawned
}

fn outline_mesh(topology: PrimitiveTopology, positions: &[Vec3]) -> Mesh {
    Mesh::new(topology, RenderAssetUsages::RENDER_WORLD)
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundaries::types::BoundarySource;
    use bevy::ecs::system::RunSystemOnce;
    use std::sync::{Arc, Mutex, mpsc};

    fn boundary_world(rx: Arc<Mutex<mpsc::Receiver<BoundaryResultMsg>>>) -> (World, Entity) {
        let mut world = World::new();
        world.insert_resource(GlobeConfig::default());
        world.init_resource::<Assets<Mesh>>();
        world.init_resource::<Assets<StandardMaterial>>();
        world.insert_resource(BoundaryChannels { res_rx: rx });
        let globe = world.spawn((Transform::default(), Globe)).id();
        (world, globe)
    }

    fn outline_count(world: &mut World, globe: Entity) -> usize {
        world
            .query_filtered::<&ChildOf, With<BoundaryOutline>>()
            .iter(world)
            .filter(|parent| parent.parent() == globe)
            .count()
    }

    #[test]
    fn test_outline_mesh_keeps_every_vertex() {
        let line = vec![Vec3::X, Vec3::Y, Vec3::Z];
        let mesh = outline_mesh(PrimitiveTopology::LineStrip, &line);
        assert_eq!(mesh.primitive_topology(), PrimitiveTopology::LineStrip);
        assert_eq!(mesh.count_vertices(), 3);
    }

    #[test]
    fn test_loaded_outlines_attach_to_globe() {
        let (tx, rx) = mpsc::channel();
        let (mut world, globe) = boundary_world(Arc::new(Mutex::new(rx)));
        tx.send(BoundaryResultMsg::Loaded {
            source: BoundarySource::Url("https://example.org/land.json".into()),
            boundaries: RasterizedBoundaries {
                lines: vec![vec![Vec3::X, Vec3::Y], vec![Vec3::Y, Vec3::Z]],
                points: vec![Vec3::Z],
                skipped_positions: 0,
            },
        })
        .unwrap();

        world
            .run_system_once(process_boundary_results_system)
            .expect("system runs");

        assert_eq!(outline_count(&mut world, globe), 3);
        assert!(!world.contains_resource::<BoundaryChannels>());
    }

    #[test]
    fn test_pending_worker_keeps_channel() {
        let (_tx, rx) = mpsc::channel();
        let (mut world, globe) = boundary_world(Arc::new(Mutex::new(rx)));

        world
            .run_system_once(process_boundary_results_system)
            .expect("system runs");

        assert!(world.contains_resource::<BoundaryChannels>());
        assert_eq!(outline_count(&mut world, globe), 0);
    }

    #[test]
    fn test_dead_worker_releases_channel() {
        let (tx, rx) = mpsc::channel::<BoundaryResultMsg>();
        drop(tx);
        let (mut world, _) = boundary_world(Arc::new(Mutex::new(rx)));

        world
            .run_system_once(process_boundary_results_system)
            .expect("system runs");

        assert!(!world.contains_resource::<BoundaryChannels>());
    }

    #[test]
    fn test_poisoned_lock_releases_channel() {
        let (_tx, rx) = mpsc::channel::<BoundaryResultMsg>();
        let rx = Arc::new(Mutex::new(rx));
        let held = Arc::clone(&rx);
        let _ = std::thread::spawn(move || {
            let _guard = held.lock().unwrap();
            panic!("worker died holding the lock");
        })
        .join();
        assert!(rx.is_poisoned());
        let (mut world, _) = boundary_world(rx);

        world
            .run_system_once(process_boundary_results_system)
            .expect("system runs");

        assert!(!world.contains_resource::<BoundaryChannels>());
    }
}
