use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::light::GlobalAmbientLight;
use bevy::picking::prelude::*;
use bevy::prelude::*;
use bevy::window::{PresentMode, Window, WindowPlugin};

use bevy_panorbit_camera::{PanOrbitCamera, PanOrbitCameraPlugin};

#[cfg(feature = "dev")]
use bevy::dev_tools::fps_overlay::FpsOverlayPlugin;

mod animation;
mod boundaries;
mod core;
mod visualization;

// Import plugins
use animation::AnimationPlugin;
use boundaries::BoundariesPlugin;
use visualization::{GlobeConfig, VisualizationPlugin};

/// Night-sky backdrop
const BACKGROUND: Color = Color::srgb(0.039, 0.086, 0.157);

// Setup camera and lights
pub fn setup(mut commands: Commands) {
    commands.insert_resource(GlobalAmbientLight {
        brightness: 600.0,
        ..default()
    });

    let pan_orbit = PanOrbitCamera {
        focus: Vec3::ZERO,
        radius: Some(4.5),
        yaw: Some(0.0),
        pitch: Some(0.0),
        zoom_lower_limit: 2.2,
        zoom_upper_limit: Some(10.0),
        force_update: true,
        ..default()
    };

    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: 45.0_f32.to_radians(),
            near: 0.1,
            far: 100.0,
            ..default()
        }),
        Camera {
            clear_color: ClearColorConfig::Custom(BACKGROUND),
            ..default()
        },
        pan_orbit,
        Tonemapping::TonyMcMapface,
        Transform::from_xyz(0.0, 0.0, 4.5).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: 6_000.0,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_xyz(5.0, 3.0, 5.0).looking_at(Vec3::ZERO, Vec3::Y),
        Name::new("Key light"),
    ));
}

fn main() {
    let mut app = App::new();

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "Travel Globe".to_string(),
            present_mode: PresentMode::AutoVsync,
            ..default()
        }),
        ..default()
    }));

    #[cfg(feature = "dev")]
    app.add_plugins(FpsOverlayPlugin::default());

    // Must exist before AnimationPlugin builds
    app.insert_resource(GlobeConfig::default());

    app.add_plugins(PanOrbitCameraPlugin);
    app.add_plugins(MeshPickingPlugin);

    // Add our custom plugins
    app.add_plugins(VisualizationPlugin);
    app.add_plugins(AnimationPlugin);
    app.add_plugins(BoundariesPlugin);

    app.add_systems(Startup, setup);

    app.run();
}
