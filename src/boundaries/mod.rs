//! Landmass outlines
//!
//! GeoJSON boundaries are loaded and rasterized on a worker thread, then
//! attached to the globe as line meshes once they arrive.

use bevy::prelude::*;

pub mod fetcher;
pub mod rasterizer;
pub mod systems;
pub mod types;

pub use types::BoundarySource;

use systems::{process_boundary_results_system, setup_boundary_worker};

/// Plugin for background boundary loading
pub struct BoundariesPlugin;

impl Plugin for BoundariesPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_boundary_worker)
            .add_systems(Update, process_boundary_results_system);
    }
}
