//! Boundary loading types and worker channels

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, mpsc::Receiver};

use super::rasterizer::RasterizedBoundaries;

/// Where landmass outlines come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundarySource {
    File(PathBuf),
    Url(String),
}

impl fmt::Display for BoundarySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundarySource::File(path) => write!(f, "{}", path.display()),
            BoundarySource::Url(url) => f.write_str(url),
        }
    }
}

/// Parameters handed to the worker thread.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryRequest {
    pub source: BoundarySource,
    /// Sphere radius the outlines are projected onto.
    pub radius: f32,
    /// Densification threshold in degrees.
    pub max_gap_degrees: f64,
}

/// Results from the boundary worker thread
#[derive(Debug)]
pub enum BoundaryResultMsg {
    Loaded {
        source: BoundarySource,
        boundaries: RasterizedBoundaries,
    },
    Failure {
        source: BoundarySource,
        error: String,
    },
}

/// Resource holding the receiving end of the boundary worker
#[derive(Resource)]
pub struct BoundaryChannels {
    pub res_rx: Arc<Mutex<Receiver<BoundaryResultMsg>>>,
}

/// Marker for spawned outline meshes
#[derive(Component)]
pub struct BoundaryOutline;
