//! Background loading of landmass outlines

use anyhow::Context;
use bevy::log::{info, warn};
use geojson::GeoJson;
use std::sync::{Arc, Mutex, mpsc};
use std::thread;

use super::rasterizer::{RasterizedBoundaries, rasterize};
use super::types::{BoundaryChannels, BoundaryRequest, BoundaryResultMsg, BoundarySource};

/// Start the background boundary worker thread.
///
/// The worker loads one source, rasterizes it and sends exactly one message.
pub fn start_boundary_worker(request: BoundaryRequest) -> BoundaryChannels {
    let (res_tx, res_rx) = mpsc::channel::<BoundaryResultMsg>();

    thread::spawn(move || {
        let msg = match load_and_rasterize(&request) {
            Ok(boundaries) => {
                info!(
                    "Rasterized {} outlines ({} vertices) from {}",
                    boundaries.lines.len(),
                    boundaries.vertex_count(),
                    request.source
                );
                if boundaries.is_empty() {
                    warn!("{} contains no drawable geometry", request.source);
                }
                if boundaries.skipped_positions > 0 {
                    warn!(
                        "Skipped {} malformed positions in {}",
                        boundaries.skipped_positions, request.source
                    );
                }
                BoundaryResultMsg::Loaded {
                    source: request.source,
                    boundaries,
                }
            }
            Err(e) => BoundaryResultMsg::Failure {
                source: request.source,
                error: format!("{e:#}"),
            },
        };
        // Receiver is gone when the app already exited
        let _ = res_tx.send(msg);
    });

    BoundaryChannels {
        res_rx: Arc::new(Mutex::new(res_rx)),
    }
}

fn load_and_rasterize(request: &BoundaryRequest) -> anyhow::Result<RasterizedBoundaries> {
    let body = match &request.source {
        BoundarySource::File(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        BoundarySource::Url(url) => fetch_url(url)?,
    };
    let json = parse_geojson(&body)
        .with_context(|| format!("parsing GeoJSON from {}", request.source))?;
    Ok(rasterize(&json, request.radius, request.max_gap_degrees))
}

fn fetch_url(url: &str) -> anyhow::Result<String> {
    let rt = tokio::runtime::Runtime::new().context("creating tokio runtime")?;
    rt.block_on(async {
        let resp = reqwest::Client::new()
            .get(url)
            .header("accept", "application/geo+json, application/json")
            .send()
            .await
            .with_context(|| format!("requesting {url}"))?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("HTTP {} from {}", status, url);
        }
        Ok(resp.text().await?)
    })
}

pub fn parse_geojson(body: &str) -> anyhow::Result<GeoJson> {
    // Tolerate a UTF-8 BOM, some exporters emit one
    let body = body.trim_start_matches('\u{feff}');
    Ok(body.parse::<GeoJson>()?)
}
