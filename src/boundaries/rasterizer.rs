//! Projection of GeoJSON boundaries onto the globe.
//!
//! Long raw segments are bisected in (lon, lat) space until every piece spans
//! at most `max_gap_degrees` in both axes, so outlines hug the sphere instead
//! of cutting chords through it.

use bevy::math::Vec3;
use geojson::{GeoJson, Geometry, Value};

use crate::core::coordinates::GeoPoint;

/// Sphere-projected primitives ready to hand to the renderer.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RasterizedBoundaries {
    pub lines: Vec<Vec<Vec3>>,
    pub points: Vec<Vec3>,
    /// Positions dropped because they were short, non-finite or outside
    /// the lon/lat domain.
    pub skipped_positions: usize,
}

impl RasterizedBoundaries {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.points.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.lines.iter().map(Vec::len).sum::<usize>() + self.points.len()
    }
}

/// Unwrap feature collections, features and (nested) geometry collections
/// down to their leaf geometries, in document order.
pub fn collect_geometries(json: &GeoJson) -> Vec<&Geometry> {
    let mut out = Vec::new();
    match json {
        GeoJson::Geometry(geometry) => push_leaves(geometry, &mut out),
        GeoJson::Feature(feature) => {
            if let Some(geometry) = &feature.geometry {
                push_leaves(geometry, &mut out);
            }
        }
        GeoJson::FeatureCollection(collection) => {
            for feature in &collection.features {
                if let Some(geometry) = &feature.geometry {
                    push_leaves(geometry, &mut out);
                }
            }
        }
    }
    out
}

fn push_leaves<'a>(geometry: &'a Geometry, out: &mut Vec<&'a Geometry>) {
    if let Value::GeometryCollection(children) = &geometry.value {
        for child in children {
            push_leaves(child, out);
        }
    } else {
        out.push(geometry);
    }
}

/// True when the pair is more than `max_gap_degrees` apart in longitude or latitude.
pub fn needs_interpolation(a: &GeoPoint, b: &GeoPoint, max_gap_degrees: f64) -> bool {
    let lon_distance = (a.longitude - b.longitude).abs();
    let lat_distance = (a.latitude - b.latitude).abs();
    lon_distance > max_gap_degrees || lat_distance > max_gap_degrees
}

/// Densify a polyline: every consecutive output pair satisfies the gap limit.
///
/// Input points are kept as-is and in order; only midpoints are inserted.
pub fn interpolate_line(points: &[GeoPoint], max_gap_degrees: f64) -> Vec<GeoPoint> {
    let Some(first) = points.first() else {
        return Vec::new();
    };

    let mut out = Vec::with_capacity(points.len());
    out.push(*first);
    for pair in points.windows(2) {
        bisect(&pair[0], &pair[1], max_gap_degrees, &mut out);
    }
    out
}

/// Push everything after `a` up to and including `b`.
fn bisect(a: &GeoPoint, b: &GeoPoint, max_gap_degrees: f64, out: &mut Vec<GeoPoint>) {
    if needs_interpolation(a, b, max_gap_degrees) {
        let mid = a.midpoint(b);
        bisect(a, &mid, max_gap_degrees, out);
        bisect(&mid, b, max_gap_degrees, out);
    } else {
        out.push(*b);
    }
}

/// Rasterize a whole GeoJSON document onto a sphere of `radius`.
pub fn rasterize(json: &GeoJson, radius: f32, max_gap_degrees: f64) -> RasterizedBoundaries {
    let mut out = RasterizedBoundaries::default();
    for geometry in collect_geometries(json) {
        rasterize_value(&geometry.value, radius, max_gap_degrees, &mut out);
    }
    out
}

/// Rasterize a single leaf geometry, appending to `out`.
pub fn rasterize_value(
    value: &Value,
    radius: f32,
    max_gap_degrees: f64,
    out: &mut RasterizedBoundaries,
) {
    match value {
        Value::Point(position) => push_point(position, radius, out),
        Value::MultiPoint(positions) => {
            for position in positions {
                push_point(position, radius, out);
            }
        }
        Value::LineString(line) => push_line(line, radius, max_gap_degrees, out),
        Value::MultiLineString(lines) | Value::Polygon(lines) => {
            for line in lines {
                push_line(line, radius, max_gap_degrees, out);
            }
        }
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                for ring in rings {
                    push_line(ring, radius, max_gap_degrees, out);
                }
            }
        }
        Value::GeometryCollection(children) => {
            for child in children {
                rasterize_value(&child.value, radius, max_gap_degrees, out);
            }
        }
    }
}

fn to_geo_point(position: &[f64]) -> Option<GeoPoint> {
    match position {
        [lon, lat, ..] => Some(GeoPoint::new(*lon, *lat)).filter(GeoPoint::in_range),
        _ => None,
    }
}

fn push_point(position: &[f64], radius: f32, out: &mut RasterizedBoundaries) {
    match to_geo_point(position) {
        Some(point) => out.points.push(point.to_sphere(radius)),
        None => out.skipped_positions += 1,
    }
}

fn push_line(
    positions: &[Vec<f64>],
    radius: f32,
    max_gap_degrees: f64,
    out: &mut RasterizedBoundaries,
) {
    let mut raw = Vec::with_capacity(positions.len());
    for position in positions {
        match to_geo_point(position) {
            Some(point) => raw.push(point),
            None => out.skipped_positions += 1,
        }
    }
    if raw.len() < 2 {
        out.skipped_positions += raw.len();
        return;
    }

    let line = interpolate_line(&raw, max_gap_degrees)
        .iter()
        .map(|p| p.to_sphere(radius))
        .collect();
    out.lines.push(line);
}
