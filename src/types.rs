//! Query inputs and outputs shared across the index API.

use geojson::JsonObject;
use geojson::feature::Id;
use serde::{Deserialize, Serialize};

/// Geographic query box in degrees.
///
/// Unlike a geometric rectangle the corners are not normalized: `west > east`
/// describes a box crossing the antimeridian, and values outside the valid
/// ranges are accepted and wrapped or clamped by the query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LngLatBounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl LngLatBounds {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// The whole world.
    pub fn world() -> Self {
        Self::new(-180.0, -90.0, 180.0, 90.0)
    }
}

impl From<[f64; 4]> for LngLatBounds {
    fn from(bbox: [f64; 4]) -> Self {
        Self::new(bbox[0], bbox[1], bbox[2], bbox[3])
    }
}

/// Geometry type code of a point in vector tile features.
pub const TILE_POINT_TYPE: u8 = 1;

/// A single feature in tile-local pixel space.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileFeature {
    #[serde(rename = "type")]
    pub feature_type: u8,
    pub geometry: Vec<[i64; 2]>,
    pub tags: Option<JsonObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
}

impl TileFeature {
    /// Whether this feature is a cluster marker.
    pub fn is_cluster(&self) -> bool {
        self.tags
            .as_ref()
            .and_then(|tags| tags.get("cluster"))
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

/// Features intersecting one `z/x/y` tile.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Tile {
    pub features: Vec<TileFeature>,
}

impl Tile {
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Record counts for one zoom level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LevelStats {
    pub zoom: u8,
    /// Points and clusters visible at this zoom.
    pub records: usize,
    /// Records aggregating more than one point.
    pub clusters: usize,
}

/// Summary of an index's contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    /// Points in the point store, including those without geometry.
    pub points: usize,
    /// Points present in the raw level.
    pub indexed_points: usize,
    /// Entries in the aggregated properties table.
    pub aggregated_properties: usize,
    /// Points inserted after the last load and missing from coarser levels.
    pub stale_points: usize,
    /// Per-zoom counts, finest level first.
    pub levels: Vec<LevelStats>,
}
