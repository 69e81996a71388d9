//! The cluster index: point store, per-zoom level stores and their spatial indexes.
//!
//! Every zoom level from `min_zoom` to `max_zoom + 1` owns a table of
//! `LevelRecord`s addressed by position plus a `LevelTree` over the same
//! positions. Level `max_zoom + 1` is the raw level holding one record per
//! indexed point; each coarser level is derived from the next finer one by
//! `hierarchy::cluster_level`.
//!
//! Points inserted after a load only reach the raw level. Coarser levels keep
//! the clusters computed at load time until the next [`ClusterIndex::load`].

mod aggregate;
mod feature;
mod hierarchy;
mod mutation;
mod query;
mod tile;

pub use aggregate::{MapFn, ReduceFn};

pub(crate) use aggregate::{Aggregator, aggregate_with};

use crate::codec::ClusterKey;
use crate::config::ClusterConfig;
use crate::error::{ClusterError, Result};
use crate::projection::{lat_y, lng_x};
use crate::spatial_index::{IndexedRecord, LevelTree};
use crate::types::{IndexStats, LevelStats};
use geojson::{Feature, FeatureCollection, GeoJson, JsonObject, Value};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Maps a point to its external numeric identity.
pub type IdAccessor = Arc<dyn Fn(&Feature) -> i64 + Send + Sync>;

/// Where a level record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RecordOrigin {
    /// A raw point, by point store position.
    Point(usize),
    /// A cluster, by its originating record.
    Cluster(ClusterKey),
}

/// One point or cluster at a given zoom level.
#[derive(Debug, Clone)]
pub(crate) struct LevelRecord {
    pub x: f64,
    pub y: f64,
    /// Lowest zoom this record was absorbed or carried at; `None` until visited.
    pub visited_zoom: Option<u8>,
    pub origin: RecordOrigin,
    /// Id of the cluster one zoom coarser that absorbed this record.
    pub parent: Option<i64>,
    pub point_count: usize,
    /// Entry in the aggregated properties table.
    pub props_index: Option<usize>,
}

impl LevelRecord {
    fn leaf(x: f64, y: f64, position: usize) -> Self {
        Self {
            x,
            y,
            visited_zoom: None,
            origin: RecordOrigin::Point(position),
            parent: None,
            point_count: 1,
            props_index: None,
        }
    }

    /// Whether hierarchy construction at `zoom` already consumed this record.
    pub fn visited_at(&self, zoom: u8) -> bool {
        self.visited_zoom.is_some_and(|visited| visited <= zoom)
    }

    pub fn is_cluster(&self) -> bool {
        self.point_count > 1
    }

    pub fn cluster_id(&self) -> Option<i64> {
        match self.origin {
            RecordOrigin::Cluster(key) => Some(key.to_id()),
            RecordOrigin::Point(_) => None,
        }
    }
}

/// Record table and spatial index for one zoom level.
#[derive(Debug, Clone, Default)]
pub(crate) struct Level {
    pub records: Vec<LevelRecord>,
    pub tree: LevelTree,
}

impl Level {
    fn from_records(records: Vec<LevelRecord>) -> Self {
        let entries = records
            .iter()
            .enumerate()
            .map(|(slot, record)| IndexedRecord::new(record.x, record.y, slot))
            .collect();
        Self {
            tree: LevelTree::build(entries),
            records,
        }
    }

    fn push(&mut self, record: LevelRecord) {
        let slot = self.records.len();
        self.tree.insert(IndexedRecord::new(record.x, record.y, slot));
        self.records.push(record);
    }
}

/// Multi-zoom point clustering index.
///
/// Built with [`ClusterIndexBuilder`](crate::ClusterIndexBuilder), then filled
/// with [`load`](Self::load). All queries return fresh GeoJSON values; nothing
/// returned aliases the index's internal state.
pub struct ClusterIndex {
    config: ClusterConfig,
    get_id: IdAccessor,
    aggregator: Option<Aggregator>,
    points: Vec<Feature>,
    /// Indexed by `zoom - min_zoom`; the last entry is the raw level.
    levels: Vec<Level>,
    cluster_props: Vec<JsonObject>,
    stale_points: usize,
}

impl ClusterIndex {
    pub(crate) fn new(
        config: ClusterConfig,
        get_id: IdAccessor,
        aggregator: Option<Aggregator>,
    ) -> Self {
        let levels = (config.min_zoom..=config.max_zoom + 1)
            .map(|_| Level::default())
            .collect();
        Self {
            config,
            get_id,
            aggregator,
            points: Vec::new(),
            levels,
            cluster_props: Vec::new(),
            stale_points: 0,
        }
    }

    /// Replace the index contents with `points` and build the full hierarchy.
    ///
    /// Points are ordered by their external identity first so that the result
    /// only depends on the input set and the configuration. Points without a
    /// `Point` geometry are stored but never indexed.
    pub fn load(&mut self, points: Vec<Feature>) -> Result<()> {
        let total_start = Instant::now();
        let min_zoom = self.config.min_zoom;
        let max_zoom = self.config.max_zoom;

        let mut points = points;
        let get_id = Arc::clone(&self.get_id);
        points.sort_by_cached_key(|point| get_id(point));

        let prepare_start = Instant::now();
        let mut raw = Vec::with_capacity(points.len());
        for (position, point) in points.iter().enumerate() {
            let Some([lng, lat]) = point_coordinates(point) else {
                continue;
            };
            raw.push(LevelRecord::leaf(
                fround(lng_x(lng)),
                fround(lat_y(lat)),
                position,
            ));
        }
        log::debug!(
            "prepared {} of {} points in {:?}",
            raw.len(),
            points.len(),
            prepare_start.elapsed()
        );
        if raw.len() < points.len() {
            log::debug!(
                "{} points without a point geometry are stored but not clustered",
                points.len() - raw.len()
            );
        }

        self.points = points;
        self.cluster_props.clear();
        self.stale_points = 0;

        // Finest level first; reversed once every zoom is built.
        let mut levels = Vec::with_capacity(usize::from(max_zoom - min_zoom) + 2);
        let mut source = Level::from_records(raw);

        for zoom in (min_zoom..=max_zoom).rev() {
            let start = Instant::now();
            let next = hierarchy::cluster_level(
                &self.config,
                self.aggregator.as_ref(),
                &self.points,
                &mut self.cluster_props,
                &mut source,
                zoom,
            )?;
            log::debug!(
                "z{}: {} records in {:?}",
                zoom,
                next.records.len(),
                start.elapsed()
            );
            levels.push(std::mem::replace(&mut source, next));
        }
        levels.push(source);

        levels.reverse();
        self.levels = levels;

        log::debug!("total load time {:?}", total_start.elapsed());
        Ok(())
    }

    /// Load every feature of a collection.
    pub fn load_collection(&mut self, collection: FeatureCollection) -> Result<()> {
        self.load(collection.features)
    }

    /// Parse GeoJSON text (a feature collection or a single feature) and load it.
    pub fn load_geojson(&mut self, text: &str) -> Result<()> {
        let geojson: GeoJson = text
            .parse()
            .map_err(|e| ClusterError::InvalidInput(format!("Failed to parse GeoJSON: {}", e)))?;

        match geojson {
            GeoJson::FeatureCollection(collection) => self.load_collection(collection),
            GeoJson::Feature(feature) => self.load(vec![feature]),
            GeoJson::Geometry(_) => Err(ClusterError::InvalidInput(
                "GeoJSON must be a Feature or FeatureCollection".to_string(),
            )),
        }
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Number of points in the point store, including unindexed ones.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points inserted since the last load. These are visible at the raw
    /// level (`max_zoom + 1`) only.
    pub fn stale_point_count(&self) -> usize {
        self.stale_points
    }

    /// Whether levels up to `max_zoom` are missing inserted points.
    pub fn is_stale(&self) -> bool {
        self.stale_points > 0
    }

    pub fn stats(&self) -> IndexStats {
        let levels = self
            .levels
            .iter()
            .enumerate()
            .rev()
            .map(|(offset, level)| LevelStats {
                zoom: self.config.min_zoom + offset as u8,
                records: level.records.len(),
                clusters: level.records.iter().filter(|r| r.is_cluster()).count(),
            })
            .collect();

        IndexStats {
            points: self.points.len(),
            indexed_points: self.raw_level().map_or(0, |level| level.records.len()),
            aggregated_properties: self.cluster_props.len(),
            stale_points: self.stale_points,
            levels,
        }
    }

    /// Clamp a requested zoom into the built range.
    pub(crate) fn limit_zoom(&self, zoom: f64) -> u8 {
        let min = f64::from(self.config.min_zoom);
        let max = f64::from(self.config.max_zoom) + 1.0;
        zoom.floor().max(min).min(max) as u8
    }

    pub(crate) fn level(&self, zoom: u8) -> Option<&Level> {
        let offset = zoom.checked_sub(self.config.min_zoom)?;
        self.levels.get(usize::from(offset))
    }

    fn raw_level(&self) -> Option<&Level> {
        self.levels.last()
    }
}

impl fmt::Debug for ClusterIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterIndex")
            .field("config", &self.config)
            .field("points", &self.points.len())
            .field("levels", &self.levels.len())
            .field("aggregated", &self.aggregator.is_some())
            .field("stale_points", &self.stale_points)
            .finish_non_exhaustive()
    }
}

/// `[lng, lat]` of a feature with a point geometry.
pub(crate) fn point_coordinates(feature: &Feature) -> Option<[f64; 2]> {
    match &feature.geometry.as_ref()?.value {
        Value::Point(coords) if coords.len() >= 2 => Some([coords[0], coords[1]]),
        _ => None,
    }
}

/// Round to single precision.
fn fround(value: f64) -> f64 {
    value as f32 as f64
}
