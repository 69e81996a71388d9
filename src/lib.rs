//! Multi-resolution point clustering for map tiles.
//!
//! `geocluster` builds a hierarchy of clusters over a set of GeoJSON points,
//! one level per zoom, so that map clients can fetch either individual points
//! or pre-aggregated cluster markers for any viewport.
//!
//! ## Features
//! - **Greedy radius clustering** per zoom with weighted centroids and stable cluster ids
//! - **Queries**: bounding box (antimeridian aware), vector-tile style tiles, children,
//!   leaves with pagination, expansion zoom
//! - **Custom aggregation** through caller-supplied map/reduce functions
//! - **Incremental updates**: point insertion at the raw level and property updates
//!
//! ## Insertion staleness
//! Inserted points are indexed at zoom `max_zoom + 1` only:
//! - Clusters at `max_zoom` and below keep the state of the last [`ClusterIndex::load`]
//! - [`ClusterIndex::is_stale`] reports pending insertions until the next load
//!
//! ```rust
//! use geocluster::{ClusterConfig, ClusterIndex, LngLatBounds};
//! use geojson::{Feature, Geometry, Value};
//!
//! let points: Vec<Feature> = (0..10)
//!     .map(|i| Feature {
//!         bbox: None,
//!         geometry: Some(Geometry::new(Value::Point(vec![-74.0 + i as f64 * 0.001, 40.7]))),
//!         id: None,
//!         properties: None,
//!         foreign_members: None,
//!     })
//!     .collect();
//!
//! let index = ClusterIndex::builder()
//!     .config(ClusterConfig::default().with_zoom_range(0, 16))
//!     .get_id(|_| 0)
//!     .load(points)?;
//!
//! let clusters = index.get_clusters(LngLatBounds::world(), 2.0);
//! assert_eq!(clusters.len(), 1);
//! # Ok::<(), geocluster::ClusterError>(())
//! ```

pub mod builder;
pub mod cluster;
pub mod codec;
pub mod config;
pub mod error;
pub mod projection;
pub mod spatial_index;
pub mod types;

#[cfg(feature = "sync")]
pub mod sync;

pub use builder::ClusterIndexBuilder;
pub use cluster::{ClusterIndex, IdAccessor, MapFn, ReduceFn};
pub use codec::ClusterKey;
pub use config::ClusterConfig;
pub use error::{ClusterError, Result};
pub use types::{IndexStats, LevelStats, LngLatBounds, Tile, TileFeature};

#[cfg(feature = "sync")]
pub use sync::SyncClusterIndex;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{ClusterConfig, ClusterIndex, ClusterIndexBuilder, ClusterKey, Result};

    pub use crate::{ClusterError, LngLatBounds, Tile, TileFeature};

    #[cfg(feature = "sync")]
    pub use crate::SyncClusterIndex;

    pub use geojson::{Feature, JsonObject};
}
