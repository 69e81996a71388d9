//! Thread-safe wrapper for concurrent index access.
//!
//! [`ClusterIndex`] itself performs no locking. `SyncClusterIndex` wraps it in
//! `Arc<RwLock<ClusterIndex>>`: queries share a read lock, while loading,
//! insertion and property updates take the write lock for their duration.
//!
//! Enable the `sync` feature to use this module:
//!
//! ```toml
//! [dependencies]
//! geocluster = { version = "0.1", features = ["sync"] }
//! ```
//!
//! # Examples
//!
//! ```rust
//! use geocluster::{ClusterIndex, LngLatBounds, SyncClusterIndex};
//! use std::thread;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let index = SyncClusterIndex::new(ClusterIndex::builder().get_id(|_| 0).build()?);
//! index.load(Vec::new())?;
//!
//! let reader = index.clone();
//! let handle = thread::spawn(move || reader.get_clusters(LngLatBounds::world(), 0.0).len());
//! assert_eq!(handle.join().unwrap(), 0);
//! # Ok(())
//! # }
//! ```

use crate::cluster::ClusterIndex;
use crate::error::Result;
use crate::types::{IndexStats, LngLatBounds, Tile};
use geojson::{Feature, JsonValue};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

/// Clonable handle to a [`ClusterIndex`] behind a read-write lock.
#[derive(Debug, Clone)]
pub struct SyncClusterIndex {
    inner: Arc<RwLock<ClusterIndex>>,
}

impl SyncClusterIndex {
    pub fn new(index: ClusterIndex) -> Self {
        Self {
            inner: Arc::new(RwLock::new(index)),
        }
    }

    /// Hold a read lock for several consecutive queries.
    pub fn read(&self) -> RwLockReadGuard<'_, ClusterIndex> {
        self.inner.read()
    }

    /// Hold the write lock across several mutations.
    pub fn write(&self) -> RwLockWriteGuard<'_, ClusterIndex> {
        self.inner.write()
    }

    // ===== Construction and mutation =====

    pub fn load(&self, points: Vec<Feature>) -> Result<()> {
        self.inner.write().load(points)
    }

    pub fn insert_point(&self, point: &Feature) -> usize {
        self.inner.write().insert_point(point)
    }

    pub fn update_point_properties(&self, point_id: i64, update: &JsonValue) -> Result<()> {
        self.inner.write().update_point_properties(point_id, update)
    }

    // ===== Queries =====

    pub fn get_clusters(&self, bbox: impl Into<LngLatBounds>, zoom: f64) -> Vec<Feature> {
        self.inner.read().get_clusters(bbox, zoom)
    }

    pub fn get_children(&self, cluster_id: i64) -> Result<Vec<Feature>> {
        self.inner.read().get_children(cluster_id)
    }

    pub fn get_leaves(&self, cluster_id: i64, limit: usize, offset: usize) -> Result<Vec<Feature>> {
        self.inner.read().get_leaves(cluster_id, limit, offset)
    }

    pub fn get_cluster_expansion_zoom(&self, cluster_id: i64) -> Result<u8> {
        self.inner.read().get_cluster_expansion_zoom(cluster_id)
    }

    pub fn get_tile(&self, z: u8, x: u32, y: u32) -> Option<Tile> {
        self.inner.read().get_tile(z, x, y)
    }

    pub fn stats(&self) -> IndexStats {
        self.inner.read().stats()
    }
}

// SyncClusterIndex must stay Send + Sync
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    let _ = assert_send_sync::<SyncClusterIndex>;
};
