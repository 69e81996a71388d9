//! Index builder for configuration and callbacks
//!
//! Serializable options live in [`ClusterConfig`]; the builder adds the
//! closures an index needs (identity accessor, map and reduce functions) and
//! validates everything once before producing a [`ClusterIndex`].

use crate::cluster::aggregate_with;
use crate::cluster::{ClusterIndex, IdAccessor, MapFn, ReduceFn};
use crate::config::{COMPILED_NODE_SIZE, ClusterConfig};
use crate::error::{ClusterError, Result};
use geojson::{Feature, JsonObject};
use std::fmt;
use std::sync::Arc;

/// Builder for a [`ClusterIndex`].
pub struct ClusterIndexBuilder {
    config: ClusterConfig,
    get_id: Option<IdAccessor>,
    map: Option<MapFn>,
    reduce: Option<ReduceFn>,
}

impl ClusterIndexBuilder {
    /// Create a builder with the default configuration and no callbacks.
    pub fn new() -> Self {
        Self {
            config: ClusterConfig::default(),
            get_id: None,
            map: None,
            reduce: None,
        }
    }

    /// Set the clustering configuration.
    pub fn config(mut self, config: ClusterConfig) -> Self {
        self.config = config;
        self
    }

    /// Accessor returning a point's numeric identity. Required.
    ///
    /// Points are ordered by this value before clustering and looked up by it
    /// in [`ClusterIndex::update_point_properties`].
    pub fn get_id<F>(mut self, get_id: F) -> Self
    where
        F: Fn(&Feature) -> i64 + Send + Sync + 'static,
    {
        self.get_id = Some(Arc::new(get_id));
        self
    }

    /// Map a point's properties into the accumulator shape. Defaults to a copy
    /// of the properties. Only used together with [`reduce`](Self::reduce).
    pub fn map<F>(mut self, map: F) -> Self
    where
        F: Fn(Option<&JsonObject>) -> JsonObject + Send + Sync + 'static,
    {
        self.map = Some(Arc::new(map));
        self
    }

    /// Fold absorbed points and clusters into a cluster's accumulated properties.
    pub fn reduce<F>(mut self, reduce: F) -> Self
    where
        F: Fn(&mut JsonObject, &JsonObject) + Send + Sync + 'static,
    {
        self.reduce = Some(Arc::new(reduce));
        self
    }

    /// Validate the configuration and create an empty index.
    pub fn build(self) -> Result<ClusterIndex> {
        let get_id = self.get_id.ok_or(ClusterError::MissingIdAccessor)?;
        self.config.validate()?;

        if self.config.node_size != COMPILED_NODE_SIZE {
            log::warn!(
                "node_size {} requested; level trees use a fixed node size of {}",
                self.config.node_size,
                COMPILED_NODE_SIZE
            );
        }
        if self.map.is_some() && self.reduce.is_none() {
            log::debug!("map function ignored without a reduce function");
        }

        let aggregator = aggregate_with(self.map, self.reduce);
        Ok(ClusterIndex::new(self.config, get_id, aggregator))
    }

    /// Build the index and load `points` into it.
    pub fn load(self, points: Vec<Feature>) -> Result<ClusterIndex> {
        let mut index = self.build()?;
        index.load(points)?;
        Ok(index)
    }
}

impl Default for ClusterIndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ClusterIndexBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterIndexBuilder")
            .field("config", &self.config)
            .field("get_id", &self.get_id.is_some())
            .field("map", &self.map.is_some())
            .field("reduce", &self.reduce.is_some())
            .finish()
    }
}

impl ClusterIndex {
    /// Start building an index.
    pub fn builder() -> ClusterIndexBuilder {
        ClusterIndexBuilder::new()
    }
}
