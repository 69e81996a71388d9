//! Custom cluster properties computed with caller-supplied map and reduce functions.

use super::{LevelRecord, RecordOrigin};
use geojson::{Feature, JsonObject};
use std::fmt;
use std::sync::Arc;

/// Turns a point's properties into the accumulator shape used by the reducer.
pub type MapFn = Arc<dyn Fn(Option<&JsonObject>) -> JsonObject + Send + Sync>;

/// Folds one absorbed point or cluster into a running accumulator.
pub type ReduceFn = Arc<dyn Fn(&mut JsonObject, &JsonObject) + Send + Sync>;

/// Identity mapping; points without properties map to an empty object.
pub(crate) fn identity_map() -> MapFn {
    Arc::new(|properties: Option<&JsonObject>| properties.cloned().unwrap_or_default())
}

/// Aggregation is enabled by a reducer; a map function alone has no effect.
pub(crate) fn aggregate_with(map: Option<MapFn>, reduce: Option<ReduceFn>) -> Option<Aggregator> {
    reduce.map(|reduce| Aggregator::new(map.unwrap_or_else(identity_map), reduce))
}

#[derive(Clone)]
pub(crate) struct Aggregator {
    map: MapFn,
    reduce: ReduceFn,
}

impl Aggregator {
    pub fn new(map: MapFn, reduce: ReduceFn) -> Self {
        Self { map, reduce }
    }

    /// Mapped properties of a record. Clusters read their accumulator from the
    /// side table, points go through the map function.
    pub fn properties_of(
        &self,
        record: &LevelRecord,
        points: &[Feature],
        cluster_props: &[JsonObject],
    ) -> JsonObject {
        match record.origin {
            RecordOrigin::Cluster(_) => record
                .props_index
                .and_then(|index| cluster_props.get(index))
                .cloned()
                .unwrap_or_default(),
            RecordOrigin::Point(position) => {
                (self.map)(points.get(position).and_then(|p| p.properties.as_ref()))
            }
        }
    }

    pub fn reduce(&self, accumulated: &mut JsonObject, properties: &JsonObject) {
        (self.reduce)(accumulated, properties);
    }
}

impl fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aggregator").finish_non_exhaustive()
    }
}
