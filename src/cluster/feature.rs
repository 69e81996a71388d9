//! Rendering level records as GeoJSON features.

use super::{ClusterIndex, LevelRecord, RecordOrigin};
use crate::projection::unproject;
use geojson::feature::Id;
use geojson::{Feature, Geometry, JsonObject, JsonValue, Value};

impl ClusterIndex {
    /// Cluster marker or original point for a record.
    pub(crate) fn record_feature(&self, record: &LevelRecord) -> Feature {
        match record.origin {
            RecordOrigin::Point(position) if !record.is_cluster() => self.point_feature(position),
            _ => self.cluster_feature(record),
        }
    }

    /// Copy of a stored point, with its store position as id when `generate_id` is set.
    pub(crate) fn point_feature(&self, position: usize) -> Feature {
        let mut feature = self.points.get(position).cloned().unwrap_or_else(empty_feature);
        if self.config.generate_id {
            feature.id = Some(Id::Number(position.into()));
        }
        feature
    }

    fn cluster_feature(&self, record: &LevelRecord) -> Feature {
        let point = unproject(record.x, record.y);
        Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::Point(vec![point.x(), point.y()]))),
            id: record.cluster_id().map(|id| Id::Number(id.into())),
            properties: Some(self.cluster_properties(record)),
            foreign_members: None,
        }
    }

    /// Aggregated properties of a cluster merged with its built-in summary fields.
    pub(crate) fn cluster_properties(&self, record: &LevelRecord) -> JsonObject {
        let mut properties = record
            .props_index
            .and_then(|index| self.cluster_props.get(index))
            .cloned()
            .unwrap_or_default();

        properties.insert("cluster".to_string(), JsonValue::Bool(true));
        if let Some(id) = record.cluster_id() {
            properties.insert("cluster_id".to_string(), id.into());
        }
        properties.insert("point_count".to_string(), record.point_count.into());
        properties.insert(
            "point_count_abbreviated".to_string(),
            abbreviate_count(record.point_count),
        );
        properties
    }
}

/// `12345` → `"12k"`, `1250` → `"1.3k"`, smaller counts stay numeric.
pub(crate) fn abbreviate_count(count: usize) -> JsonValue {
    if count >= 10_000 {
        JsonValue::String(format!("{}k", (count + 500) / 1000))
    } else if count >= 1000 {
        let tenths = (count + 50) / 100;
        if tenths % 10 == 0 {
            JsonValue::String(format!("{}k", tenths / 10))
        } else {
            JsonValue::String(format!("{}.{}k", tenths / 10, tenths % 10))
        }
    } else {
        count.into()
    }
}

fn empty_feature() -> Feature {
    Feature {
        bbox: None,
        geometry: None,
        id: None,
        properties: None,
        foreign_members: None,
    }
}
