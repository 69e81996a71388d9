//! Point insertion and property updates on a built index.

use super::{ClusterIndex, LevelRecord, fround, point_coordinates};
use crate::error::{ClusterError, Result};
use crate::projection::{lat_y, lng_x};
use geojson::{Feature, JsonObject, JsonValue};

/// Members that would move a point if merged.
const LOCATION_MEMBERS: &[&str] = &["geometry", "bbox", "coordinates"];

impl ClusterIndex {
    /// Append a copy of `point` to the point store and the raw level.
    ///
    /// Returns the point's store position. Clusters at `max_zoom` and below
    /// are not recomputed: the point is only visible at zoom `max_zoom + 1`
    /// until the index is reloaded (see [`is_stale`](Self::is_stale)).
    pub fn insert_point(&mut self, point: &Feature) -> usize {
        let position = self.points.len();
        let coordinates = point_coordinates(point);
        self.points.push(point.clone());

        if let Some([lng, lat]) = coordinates
            && let Some(raw) = self.levels.last_mut()
        {
            raw.push(LevelRecord::leaf(
                fround(lng_x(lng)),
                fround(lat_y(lat)),
                position,
            ));
        }

        if self.stale_points == 0 {
            log::warn!(
                "points inserted after load are not clustered at zoom {} and below until reload",
                self.config.max_zoom
            );
        }
        self.stale_points += 1;
        log::trace!("inserted point at position {}", position);

        position
    }

    /// Deep-merge a partial feature into the point with external id `point_id`.
    ///
    /// The update is a GeoJSON-feature-shaped object. Its `properties` member is
    /// merged into the point's properties; other members become foreign
    /// members. Location members (`geometry`, `bbox`, and `coordinates` inside
    /// properties) are discarded so the spatial index never goes out of sync,
    /// and `id`/`type` are ignored.
    pub fn update_point_properties(&mut self, point_id: i64, update: &JsonValue) -> Result<()> {
        let position = self
            .points
            .iter()
            .position(|point| (self.get_id)(point) == point_id)
            .ok_or(ClusterError::PointNotFound(point_id))?;

        let JsonValue::Object(mut patch) = update.clone() else {
            return Err(ClusterError::InvalidInput(
                "point update must be a JSON object".to_string(),
            ));
        };
        strip_location(&mut patch);
        patch.remove("id");
        patch.remove("type");

        let properties = match patch.remove("properties") {
            Some(JsonValue::Object(mut properties)) => {
                strip_location(&mut properties);
                Some(properties)
            }
            Some(JsonValue::Null) | None => None,
            Some(_) => {
                return Err(ClusterError::InvalidInput(
                    "properties update must be a JSON object".to_string(),
                ));
            }
        };

        let point = &mut self.points[position];
        if let Some(properties) = properties {
            deep_merge(point.properties.get_or_insert_with(JsonObject::new), properties);
        }
        if !patch.is_empty() {
            deep_merge(point.foreign_members.get_or_insert_with(JsonObject::new), patch);
        }

        log::trace!("updated properties of point {}", point_id);
        Ok(())
    }
}

fn strip_location(object: &mut JsonObject) {
    for member in LOCATION_MEMBERS {
        object.remove(*member);
    }
}

/// Recursively merge `patch` into `target`; non-object values replace.
fn deep_merge(target: &mut JsonObject, patch: JsonObject) {
    for (key, value) in patch {
        match value {
            JsonValue::Object(nested) => {
                if let Some(JsonValue::Object(existing)) = target.get_mut(&key) {
                    deep_merge(existing, nested);
                    continue;
                }
                target.insert(key, JsonValue::Object(nested));
            }
            value => {
                target.insert(key, value);
            }
        }
    }
}
