//! Read-only queries over a built hierarchy.

use super::{ClusterIndex, Level, RecordOrigin};
use crate::codec::ClusterKey;
use crate::error::{ClusterError, Result};
use crate::projection::{lat_y, lng_x};
use crate::spatial_index::SlotList;
use crate::types::LngLatBounds;
use geojson::Feature;

impl ClusterIndex {
    /// Points and clusters visible at `zoom` within `bbox`.
    ///
    /// Longitudes are wrapped into `[-180, 180]` and latitudes clamped into
    /// `[-90, 90]`. A box whose west edge lies east of its east edge crosses
    /// the antimeridian and is answered as two boxes. Fractional zooms are
    /// floored and clamped into the built range.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use geocluster::{ClusterIndex, LngLatBounds};
    ///
    /// # fn main() -> geocluster::Result<()> {
    /// let mut index = ClusterIndex::builder().get_id(|_| 0).build()?;
    /// index.load(Vec::new())?;
    /// assert!(index.get_clusters(LngLatBounds::world(), 3.0).is_empty());
    /// # Ok(())
    /// # }
    /// ```
    pub fn get_clusters(&self, bbox: impl Into<LngLatBounds>, zoom: f64) -> Vec<Feature> {
        let bbox = bbox.into();
        let mut min_lng = wrap_longitude(bbox.west);
        let min_lat = bbox.south.clamp(-90.0, 90.0);
        let mut max_lng = if bbox.east == 180.0 {
            180.0
        } else {
            wrap_longitude(bbox.east)
        };
        let max_lat = bbox.north.clamp(-90.0, 90.0);

        if bbox.east - bbox.west >= 360.0 {
            min_lng = -180.0;
            max_lng = 180.0;
        } else if min_lng > max_lng {
            let mut eastern = self.get_clusters([min_lng, min_lat, 180.0, max_lat], zoom);
            let western = self.get_clusters([-180.0, min_lat, max_lng, max_lat], zoom);
            eastern.extend(western);
            return eastern;
        }

        let Some(level) = self.level(self.limit_zoom(zoom)) else {
            return Vec::new();
        };

        level
            .tree
            .range(lng_x(min_lng), lat_y(max_lat), lng_x(max_lng), lat_y(min_lat))
            .into_iter()
            .map(|slot| self.record_feature(&level.records[slot]))
            .collect()
    }

    /// Direct children of a cluster one zoom finer than where it appears.
    pub fn get_children(&self, cluster_id: i64) -> Result<Vec<Feature>> {
        let (level, slots) = self.child_slots(cluster_id)?;
        Ok(slots
            .into_iter()
            .map(|slot| self.record_feature(&level.records[slot]))
            .collect())
    }

    /// Original points under a cluster in depth-first order, skipping `offset`
    /// points and returning at most `limit`.
    pub fn get_leaves(&self, cluster_id: i64, limit: usize, offset: usize) -> Result<Vec<Feature>> {
        let mut leaves = Vec::new();
        if limit > 0 {
            self.append_leaves(&mut leaves, cluster_id, limit, offset, 0)?;
        }
        Ok(leaves)
    }

    /// Zoom at which a cluster splits into more than one child.
    pub fn get_cluster_expansion_zoom(&self, cluster_id: i64) -> Result<u8> {
        let key = ClusterKey::from_id(cluster_id)?;
        let max_zoom = i32::from(self.config.max_zoom);
        let mut cluster_id = cluster_id;
        let mut expansion_zoom = i32::from(key.origin_zoom()) - 1;

        while expansion_zoom <= max_zoom {
            let (level, slots) = self.child_slots(cluster_id)?;
            expansion_zoom += 1;

            if slots.len() != 1 {
                break;
            }
            match level.records[slots[0]].cluster_id() {
                Some(child_id) => cluster_id = child_id,
                None => break,
            }
        }

        Ok(expansion_zoom.max(0) as u8)
    }

    /// Level a cluster originated on and the slots of its children there.
    pub(crate) fn child_slots(&self, cluster_id: i64) -> Result<(&Level, SlotList)> {
        let key = ClusterKey::from_id(cluster_id)?;
        let not_found = || ClusterError::NotFound { cluster_id };

        let level = self.level(key.origin_zoom()).ok_or_else(not_found)?;
        let origin = level
            .records
            .get(key.origin_position())
            .ok_or_else(not_found)?;

        let radius = self.config.radius_at(i32::from(key.origin_zoom()) - 1);
        let slots: SlotList = level
            .tree
            .within(origin.x, origin.y, radius)
            .into_iter()
            .filter(|&slot| level.records[slot].parent == Some(cluster_id))
            .collect();

        if slots.is_empty() {
            return Err(not_found());
        }
        Ok((level, slots))
    }

    fn append_leaves(
        &self,
        result: &mut Vec<Feature>,
        cluster_id: i64,
        limit: usize,
        offset: usize,
        mut skipped: usize,
    ) -> Result<usize> {
        let (level, slots) = self.child_slots(cluster_id)?;

        for slot in slots {
            if result.len() >= limit {
                break;
            }
            let record = &level.records[slot];

            match record.origin {
                RecordOrigin::Cluster(key) if record.is_cluster() => {
                    if skipped + record.point_count <= offset {
                        skipped += record.point_count;
                    } else {
                        skipped = self.append_leaves(result, key.to_id(), limit, offset, skipped)?;
                    }
                }
                _ if skipped < offset => skipped += 1,
                RecordOrigin::Point(position) => result.push(self.point_feature(position)),
                RecordOrigin::Cluster(_) => {}
            }
        }

        Ok(skipped)
    }
}

fn wrap_longitude(lng: f64) -> f64 {
    ((lng + 180.0) % 360.0 + 360.0) % 360.0 - 180.0
}
