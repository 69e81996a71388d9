//! Tile extraction in tile-local pixel coordinates.

use super::{ClusterIndex, Level, RecordOrigin, point_coordinates};
use crate::projection::{lat_y, lng_x};
use crate::types::{TILE_POINT_TYPE, Tile, TileFeature};
use geojson::feature::Id;

impl ClusterIndex {
    /// Features of tile `z/x/y`, or `None` when the tile is empty.
    ///
    /// The tile is padded by `radius / extent` on every side so markers near
    /// the edge are not clipped, and tiles on the world's left or right edge
    /// also pick up features wrapped across the antimeridian.
    pub fn get_tile(&self, z: u8, x: u32, y: u32) -> Option<Tile> {
        let level = self.level(self.limit_zoom(f64::from(z)))?;
        let z2 = 2f64.powi(i32::from(z));
        let (x, y) = (f64::from(x), f64::from(y));
        let p = self.config.radius / self.config.extent;
        let top = (y - p) / z2;
        let bottom = (y + 1.0 + p) / z2;

        let mut tile = Tile::default();

        let slots = level
            .tree
            .range((x - p) / z2, top, (x + 1.0 + p) / z2, bottom);
        self.add_tile_features(&mut tile, level, &slots, x, y, z2);

        if x == 0.0 {
            let slots = level.tree.range(1.0 - p / z2, top, 1.0, bottom);
            self.add_tile_features(&mut tile, level, &slots, z2, y, z2);
        }
        if x == z2 - 1.0 {
            let slots = level.tree.range(0.0, top, p / z2, bottom);
            self.add_tile_features(&mut tile, level, &slots, -1.0, y, z2);
        }

        if tile.features.is_empty() {
            None
        } else {
            Some(tile)
        }
    }

    fn add_tile_features(
        &self,
        tile: &mut Tile,
        level: &Level,
        slots: &[usize],
        x: f64,
        y: f64,
        z2: f64,
    ) {
        let extent = self.config.extent;

        for &slot in slots {
            let record = &level.records[slot];

            let (tags, px, py, id) = match record.origin {
                RecordOrigin::Point(position) if !record.is_cluster() => {
                    let point = &self.points[position];
                    // Unclustered points use their exact coordinates, not the
                    // single-precision copy kept in the record.
                    let (px, py) = match point_coordinates(point) {
                        Some([lng, lat]) => (lng_x(lng), lat_y(lat)),
                        None => (record.x, record.y),
                    };
                    let id = if self.config.generate_id {
                        Some(Id::Number(position.into()))
                    } else {
                        point.id.clone()
                    };
                    (point.properties.clone(), px, py, id)
                }
                _ => (
                    Some(self.cluster_properties(record)),
                    record.x,
                    record.y,
                    record.cluster_id().map(|id| Id::Number(id.into())),
                ),
            };

            tile.features.push(TileFeature {
                feature_type: TILE_POINT_TYPE,
                geometry: vec![[
                    (extent * (px * z2 - x)).round() as i64,
                    (extent * (py * z2 - y)).round() as i64,
                ]],
                tags,
                id,
            });
        }
    }
}
