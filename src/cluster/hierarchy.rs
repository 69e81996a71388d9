//! Greedy agglomerative clustering of one zoom level into the next coarser one.
//!
//! Seeds are visited in ascending table order. Each unvisited seed claims every
//! still-unvisited record within the zoom's radius; if the claimed point count
//! reaches `min_points` they collapse into one weighted-centroid cluster,
//! otherwise the seed and its claimed neighbors are carried to the coarser
//! level unchanged.
//!
//! `visited_zoom` and `parent` on the source level are written here and nowhere
//! else. Each record is visited exactly once per coarser zoom, and a level is
//! only published to readers after its whole coarser chain is built.

use super::{Aggregator, Level, LevelRecord, RecordOrigin};
use crate::codec::ClusterKey;
use crate::config::ClusterConfig;
use crate::error::Result;
use geojson::{Feature, JsonObject};

/// Build the level at `zoom` from `source`, the level at `zoom + 1`.
pub(crate) fn cluster_level(
    config: &ClusterConfig,
    aggregator: Option<&Aggregator>,
    points: &[Feature],
    cluster_props: &mut Vec<JsonObject>,
    source: &mut Level,
    zoom: u8,
) -> Result<Level> {
    let radius = config.radius_at(i32::from(zoom));
    let origin_zoom = zoom + 1;
    let records = &mut source.records;
    let mut next = Vec::new();

    for i in 0..records.len() {
        if records[i].visited_at(zoom) {
            continue;
        }
        records[i].visited_zoom = Some(zoom);

        let (x, y) = (records[i].x, records[i].y);
        let seed_count = records[i].point_count;
        let neighbors = source.tree.within(x, y, radius);

        let num_points = seed_count
            + neighbors
                .iter()
                .filter(|&&k| !records[k].visited_at(zoom))
                .map(|&k| records[k].point_count)
                .sum::<usize>();

        if num_points > seed_count && num_points >= config.min_points {
            let key = ClusterKey::new(i, origin_zoom)?;
            let id = key.to_id();

            let mut wx = x * seed_count as f64;
            let mut wy = y * seed_count as f64;
            let mut accumulated: Option<JsonObject> = None;

            for &k in &neighbors {
                if records[k].visited_at(zoom) {
                    continue;
                }
                records[k].visited_zoom = Some(zoom);
                records[k].parent = Some(id);

                let weight = records[k].point_count as f64;
                wx += records[k].x * weight;
                wy += records[k].y * weight;

                if let Some(aggregator) = aggregator {
                    let table: &[JsonObject] = cluster_props;
                    let acc = accumulated.get_or_insert_with(|| {
                        aggregator.properties_of(&records[i], points, table)
                    });
                    let properties = aggregator.properties_of(&records[k], points, table);
                    aggregator.reduce(acc, &properties);
                }
            }

            records[i].parent = Some(id);

            let props_index = accumulated.map(|acc| {
                cluster_props.push(acc);
                cluster_props.len() - 1
            });

            let count = num_points as f64;
            next.push(LevelRecord {
                x: wx / count,
                y: wy / count,
                visited_zoom: None,
                origin: RecordOrigin::Cluster(key),
                parent: None,
                point_count: num_points,
                props_index,
            });
        } else {
            next.push(carried(&records[i]));

            if num_points > seed_count {
                for &k in &neighbors {
                    if records[k].visited_at(zoom) {
                        continue;
                    }
                    records[k].visited_zoom = Some(zoom);
                    next.push(carried(&records[k]));
                }
            }
        }
    }

    Ok(Level::from_records(next))
}

/// Copy of a record that survives unmerged into the coarser level.
fn carried(record: &LevelRecord) -> LevelRecord {
    LevelRecord {
        visited_zoom: None,
        parent: None,
        ..record.clone()
    }
}
