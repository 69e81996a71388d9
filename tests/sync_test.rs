use geocluster::{ClusterIndex, LngLatBounds, SyncClusterIndex};
use geojson::{Feature, Geometry, JsonObject, JsonValue, Value};
use serde_json::json;
use std::thread;

fn point(point_id: i64, lng: f64, lat: f64) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("pointId".to_string(), json!(point_id));
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![lng, lat]))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn point_id(feature: &Feature) -> i64 {
    feature
        .property("pointId")
        .and_then(JsonValue::as_i64)
        .unwrap_or(-1)
}

fn loaded_index(n: i64) -> SyncClusterIndex {
    let index = ClusterIndex::builder().get_id(point_id).build().unwrap();
    let index = SyncClusterIndex::new(index);
    let points = (0..n)
        .map(|i| point(i, -10.0 + (i % 20) as f64 * 0.5, 40.0 + (i / 20) as f64 * 0.5))
        .collect();
    index.load(points).unwrap();
    index
}

#[test]
fn test_concurrent_queries() {
    let index = loaded_index(200);
    let expected = index.get_clusters(LngLatBounds::world(), 3.0).len();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let index = index.clone();
            thread::spawn(move || {
                for _ in 0..50 {
                    assert_eq!(index.get_clusters(LngLatBounds::world(), 3.0).len(), expected);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_concurrent_inserts() {
    let index = loaded_index(100);

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let index = index.clone();
            thread::spawn(move || {
                for j in 0..25 {
                    let id = 1000 + t * 25 + j;
                    index.insert_point(&point(id, 20.0 + j as f64 * 0.1, -5.0));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let stats = index.stats();
    assert_eq!(stats.points, 200);
    assert_eq!(stats.indexed_points, 200);
    assert_eq!(stats.stale_points, 100);
}

#[test]
fn test_reads_and_updates() {
    let index = loaded_index(100);
    let mut handles = vec![];

    for _ in 0..4 {
        let index = index.clone();
        handles.push(thread::spawn(move || {
            for _ in 0..25 {
                let clusters = index.get_clusters(LngLatBounds::world(), 0.0);
                let total: u64 = clusters
                    .iter()
                    .map(|f| f.property("point_count").and_then(JsonValue::as_u64).unwrap_or(1))
                    .sum();
                assert_eq!(total, 100);
            }
        }));
    }

    for i in 0..2 {
        let index = index.clone();
        handles.push(thread::spawn(move || {
            for j in 0..10 {
                let update = json!({"properties": {"writer": i, "round": j}});
                index.update_point_properties(i * 10 + j, &update).unwrap();
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    let guard = index.read();
    let updated = guard
        .get_clusters(LngLatBounds::world(), 17.0)
        .into_iter()
        .filter(|f| f.contains_property("writer"))
        .count();
    assert_eq!(updated, 20);
}

#[test]
fn test_cluster_navigation_through_handle() {
    let index = loaded_index(100);
    let cluster = index
        .get_clusters(LngLatBounds::world(), 0.0)
        .into_iter()
        .find(|f| f.contains_property("cluster"))
        .expect("points should cluster at zoom 0");
    let id = cluster.property("cluster_id").and_then(JsonValue::as_i64).unwrap();
    let count = cluster.property("point_count").and_then(JsonValue::as_u64).unwrap();

    assert!(!index.get_children(id).unwrap().is_empty());
    assert_eq!(index.get_leaves(id, usize::MAX, 0).unwrap().len() as u64, count);
    assert!(index.get_cluster_expansion_zoom(id).unwrap() >= 1);
    assert!(index.get_tile(0, 0, 0).is_some());
}
