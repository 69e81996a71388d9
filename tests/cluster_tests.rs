use geocluster::{ClusterConfig, ClusterError, ClusterIndex, ClusterKey, LngLatBounds};
use geojson::feature::Id;
use geojson::{Feature, Geometry, JsonObject, JsonValue, Value};
use serde_json::json;

fn point(point_id: i64, lng: f64, lat: f64, value: i64) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("pointId".to_string(), json!(point_id));
    properties.insert("name".to_string(), json!(format!("place {}", point_id)));
    properties.insert("value".to_string(), json!(value));
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
        .properties
        .as_ref()
        .and_then(|p| p.get("pointId"))
        .and_then(JsonValue::as_i64)
        .unwrap_or(-1)
}

/// Deterministic pseudo-random points around the Caribbean.
fn scattered_points(n: usize) -> Vec<Feature> {
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = || {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (state >> 11) as f64 / (1u64 << 53) as f64
    };

    // Reverse id order so loading has to sort.
    (0..n)
        .rev()
        .map(|i| {
            let lng = -90.0 + next() * 30.0;
            let lat = 10.0 + next() * 20.0;
            point(i as i64, lng, lat, (i % 7) as i64 + 1)
        })
        .collect()
}

fn build(config: ClusterConfig, points: Vec<Feature>) -> ClusterIndex {
    let _ = env_logger::builder().is_test(true).try_init();
    ClusterIndex::builder()
        .config(config)
        .get_id(point_id)
        .load(points)
        .expect("Failed to build index")
}

fn property_i64(feature: &Feature, name: &str) -> Option<i64> {
    feature.property(name).and_then(JsonValue::as_i64)
}

fn is_cluster(feature: &Feature) -> bool {
    feature.contains_property("cluster")
}

fn weight(feature: &Feature) -> usize {
    if is_cluster(feature) {
        property_i64(feature, "point_count").unwrap() as usize
    } else {
        1
    }
}

#[test]
fn test_zoom_zero_tile_matches_hand_computed_hierarchy() {
    // Half a degree apart: merged from zoom 5 down, the third point stays alone.
    let points = vec![
        point(0, 0.0, 0.0, 1),
        point(1, 0.5, 0.0, 1),
        point(2, 100.0, 45.0, 1),
    ];
    let index = build(ClusterConfig::default(), points);

    let tile = index.get_tile(0, 0, 0).expect("tile should not be empty");
    assert_eq!(tile.features.len(), 2);

    let cluster = &tile.features[0];
    let cluster_id = ClusterKey::new(0, 6).unwrap().to_id();
    assert_eq!(cluster.geometry, vec![[256, 256]]);
    assert_eq!(cluster.id, Some(Id::Number(cluster_id.into())));
    let tags = cluster.tags.as_ref().unwrap();
    assert_eq!(tags["cluster"], json!(true));
    assert_eq!(tags["cluster_id"], json!(cluster_id));
    assert_eq!(tags["point_count"], json!(2));
    assert_eq!(tags["point_count_abbreviated"], json!(2));

    let single = &tile.features[1];
    assert!(!single.is_cluster());
    assert_eq!(single.geometry, vec![[398, 184]]);
    assert_eq!(single.id, None);
    assert_eq!(single.tags.as_ref().unwrap()["pointId"], json!(2));
}

#[test]
fn test_tile_serializes_to_vector_tile_shape() {
    let index = build(
        ClusterConfig::default(),
        vec![point(0, 0.0, 0.0, 1), point(1, 0.5, 0.0, 1)],
    );
    let tile = index.get_tile(0, 0, 0).unwrap();
    let json: JsonValue = serde_json::from_str(&tile.to_json().unwrap()).unwrap();

    assert_eq!(json["features"][0]["type"], json!(1));
    assert_eq!(json["features"][0]["geometry"], json!([[256, 256]]));
    assert_eq!(json["features"][0]["tags"]["point_count"], json!(2));
}

#[test]
fn test_min_points_is_monotonic() {
    // Groups of 1..=6 identical points, far enough apart to never interact.
    let mut points = Vec::new();
    let mut id = 0;
    for (group, lng) in [-150.0, -100.0, -50.0, 0.0, 50.0, 100.0].iter().enumerate() {
        for _ in 0..=group {
            points.push(point(id, *lng, 0.0, 1));
            id += 1;
        }
    }

    let mut previous: Option<Vec<(usize, usize)>> = None;
    for min_points in 2..=7 {
        let index = build(
            ClusterConfig::default()
                .with_zoom_range(0, 8)
                .with_min_points(min_points),
            points.clone(),
        );
        let per_zoom: Vec<(usize, usize)> = (0..=9)
            .map(|zoom| {
                let features = index.get_clusters(LngLatBounds::world(), zoom as f64);
                let clusters = features.iter().filter(|f| is_cluster(f)).count();
                (clusters, features.len())
            })
            .collect();

        let expected_clusters = (1..=6).filter(|&size| size >= min_points).count();
        assert_eq!(per_zoom[0].0, expected_clusters);

        if let Some(previous) = &previous {
            for (zoom, (now, before)) in per_zoom.iter().zip(previous).enumerate() {
                assert!(now.0 <= before.0, "more clusters at z{}", zoom);
                assert!(now.1 >= before.1, "fewer features at z{}", zoom);
            }
        }
        previous = Some(per_zoom);
    }
}

#[test]
fn test_point_counts_are_conserved_at_every_zoom() {
    let index = build(ClusterConfig::default(), scattered_points(300));

    for zoom in 0..=17 {
        let features = index.get_clusters(LngLatBounds::world(), zoom as f64);
        let total: usize = features.iter().map(weight).sum();
        assert_eq!(total, 300, "zoom {}", zoom);
    }

    let stats = index.stats();
    assert_eq!(stats.points, 300);
    assert_eq!(stats.indexed_points, 300);
    assert_eq!(stats.levels.len(), 18);
    assert_eq!(stats.levels[0].zoom, 17);
    assert_eq!(stats.levels[0].records, 300);
    assert_eq!(stats.levels[0].clusters, 0);
}

#[test]
fn test_children_sum_to_parent_count() {
    let index = build(ClusterConfig::default(), scattered_points(300));

    for zoom in 0..5 {
        for cluster in index
            .get_clusters(LngLatBounds::world(), zoom as f64)
            .iter()
            .filter(|f| is_cluster(f))
        {
            let id = property_i64(cluster, "cluster_id").unwrap();
            let children = index.get_children(id).unwrap();
            assert!(!children.is_empty());
            let sum: usize = children.iter().map(weight).sum();
            assert_eq!(sum, weight(cluster));
        }
    }
}

#[test]
fn test_leaves_pagination_is_a_depth_first_window() {
    // A 4x3 grid small enough to end up in one cluster at zoom 0.
    let mut points = Vec::new();
    for i in 0..12 {
        let lng = 10.0 + (i % 4) as f64 * 0.05;
        let lat = 10.0 + (i / 4) as f64 * 0.05;
        points.push(point(i, lng, lat, 1));
    }
    let index = build(ClusterConfig::default(), points);

    let top = index.get_clusters(LngLatBounds::world(), 0.0);
    assert_eq!(top.len(), 1);
    let id = property_i64(&top[0], "cluster_id").unwrap();

    let all: Vec<i64> = index
        .get_leaves(id, usize::MAX, 0)
        .unwrap()
        .iter()
        .map(point_id)
        .collect();
    assert_eq!(all.len(), 12);
    let mut sorted = all.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, (0..12).collect::<Vec<_>>());

    for offset in 0..=13 {
        for limit in 0..=13 {
            let page: Vec<i64> = index
                .get_leaves(id, limit, offset)
                .unwrap()
                .iter()
                .map(point_id)
                .collect();
            let start = offset.min(12);
            let end = (offset + limit).min(12);
            assert_eq!(page, &all[start..end], "limit {} offset {}", limit, offset);
        }
    }
}

#[test]
fn test_leaves_keep_null_properties() {
    let mut points = vec![point(0, 20.0, 20.0, 1), point(1, 20.01, 20.0, 1)];
    points.push(Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![20.005, 20.0]))),
        id: None,
        properties: None,
        foreign_members: None,
    });
    let index = build(ClusterConfig::default(), points);

    let top = index.get_clusters(LngLatBounds::world(), 0.0);
    assert_eq!(top.len(), 1);
    let id = property_i64(&top[0], "cluster_id").unwrap();

    let leaves = index.get_leaves(id, 10, 0).unwrap();
    assert_eq!(leaves.len(), 3);
    assert_eq!(leaves.iter().filter(|f| f.properties.is_none()).count(), 1);
}

#[test]
fn test_expansion_zoom_of_two_points() {
    // One degree apart: within the radius up to zoom 4, separate from zoom 5.
    let index = build(
        ClusterConfig::default(),
        vec![point(0, 0.0, 0.0, 1), point(1, 1.0, 0.0, 1)],
    );

    let top = index.get_clusters(LngLatBounds::world(), 0.0);
    assert_eq!(top.len(), 1);
    let id = property_i64(&top[0], "cluster_id").unwrap();
    assert_eq!(ClusterKey::from_id(id).unwrap().origin_zoom(), 5);

    assert_eq!(index.get_cluster_expansion_zoom(id).unwrap(), 5);
    assert_eq!(index.get_clusters(LngLatBounds::world(), 4.0).len(), 1);
    assert_eq!(index.get_clusters(LngLatBounds::world(), 5.0).len(), 2);
    assert_eq!(index.get_children(id).unwrap().len(), 2);
}

#[test]
fn test_expansion_zoom_stops_after_max_zoom() {
    let index = build(
        ClusterConfig::default().with_zoom_range(0, 4),
        vec![point(0, 5.0, 5.0, 1), point(1, 5.0, 5.0, 1)],
    );

    let top = index.get_clusters(LngLatBounds::world(), 0.0);
    let id = property_i64(&top[0], "cluster_id").unwrap();
    assert_eq!(index.get_cluster_expansion_zoom(id).unwrap(), 5);
}

#[test]
fn test_expansion_zoom_reveals_multiple_features() {
    let index = build(ClusterConfig::default(), scattered_points(200));

    for cluster in index
        .get_clusters(LngLatBounds::world(), 0.0)
        .iter()
        .filter(|f| is_cluster(f))
    {
        let id = property_i64(cluster, "cluster_id").unwrap();
        let zoom = index.get_cluster_expansion_zoom(id).unwrap();
        assert!(zoom >= 1 && zoom <= 17);
    }
}

#[test]
fn test_reduce_aggregates_cluster_properties() {
    let index = ClusterIndex::builder()
        .config(ClusterConfig::default().with_radius(100.0))
        .get_id(point_id)
        .map(|properties| {
            let mut mapped = JsonObject::new();
            let value = properties
                .and_then(|p| p.get("value"))
                .cloned()
                .unwrap_or(json!(0));
            mapped.insert("sum".to_string(), value);
            mapped
        })
        .reduce(|accumulated, other| {
            let total = accumulated.get("sum").and_then(JsonValue::as_i64).unwrap_or(0)
                + other.get("sum").and_then(JsonValue::as_i64).unwrap_or(0);
            accumulated.insert("sum".to_string(), json!(total));
        })
        .load(scattered_points(250))
        .unwrap();

    let mut checked = 0;
    for zoom in 0..=6 {
        for cluster in index
            .get_clusters(LngLatBounds::world(), zoom as f64)
            .iter()
            .filter(|f| is_cluster(f))
        {
            let id = property_i64(cluster, "cluster_id").unwrap();
            let expected: i64 = index
                .get_leaves(id, usize::MAX, 0)
                .unwrap()
                .iter()
                .map(|leaf| property_i64(leaf, "value").unwrap())
                .sum();
            assert_eq!(property_i64(cluster, "sum"), Some(expected));
            checked += 1;
        }
    }
    assert!(checked > 0);
    assert!(index.stats().aggregated_properties > 0);

    let tile = index.get_tile(0, 0, 0).unwrap();
    assert!(
        tile.features
            .iter()
            .filter(|f| f.is_cluster())
            .all(|f| f.tags.as_ref().unwrap().contains_key("sum"))
    );
}

#[test]
fn test_generate_id_uses_store_positions() {
    let index = build(
        ClusterConfig::default().with_generate_id(true),
        scattered_points(100),
    );

    // Tiles covering the generated area at zoom 5, where most points are unclustered.
    let mut ids = Vec::new();
    for x in 8..=10 {
        for y in 13..=15 {
            let Some(tile) = index.get_tile(5, x, y) else {
                continue;
            };
            ids.extend(
                tile.features
                    .into_iter()
                    .filter(|f| !f.is_cluster())
                    .map(|f| f.id.expect("point should have a generated id")),
            );
        }
    }
    assert!(!ids.is_empty());
    for id in ids {
        match id {
            Id::Number(n) => assert!(n.as_u64().unwrap() < 100),
            Id::String(_) => panic!("expected numeric id"),
        }
    }

    // Points are sorted by id on load, so position equals pointId here.
    for feature in index.get_clusters(LngLatBounds::world(), 17.0) {
        assert_eq!(feature.id, Some(Id::Number(point_id(&feature).into())));
    }
}

#[test]
fn test_same_location_points_cluster_at_max_zoom() {
    let index = build(
        ClusterConfig::default()
            .with_zoom_range(0, 20)
            .with_extent(8192.0)
            .with_radius(16.0),
        vec![
            point(0, -1.426798, 53.943034, 1),
            point(1, -1.426798, 53.943034, 1),
        ],
    );

    let z20 = index
        .stats()
        .levels
        .into_iter()
        .find(|level| level.zoom == 20)
        .unwrap();
    assert_eq!(z20.records, 1);
    assert_eq!(z20.clusters, 1);
}

#[test]
fn test_load_geojson_text() {
    let text = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"pointId": 1}, "geometry": {"type": "Point", "coordinates": [2.35, 48.85]}},
            {"type": "Feature", "properties": {"pointId": 2}, "geometry": {"type": "Point", "coordinates": [2.36, 48.86]}},
            {"type": "Feature", "properties": {"pointId": 3}, "geometry": null}
        ]
    }"#;

    let mut index = ClusterIndex::builder().get_id(point_id).build().unwrap();
    index.load_geojson(text).unwrap();

    let stats = index.stats();
    assert_eq!(stats.points, 3);
    assert_eq!(stats.indexed_points, 2);
    assert_eq!(index.get_clusters(LngLatBounds::world(), 0.0).len(), 1);

    assert!(matches!(
        index.load_geojson("not json"),
        Err(ClusterError::InvalidInput(_))
    ));
}
