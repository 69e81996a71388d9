use geocluster::{ClusterConfig, ClusterIndex, LngLatBounds};
use geojson::{Feature, Geometry, JsonObject, JsonValue, Value};
use serde_json::json;

fn city(id: i64, name: &str, lng: f64, lat: f64, population: i64) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("id".to_string(), json!(id));
    properties.insert("name".to_string(), json!(name));
    properties.insert("population".to_string(), json!(population));
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![lng, lat]))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=debug to see per-zoom build timings)
    env_logger::init();

    println!("=== geocluster - Getting Started ===\n");

    let cities = vec![
        city(1, "New York", -74.0060, 40.7128, 8_336_817),
        city(2, "Newark", -74.1724, 40.7357, 311_549),
        city(3, "Jersey City", -74.0776, 40.7282, 292_449),
        city(4, "Philadelphia", -75.1652, 39.9526, 1_584_064),
        city(5, "London", -0.1278, 51.5074, 8_982_000),
        city(6, "Paris", 2.3522, 48.8566, 2_161_000),
        city(7, "Brussels", 4.3517, 50.8503, 1_208_542),
        city(8, "Auckland", 174.7633, -36.8485, 1_657_000),
    ];

    // === BUILD ===
    println!("1. Building the index");
    println!("---------------------");

    let index = ClusterIndex::builder()
        .config(ClusterConfig::default().with_radius(60.0))
        .get_id(|f| f.property("id").and_then(JsonValue::as_i64).unwrap_or(0))
        .map(|properties| {
            let mut acc = JsonObject::new();
            let population = properties
                .and_then(|p| p.get("population"))
                .cloned()
                .unwrap_or(json!(0));
            acc.insert("population".to_string(), population);
            acc
        })
        .reduce(|acc, props| {
            let total = acc.get("population").and_then(JsonValue::as_i64).unwrap_or(0)
                + props.get("population").and_then(JsonValue::as_i64).unwrap_or(0);
            acc.insert("population".to_string(), json!(total));
        })
        .load(cities)?;

    let stats = index.stats();
    println!(
        "   Indexed {} points over {} zoom levels\n",
        stats.indexed_points,
        stats.levels.len()
    );

    // === QUERY BY ZOOM ===
    println!("2. Clusters per zoom");
    println!("--------------------");

    for zoom in [0.0, 3.0, 6.0, 10.0] {
        let features = index.get_clusters(LngLatBounds::world(), zoom);
        println!("   z{}: {} features", zoom, features.len());
        for feature in &features {
            match feature.property("point_count_abbreviated") {
                Some(count) => println!(
                    "     - cluster of {} (population {})",
                    count,
                    feature.property("population").unwrap_or(&JsonValue::Null)
                ),
                None => println!(
                    "     - {}",
                    feature.property("name").unwrap_or(&JsonValue::Null)
                ),
            }
        }
    }
    println!();

    // === NAVIGATE A CLUSTER ===
    println!("3. Navigating a cluster");
    println!("-----------------------");

    let cluster_id = index
        .get_clusters([-80.0, 35.0, -70.0, 45.0], 3.0)
        .into_iter()
        .find_map(|f| f.property("cluster_id").and_then(JsonValue::as_i64));

    if let Some(cluster_id) = cluster_id {
        println!(
            "   Cluster {} expands at zoom {}",
            cluster_id,
            index.get_cluster_expansion_zoom(cluster_id)?
        );
        println!("   Children: {}", index.get_children(cluster_id)?.len());
        for leaf in index.get_leaves(cluster_id, 10, 0)? {
            println!(
                "     - leaf {}",
                leaf.property("name").unwrap_or(&JsonValue::Null)
            );
        }
    }
    println!();

    // === TILES ===
    println!("4. Tiles");
    println!("--------");

    if let Some(tile) = index.get_tile(0, 0, 0) {
        println!("   Tile 0/0/0 has {} features", tile.features.len());
        println!("   {}", tile.to_json()?);
    }

    println!("\n=== Done ===");
    Ok(())
}
