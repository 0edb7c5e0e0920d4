//! Live Valhalla round trip over a real Nevada extract.
//!
//! Requires docker and a one-time Geofabrik download + tile build, so the
//! tests are ignored by default:
//!     cargo test --test valhalla_integration -- --ignored

use std::env;

use testcontainers::core::{IntoContainerPort, Mount};
use testcontainers::runners::SyncRunner;
use testcontainers::{Container, GenericImage, ImageExt, ReuseDirective, TestcontainersError};

use trip_planner::traits::{DistanceProvider, RoutePlanner};
use trip_planner::valhalla::{ValhallaClient, ValhallaConfig};
use trip_planner::valhalla_data::{
    GeofabrikRegion, VALHALLA_IMAGE, ValhallaDataset, ValhallaDatasetConfig,
};

fn valhalla_container() -> Result<(Container<GenericImage>, String), TestcontainersError> {
    let data_root = env::var("VALHALLA_DATA_DIR").unwrap_or_else(|_| "valhalla-data".to_string());
    let region = GeofabrikRegion::new("north-america/us/nevada");
    let config = ValhallaDatasetConfig::new(region, data_root);
    let dataset = ValhallaDataset::ensure(&config)
        .map_err(|err| TestcontainersError::other(format!("Valhalla prep failed: {err:?}")))?;

    let image = GenericImage::new(VALHALLA_IMAGE, "latest")
        .with_exposed_port(8002.tcp())
        .with_mount(Mount::bind_mount(
            dataset.data_dir.to_string_lossy().to_string(),
            "/data",
        ))
        .with_cmd(vec!["valhalla_service", "/data/valhalla.json", "1"])
        .with_container_name("valhalla-nevada")
        .with_startup_timeout(std::time::Duration::from_secs(60))
        .with_reuse(ReuseDirective::Always);

    let container = image.start()?;
    let port = container.get_host_port_ipv4(8002.tcp())?;
    let base_url = format!("http://127.0.0.1:{port}");

    Ok((container, base_url))
}

#[test]
#[ignore = "requires docker and a Geofabrik download"]
fn pair_cost_and_route_against_live_valhalla() {
    let (container, base_url) = valhalla_container().expect("start Valhalla container");

    let config = ValhallaConfig {
        base_url,
        ..ValhallaConfig::default()
    };
    let client = ValhallaClient::new(config).expect("build Valhalla client");

    let strip = (36.114647, -115.172813);
    let fremont = (36.170727, -115.144566);
    let sign = (36.082157, -115.172661);

    let cost = {
        let start = std::time::Instant::now();
        let mut last = None;
        while start.elapsed() < std::time::Duration::from_secs(30) {
            match client.pair_cost(strip, fremont) {
                Ok(cost) => {
                    last = Some(cost);
                    break;
                }
                Err(_) => std::thread::sleep(std::time::Duration::from_millis(500)),
            }
        }
        last.expect("Valhalla never became ready")
    };

    // Strip to Fremont is roughly 10 km by road.
    assert!(cost.distance > 5.0 && cost.distance < 20.0, "got {cost:?}");
    assert!(cost.duration > 0.0);

    let route = client
        .plan_route(&[strip, fremont, sign, strip])
        .expect("route waypoints");
    assert!(route.distance > 0.0);
    assert!(route.duration > 0.0);
    assert_eq!(route.geometry.len(), 3, "one leg per waypoint pair");
    assert!(route.geometry.iter().all(|leg| !leg.points().is_empty()));

    drop(container);
}
