//! Integration tests for the cleanup map against a mock backend.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use trashtag_lka::config::{BackendMode, Config};
use trashtag_lka::device::{Address, DeviceError, Devices, Geocoder};
use trashtag_lka::gateway::RestGateway;
use trashtag_lka::location::{CoordinateSource, Coordinates, LocationFilter, LocationType};
use trashtag_lka::screens::map::MapScreen;
use trashtag_lka::screens::{AppContext, DataSource};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GALLE_FACE: Coordinates = Coordinates {
    latitude: 6.9253,
    longitude: 79.8446,
};

/// Knows one place by name and nothing else.
struct OnePlace;

#[async_trait]
impl Geocoder for OnePlace {
    async fn geocode(&self, label: &str) -> Result<Vec<Coordinates>, DeviceError> {
        Ok(if label == "Galle Face Green" {
            vec![GALLE_FACE]
        } else {
            Vec::new()
        })
    }

    async fn reverse_geocode(&self, _at: Coordinates) -> Result<Vec<Address>, DeviceError> {
        Ok(Vec::new())
    }
}

fn create_test_config(base_url: &str, demo_mode: bool) -> Config {
    Config {
        backend: BackendMode::Rest {
            url: base_url.to_string(),
            anon_key: "anon-key".to_string(),
        },
        demo_mode,
        ..Config::for_testing()
    }
}

fn screen(server: &MockServer, demo_mode: bool) -> MapScreen {
    let config = create_test_config(&server.uri(), demo_mode);
    let gateway = RestGateway::new(&config).unwrap();
    let devices = Devices {
        geocoder: Arc::new(OnePlace),
        ..Devices::headless()
    };
    MapScreen::new(AppContext::new(Arc::new(gateway), config), &devices).with_seed(7)
}

fn row(id: &str, location: &str, caption: &str, author: Option<&str>) -> serde_json::Value {
    json!({
        "id": id,
        "user_id": "u1",
        "image_url": format!("https://cdn.example.com/{id}.jpg"),
        "caption": caption,
        "location": location,
        "created_at": "2024-01-15T10:00:00+00:00",
        "profiles": author.map(|name| json!({"name": name}))
    })
}

async fn mount_posts(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/posts"))
        .and(query_param("location", "not.is.null"))
        .and(query_param("order", "created_at.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_pins_are_geocoded_or_approximate() {
    let server = MockServer::start().await;
    mount_posts(
        &server,
        json!([
            row("p1", "Galle Face Green", "Picked up 3 bags of plastic", Some("Maya S.")),
            row("p2", "Mount Lavinia Beach", "Shoreline sweep", None),
            row("p3", "Viharamahadevi Park", "Weekend cleanup", Some("  ")),
            row("p4", "  ", "No place given", None),
        ]),
    )
    .await;

    let mut map = screen(&server, true);
    map.load().await.unwrap();

    assert_eq!(map.source(), Some(DataSource::Remote));
    let locations = map.locations();
    assert_eq!(locations.len(), 3);

    assert_eq!(locations[0].coordinate_source, CoordinateSource::Geocoded);
    assert_eq!(locations[0].coordinates, GALLE_FACE);
    assert_eq!(locations[0].contributor, "Maya S.");
    assert_eq!(locations[0].kind, LocationType::Street);

    let reference = Config::for_testing().map_reference;
    for approximate in &locations[1..] {
        assert_eq!(approximate.coordinate_source, CoordinateSource::Approximate);
        assert!((approximate.coordinates.latitude - reference.latitude).abs() <= 0.25);
        assert!((approximate.coordinates.longitude - reference.longitude).abs() <= 0.25);
        assert_eq!(approximate.contributor, "Anonymous User");
    }
    assert_eq!(locations[1].kind, LocationType::Beach);
    assert_eq!(locations[2].kind, LocationType::Park);

    let stats = map.stats();
    assert_eq!((stats.total, stats.beaches, stats.parks), (3, 1, 1));

    map.set_filter(LocationFilter::Only(LocationType::Beach));
    assert_eq!(map.visible().map(|l| l.id.as_str()).collect::<Vec<_>>(), vec!["p2"]);
}

#[tokio::test]
async fn test_empty_map_shows_demo_pins_in_demo_mode() {
    let server = MockServer::start().await;
    mount_posts(&server, json!([])).await;

    let mut map = screen(&server, true);
    map.load().await.unwrap();
    assert_eq!(map.source(), Some(DataSource::Fallback));
    assert!(!map.locations().is_empty());
    assert!(map
        .locations()
        .iter()
        .all(|l| l.coordinate_source == CoordinateSource::Demo));
}

#[tokio::test]
async fn test_empty_map_stays_empty_without_demo_mode() {
    let server = MockServer::start().await;
    mount_posts(&server, json!([])).await;

    let mut map = screen(&server, false);
    map.load().await.unwrap();
    assert_eq!(map.source(), Some(DataSource::Remote));
    assert!(map.locations().is_empty());
    assert_eq!(map.stats().total, 0);
}
