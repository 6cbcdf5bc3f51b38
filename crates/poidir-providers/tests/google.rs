//! Integration tests for `GoogleClient` using wiremock HTTP mocks.

use std::time::Duration;

use poidir_core::{ApiKeys, CategoryCode, Coordinate, Preferences};
use poidir_providers::{Geocoder, GoogleClient, HttpSettings, PlacesProvider, SearchRequest};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CHARLOTTE: Coordinate = Coordinate::new(35.22, -80.84);

fn test_client(base_url: &str, open_now: bool) -> GoogleClient {
    test_client_with(base_url, open_now, HttpSettings::default())
}

fn test_client_with(base_url: &str, open_now: bool, settings: HttpSettings) -> GoogleClient {
    let prefs = Preferences {
        open_now,
        api_keys: ApiKeys {
            google: Some("google-key".to_string()),
            ..ApiKeys::default()
        },
        ..Preferences::default()
    };
    let (_tx, rx) = watch::channel(prefs);
    GoogleClient::with_base_url(settings, rx, base_url)
        .expect("client construction should not fail")
}

fn results_body() -> serde_json::Value {
    serde_json::json!({
        "status": "OK",
        "results": [
            {
                "name": "Mert's Heart and Soul",
                "formatted_address": "214 N College St, Charlotte, NC 28202, United States",
                "geometry": { "location": { "lat": 35.2275, "lng": -80.8414 } },
                "types": ["restaurant", "food"],
                "place_id": "ChIJmerts"
            },
            {
                "name": "Fahrenheit",
                "vicinity": "222 S Caldwell St, Charlotte",
                "geometry": { "location": { "lat": 35.2215, "lng": -80.8397 } },
                "types": ["bar"],
                "place_id": "ChIJfahrenheit"
            }
        ]
    })
}

#[tokio::test]
async fn typed_query_uses_text_search_with_type_and_opennow() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/place/textsearch/json"))
        .and(query_param("key", "google-key"))
        .and(query_param("query", "restaurants"))
        .and(query_param("location", "35.22,-80.84"))
        .and(query_param("radius", "16090"))
        .and(query_param("type", "restaurant"))
        .and(query_param("opennow", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(results_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), true);
    let request = SearchRequest::new("restaurants", CHARLOTTE, CategoryCode::new("restaurant"));
    let places = client.search(&request).await.expect("not cancelled");

    assert_eq!(places.len(), 2);
    assert_eq!(places[0].address.city, "Charlotte");
    assert_eq!(places[0].address.zip, "28202");
    assert_eq!(places[0].provider_place_id.as_deref(), Some("ChIJmerts"));
    assert_eq!(places[1].address.street, "222 S Caldwell St");
}

#[tokio::test]
async fn blank_query_uses_nearby_search() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/place/nearbysearch/json"))
        .and(query_param("type", "cafe"))
        .and(query_param_is_missing("query"))
        .and(query_param_is_missing("opennow"))
        .respond_with(ResponseTemplate::new(200).set_body_json(results_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), false);
    let request = SearchRequest::new("", CHARLOTTE, CategoryCode::new("cafe"));
    let places = client.search(&request).await.expect("not cancelled");

    assert_eq!(places.len(), 2);
}

#[tokio::test]
async fn free_text_results_are_filtered_locally() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/place/textsearch/json"))
        .and(query_param_is_missing("type"))
        .respond_with(ResponseTemplate::new(200).set_body_json(results_body()))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), false);
    let request = SearchRequest::new("bar", CHARLOTTE, None);
    let places = client.search(&request).await.expect("not cancelled");

    assert_eq!(places.len(), 1);
    assert_eq!(places[0].name, "Fahrenheit");
}

#[tokio::test]
async fn request_denied_degrades_to_empty_results() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/place/textsearch/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "REQUEST_DENIED",
            "error_message": "The provided API key is invalid.",
            "results": []
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), false);
    let request = SearchRequest::new("coffee", CHARLOTTE, None);

    assert_eq!(client.search(&request).await, Ok(Vec::new()));
}

#[tokio::test]
async fn invalid_coordinate_makes_no_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(results_body()))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), false);
    let request = SearchRequest::new("coffee", Coordinate::UNSET, None);

    assert_eq!(client.search(&request).await, Ok(Vec::new()));
}

#[tokio::test]
async fn autocomplete_returns_prediction_descriptions() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/place/autocomplete/json"))
        .and(query_param("input", "starb"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "OK",
            "predictions": [
                { "description": "Starbucks, South Tryon Street, Charlotte, NC, USA" },
                { "description": "Starbucks, Providence Road, Charlotte, NC, USA" }
            ]
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), false);
    let suggestions = client
        .autocomplete("starb", &CancellationToken::new())
        .await
        .expect("not cancelled");

    assert_eq!(suggestions.len(), 2);
    assert!(suggestions[0].starts_with("Starbucks, South Tryon"));
}

#[tokio::test]
async fn details_request_named_fields() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/place/details/json"))
        .and(query_param("place_id", "ChIJmerts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "OK",
            "result": {
                "name": "Mert's Heart and Soul",
                "formatted_address": "214 N College St, Charlotte, NC 28202, USA",
                "formatted_phone_number": "(704) 342-4222",
                "website": "https://mertscharlotte.example",
                "opening_hours": { "weekday_text": ["Monday: 11:00 AM – 9:00 PM", "Tuesday: Closed"] },
                "place_id": "ChIJmerts"
            }
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), false);
    let record = client.details("ChIJmerts").await.expect("details");

    assert_eq!(record.phone.as_deref(), Some("(704) 342-4222"));
    assert_eq!(record.hours.len(), 2);
    assert_eq!(record.address.country, "USA");
}

#[tokio::test]
async fn geocode_and_reverse_geocode() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geocode/json"))
        .and(query_param("address", "Charlotte, NC"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "OK",
            "results": [{
                "formatted_address": "Charlotte, NC, USA",
                "geometry": { "location": { "lat": 35.2271, "lng": -80.8431 } }
            }]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/geocode/json"))
        .and(query_param("latlng", "35.22,-80.84"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "OK",
            "results": [{
                "formatted_address": "600 E Trade St, Charlotte, NC 28202, USA",
                "geometry": { "location": { "lat": 35.22, "lng": -80.84 } }
            }]
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), false);

    assert_eq!(
        client.coordinates("Charlotte, NC").await,
        Some(Coordinate::new(35.2271, -80.8431))
    );
    assert_eq!(
        client.address(CHARLOTTE).await.as_deref(),
        Some("600 E Trade St, Charlotte, NC 28202, USA")
    );
}

#[tokio::test]
async fn zero_results_geocode_is_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geocode/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "ZERO_RESULTS",
            "results": []
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), false);
    assert!(client.coordinates("nowhere at all").await.is_none());
}

#[tokio::test]
async fn request_timeout_yields_empty_results() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/place/textsearch/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(results_body())
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let settings = HttpSettings {
        request_timeout: Duration::from_secs(1),
        ..HttpSettings::default()
    };
    let client = test_client_with(&server.uri(), false, settings);
    let request = SearchRequest::new("soul food", CHARLOTTE, None);
    let places = client.search(&request).await.expect("timeout is not a cancellation");

    assert!(places.is_empty());
}
