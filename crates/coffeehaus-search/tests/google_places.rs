use axum::extract::Query;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use std::collections::HashMap;

use coffeehaus_search::{GooglePlacesClient, PlacesClient};
use coffeehaus_types::models::LatLng;

async fn spawn_mock() -> String {
    let app = Router::new()
        .route(
            "/place/nearbysearch/json",
            get(|| async {
                Json(json!({
                    "status": "OK",
                    "results": [
                        { "place_id": "a", "name": "Portola Coffee" },
                        { "place_id": "broken", "name": "Broken Cafe" }
                    ]
                }))
            }),
        )
        .route(
            "/place/textsearch/json",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                if q.get("query").map(String::as_str) == Some("nothing here") {
                    return Json(json!({ "status": "ZERO_RESULTS", "results": [] }));
                }
                Json(json!({
                    "status": "OK",
                    "results": [
                        { "place_id": "a", "name": "Portola Coffee" },
                        { "place_id": "b", "name": "Some Other Place" }
                    ]
                }))
            }),
        )
        .route(
            "/place/autocomplete/json",
            get(|| async {
                Json(json!({
                    "status": "OK",
                    "predictions": [{ "structured_formatting": { "main_text": "Portola Coffee" } }]
                }))
            }),
        )
        .route("/place/details/json", get(details))
        .route(
            "/geocode/json",
            get(|| async {
                Json(json!({
                    "status": "OK",
                    "results": [{ "formatted_address": "Costa Mesa, CA, USA" }]
                }))
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn details(Query(q): Query<HashMap<String, String>>) -> Json<Value> {
    let id = q.get("place_id").cloned().unwrap_or_default();
    if id == "broken" {
        return Json(json!({ "status": "NOT_FOUND" }));
    }
    let name = if id == "a" { "Portola Coffee" } else { "Some Other Place" };
    Json(json!({
        "status": "OK",
        "result": {
            "place_id": id,
            "name": name,
            "formatted_address": "3313 Hyland Ave, Costa Mesa, CA",
            "geometry": { "location": { "lat": 33.69, "lng": -117.92 } },
            "rating": 4.7
        }
    }))
}

#[tokio::test]
async fn nearby_skips_places_without_details() {
    let client = GooglePlacesClient::with_base_url("test-key", spawn_mock().await);
    let shops = client.nearby(LatLng::new(33.69, -117.92), 5000).await.unwrap();
    assert_eq!(shops.len(), 1);
    assert_eq!(shops[0].name, "Portola Coffee");
    assert_eq!(shops[0].rating, 4.7);
}

#[tokio::test]
async fn specific_keeps_only_matching_names() {
    let client = GooglePlacesClient::with_base_url("test-key", spawn_mock().await);
    let shops = client.specific("portola", "Costa Mesa").await.unwrap();
    assert_eq!(shops.len(), 1);
    assert_eq!(shops[0].place_id, "a");
}

#[tokio::test]
async fn zero_results_is_empty() {
    let client = GooglePlacesClient::with_base_url("test-key", spawn_mock().await);
    assert!(client.text_search("nothing here").await.unwrap().is_empty());
}

#[tokio::test]
async fn reverse_geocode_returns_first_address() {
    let client = GooglePlacesClient::with_base_url("test-key", spawn_mock().await);
    let address = client.reverse_geocode(LatLng::new(33.69, -117.92)).await.unwrap();
    assert_eq!(address, "Costa Mesa, CA, USA");
}
