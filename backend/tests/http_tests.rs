//! HTTP API tests
//!
//! Drives the router in-process with `oneshot`; upstreams are mocks and
//! no database is configured.

mod common;

use std::sync::Arc;

use advisory_backend::{create_app, AppState, Config};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use common::*;
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> Router {
    let h = harness(
        MockGeocoder::answering("Ames, Story County, Iowa"),
        MockWeather::answering(conditions(25.0, 50.0, 10.0)),
        MockGenerator::answering("Irrigate lightly tomorrow morning."),
    );
    let config = Config::load().expect("default config loads");

    create_app(AppState {
        pipeline: Arc::new(h.pipeline),
        db: None,
        config: Arc::new(config),
    })
}

async fn post_advisory(body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/farms/advisory")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get_json(uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_submit_advisory() {
    let (status, body) = post_advisory(json!({
        "farmName": "Sunny Acres",
        "cropType": "Corn",
        "areaAcres": "120.5",
        "latitude": 42.0267,
        "longitude": -93.617
    }))
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stage"], "done");
    assert_eq!(body["error"], Value::Null);
    assert_eq!(body["location"]["address"], "Ames, Story County, Iowa");
    assert_eq!(body["weather"]["status"], "available");
    assert_eq!(body["estimate"]["status"], "estimated");
    assert_eq!(body["estimate"]["index"], 0);
    assert_eq!(body["waterNeed"], "low");
    assert_eq!(body["adviceText"], "Irrigate lightly tomorrow morning.");
}

#[tokio::test]
async fn test_half_coordinate_pair_rejected() {
    let (status, body) = post_advisory(json!({
        "farmName": "Sunny Acres",
        "cropType": "Corn",
        "latitude": 42.0267
    }))
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["field"], "coordinates");
}

#[tokio::test]
async fn test_out_of_range_latitude_rejected() {
    let (status, body) = post_advisory(json!({
        "farmName": "Sunny Acres",
        "latitude": 123.0,
        "longitude": 10.0
    }))
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "coordinates");
}

#[tokio::test]
async fn test_missing_farm_name_rejected() {
    let (status, body) = post_advisory(json!({
        "cropType": "Wheat",
        "address": "Salina, KS"
    }))
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["field"], "farmName");
}

#[tokio::test]
async fn test_missing_location_rejected() {
    let (status, body) = post_advisory(json!({ "farmName": "Nowhere" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "address");
}

#[tokio::test]
async fn test_health_endpoints() {
    for uri in ["/health", "/api/v1/health"] {
        let (status, body) = get_json(uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], "not_configured");
    }
}
