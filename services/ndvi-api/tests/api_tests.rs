//! HTTP contract of the timeseries service.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use ndvi_api::{build_router, AppState, Pipeline};
use ndvi_common::{Band, BoundingBox, POINT_BUFFER_DEG};
use raster_stack::{RasterStack, StackOptions};
use stac_client::SceneCatalog;
use test_utils::{
    locations, memory_url, nir_red_for_index, constant_band, scene_with_all_bands, utc_day,
    MemoryPixelSource, StaticCatalog,
};

const SIZE: usize = 6;

fn farm_source(ids: &[&str]) -> MemoryPixelSource {
    let (lat, lon) = locations::IOWA_FARM;
    let bbox = BoundingBox::around_point(lon, lat, POINT_BUFFER_DEG);
    let mut source = MemoryPixelSource::new();
    for id in ids {
        let (nir, red) = nir_red_for_index(SIZE, SIZE, 0.6, 700.0);
        source = source
            .with_grid(memory_url(id, Band::Nir), &bbox, SIZE, SIZE, nir)
            .with_grid(memory_url(id, Band::Red), &bbox, SIZE, SIZE, red)
            .with_grid(memory_url(id, Band::Green), &bbox, SIZE, SIZE, constant_band(SIZE, SIZE, 900.0))
            .with_grid(memory_url(id, Band::Blue), &bbox, SIZE, SIZE, constant_band(SIZE, SIZE, 500.0));
    }
    source
}

fn app_with(catalog: Arc<dyn SceneCatalog>, source: MemoryPixelSource, slots: usize, queue: Duration) -> Router {
    let stack = RasterStack::new(
        Arc::new(source),
        StackOptions {
            fetch_concurrency: 4,
            resolution: 0.005,
        },
    );
    let state = AppState::new(Pipeline::new(catalog, stack), slots, queue);
    build_router(Arc::new(state))
}

fn app(catalog: Arc<dyn SceneCatalog>, source: MemoryPixelSource) -> Router {
    app_with(catalog, source, 2, Duration::from_secs(5))
}

fn post_json(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/timeseries")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn farm_body() -> Value {
    let (lat, lon) = locations::IOWA_FARM;
    json!({"lat": lat, "lon": lon, "start_date": "2024-04-01", "end_date": "2024-09-30"})
}

#[tokio::test]
async fn test_success_payload_shape() {
    let scenes = vec![
        scene_with_all_bands("late", utc_day(2024, 8, 1)),
        scene_with_all_bands("early", utc_day(2024, 5, 1)),
    ];
    let app = app(Arc::new(StaticCatalog::new(scenes)), farm_source(&["early", "late"]));

    let (status, body) = call(app, post_json(farm_body())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");

    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["date"], "2024-05-01");
    assert_eq!(data[1]["date"], "2024-08-01");
    assert!((data[0]["ndvi"].as_f64().unwrap() - 0.6).abs() < 1e-4);

    let frames = body["frames"].as_array().unwrap();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[1]["date"], "2024-08-01");
    for frame in frames {
        // base64 of the PNG signature
        assert!(frame["rgb"].as_str().unwrap().starts_with("iVBORw0KGgo"));
        assert!(frame["mask"].as_str().unwrap().starts_with("iVBORw0KGgo"));
    }
}

#[tokio::test]
async fn test_missing_coordinates_is_400() {
    let catalog = Arc::new(StaticCatalog::empty());
    let app = app(catalog.clone(), MemoryPixelSource::new());

    let (status, body) = call(app, post_json(json!({"lat": 40.0}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Missing coordinates"}));
    assert_eq!(catalog.calls(), 0);
}

#[tokio::test]
async fn test_invalid_inputs_are_400() {
    let bodies = [
        json!({"lat": "abc", "lon": 1.0}),
        json!({"lat": 100.0, "lon": 1.0}),
        json!({"lat": 1.0, "lon": 1.0, "start_date": "yesterday"}),
        json!({"lat": 1.0, "lon": 1.0, "start_date": "2024-06-01", "end_date": "2024-01-01"}),
    ];
    for body in bodies {
        let app = app(Arc::new(StaticCatalog::empty()), MemoryPixelSource::new());
        let (status, response) = call(app, post_json(body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {}", body);
        assert!(response["error"].is_string());
    }
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let app = app(Arc::new(StaticCatalog::empty()), MemoryPixelSource::new());
    let request = Request::builder()
        .method("POST")
        .uri("/api/timeseries")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = call(app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_no_scenes_is_404() {
    let app = app(Arc::new(StaticCatalog::empty()), MemoryPixelSource::new());
    let (lat, lon) = locations::OPEN_OCEAN;

    let (status, body) = call(app, post_json(json!({"lat": lat, "lon": lon}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "No data found for this location"}));
}

#[tokio::test]
async fn test_upstream_failure_is_500() {
    let app = app(Arc::new(StaticCatalog::failing("search backend down")), MemoryPixelSource::new());

    let (status, body) = call(app, post_json(farm_body())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("search backend down"));
}

#[tokio::test]
async fn test_saturated_limiter_is_503() {
    let scenes = vec![scene_with_all_bands("slow", utc_day(2024, 6, 1))];
    let source = farm_source(&["slow"]).with_delay(Duration::from_millis(500));
    let app = app_with(Arc::new(StaticCatalog::new(scenes)), source, 1, Duration::from_millis(50));

    let first = tokio::spawn(call(app.clone(), post_json(farm_body())));
    tokio::time::sleep(Duration::from_millis(100)).await;
    let (status, body) = call(app, post_json(farm_body())).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().starts_with("Service unavailable"));
    let (first_status, _) = first.await.unwrap();
    assert_eq!(first_status, StatusCode::OK);
}

#[tokio::test]
async fn test_health() {
    let app = app(Arc::new(StaticCatalog::empty()), MemoryPixelSource::new());
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let (status, body) = call(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}
