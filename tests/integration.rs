use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use ride_dispatch::api::rest::router;
use ride_dispatch::state::AppState;
use serde_json::{Value, json};
use tower::ServiceExt;

fn setup() -> axum::Router {
    router(Arc::new(AppState::new(1024, 7, 50.0, Default::default())))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn create_driver(app: &axum::Router, lat: f64, lon: f64, rate: Option<f64>) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/drivers",
            json!({
                "name": "John Driver",
                "location": { "lat": lat, "lon": lon },
                "price_per_km": rate
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let id = body["id"].as_str().unwrap().to_string();

    // Drivers onboard OFFLINE and go on duty explicitly.
    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/drivers/{id}/duty"),
            json!({ "availability": "Online" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    id
}

async fn create_client(app: &axum::Router, location: Value) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/clients",
            json!({ "name": "Jane Client", "location": location }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["id"].as_str().unwrap().to_string()
}

async fn create_ride(app: &axum::Router, client_id: &str, driver_id: &str) -> Value {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/rides",
            json!({
                "client_id": client_id,
                "driver_id": driver_id,
                "pickup": { "lat": 6.5244, "lon": 3.3792 },
                "dropoff": { "lat": 6.5500, "lon": 3.4000 }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

async fn transition(app: &axum::Router, ride_id: &str, action: &str, caller_id: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/rides/{ride_id}/{action}"),
            json!({ "caller_id": caller_id }),
        ))
        .await
        .unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

async fn driver_availability(app: &axum::Router, driver_id: &str) -> String {
    let response = app.clone().oneshot(get_request("/drivers")).await.unwrap();
    let drivers = body_json(response).await;
    drivers
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["id"] == driver_id)
        .unwrap()["availability"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn health_returns_ok() {
    let app = setup();
    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["drivers"], 0);
    assert_eq!(body["clients"], 0);
    assert_eq!(body["rides"], 0);
}

#[tokio::test]
async fn metrics_returns_prometheus_format() {
    let app = setup();
    let response = app.oneshot(get_request("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.contains("text/plain"));

    let body = body_string(response).await;
    assert!(body.contains("active_rides"));
}

#[tokio::test]
async fn create_driver_starts_offline_without_load() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/drivers",
            json!({
                "name": "John Driver",
                "location": { "lat": 6.5244, "lon": 3.3792 },
                "price_per_km": 150.0
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["availability"], "Offline");
    assert_eq!(body["price_per_km"], 150.0);
    assert!(!body["id"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn create_driver_empty_name_returns_400() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/drivers",
            json!({ "name": "  ", "price_per_km": 100.0 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_driver_negative_rate_returns_400() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/drivers",
            json!({ "name": "John", "price_per_km": -1.0 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn out_of_range_coordinate_returns_400() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/clients",
            json!({ "name": "Jane", "location": { "lat": 95.0, "lon": 3.0 } }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_client_location() {
    let app = setup();
    let client_id = create_client(&app, Value::Null).await;

    let response = app
        .oneshot(json_request(
            "PATCH",
            &format!("/clients/{client_id}/location"),
            json!({ "location": { "lat": 6.45, "lon": 3.39 } }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["location"]["lat"], 6.45);
    assert_eq!(body["location"]["lon"], 3.39);
}

#[tokio::test]
async fn nearby_drivers_ranked_and_limited() {
    let app = setup();
    let client_id = create_client(&app, json!({ "lat": 6.5244, "lon": 3.3792 })).await;

    // ~1 km and ~5 km north of the client.
    let near_id = create_driver(&app, 6.5334, 3.3792, Some(150.0)).await;
    let mid_id = create_driver(&app, 6.5694, 3.3792, Some(150.0)).await;

    // An off-duty driver next door never shows up.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/drivers",
            json!({
                "name": "Off Duty",
                "location": { "lat": 6.5245, "lon": 3.3793 },
                "price_per_km": 100.0
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get_request(&format!("/clients/{client_id}/nearby-drivers")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let matches = body_json(response).await;
    let list = matches.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["driver"]["id"], near_id);
    assert_eq!(list[1]["driver"]["id"], mid_id);
    assert!(list[0]["distance_km"].as_f64().unwrap() <= list[1]["distance_km"].as_f64().unwrap());

    let response = app
        .oneshot(get_request(&format!(
            "/clients/{client_id}/nearby-drivers?limit=1"
        )))
        .await
        .unwrap();
    let matches = body_json(response).await;
    let list = matches.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["driver"]["id"], near_id);
}

#[tokio::test]
async fn nearby_drivers_without_client_location_is_empty() {
    let app = setup();
    let client_id = create_client(&app, Value::Null).await;
    create_driver(&app, 6.5334, 3.3792, Some(150.0)).await;

    let response = app
        .oneshot(get_request(&format!("/clients/{client_id}/nearby-drivers")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let matches = body_json(response).await;
    assert_eq!(matches.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn nearby_drivers_unknown_client_returns_404() {
    let app = setup();
    let fake_id = "00000000-0000-0000-0000-000000000000";
    let response = app
        .oneshot(get_request(&format!("/clients/{fake_id}/nearby-drivers")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_ride_without_rate_returns_422() {
    let app = setup();
    let client_id = create_client(&app, json!({ "lat": 6.5244, "lon": 3.3792 })).await;
    let driver_id = create_driver(&app, 6.5244, 3.3792, None).await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/rides",
            json!({
                "client_id": client_id,
                "driver_id": driver_id,
                "pickup": { "lat": 6.5244, "lon": 3.3792 },
                "dropoff": { "lat": 6.5500, "lon": 3.4000 }
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn full_ride_lifecycle() {
    let app = setup();
    let client_id = create_client(&app, json!({ "lat": 6.5244, "lon": 3.3792 })).await;
    let driver_id = create_driver(&app, 6.5244, 3.3792, Some(150.0)).await;

    let ride = create_ride(&app, &client_id, &driver_id).await;
    assert_eq!(ride["status"], "Requested");
    assert!(ride["price"].as_f64().unwrap() > 0.0);
    let ride_id = ride["id"].as_str().unwrap().to_string();

    // Both participants see the open ride.
    let response = app
        .clone()
        .oneshot(get_request(&format!("/participants/{driver_id}/rides")))
        .await
        .unwrap();
    let active = body_json(response).await;
    assert_eq!(active.as_array().unwrap().len(), 1);

    let (status, body) = transition(&app, &ride_id, "accept", &driver_id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Accepted");
    assert_eq!(driver_availability(&app, &driver_id).await, "Engaged");

    let (status, body) = transition(&app, &ride_id, "start", &driver_id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Started");

    let (status, body) = transition(&app, &ride_id, "complete", &driver_id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Completed");
    assert_eq!(driver_availability(&app, &driver_id).await, "Online");

    let response = app
        .clone()
        .oneshot(get_request(&format!("/participants/{client_id}/rides")))
        .await
        .unwrap();
    let active = body_json(response).await;
    assert_eq!(active.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn client_cancel_frees_engaged_driver() {
    let app = setup();
    let client_id = create_client(&app, json!({ "lat": 6.5244, "lon": 3.3792 })).await;
    let driver_id = create_driver(&app, 6.5244, 3.3792, Some(150.0)).await;

    let ride = create_ride(&app, &client_id, &driver_id).await;
    let ride_id = ride["id"].as_str().unwrap().to_string();

    let (status, _) = transition(&app, &ride_id, "accept", &driver_id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(driver_availability(&app, &driver_id).await, "Engaged");

    let (status, body) = transition(&app, &ride_id, "cancel", &client_id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Cancelled");
    assert_eq!(driver_availability(&app, &driver_id).await, "Online");
}

#[tokio::test]
async fn stranger_transition_returns_403() {
    let app = setup();
    let client_id = create_client(&app, json!({ "lat": 6.5244, "lon": 3.3792 })).await;
    let driver_id = create_driver(&app, 6.5244, 3.3792, Some(150.0)).await;

    let ride = create_ride(&app, &client_id, &driver_id).await;
    let ride_id = ride["id"].as_str().unwrap().to_string();

    let stranger = "11111111-1111-1111-1111-111111111111";
    let (status, _) = transition(&app, &ride_id, "accept", stranger).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The client may cancel, but never accept.
    let (status, _) = transition(&app, &ride_id, "accept", &client_id).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn repeated_accept_returns_409() {
    let app = setup();
    let client_id = create_client(&app, json!({ "lat": 6.5244, "lon": 3.3792 })).await;
    let driver_id = create_driver(&app, 6.5244, 3.3792, Some(150.0)).await;

    let ride = create_ride(&app, &client_id, &driver_id).await;
    let ride_id = ride["id"].as_str().unwrap().to_string();

    let (status, _) = transition(&app, &ride_id, "accept", &driver_id).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = transition(&app, &ride_id, "accept", &driver_id).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("invalid transition"));
}

#[tokio::test]
async fn transition_on_missing_ride_returns_404() {
    let app = setup();
    let driver_id = create_driver(&app, 6.5244, 3.3792, Some(150.0)).await;

    let fake_ride = "22222222-2222-2222-2222-222222222222";
    let (status, _) = transition(&app, fake_ride, "accept", &driver_id).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn engaged_driver_cannot_toggle_duty() {
    let app = setup();
    let client_id = create_client(&app, json!({ "lat": 6.5244, "lon": 3.3792 })).await;
    let driver_id = create_driver(&app, 6.5244, 3.3792, Some(150.0)).await;

    let ride = create_ride(&app, &client_id, &driver_id).await;
    let ride_id = ride["id"].as_str().unwrap().to_string();
    let (status, _) = transition(&app, &ride_id, "accept", &driver_id).await;
    assert_eq!(status, StatusCode::OK);

    let response = app
        .oneshot(json_request(
            "PATCH",
            &format!("/drivers/{driver_id}/duty"),
            json!({ "availability": "Offline" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}
