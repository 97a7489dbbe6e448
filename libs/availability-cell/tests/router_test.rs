use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::ServiceExt;

use availability_cell::router::availability_routes;
use availability_cell::AvailabilityService;
use shared_utils::test_utils::TestClinic;

fn create_test_app(clinic: &TestClinic) -> Router {
    let service = AvailabilityService::new(&clinic.config, clinic.store.clone(), clinic.clock.clone());
    availability_routes(Arc::new(service))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn test_create_then_list_slots() {
    let clinic = TestClinic::default();
    let doctor = clinic.add_doctor(dec!(500)).await;
    let app = create_test_app(&clinic);
    let date = clinic.tomorrow();

    let create = Request::builder()
        .method("POST")
        .uri(format!("/doctors/{}", doctor.id))
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "date": date, "available_time": "09:00-10:00" }).to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(create).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let list = Request::builder()
        .uri(format!("/doctors/{}/slots?date={}", doctor.id, date))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(list).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["available_slots"], json!(["09:00-09:30", "09:30-10:00"]));
    assert_eq!(body["total"], 2);
}

#[tokio::test]
async fn test_past_date_is_bad_request() {
    let clinic = TestClinic::default();
    let doctor = clinic.add_doctor(dec!(500)).await;
    let app = create_test_app(&clinic);

    let request = Request::builder()
        .uri(format!("/doctors/{}/slots?date={}", doctor.id, clinic.yesterday()))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("past"));
}

#[tokio::test]
async fn test_duplicate_window_is_conflict() {
    let clinic = TestClinic::default();
    let doctor = clinic.add_doctor(dec!(500)).await;
    clinic.add_availability(doctor.id, clinic.tomorrow(), "09:00-10:00").await;
    let app = create_test_app(&clinic);

    let request = Request::builder()
        .method("POST")
        .uri(format!("/doctors/{}", doctor.id))
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "date": clinic.tomorrow(), "available_time": "11:00-12:00" }).to_string(),
        ))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_missing_window_is_not_found() {
    let clinic = TestClinic::default();
    let doctor = clinic.add_doctor(dec!(500)).await;
    let app = create_test_app(&clinic);

    let request = Request::builder()
        .uri(format!("/doctors/{}/slots?date={}", doctor.id, clinic.tomorrow()))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
