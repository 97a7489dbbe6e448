mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use appointment_cell::router::appointment_routes;
use billing_cell::router::cancellation_routes;
use shared_models::BookingStatus;

use common::{desk, open_doctor, Desk};

fn create_test_app(d: &Desk) -> Router {
    appointment_routes(d.booking.clone(), d.prescriptions.clone())
        .merge(cancellation_routes(d.settlement.clone()))
}

fn post_json(uri: String, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn test_book_then_fetch_appointment() {
    let d = desk();
    let (doctor, date) = open_doctor(&d.clinic, dec!(500)).await;
    let patient = d.clinic.add_patient().await;
    let app = create_test_app(&d);

    let response = app
        .clone()
        .oneshot(post_json(
            "/".to_string(),
            json!({
                "patient_id": patient.id,
                "doctor_id": doctor.id,
                "date": date,
                "time_slot": "09:00-09:30",
                "health_issue": "Migraine",
                "email": patient.email,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["appointment"]["booking_status"], "pending");
    assert_eq!(body["notification"]["status"], "queued");
    let appointment_id = body["appointment"]["id"].as_str().unwrap().to_string();

    let fetch = Request::builder()
        .uri(format!("/{}", appointment_id))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(fetch).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["invoice"]["payment_status"], "pending");
    assert!(body["prescription"].is_null());
}

#[tokio::test]
async fn test_taken_slot_is_conflict() {
    let d = desk();
    let (doctor, date) = open_doctor(&d.clinic, dec!(500)).await;
    let holder = d.clinic.add_patient().await;
    d.clinic
        .add_appointment(holder.id, doctor.id, date, "09:00-09:30", BookingStatus::Confirmed)
        .await;
    let patient = d.clinic.add_patient().await;
    let app = create_test_app(&d);

    let response = app
        .oneshot(post_json(
            "/".to_string(),
            json!({
                "patient_id": patient.id,
                "doctor_id": doctor.id,
                "date": date,
                "time_slot": "09:00-09:30",
                "health_issue": "Migraine",
                "email": patient.email,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_past_date_is_bad_request() {
    let d = desk();
    let (doctor, _) = open_doctor(&d.clinic, dec!(500)).await;
    let patient = d.clinic.add_patient().await;
    let app = create_test_app(&d);

    let response = app
        .oneshot(post_json(
            "/".to_string(),
            json!({
                "patient_id": patient.id,
                "doctor_id": doctor.id,
                "date": d.clinic.yesterday(),
                "time_slot": "09:00-09:30",
                "health_issue": "Migraine",
                "email": patient.email,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_prescription_and_cancel_routes() {
    let d = desk();
    let (doctor, date) = open_doctor(&d.clinic, dec!(500)).await;
    let patient = d.clinic.add_patient().await;
    let confirmed = d
        .clinic
        .add_appointment(patient.id, doctor.id, date, "09:00-09:30", BookingStatus::Confirmed)
        .await;
    let pending = d
        .clinic
        .add_appointment(patient.id, doctor.id, date, "09:30-10:00", BookingStatus::Pending)
        .await;
    let app = create_test_app(&d);

    let prescription = json!({
        "doctor_id": doctor.id,
        "patient_id": patient.id,
        "prescription_text": "Ibuprofen as needed",
    });
    let response = app
        .clone()
        .oneshot(post_json(
            format!("/{}/prescription", confirmed.id),
            prescription.clone(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["appointment"]["booking_status"], "completed");

    let response = app
        .clone()
        .oneshot(post_json(format!("/{}/prescription", pending.id), prescription))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let cancel = Request::builder()
        .method("POST")
        .uri(format!("/{}/cancel", pending.id))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(cancel).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let missing = Request::builder()
        .uri(format!("/{}", Uuid::new_v4()))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(missing).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
