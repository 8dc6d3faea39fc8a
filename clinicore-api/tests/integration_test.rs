/// Integration tests for the Clinicore API
///
/// End-to-end verification through the router:
/// - Authentication and the response envelope
/// - Booking flow with conflict handling
/// - Role-scoped listings
/// - Stock adjustment guard
///
/// These tests require a running PostgreSQL database.
/// Run with: cargo test --test integration_test -- --test-threads=1

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use clinicore_shared::models::user::Role;
use common::TestContext;
use serde_json::{json, Value};
use tower::Service as _;

async fn send(
    ctx: &TestContext,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", ctx.bearer(token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = ctx.app.clone().call(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, value)
}

#[tokio::test]
async fn test_health_check_is_public() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = send(&ctx, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let ctx = TestContext::new().await.unwrap();

    let (status, _) = send(&ctx, "GET", "/v1/appointments", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_login_roundtrip() {
    let ctx = TestContext::new().await.unwrap();
    let email = format!("reg-{}@test.example", uuid::Uuid::new_v4());

    let (status, body) = send(
        &ctx,
        "POST",
        "/v1/auth/register",
        None,
        Some(json!({
            "name": "New Patient",
            "email": email,
            "password": "longenough1"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register failed: {}", body);
    assert_eq!(body["success"], true);
    // Self-registration always yields a patient account
    assert_eq!(body["data"]["role"], "patient");

    let (status, body) = send(
        &ctx,
        "POST",
        "/v1/auth/login",
        None,
        Some(json!({ "email": email, "password": "longenough1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["access_token"].as_str().unwrap().len() > 20);

    // Wrong password fails closed
    let (status, _) = send(
        &ctx,
        "POST",
        "/v1/auth/login",
        None,
        Some(json!({ "email": email, "password": "wrongpass99" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_booking_conflict_returns_409() {
    let ctx = TestContext::new().await.unwrap();
    let doctor = ctx.seeded_doctor().await.unwrap();
    let (_, receptionist_token) = ctx.user_with_role(Role::Receptionist).await.unwrap();
    let (patient, _) = ctx.user_with_role(Role::Patient).await.unwrap();

    let booking = json!({
        "patient_id": patient.id,
        "doctor_id": doctor.id,
        "date": "2031-03-10",
        "start_time": "10:00:00",
        "end_time": "10:30:00"
    });

    let (status, body) = send(
        &ctx,
        "POST",
        "/v1/appointments",
        Some(&receptionist_token),
        Some(booking.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "booking failed: {}", body);
    assert_eq!(body["data"]["status"], "scheduled");

    // Identical slot again: conflict in the envelope error shape
    let (status, body) = send(
        &ctx,
        "POST",
        "/v1/appointments",
        Some(&receptionist_token),
        Some(booking),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn test_patient_listing_is_scoped() {
    let ctx = TestContext::new().await.unwrap();
    let doctor = ctx.seeded_doctor().await.unwrap();
    let (_, receptionist_token) = ctx.user_with_role(Role::Receptionist).await.unwrap();
    let (alice, alice_token) = ctx.user_with_role(Role::Patient).await.unwrap();
    let (bob, _) = ctx.user_with_role(Role::Patient).await.unwrap();

    for (patient, start, end) in [
        (&alice, "09:00:00", "09:30:00"),
        (&bob, "09:30:00", "10:00:00"),
    ] {
        let (status, body) = send(
            &ctx,
            "POST",
            "/v1/appointments",
            Some(&receptionist_token),
            Some(json!({
                "patient_id": patient.id,
                "doctor_id": doctor.id,
                "date": "2031-03-11",
                "start_time": start,
                "end_time": end
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "booking failed: {}", body);
    }

    // Alice asks for Bob's appointments; the scope returns only hers
    let uri = format!("/v1/appointments?patient_id={}", bob.id);
    let (status, body) = send(&ctx, "GET", &uri, Some(&alice_token), None).await;
    assert_eq!(status, StatusCode::OK);

    let rows = body["data"].as_array().unwrap();
    assert!(!rows.is_empty());
    for row in rows {
        assert_eq!(row["patient_id"], json!(alice.id));
    }
}

#[tokio::test]
async fn test_patient_cannot_reach_admin_surface() {
    let ctx = TestContext::new().await.unwrap();
    let (_, patient_token) = ctx.user_with_role(Role::Patient).await.unwrap();

    let (status, body) = send(&ctx, "GET", "/v1/users", Some(&patient_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, _) = send(&ctx, "GET", "/v1/dashboard/summary", Some(&patient_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_stock_adjustment_guard() {
    let ctx = TestContext::new().await.unwrap();
    let (_, admin_token) = ctx.user_with_role(Role::Admin).await.unwrap();

    let (status, body) = send(
        &ctx,
        "POST",
        "/v1/inventory",
        Some(&admin_token),
        Some(json!({
            "name": "Syringe 5ml",
            "sku": format!("SYR-{}", uuid::Uuid::new_v4()),
            "stock_quantity": 5,
            "reorder_level": 10,
            "unit_price_cents": 40
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "create failed: {}", body);
    let item_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &ctx,
        "POST",
        &format!("/v1/inventory/{}/adjust", item_id),
        Some(&admin_token),
        Some(json!({ "delta": -2 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["stock_quantity"], 3);

    // Would go negative: 409, quantity unchanged
    let (status, body) = send(
        &ctx,
        "POST",
        &format!("/v1/inventory/{}/adjust", item_id),
        Some(&admin_token),
        Some(json!({ "delta": -10 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (status, body) = send(
        &ctx,
        "GET",
        &format!("/v1/inventory/{}", item_id),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["stock_quantity"], 3);
}
